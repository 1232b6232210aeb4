use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::{error, info, Level};

use svcdebug::config::{
    get_service_timeout, is_hook_set, remove_hook, reset_service_timeout, set_hook,
    set_service_timeout, RegistryStore,
};
use svcdebug::orchestrator::{DebugSession, WAIT_MODE_FLAG};
use svcdebug::process::{identity, privileges, ManagedProcess};
use svcdebug::DebugError;

/// Flag the OS interception hook passes implicitly: everything after it is
/// the original service command line
const DEBUG_MODE_FLAG: &str = "--debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some(DEBUG_MODE_FLAG) => run_debug_session(&args[1..]).await,
        Some(WAIT_MODE_FLAG) => run_wait_indicator(&args[1..]),
        _ => run_configuration(&args),
    }
}

/// Invoked by the OS in place of the hooked service executable. Runs
/// unattended, so failures are logged and never prompt.
async fn run_debug_session(target: &[String]) -> Result<()> {
    let executable = match target.first() {
        Some(executable) => executable.clone(),
        None => {
            error!("debug mode requires the target command line");
            return Ok(());
        }
    };
    let arguments = target[1..].to_vec();

    info!(
        service = %executable,
        "svcdebug v{} intercepted a service start",
        env!("CARGO_PKG_VERSION")
    );

    let store = RegistryStore::new();
    let session = DebugSession::new(&store, executable, arguments);
    if let Err(err) = session.run().await {
        if notify_on_console(&err, identity::is_local_system()) {
            eprintln!("{err}");
        }
        error!(error = %err, "debug session failed");
    }
    Ok(())
}

/// Whether a debug-session failure should also be shown on the console.
///
/// Only permission errors warrant it, and only when a person launched the
/// program; under the service identity there is no console to talk to.
fn notify_on_console(err: &DebugError, local_system: bool) -> bool {
    matches!(err, DebugError::PermissionDenied(_)) && !local_system
}

/// The waiting indicator: a console window shown where the operator can see
/// it. Stays open until dismissed or terminated by the debug session.
fn run_wait_indicator(args: &[String]) -> Result<()> {
    let target = args
        .first()
        .map(|name| name.trim_matches('"'))
        .unwrap_or("the service");

    println!("Waiting for a debugger to attach to {target} ...");
    println!("The service is suspended. Attach your debugger now, or press Enter to stop waiting and let it start.");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

/// Interactive configuration: manage hooks, the service-start timeout, and
/// restarts. Needs administrative rights for every write.
fn run_configuration(args: &[String]) -> Result<()> {
    // A hooked service whose override was removed mid-start would land
    // here as LocalSystem; there is nobody to talk to, so leave quietly.
    if identity::is_local_system() {
        return Ok(());
    }

    if !identity::is_administrator() {
        let relauncher = ManagedProcess::new(
            std::env::current_exe()?.to_string_lossy(),
            args.to_vec(),
        );
        if let Err(err) = relauncher.start_as_admin() {
            eprintln!("This program requires administrator rights: {err}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let store = RegistryStore::new();
    let own_image = std::env::current_exe()?.to_string_lossy().into_owned();

    match args.split_first().map(|(cmd, rest)| (cmd.as_str(), rest)) {
        Some(("install", [executable])) => {
            let command_line = format!("\"{own_image}\" {DEBUG_MODE_FLAG}");
            set_hook(&store, executable, &command_line)?;
            println!("Debugger hook installed for {executable}");
        }
        Some(("remove", [executable])) => {
            remove_hook(&store, executable)?;
            println!("Debugger hook removed for {executable}");
        }
        Some(("status", [executable])) => {
            if is_hook_set(&store, executable, &own_image) {
                println!("{executable}: hooked by this program");
            } else {
                println!("{executable}: not hooked by this program");
            }
            println!(
                "Service start timeout: {} ms",
                get_service_timeout(&store).as_millis()
            );
        }
        Some(("timeout", [value])) if *value == "reset" => {
            reset_service_timeout(&store)?;
            println!("Service start timeout reset to the OS default (restart required)");
        }
        Some(("timeout", [value])) => {
            let ms: u32 = value.parse()?;
            set_service_timeout(&store, std::time::Duration::from_millis(ms as u64))?;
            println!("Service start timeout set to {ms} ms (restart required)");
        }
        Some(("timeout", [])) => {
            println!(
                "Service start timeout: {} ms",
                get_service_timeout(&store).as_millis()
            );
        }
        Some(("restart", [])) => {
            privileges::restart_system(
                "Restarting to apply the service start timeout",
                std::time::Duration::from_secs(10),
            )?;
            println!("System restart initiated");
        }
        _ => print_usage(&own_image),
    }
    Ok(())
}

fn print_usage(own_image: &str) {
    println!("svcdebug v{} - debug Windows services from the first instruction", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage:");
    println!("  {own_image} install <service.exe>   Hook a service executable");
    println!("  {own_image} remove <service.exe>    Remove the hook");
    println!("  {own_image} status <service.exe>    Show hook and timeout state");
    println!("  {own_image} timeout [<ms>|reset]    Show or change the service start timeout");
    println!("  {own_image} restart                 Restart the system to apply the timeout");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_notify_interactive_users_only() {
        let err = DebugError::PermissionDenied("administrator rights required".to_string());
        assert!(notify_on_console(&err, false));
        assert!(!notify_on_console(&err, true));
    }

    #[test]
    fn test_other_errors_stay_in_the_log() {
        let err = DebugError::NoActiveSession;
        assert!(!notify_on_console(&err, false));
        assert!(!notify_on_console(&err, true));
    }
}
