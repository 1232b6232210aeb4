//! Debug-session orchestration
//!
//! Entered when the program is launched by the OS interception hook in
//! place of a service executable. The session moves through validating the
//! caller's identity, launching the target suspended under a hook bypass,
//! racing debugger attachment against the waiting indicator, and resuming
//! the target before the service control manager's start timeout elapses.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{get_service_timeout, ConfigStore, DebuggerHookScope};
use crate::core::types::{executable_file_name, DebugError, DebugResult, INVALID_SESSION_ID};
use crate::process::{identity, ManagedProcess};
use crate::windows::bindings::wtsapi32;

/// Subtracted from the service-start timeout so the session always resolves
/// before the service control manager would kill the start
pub const SAFETY_MARGIN: Duration = Duration::from_millis(2_000);

/// Bounded wait for a console/RDP session to become active before starting
/// the indicator on the logon screen
pub const LOGON_WAIT_ATTEMPTS: u32 = 10;
pub const LOGON_WAIT_INTERVAL: Duration = Duration::from_millis(1_000);

/// Flag the program passes to itself to start the waiting indicator
pub const WAIT_MODE_FLAG: &str = "--wait";

/// How the racing wait in the Waiting state resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A debugger attached to the target before anything else happened
    DebuggerAttached,
    /// The waiting indicator exited on its own (user dismissed it)
    IndicatorClosed,
    /// Neither condition held within the budget
    TimedOut,
}

/// Races debugger-attachment polling against indicator-exit polling under a
/// deadline.
///
/// A poller that resolves `false` has exhausted its query-failure budget; it
/// must not win the race, so it is parked until the deadline fires. Both
/// pollers are dropped (cancelled) as soon as the race resolves.
pub async fn race_for_resolution<A, E>(
    debugger_attached: A,
    indicator_exited: E,
    budget: Duration,
) -> WaitOutcome
where
    A: Future<Output = bool>,
    E: Future<Output = bool>,
{
    let attached = async {
        if !debugger_attached.await {
            std::future::pending::<()>().await;
        }
    };
    let exited = async {
        if !indicator_exited.await {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = tokio::time::sleep(budget) => WaitOutcome::TimedOut,
        _ = attached => WaitOutcome::DebuggerAttached,
        _ = exited => WaitOutcome::IndicatorClosed,
    }
}

/// One debug session for an intercepted service executable
pub struct DebugSession<'a, S: ConfigStore + ?Sized> {
    store: &'a S,
    target_executable: String,
    target_arguments: Vec<String>,
}

impl<'a, S: ConfigStore + ?Sized> DebugSession<'a, S> {
    pub fn new(store: &'a S, target_executable: String, target_arguments: Vec<String>) -> Self {
        DebugSession {
            store,
            target_executable,
            target_arguments,
        }
    }

    /// Runs the session to completion.
    ///
    /// Failing to create the target process is fatal (the service start
    /// then fails normally); failing to start the waiting indicator is not.
    /// The target is resumed on every outcome, including timeout, and the
    /// interception hook is restored before returning.
    pub async fn run(self) -> DebugResult<()> {
        // Validating
        if !identity::is_administrator() && !identity::is_local_system() {
            return Err(DebugError::PermissionDenied(
                "debug sessions require administrative rights or the LocalSystem identity"
                    .to_string(),
            ));
        }

        // Preparing
        let target_name = executable_file_name(&self.target_executable).to_string();
        let own_image = std::env::current_exe()?;
        let indicator_arguments = vec![
            WAIT_MODE_FLAG.to_string(),
            format!("\"{}\"", target_name),
        ];

        // Launching: the bypass stays active for the whole session and is
        // released (restoring the hook) when this scope ends
        let _hook_bypass = DebuggerHookScope::acquire(self.store, &target_name)?;

        let mut target =
            ManagedProcess::new(self.target_executable.clone(), self.target_arguments.clone());
        target.start(true)?;
        info!(service = %target_name, pid = ?target.pid(), "target started suspended");

        let mut indicator =
            ManagedProcess::new(own_image.to_string_lossy(), indicator_arguments);
        if let Err(err) = start_wait_indicator(&mut indicator).await {
            // No visible timer then; the debugging window stays open anyway
            warn!(error = %err, "could not start the waiting indicator");
        }

        // Waiting
        let budget = get_service_timeout(self.store).saturating_sub(SAFETY_MARGIN);
        let outcome =
            race_for_resolution(target.wait_for_debugger(), indicator.wait_for_exit(), budget)
                .await;
        info!(?outcome, "wait resolved");

        // Resolving
        resolve_target(outcome, || target.resume(), || indicator.terminate())
    }
}

/// Applies the resolution actions for a finished wait.
///
/// The target is resumed exactly once no matter how the wait ended (a timed
/// out or dismissed session must still let the service start), and the
/// waiting indicator is closed only when a debugger attachment ended the
/// wait. A failing indicator close is logged and never masks the resume
/// result.
pub fn resolve_target(
    outcome: WaitOutcome,
    resume: impl FnOnce() -> DebugResult<()>,
    close_indicator: impl FnOnce() -> DebugResult<()>,
) -> DebugResult<()> {
    let resumed = resume();
    if outcome == WaitOutcome::DebuggerAttached {
        if let Err(err) = close_indicator() {
            warn!(error = %err, "could not close the waiting indicator");
        }
    }
    resumed
}

/// Starts the waiting indicator where a human can see it: on the user's
/// desktop when somebody is logged on, otherwise on the logon screen once a
/// console/RDP session becomes active.
async fn start_wait_indicator(indicator: &mut ManagedProcess) -> DebugResult<()> {
    if wtsapi32::logged_on_user_available() {
        return indicator.start_on_user_desktop();
    }

    for _ in 0..LOGON_WAIT_ATTEMPTS {
        if wtsapi32::active_console_session() != INVALID_SESSION_ID {
            break;
        }
        tokio::time::sleep(LOGON_WAIT_INTERVAL).await;
    }
    indicator.start_on_logon_screen()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_race_debugger_attaches_first() {
        let outcome = race_for_resolution(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                true
            },
            std::future::pending(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::DebuggerAttached);
    }

    #[tokio::test]
    async fn test_race_indicator_closes_first() {
        let outcome = race_for_resolution(
            std::future::pending(),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                true
            },
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::IndicatorClosed);
    }

    #[tokio::test]
    async fn test_race_times_out() {
        let outcome = race_for_resolution(
            std::future::pending(),
            std::future::pending(),
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_exhausted_poller_does_not_win() {
        // A poller that gave up (false) must fall through to the timeout
        let outcome = race_for_resolution(
            async { false },
            std::future::pending(),
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }
}
