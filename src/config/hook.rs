//! Debugger interception hooks and the scoped hook bypass

use std::time::Duration;

use tracing::{debug, warn};

use crate::core::types::{executable_file_name, DebugResult};

use super::store::ConfigStore;

/// Service-start timeout the OS applies when no override is configured
pub const SERVICE_TIMEOUT_DEFAULT: Duration = Duration::from_millis(30_000);

/// Configures `command_line` as the debugger for `executable`, so the OS
/// launch path redirects the executable to it.
pub fn set_hook<S: ConfigStore + ?Sized>(
    store: &S,
    executable: &str,
    command_line: &str,
) -> DebugResult<()> {
    let name = executable_file_name(executable);
    store.set_debugger_override(name, command_line)?;
    debug!(executable = name, "interception hook set");
    Ok(())
}

/// Removes the debugger hook for `executable`. Succeeds if none was set.
pub fn remove_hook<S: ConfigStore + ?Sized>(store: &S, executable: &str) -> DebugResult<()> {
    let name = executable_file_name(executable);
    store.remove_debugger_override(name)?;
    debug!(executable = name, "interception hook removed");
    Ok(())
}

/// Checks whether the hook for `executable` refers to `debugger`
/// (case-insensitive substring match on the stored command line). An empty
/// `debugger` matches nothing.
pub fn is_hook_set<S: ConfigStore + ?Sized>(store: &S, executable: &str, debugger: &str) -> bool {
    if debugger.is_empty() {
        return false;
    }
    let name = executable_file_name(executable);
    match store.debugger_override(name) {
        Ok(Some(current)) => current
            .to_ascii_lowercase()
            .contains(&debugger.to_ascii_lowercase()),
        _ => false,
    }
}

/// Reads the effective service-start timeout: the stored override or the OS
/// default when none (or an unreadable value) is configured.
pub fn get_service_timeout<S: ConfigStore + ?Sized>(store: &S) -> Duration {
    match store.service_timeout_ms() {
        Ok(Some(ms)) => Duration::from_millis(ms as u64),
        _ => SERVICE_TIMEOUT_DEFAULT,
    }
}

/// Sets the service-start timeout override. Takes effect after a restart.
pub fn set_service_timeout<S: ConfigStore + ?Sized>(
    store: &S,
    timeout: Duration,
) -> DebugResult<()> {
    store.set_service_timeout_ms(timeout.as_millis() as u32)?;
    Ok(())
}

/// Removes the service-start timeout override. Takes effect after a restart.
pub fn reset_service_timeout<S: ConfigStore + ?Sized>(store: &S) -> DebugResult<()> {
    store.reset_service_timeout()?;
    Ok(())
}

/// Scoped bypass of the debugger hook for one executable.
///
/// Captures the configured override at construction and removes it; on drop
/// the captured value is restored if one existed. Holding the scope while
/// launching the target prevents the launch from being intercepted again by
/// this very program.
pub struct DebuggerHookScope<'a, S: ConfigStore + ?Sized> {
    store: &'a S,
    executable: String,
    saved: Option<String>,
}

impl<'a, S: ConfigStore + ?Sized> DebuggerHookScope<'a, S> {
    /// Reads and clears the hook for `executable`
    pub fn acquire(store: &'a S, executable: &str) -> DebugResult<Self> {
        let name = executable_file_name(executable).to_string();
        let saved = store.debugger_override(&name)?;
        store.remove_debugger_override(&name)?;
        debug!(executable = %name, had_hook = saved.is_some(), "hook bypass acquired");
        Ok(DebuggerHookScope {
            store,
            executable: name,
            saved,
        })
    }

    /// The override captured at acquisition, if any
    pub fn saved(&self) -> Option<&str> {
        self.saved.as_deref()
    }
}

impl<S: ConfigStore + ?Sized> Drop for DebuggerHookScope<'_, S> {
    fn drop(&mut self) {
        let saved = match self.saved.take() {
            Some(saved) => saved,
            None => return,
        };
        if let Err(err) = self.store.set_debugger_override(&self.executable, &saved) {
            warn!(
                executable = %self.executable,
                error = %err,
                "could not restore interception hook"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::InMemoryStore;

    #[test]
    fn test_remove_then_query_is_false() {
        let store = InMemoryStore::new();
        remove_hook(&store, "slow.exe").unwrap();
        assert!(!is_hook_set(&store, "slow.exe", "svcdebug.exe"));
    }

    #[test]
    fn test_set_then_query_is_true() {
        let store = InMemoryStore::new();
        set_hook(&store, "slow.exe", "\"C:\\Tools\\SvcDebug.exe\" --debug").unwrap();
        assert!(is_hook_set(&store, "slow.exe", "svcdebug.exe"));
        assert!(is_hook_set(&store, "slow.exe", "SVCDEBUG.EXE"));
        assert!(!is_hook_set(&store, "slow.exe", "other-debugger.exe"));
    }

    #[test]
    fn test_empty_debugger_name_never_matches() {
        let store = InMemoryStore::new();
        set_hook(&store, "slow.exe", "\"C:\\Tools\\SvcDebug.exe\" --debug").unwrap();
        assert!(!is_hook_set(&store, "slow.exe", ""));
    }

    #[test]
    fn test_hook_keys_use_file_name() {
        let store = InMemoryStore::new();
        set_hook(&store, "C:\\svc\\slow.exe", "dbg.exe").unwrap();
        assert!(is_hook_set(&store, "slow.exe", "dbg.exe"));
    }

    #[test]
    fn test_scope_round_trip_restores_value() {
        let store = InMemoryStore::new();
        set_hook(&store, "slow.exe", "dbg.exe --attach").unwrap();

        {
            let scope = DebuggerHookScope::acquire(&store, "slow.exe").unwrap();
            assert_eq!(scope.saved(), Some("dbg.exe --attach"));
            // Bypass active: no override present
            assert_eq!(store.debugger_override("slow.exe").unwrap(), None);
        }

        assert_eq!(
            store.debugger_override("slow.exe").unwrap().as_deref(),
            Some("dbg.exe --attach")
        );
    }

    #[test]
    fn test_scope_round_trip_is_idempotent() {
        let store = InMemoryStore::new();
        set_hook(&store, "slow.exe", "dbg.exe").unwrap();

        for _ in 0..3 {
            let _scope = DebuggerHookScope::acquire(&store, "slow.exe").unwrap();
        }

        assert_eq!(
            store.debugger_override("slow.exe").unwrap().as_deref(),
            Some("dbg.exe")
        );
    }

    #[test]
    fn test_scope_without_prior_value_restores_nothing() {
        let store = InMemoryStore::new();

        {
            let scope = DebuggerHookScope::acquire(&store, "slow.exe").unwrap();
            assert_eq!(scope.saved(), None);
            assert_eq!(store.debugger_override("slow.exe").unwrap(), None);
        }

        assert_eq!(store.debugger_override("slow.exe").unwrap(), None);
    }

    #[test]
    fn test_service_timeout_default_and_override() {
        let store = InMemoryStore::new();
        assert_eq!(get_service_timeout(&store), SERVICE_TIMEOUT_DEFAULT);

        set_service_timeout(&store, Duration::from_millis(90_000)).unwrap();
        assert_eq!(get_service_timeout(&store), Duration::from_millis(90_000));

        reset_service_timeout(&store).unwrap();
        assert_eq!(get_service_timeout(&store), SERVICE_TIMEOUT_DEFAULT);
    }
}
