//! Narrow interface over the system-wide configuration store
//!
//! The two values the core consumes live in a persistent, system-wide
//! store: per-executable debugger overrides and the service-start timeout.
//! Callers pass a store handle instead of touching ambient global state, so
//! tests can substitute an in-memory fake.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

/// Access to the persistent system configuration store.
///
/// Missing values read as `None`; removing a missing value succeeds.
pub trait ConfigStore {
    /// Reads the debugger override configured for an executable name
    fn debugger_override(&self, executable: &str) -> io::Result<Option<String>>;

    /// Sets the debugger override for an executable name
    fn set_debugger_override(&self, executable: &str, command_line: &str) -> io::Result<()>;

    /// Removes the debugger override for an executable name
    fn remove_debugger_override(&self, executable: &str) -> io::Result<()>;

    /// Reads the configured service-start timeout in milliseconds
    fn service_timeout_ms(&self) -> io::Result<Option<u32>>;

    /// Sets the service-start timeout in milliseconds (takes effect after a
    /// system restart)
    fn set_service_timeout_ms(&self, timeout: u32) -> io::Result<()>;

    /// Removes the service-start timeout override, restoring the OS default
    fn reset_service_timeout(&self) -> io::Result<()>;
}

/// In-memory store used by tests and available for dry runs
#[derive(Default)]
pub struct InMemoryStore {
    overrides: Mutex<HashMap<String, String>>,
    timeout: Mutex<Option<u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryStore {
    fn debugger_override(&self, executable: &str) -> io::Result<Option<String>> {
        let overrides = self.overrides.lock().unwrap();
        Ok(overrides.get(&executable.to_ascii_lowercase()).cloned())
    }

    fn set_debugger_override(&self, executable: &str, command_line: &str) -> io::Result<()> {
        let mut overrides = self.overrides.lock().unwrap();
        overrides.insert(executable.to_ascii_lowercase(), command_line.to_string());
        Ok(())
    }

    fn remove_debugger_override(&self, executable: &str) -> io::Result<()> {
        let mut overrides = self.overrides.lock().unwrap();
        overrides.remove(&executable.to_ascii_lowercase());
        Ok(())
    }

    fn service_timeout_ms(&self) -> io::Result<Option<u32>> {
        Ok(*self.timeout.lock().unwrap())
    }

    fn set_service_timeout_ms(&self, timeout: u32) -> io::Result<()> {
        *self.timeout.lock().unwrap() = Some(timeout);
        Ok(())
    }

    fn reset_service_timeout(&self) -> io::Result<()> {
        *self.timeout.lock().unwrap() = None;
        Ok(())
    }
}
