//! Registry-backed implementation of [`ConfigStore`]

use std::io;

use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_SET_VALUE};
use winreg::RegKey;

use super::store::ConfigStore;

/// Root key for Image File Execution Options debugger overrides
const IMAGE_FILE_EXECUTION_OPTIONS_KEY: &str =
    "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Image File Execution Options";

/// Value name the OS launch path reads as the debugger override
const DEBUGGER_VALUE: &str = "Debugger";

/// Key holding the service control manager's start timeout
const CONTROL_KEY: &str = "SYSTEM\\CurrentControlSet\\Control";

/// Value name of the service-start timeout in milliseconds
const SERVICES_PIPE_TIMEOUT_VALUE: &str = "ServicesPipeTimeout";

/// System configuration store rooted in HKEY_LOCAL_MACHINE.
///
/// Writing requires administrative rights; reads work for any caller.
#[derive(Default)]
pub struct RegistryStore;

impl RegistryStore {
    pub fn new() -> Self {
        RegistryStore
    }

    fn ifeo_path(executable: &str) -> String {
        format!("{}\\{}", IMAGE_FILE_EXECUTION_OPTIONS_KEY, executable)
    }
}

/// Maps a missing key or value to `None` instead of an error
fn ignore_not_found<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

impl ConfigStore for RegistryStore {
    fn debugger_override(&self, executable: &str) -> io::Result<Option<String>> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = match ignore_not_found(
            root.open_subkey_with_flags(Self::ifeo_path(executable), KEY_READ),
        )? {
            Some(key) => key,
            None => return Ok(None),
        };
        ignore_not_found(key.get_value::<String, _>(DEBUGGER_VALUE))
    }

    fn set_debugger_override(&self, executable: &str, command_line: &str) -> io::Result<()> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let (key, _) = root.create_subkey(Self::ifeo_path(executable))?;
        key.set_value(DEBUGGER_VALUE, &command_line)
    }

    fn remove_debugger_override(&self, executable: &str) -> io::Result<()> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = match ignore_not_found(
            root.open_subkey_with_flags(Self::ifeo_path(executable), KEY_SET_VALUE),
        )? {
            Some(key) => key,
            None => return Ok(()),
        };
        ignore_not_found(key.delete_value(DEBUGGER_VALUE)).map(|_| ())
    }

    fn service_timeout_ms(&self) -> io::Result<Option<u32>> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = root.open_subkey_with_flags(CONTROL_KEY, KEY_READ)?;
        ignore_not_found(key.get_value::<u32, _>(SERVICES_PIPE_TIMEOUT_VALUE))
    }

    fn set_service_timeout_ms(&self, timeout: u32) -> io::Result<()> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = root.open_subkey_with_flags(CONTROL_KEY, KEY_SET_VALUE)?;
        key.set_value(SERVICES_PIPE_TIMEOUT_VALUE, &timeout)
    }

    fn reset_service_timeout(&self) -> io::Result<()> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = root.open_subkey_with_flags(CONTROL_KEY, KEY_SET_VALUE)?;
        ignore_not_found(key.delete_value(SERVICES_PIPE_TIMEOUT_VALUE)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_missing_override_reads_none() {
        let store = RegistryStore::new();
        let result = store.debugger_override("svcdebug-no-such-executable.exe");
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_service_timeout_readable_without_elevation() {
        // The control key always exists; the value may or may not
        let store = RegistryStore::new();
        assert!(store.service_timeout_ms().is_ok());
    }

    #[test]
    fn test_ifeo_path_layout() {
        assert_eq!(
            RegistryStore::ifeo_path("slow.exe"),
            "SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion\\Image File Execution Options\\slow.exe"
        );
    }
}
