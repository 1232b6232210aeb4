//! Caller security identity checks

use winapi::um::winnt::{WinBuiltinAdministratorsSid, WinLocalSystemSid};

use crate::windows::bindings::advapi32;

/// Checks whether the current process runs with administrative rights.
/// Any query failure is treated as "not an administrator".
pub fn is_administrator() -> bool {
    advapi32::is_member_of_well_known_sid(WinBuiltinAdministratorsSid).unwrap_or(false)
}

/// Checks whether the current process runs under the LocalSystem identity.
/// Any query failure is treated as "not LocalSystem".
pub fn is_local_system() -> bool {
    advapi32::is_member_of_well_known_sid(WinLocalSystemSid).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_identity_checks_are_stable() {
        // The identity of the test process does not change between calls
        assert_eq!(is_administrator(), is_administrator());
        assert_eq!(is_local_system(), is_local_system());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_test_runner_is_not_local_system() {
        // Interactive test runs never carry the LocalSystem identity
        assert!(!is_local_system());
    }
}
