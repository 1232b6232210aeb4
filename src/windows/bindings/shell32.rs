//! Shell32.dll bindings for the elevation prompt

use std::ptr;

use winapi::um::shellapi::ShellExecuteW;
use winapi::um::winuser::SW_SHOWNORMAL;

use crate::core::types::{DebugError, DebugResult};
use crate::windows::utils::error_codes::ErrorCode;
use crate::windows::utils::strings::string_to_wide;

/// Launches an executable through the OS elevation prompt (`runas` verb).
///
/// Reports an elevation error when the launch fails, including when the
/// user declines the prompt.
pub fn shell_execute_runas(executable: &str, arguments: &str) -> DebugResult<()> {
    let verb = string_to_wide("runas");
    let file = string_to_wide(executable);
    let parameters = string_to_wide(arguments);

    unsafe {
        let instance = ShellExecuteW(
            ptr::null_mut(),
            verb.as_ptr(),
            file.as_ptr(),
            parameters.as_ptr(),
            ptr::null(),
            SW_SHOWNORMAL,
        );

        // Values up to 32 are error codes by contract
        if (instance as usize) <= 32 {
            return Err(DebugError::ElevationFailed(
                ErrorCode::last_error().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_runas_missing_executable_fails() {
        let result = shell_execute_runas("Z:\\does\\not\\exist\\missing.exe", "");
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            DebugError::ElevationFailed(_)
        ));
    }
}
