//! String conversion utilities for Windows API

use std::ffi::{OsStr, OsString};
use std::os::windows::ffi::{OsStrExt, OsStringExt};

use winapi::um::processenv::ExpandEnvironmentStringsW;

/// Convert a Rust string to a null-terminated Windows wide string (UTF-16)
pub fn string_to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Convert a Windows wide string (UTF-16) to a Rust string
pub fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    let os_string = OsString::from_wide(&wide[..len]);
    os_string.to_string_lossy().into_owned()
}

/// Expands `%VARIABLE%` references in a string using the caller's environment.
///
/// Falls back to the unexpanded input if the OS call fails.
pub fn expand_environment_strings(s: &str) -> String {
    let source = string_to_wide(s);

    unsafe {
        let required = ExpandEnvironmentStringsW(source.as_ptr(), std::ptr::null_mut(), 0);
        if required == 0 {
            return s.to_string();
        }

        let mut buffer = vec![0u16; required as usize];
        let written =
            ExpandEnvironmentStringsW(source.as_ptr(), buffer.as_mut_ptr(), required);
        if written == 0 || written > required {
            return s.to_string();
        }

        wide_to_string(&buffer)
    }
}
