//! Userenv.dll bindings for user profiles and environment blocks

use std::ffi::c_void;
use std::mem;
use std::ptr;

use winapi::shared::minwindef::{DWORD, FALSE, LPVOID};
use winapi::um::profinfo::PROFILEINFOW;
use winapi::um::userenv::{
    CreateEnvironmentBlock, DestroyEnvironmentBlock, GetUserProfileDirectoryW, LoadUserProfileW,
    UnloadUserProfile,
};
use winapi::um::winnt::HANDLE;

use crate::core::types::{DebugError, DebugResult};
use crate::windows::utils::strings::{string_to_wide, wide_to_string};

/// Loads the user profile associated with a token, returning the registry
/// hive handle of the loaded profile.
///
/// # Safety
/// The token must be a valid user token
pub unsafe fn load_user_profile(token: HANDLE, user_name: &str) -> DebugResult<*mut c_void> {
    let mut user_wide = string_to_wide(user_name);

    let mut profile: PROFILEINFOW = mem::zeroed();
    profile.dwSize = mem::size_of::<PROFILEINFOW>() as DWORD;
    profile.lpUserName = user_wide.as_mut_ptr();

    if LoadUserProfileW(token, &mut profile) == FALSE {
        return Err(DebugError::last_os_error().into());
    }
    Ok(profile.hProfile as *mut c_void)
}

/// Unloads a previously loaded user profile. Errors are ignored, matching
/// cleanup-path semantics.
///
/// # Safety
/// `token` and `profile` must be the pair returned by a prior successful
/// [`load_user_profile`]
pub unsafe fn unload_user_profile(token: HANDLE, profile: *mut c_void) {
    if !profile.is_null() {
        UnloadUserProfile(token, profile as HANDLE);
    }
}

/// Builds the environment block of the user a token represents
///
/// # Safety
/// The token must be a valid user token
pub unsafe fn create_environment_block(token: HANDLE) -> DebugResult<*mut c_void> {
    let mut block: LPVOID = ptr::null_mut();
    if CreateEnvironmentBlock(&mut block, token, FALSE) == FALSE {
        return Err(DebugError::last_os_error().into());
    }
    Ok(block as *mut c_void)
}

/// Destroys an environment block returned by [`create_environment_block`]
///
/// # Safety
/// The block must come from a prior successful [`create_environment_block`]
pub unsafe fn destroy_environment_block(block: *mut c_void) {
    DestroyEnvironmentBlock(block as LPVOID);
}

/// Resolves the profile directory of the user a token represents.
///
/// Best-effort: returns `None` when the directory cannot be resolved, which
/// callers treat as non-fatal.
pub fn user_profile_directory(token: HANDLE) -> Option<String> {
    unsafe {
        let mut size: DWORD = 0;
        GetUserProfileDirectoryW(token, ptr::null_mut(), &mut size);
        if size == 0 {
            return None;
        }

        let mut buffer = vec![0u16; size as usize];
        if GetUserProfileDirectoryW(token, buffer.as_mut_ptr(), &mut size) == FALSE {
            return None;
        }
        Some(wide_to_string(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_environment_block_null_token_fails() {
        // A null token is rejected by the OS; no block must leak
        unsafe {
            let result = create_environment_block(ptr::null_mut());
            assert!(result.is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_profile_directory_null_token_is_none() {
        assert!(user_profile_directory(ptr::null_mut()).is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_unload_null_profile_is_noop() {
        unsafe {
            unload_user_profile(ptr::null_mut(), ptr::null_mut());
        }
    }
}
