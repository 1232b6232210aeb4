//! Advapi32.dll bindings for tokens, privileges, impersonated process
//! creation, and system restart

use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::time::Duration;

use winapi::shared::minwindef::{DWORD, FALSE, TRUE};
use winapi::um::minwinbase::SECURITY_ATTRIBUTES;
use winapi::um::processthreadsapi::{
    CreateProcessAsUserW, OpenProcessToken, PROCESS_INFORMATION, STARTUPINFOW,
};
use winapi::um::reason::{
    SHTDN_REASON_FLAG_PLANNED, SHTDN_REASON_MAJOR_OPERATINGSYSTEM, SHTDN_REASON_MINOR_RECONFIG,
};
use winapi::um::securitybaseapi::{
    AdjustTokenPrivileges, CheckTokenMembership, CreateWellKnownSid, DuplicateTokenEx,
};
use winapi::um::winbase::LookupPrivilegeValueW;
use winapi::um::winnt::{
    SecurityImpersonation, TokenPrimary, HANDLE, LUID, LUID_AND_ATTRIBUTES, PSID,
    SECURITY_MAX_SID_SIZE, SE_PRIVILEGE_ENABLED, TOKEN_PRIVILEGES, WELL_KNOWN_SID_TYPE,
};
use winapi::um::winreg::InitiateSystemShutdownExW;

use crate::core::types::{DebugError, DebugResult};
use crate::windows::bindings::kernel32::CreatedProcess;
use crate::windows::types::Handle;
use crate::windows::utils::error_codes::ErrorCode;
use crate::windows::utils::strings::string_to_wide;

/// Safe wrapper for OpenProcessToken
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn open_process_token(process: HANDLE, desired_access: u32) -> DebugResult<Handle> {
    let mut token: HANDLE = ptr::null_mut();
    if OpenProcessToken(process, desired_access, &mut token) == FALSE {
        return Err(DebugError::last_os_error().into());
    }
    Ok(Handle::new(token))
}

/// Duplicates a token into an impersonation-capable primary token
/// (MAXIMUM_ALLOWED access, SecurityImpersonation level).
pub fn duplicate_token_ex(token: &Handle) -> DebugResult<Handle> {
    unsafe {
        let mut attributes: SECURITY_ATTRIBUTES = mem::zeroed();
        attributes.nLength = mem::size_of::<SECURITY_ATTRIBUTES>() as DWORD;

        let mut duplicated: HANDLE = ptr::null_mut();
        let ok = DuplicateTokenEx(
            token.raw(),
            winapi::um::winnt::MAXIMUM_ALLOWED,
            &mut attributes,
            SecurityImpersonation,
            TokenPrimary,
            &mut duplicated,
        );

        if ok == FALSE {
            return Err(DebugError::last_os_error().into());
        }
        Ok(Handle::new(duplicated))
    }
}

/// Resolves a named privilege to its local identifier
pub fn lookup_privilege_value(name: &str) -> DebugResult<LUID> {
    let name_wide = string_to_wide(name);
    unsafe {
        let mut luid: LUID = mem::zeroed();
        if LookupPrivilegeValueW(ptr::null(), name_wide.as_ptr(), &mut luid) == FALSE {
            return Err(DebugError::PrivilegeAdjustment {
                name: name.to_string(),
                reason: format!("lookup failed: {}", ErrorCode::last_error()),
            });
        }
        Ok(luid)
    }
}

/// Enables a single privilege on a token.
///
/// AdjustTokenPrivileges reports success even when nothing was assigned, so
/// the last error code is checked for ERROR_NOT_ALL_ASSIGNED as well.
pub fn enable_privilege(token: &Handle, name: &str, luid: LUID) -> DebugResult<()> {
    unsafe {
        let mut privileges = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: luid,
                Attributes: SE_PRIVILEGE_ENABLED,
            }],
        };

        let adjusted = AdjustTokenPrivileges(
            token.raw(),
            FALSE,
            &mut privileges,
            mem::size_of::<TOKEN_PRIVILEGES>() as DWORD,
            ptr::null_mut(),
            ptr::null_mut(),
        );

        let last_error = ErrorCode::last_error();
        if adjusted == FALSE || last_error != ErrorCode::Success {
            return Err(DebugError::PrivilegeAdjustment {
                name: name.to_string(),
                reason: last_error.to_string(),
            });
        }
        Ok(())
    }
}

/// Safe wrapper for CreateProcessAsUserW.
///
/// Creates a process under the given token, optionally attached to an
/// explicit window station/desktop, with an optional environment block and
/// working directory.
pub fn create_process_as_user(
    token: &Handle,
    command_line: &str,
    desktop: Option<&str>,
    environment: *mut c_void,
    current_directory: Option<&str>,
    creation_flags: u32,
) -> DebugResult<CreatedProcess> {
    let mut command_wide = string_to_wide(command_line);
    let mut desktop_wide = desktop.map(string_to_wide);
    let directory_wide = current_directory.map(string_to_wide);

    unsafe {
        let mut process_attributes: SECURITY_ATTRIBUTES = mem::zeroed();
        process_attributes.nLength = mem::size_of::<SECURITY_ATTRIBUTES>() as DWORD;
        let mut thread_attributes: SECURITY_ATTRIBUTES = mem::zeroed();
        thread_attributes.nLength = mem::size_of::<SECURITY_ATTRIBUTES>() as DWORD;

        let mut startup_info: STARTUPINFOW = mem::zeroed();
        startup_info.cb = mem::size_of::<STARTUPINFOW>() as DWORD;
        if let Some(desktop) = desktop_wide.as_mut() {
            startup_info.lpDesktop = desktop.as_mut_ptr();
        }

        let mut process_info: PROCESS_INFORMATION = mem::zeroed();

        let created = CreateProcessAsUserW(
            token.raw(),
            ptr::null(),
            command_wide.as_mut_ptr(),
            &mut process_attributes,
            &mut thread_attributes,
            FALSE,
            creation_flags,
            environment as *mut _,
            directory_wide
                .as_ref()
                .map_or(ptr::null(), |dir| dir.as_ptr()),
            &mut startup_info,
            &mut process_info,
        );

        if created == FALSE {
            return Err(DebugError::creation_failed(command_line));
        }

        Ok(CreatedProcess {
            process: Handle::new(process_info.hProcess),
            thread: Handle::new(process_info.hThread),
            pid: process_info.dwProcessId,
        })
    }
}

/// Initiates a system restart with a user-visible message and countdown,
/// tagged as a planned reconfiguration.
pub fn initiate_system_restart(message: &str, delay: Duration) -> DebugResult<()> {
    let mut message_wide = string_to_wide(message);
    unsafe {
        let initiated = InitiateSystemShutdownExW(
            ptr::null_mut(),
            message_wide.as_mut_ptr(),
            delay.as_secs() as DWORD,
            FALSE,
            TRUE,
            SHTDN_REASON_MAJOR_OPERATINGSYSTEM
                | SHTDN_REASON_MINOR_RECONFIG
                | SHTDN_REASON_FLAG_PLANNED,
        );

        if initiated == FALSE {
            return Err(DebugError::RestartFailed(DebugError::last_os_error()));
        }
        Ok(())
    }
}

/// Checks whether the calling context's token contains the given well-known SID
pub fn is_member_of_well_known_sid(sid_type: WELL_KNOWN_SID_TYPE) -> DebugResult<bool> {
    unsafe {
        let mut sid_buffer = [0u8; SECURITY_MAX_SID_SIZE];
        let mut sid_size = sid_buffer.len() as DWORD;
        let sid = sid_buffer.as_mut_ptr() as PSID;

        if CreateWellKnownSid(sid_type, ptr::null_mut(), sid, &mut sid_size) == FALSE {
            return Err(DebugError::last_os_error().into());
        }

        let mut is_member = FALSE;
        if CheckTokenMembership(ptr::null_mut(), sid, &mut is_member) == FALSE {
            return Err(DebugError::last_os_error().into());
        }
        Ok(is_member != FALSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_lookup_shutdown_privilege() {
        let luid = lookup_privilege_value("SeShutdownPrivilege");
        assert!(luid.is_ok());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_lookup_unknown_privilege_fails() {
        let result = lookup_privilege_value("SeNoSuchPrivilege");
        assert!(result.is_err());
        match result.unwrap_err() {
            DebugError::PrivilegeAdjustment { name, .. } => {
                assert_eq!(name, "SeNoSuchPrivilege");
            }
            other => panic!("Expected PrivilegeAdjustment, got {other:?}"),
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_process_token_null_fails() {
        unsafe {
            let result = open_process_token(ptr::null_mut(), winapi::um::winnt::TOKEN_QUERY);
            assert!(result.is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_duplicate_null_token_fails() {
        let token = Handle::null();
        assert!(duplicate_token_ex(&token).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_well_known_sid_membership_queries() {
        use winapi::um::winnt::WinWorldSid;

        // Everyone is a member of the world SID
        let result = is_member_of_well_known_sid(WinWorldSid);
        assert!(matches!(result, Ok(true)));
    }
}
