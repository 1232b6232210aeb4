//! Kernel32.dll bindings for process and thread control

use std::mem;
use std::ptr;

use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::debugapi::CheckRemoteDebuggerPresent;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{
    CreateProcessW, GetExitCodeProcess, OpenProcess, ProcessIdToSessionId, ResumeThread,
    SuspendThread, TerminateProcess, PROCESS_INFORMATION, STARTUPINFOW,
};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use winapi::um::winbase::{CREATE_SUSPENDED, CREATE_UNICODE_ENVIRONMENT};
use winapi::um::winnt::HANDLE;

use crate::core::types::{DebugError, DebugResult, ProcessId, SessionId};
use crate::windows::types::Handle;
use crate::windows::utils::strings::{string_to_wide, wide_to_string};

/// Handles of a freshly created process, both exclusively owned
pub struct CreatedProcess {
    pub process: Handle,
    pub thread: Handle,
    pub pid: ProcessId,
}

/// Safe wrapper for CreateProcessW.
///
/// The process is created in the caller's own session with a unicode
/// environment; when `suspended` is set the main thread is created in a
/// stopped state and must be resumed explicitly.
pub fn create_process(command_line: &str, suspended: bool) -> DebugResult<CreatedProcess> {
    let mut creation_flags = CREATE_UNICODE_ENVIRONMENT;
    if suspended {
        creation_flags |= CREATE_SUSPENDED;
    }

    // CreateProcessW may modify the command line buffer in place
    let mut command_wide = string_to_wide(command_line);

    unsafe {
        let mut startup_info: STARTUPINFOW = mem::zeroed();
        startup_info.cb = mem::size_of::<STARTUPINFOW>() as DWORD;
        let mut process_info: PROCESS_INFORMATION = mem::zeroed();

        let created = CreateProcessW(
            ptr::null(),
            command_wide.as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            FALSE,
            creation_flags,
            ptr::null_mut(),
            ptr::null(),
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

/// Safe wrapper for SuspendThread, returning the previous suspend count
///
/// # Safety
/// The handle must be a valid thread handle with suspend/resume access
pub unsafe fn suspend_thread(thread: HANDLE) -> DebugResult<u32> {
    let previous = SuspendThread(thread);
    if previous == u32::MAX {
        return Err(DebugError::last_os_error().into());
    }
    Ok(previous)
}

/// Safe wrapper for ResumeThread, returning the previous suspend count
///
/// # Safety
/// The handle must be a valid thread handle with suspend/resume access
pub unsafe fn resume_thread(thread: HANDLE) -> DebugResult<u32> {
    let previous = ResumeThread(thread);
    if previous == u32::MAX {
        return Err(DebugError::last_os_error().into());
    }
    Ok(previous)
}

/// Safe wrapper for TerminateProcess
///
/// # Safety
/// The handle must be a valid process handle with terminate access
pub unsafe fn terminate_process(process: HANDLE, exit_code: u32) -> DebugResult<()> {
    if TerminateProcess(process, exit_code) == FALSE {
        return Err(DebugError::TerminateFailed(DebugError::last_os_error()));
    }
    Ok(())
}

/// Safe wrapper for GetExitCodeProcess.
///
/// Returns `None` while the process is still running (the STILL_ACTIVE
/// sentinel) and `Some(code)` once it has exited.
///
/// # Safety
/// The handle must be a valid process handle with query access
pub unsafe fn exit_code(process: HANDLE) -> DebugResult<Option<u32>> {
    let mut code: DWORD = 0;
    if GetExitCodeProcess(process, &mut code) == FALSE {
        return Err(DebugError::last_os_error().into());
    }
    if code == STILL_ACTIVE {
        Ok(None)
    } else {
        Ok(Some(code))
    }
}

/// Safe wrapper for CheckRemoteDebuggerPresent
///
/// # Safety
/// The handle must be a valid process handle with query access
pub unsafe fn is_remote_debugger_present(process: HANDLE) -> DebugResult<bool> {
    let mut present = FALSE;
    if CheckRemoteDebuggerPresent(process, &mut present) == FALSE {
        return Err(DebugError::last_os_error().into());
    }
    Ok(present != FALSE)
}

/// Safe wrapper for OpenProcess
pub fn open_process(pid: ProcessId, desired_access: u32) -> DebugResult<Handle> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if handle.is_null() {
            return Err(DebugError::last_os_error().into());
        }
        Ok(Handle::new(handle))
    }
}

/// Finds the PID of a process with the given image name running in the given
/// session, using a ToolHelp32 snapshot.
pub fn find_process_in_session(
    image_name: &str,
    session: SessionId,
) -> DebugResult<Option<ProcessId>> {
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
        if snapshot.is_null() || snapshot == INVALID_HANDLE_VALUE {
            return Err(DebugError::last_os_error().into());
        }
        let snapshot = Handle::new(snapshot);

        let mut entry: PROCESSENTRY32W = mem::zeroed();
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as DWORD;

        let mut more = Process32FirstW(snapshot.raw(), &mut entry);
        while more != FALSE {
            let name = wide_to_string(&entry.szExeFile);
            if name.eq_ignore_ascii_case(image_name) {
                let mut process_session: DWORD = 0;
                if ProcessIdToSessionId(entry.th32ProcessID, &mut process_session) != FALSE
                    && process_session == session
                {
                    return Ok(Some(entry.th32ProcessID));
                }
            }
            more = Process32NextW(snapshot.raw(), &mut entry);
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_create_process_invalid_path_fails() {
        let result = create_process("Z:\\does\\not\\exist\\missing.exe", false);
        assert!(result.is_err());
        match result.unwrap_err() {
            DebugError::CreationFailed { command, .. } => {
                assert!(command.contains("missing.exe"));
            }
            other => panic!("Expected CreationFailed, got {other:?}"),
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_process() {
        // PID 0 is the idle process and cannot be opened
        let result = open_process(0, 0x0400);
        assert!(result.is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_null_handle_queries_fail() {
        unsafe {
            assert!(exit_code(ptr::null_mut()).is_err());
            assert!(is_remote_debugger_present(ptr::null_mut()).is_err());
            assert!(suspend_thread(ptr::null_mut()).is_err());
            assert!(resume_thread(ptr::null_mut()).is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_find_process_in_session_unknown_image() {
        let result = find_process_in_session("definitely-not-a-process.exe", 0);
        assert!(matches!(result, Ok(None)));
    }
}
