//! Wtsapi32.dll bindings for logon session enumeration and user tokens

use std::ptr;
use std::slice;

use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::winnt::{HANDLE, LPWSTR};
use winapi::um::wtsapi32::{
    WTSClientProtocolType, WTSEnumerateSessionsW, WTSFreeMemory, WTSQuerySessionInformationW,
    WTSQueryUserToken, WTSUserName, WTS_SESSION_INFOW,
};

use crate::core::types::{
    find_active_console_session, ConnectState, DebugError, DebugResult, SessionId, SessionInfo,
    SessionProtocol, INVALID_SESSION_ID,
};
use crate::windows::types::Handle;
use crate::windows::utils::strings::wide_to_string;

// WTS_CURRENT_SERVER_HANDLE
const CURRENT_SERVER: HANDLE = ptr::null_mut();

/// A WTS-allocated buffer released with WTSFreeMemory on drop
struct WtsBuffer {
    ptr: *mut u16,
}

impl Drop for WtsBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                WTSFreeMemory(self.ptr as *mut _);
            }
        }
    }
}

fn query_session_information(session: SessionId, info_class: u32) -> DebugResult<WtsBuffer> {
    unsafe {
        let mut buffer: LPWSTR = ptr::null_mut();
        let mut returned: DWORD = 0;
        let queried = WTSQuerySessionInformationW(
            CURRENT_SERVER,
            session,
            info_class,
            &mut buffer,
            &mut returned,
        );

        if queried == FALSE {
            return Err(DebugError::last_os_error().into());
        }
        Ok(WtsBuffer { ptr: buffer })
    }
}

/// Enumerates all logon sessions with their connect state and client
/// protocol type.
///
/// Sessions whose protocol type cannot be queried are skipped, matching the
/// selection semantics of [`find_active_console_session`].
pub fn enumerate_sessions() -> DebugResult<Vec<SessionInfo>> {
    unsafe {
        let mut sessions_ptr: *mut WTS_SESSION_INFOW = ptr::null_mut();
        let mut count: DWORD = 0;

        let enumerated =
            WTSEnumerateSessionsW(CURRENT_SERVER, 0, 1, &mut sessions_ptr, &mut count);
        if enumerated == FALSE {
            return Err(DebugError::last_os_error().into());
        }

        let raw_sessions = slice::from_raw_parts(sessions_ptr, count as usize);
        let mut sessions = Vec::with_capacity(raw_sessions.len());
        for raw in raw_sessions {
            let protocol = match query_session_information(raw.SessionId, WTSClientProtocolType) {
                Ok(buffer) => SessionProtocol::from(*(buffer.ptr as *const u16)),
                Err(_) => continue,
            };
            sessions.push(SessionInfo::new(
                raw.SessionId,
                ConnectState::from(raw.State),
                protocol,
            ));
        }

        WTSFreeMemory(sessions_ptr as *mut _);
        Ok(sessions)
    }
}

/// Gets the session id of the currently active console session (local
/// console or RDP), or [`INVALID_SESSION_ID`] when there is none.
pub fn active_console_session() -> SessionId {
    match enumerate_sessions() {
        Ok(sessions) => find_active_console_session(&sessions),
        Err(_) => INVALID_SESSION_ID,
    }
}

/// Checks whether a user is currently logged on: the active console session
/// must be valid and not the system session.
pub fn logged_on_user_available() -> bool {
    let session = active_console_session();
    session != INVALID_SESSION_ID && session != 0
}

/// Obtains the user token of a session. Requires the caller to run as
/// LocalSystem.
pub fn query_user_token(session: SessionId) -> DebugResult<Handle> {
    unsafe {
        let mut token: HANDLE = ptr::null_mut();
        if WTSQueryUserToken(session, &mut token) == FALSE {
            return Err(DebugError::resource_acquisition("user token", session));
        }
        Ok(Handle::new(token))
    }
}

/// Queries the user name logged on to a session
pub fn query_session_user_name(session: SessionId) -> DebugResult<String> {
    let buffer = query_session_information(session, WTSUserName)
        .map_err(|_| DebugError::session_query_failed(session, "could not query user name"))?;

    unsafe {
        let mut len = 0;
        while *buffer.ptr.add(len) != 0 {
            len += 1;
        }
        Ok(wide_to_string(slice::from_raw_parts(buffer.ptr, len)))
    }
}
