//! Session-crossing start operations for [`ManagedProcess`]
//!
//! Both operations require the LocalSystem identity: querying another
//! session's user token and opening winlogon's token are privileged.

use tracing::{debug, info};
use winapi::um::winbase::{CREATE_NEW_CONSOLE, CREATE_UNICODE_ENVIRONMENT, NORMAL_PRIORITY_CLASS};
use winapi::um::winnt::{MAXIMUM_ALLOWED, TOKEN_DUPLICATE};

use crate::core::types::{DebugError, DebugResult, INVALID_SESSION_ID};
use crate::process::identity;
use crate::process::managed::ManagedProcess;
use crate::windows::bindings::{advapi32, kernel32, userenv, wtsapi32};
use crate::windows::types::{EnvironmentBlock, LoadedProfile};

/// Image name of the trusted logon manager bound to every interactive session
const LOGON_MANAGER_IMAGE: &str = "winlogon.exe";

/// Window station and desktop shown when no user is logged on
const LOGON_DESKTOP: &str = "winsta0\\Winlogon";

impl ManagedProcess {
    /// Starts the process in the active console session, under that
    /// session's user, profile, and environment.
    ///
    /// The token → profile → environment chain is held in guards scoped to
    /// this function; a failure at any step releases everything acquired so
    /// far in reverse order. On success only the new process and thread
    /// handles survive.
    pub fn start_on_user_desktop(&mut self) -> DebugResult<()> {
        if !identity::is_local_system() {
            return Err(DebugError::PermissionDenied(
                "starting a process on the user desktop requires the LocalSystem identity"
                    .to_string(),
            ));
        }

        let session = wtsapi32::active_console_session();
        if session == INVALID_SESSION_ID {
            return Err(DebugError::NoActiveSession);
        }

        let token = wtsapi32::query_user_token(session)?;
        let user_name = wtsapi32::query_session_user_name(session)?;
        let _profile = LoadedProfile::load(&token, &user_name)
            .map_err(|_| DebugError::resource_acquisition("user profile", session))?;
        let environment = EnvironmentBlock::for_token(&token)
            .map_err(|_| DebugError::resource_acquisition("environment block", session))?;

        // Best-effort; process creation works without a working directory
        let profile_directory = userenv::user_profile_directory(token.raw());

        debug!(session, user = %user_name, "creating process on user desktop");
        let created = advapi32::create_process_as_user(
            &token,
            &self.command_line(),
            None,
            environment.as_ptr(),
            profile_directory.as_deref(),
            CREATE_UNICODE_ENVIRONMENT,
        )?;

        info!(session, user = %user_name, pid = created.pid, "process started on user desktop");
        self.adopt(created);
        Ok(())
    }

    /// Starts the process on the secure logon desktop of the active session,
    /// impersonating the session's logon manager.
    ///
    /// Used when the target session exists but has no interactive user, for
    /// example while the logon or unlock screen is shown.
    pub fn start_on_logon_screen(&mut self) -> DebugResult<()> {
        if !identity::is_local_system() {
            return Err(DebugError::PermissionDenied(
                "starting a process on the logon screen requires the LocalSystem identity"
                    .to_string(),
            ));
        }

        let session = wtsapi32::active_console_session();
        if session == INVALID_SESSION_ID {
            return Err(DebugError::NoActiveSession);
        }

        let logon_manager_pid = kernel32::find_process_in_session(LOGON_MANAGER_IMAGE, session)?
            .ok_or_else(|| {
                DebugError::session_query_failed(session, "logon manager process not found")
            })?;

        let logon_manager = kernel32::open_process(logon_manager_pid, MAXIMUM_ALLOWED)
            .map_err(|_| DebugError::resource_acquisition("logon manager process", session))?;
        let token = unsafe { advapi32::open_process_token(logon_manager.raw(), TOKEN_DUPLICATE) }
            .map_err(|_| DebugError::resource_acquisition("logon manager token", session))?;
        drop(logon_manager);

        let primary_token = advapi32::duplicate_token_ex(&token)
            .map_err(|_| DebugError::resource_acquisition("impersonation token", session))?;
        drop(token);

        debug!(session, desktop = LOGON_DESKTOP, "creating process on logon screen");
        let created = advapi32::create_process_as_user(
            &primary_token,
            &self.command_line(),
            Some(LOGON_DESKTOP),
            EnvironmentBlock::null_ptr(),
            None,
            CREATE_NEW_CONSOLE | NORMAL_PRIORITY_CLASS,
        )?;

        info!(session, pid = created.pid, "process started on logon screen");
        self.adopt(created);
        Ok(())
    }
}
