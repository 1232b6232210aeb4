//! Shutdown privilege handling and system restart

use std::time::Duration;

use tracing::info;
use winapi::um::processthreadsapi::GetCurrentProcess;
use winapi::um::winnt::{TOKEN_ADJUST_PRIVILEGES, TOKEN_QUERY};

use crate::core::types::DebugResult;
use crate::windows::bindings::advapi32;

/// Name of the privilege required to initiate a shutdown or restart
pub const SHUTDOWN_PRIVILEGE_NAME: &str = "SeShutdownPrivilege";

/// Enables the shutdown privilege on the current process token and initiates
/// a planned system restart with a user-visible message and countdown.
///
/// The token handle is closed before returning, success or failure.
pub fn restart_system(message: &str, delay: Duration) -> DebugResult<()> {
    let luid = advapi32::lookup_privilege_value(SHUTDOWN_PRIVILEGE_NAME)?;

    let token = unsafe {
        advapi32::open_process_token(GetCurrentProcess(), TOKEN_QUERY | TOKEN_ADJUST_PRIVILEGES)?
    };
    advapi32::enable_privilege(&token, SHUTDOWN_PRIVILEGE_NAME, luid)?;

    info!(delay_secs = delay.as_secs(), "initiating system restart");
    advapi32::initiate_system_restart(message, delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_name() {
        assert_eq!(SHUTDOWN_PRIVILEGE_NAME, "SeShutdownPrivilege");
    }
}
