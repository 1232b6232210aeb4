//! Custom error types for svcdebug

use thiserror::Error;

/// Main error type for process and session control operations
#[derive(Error, Debug)]
pub enum DebugError {
    #[error("Could not create process `{command}`")]
    CreationFailed {
        command: String,
        #[source]
        source: windows::core::Error,
    },

    #[error("Failed to start program as administrator: {0}")]
    ElevationFailed(String),

    #[error("Insufficient rights: {0}")]
    PermissionDenied(String),

    #[error("No active console session found")]
    NoActiveSession,

    #[error("Session {session}: {reason}")]
    SessionQueryFailed {
        session: u32,
        reason: String,
        #[source]
        source: windows::core::Error,
    },

    #[error("Could not acquire {resource} for session {session}")]
    ResourceAcquisition {
        resource: &'static str,
        session: u32,
        #[source]
        source: windows::core::Error,
    },

    #[error("Could not enable privilege {name}: {reason}")]
    PrivilegeAdjustment { name: String, reason: String },

    #[error("Could not initiate system restart")]
    RestartFailed(#[source] windows::core::Error),

    #[error("Could not terminate process")]
    TerminateFailed(#[source] windows::core::Error),

    #[error("Configuration store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),
}

/// Result type alias for process and session control operations
pub type DebugResult<T> = Result<T, DebugError>;

impl DebugError {
    /// Captures the calling thread's last OS error code
    pub fn last_os_error() -> windows::core::Error {
        windows::core::Error::from_win32()
    }

    /// Creates a creation error carrying the last OS error code
    pub fn creation_failed(command: impl Into<String>) -> Self {
        DebugError::CreationFailed {
            command: command.into(),
            source: Self::last_os_error(),
        }
    }

    /// Creates a session query error carrying the last OS error code
    pub fn session_query_failed(session: u32, reason: impl Into<String>) -> Self {
        DebugError::SessionQueryFailed {
            session,
            reason: reason.into(),
            source: Self::last_os_error(),
        }
    }

    /// Creates a resource acquisition error carrying the last OS error code
    pub fn resource_acquisition(resource: &'static str, session: u32) -> Self {
        DebugError::ResourceAcquisition {
            resource,
            session,
            source: Self::last_os_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DebugError::PermissionDenied("administrator rights required".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient rights: administrator rights required"
        );

        let err = DebugError::NoActiveSession;
        assert_eq!(err.to_string(), "No active console session found");

        let err = DebugError::ElevationFailed("prompt was declined".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to start program as administrator: prompt was declined"
        );
    }

    #[test]
    fn test_structured_variants() {
        let err = DebugError::creation_failed("C:\\svc\\slow.exe");
        match &err {
            DebugError::CreationFailed { command, .. } => {
                assert_eq!(command, "C:\\svc\\slow.exe");
            }
            _ => panic!("Wrong error type"),
        }
        assert!(err.to_string().contains("slow.exe"));

        let err = DebugError::resource_acquisition("user profile", 2);
        assert_eq!(
            err.to_string(),
            "Could not acquire user profile for session 2"
        );

        let err = DebugError::session_query_failed(3, "user name unavailable");
        assert!(err.to_string().starts_with("Session 3:"));
    }

    #[test]
    fn test_from_implementations() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "registry denied");
        let err: DebugError = io_err.into();
        assert!(matches!(err, DebugError::Store(_)));

        let win_err = windows::core::Error::from_win32();
        let err: DebugError = win_err.into();
        assert!(matches!(err, DebugError::WindowsApi(_)));
    }

    #[test]
    fn test_debug_result_type() {
        fn succeeds() -> DebugResult<u32> {
            Ok(42)
        }

        fn fails() -> DebugResult<u32> {
            Err(DebugError::NoActiveSession)
        }

        assert_eq!(succeeds().unwrap(), 42);
        assert!(fails().is_err());
    }
}
