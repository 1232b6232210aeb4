//! Core module containing fundamental types for svcdebug
//!
//! Provides the foundational building blocks used throughout the crate:
//! session identities, error types, and command-line handling.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    find_active_console_session, DebugError, DebugResult, SessionId, SessionInfo,
    INVALID_SESSION_ID,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Platform verification at compile time
#[cfg(not(target_os = "windows"))]
compile_error!("svcdebug only supports the Windows platform");
