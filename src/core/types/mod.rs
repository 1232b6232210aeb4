//! Core type definitions for svcdebug
//!
//! This module contains the fundamental types used throughout the crate:
//! the error taxonomy, the logon session model, and command-line assembly.

mod command_line;
mod error;
mod session;

// Re-export all public types
pub use command_line::{build_command_line, executable_file_name, join_arguments};
pub use error::{DebugError, DebugResult};
pub use session::{
    find_active_console_session, ConnectState, SessionId, SessionInfo, SessionProtocol,
    INVALID_SESSION_ID,
};

// Common type aliases
pub type ProcessId = u32;
