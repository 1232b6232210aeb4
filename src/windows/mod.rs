//! Windows API layer for process and session control
//!
//! Provides safe wrappers around the Windows API functions used to create
//! processes in arbitrary sessions, manipulate tokens and privileges, and
//! query debugger presence. All unsafe FFI calls are contained within this
//! module with proper error handling.

pub mod bindings;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{EnvironmentBlock, Handle, LoadedProfile};
pub use utils::ErrorCode;

// Re-export key bindings
pub use bindings::{advapi32, kernel32, shell32, userenv, wtsapi32};
