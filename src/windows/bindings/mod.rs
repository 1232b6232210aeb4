//! Windows API bindings
//!
//! Low-level FFI bindings to the system libraries involved in process,
//! session, and token control. Every wrapper is fallible and carries the
//! OS error code on failure; retry policy belongs to callers.

pub mod advapi32;
pub mod kernel32;
pub mod shell32;
pub mod userenv;
pub mod wtsapi32;

pub use kernel32::CreatedProcess;
