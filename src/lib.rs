//! Svcdebug library for prenatal debugging of Windows services

#![allow(dead_code)]

pub mod config;
pub mod core;
pub mod orchestrator;
pub mod process;
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    build_command_line, executable_file_name, find_active_console_session, join_arguments,
    ConnectState,
    DebugError, DebugResult, ProcessId, SessionId, SessionInfo, SessionProtocol,
    INVALID_SESSION_ID,
};

pub use config::{ConfigStore, DebuggerHookScope, InMemoryStore, RegistryStore};
pub use orchestrator::{race_for_resolution, resolve_target, DebugSession, WaitOutcome};
pub use process::ManagedProcess;
