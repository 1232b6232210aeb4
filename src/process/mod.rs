//! Process control for Windows
//!
//! This module provides the managed process abstraction (creation in
//! arbitrary sessions, suspend/resume, debugger-presence and exit polling,
//! termination), caller identity checks, and the shutdown privilege helper.

mod desktop;
pub mod identity;
pub mod managed;
pub mod privileges;

pub use identity::{is_administrator, is_local_system};
pub use managed::{ManagedProcess, POLL_INTERVAL, QUERY_FAILURE_BUDGET};
pub use privileges::restart_system;
