//! Utility helpers shared by the Windows bindings

pub mod error_codes;
pub mod strings;

pub use error_codes::ErrorCode;
pub use strings::{expand_environment_strings, string_to_wide, wide_to_string};
