//! System configuration store access
//!
//! Provides the narrow store interface used by the core (debugger hook
//! overrides and the service-start timeout), a registry-backed
//! implementation, and the scoped hook bypass.

pub mod hook;
mod registry;
pub mod store;

pub use hook::{
    get_service_timeout, is_hook_set, remove_hook, reset_service_timeout, set_hook,
    set_service_timeout, DebuggerHookScope, SERVICE_TIMEOUT_DEFAULT,
};
pub use registry::RegistryStore;
pub use store::{ConfigStore, InMemoryStore};
