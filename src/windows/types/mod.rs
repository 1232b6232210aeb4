//! Safe wrapper types around raw Windows resources

mod guards;
mod handle;

pub use guards::{EnvironmentBlock, LoadedProfile};
pub use handle::Handle;
