//! Scoped guards for the security-context resource chain
//!
//! `start_on_user_desktop` acquires token, profile, and environment block in
//! order and must release them in reverse order on every exit path. Each link
//! of the chain is a guard whose Drop performs the release, so an early `?`
//! unwinds the chain correctly without explicit cleanup code.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;

use crate::core::types::DebugResult;
use crate::windows::bindings::userenv;
use crate::windows::types::Handle;

/// A user profile loaded against a token, unloaded on drop.
///
/// The borrow ties the profile to the token it was loaded with; the profile
/// must be unloaded before the token handle is closed.
pub struct LoadedProfile<'a> {
    token: &'a Handle,
    profile: *mut c_void,
}

impl<'a> LoadedProfile<'a> {
    /// Loads the profile of `user_name` using the given user token
    pub fn load(token: &'a Handle, user_name: &str) -> DebugResult<Self> {
        let profile = unsafe { userenv::load_user_profile(token.raw(), user_name)? };
        Ok(LoadedProfile { token, profile })
    }
}

impl Drop for LoadedProfile<'_> {
    fn drop(&mut self) {
        unsafe {
            userenv::unload_user_profile(self.token.raw(), self.profile);
        }
    }
}

/// An environment block built for a token, destroyed on drop
pub struct EnvironmentBlock<'a> {
    block: *mut c_void,
    _token: PhantomData<&'a Handle>,
}

impl<'a> EnvironmentBlock<'a> {
    /// Builds the environment block of the user the token represents
    pub fn for_token(token: &'a Handle) -> DebugResult<Self> {
        let block = unsafe { userenv::create_environment_block(token.raw())? };
        Ok(EnvironmentBlock {
            block,
            _token: PhantomData,
        })
    }

    /// Raw pointer for passing to process creation
    pub fn as_ptr(&self) -> *mut c_void {
        self.block
    }
}

impl Drop for EnvironmentBlock<'_> {
    fn drop(&mut self) {
        if !self.block.is_null() {
            unsafe {
                userenv::destroy_environment_block(self.block);
            }
        }
    }
}

// The block is an owned, process-local allocation
unsafe impl Send for EnvironmentBlock<'_> {}

impl EnvironmentBlock<'_> {
    /// An absent environment block (the child inherits the caller's)
    pub fn null_ptr() -> *mut c_void {
        ptr::null_mut()
    }
}
