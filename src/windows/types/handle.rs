//! Safe HANDLE wrapper with automatic cleanup

use std::ptr;
use winapi::um::handleapi::CloseHandle;
use winapi::um::winnt::HANDLE;

/// Safe wrapper around a Windows HANDLE with RAII semantics
pub struct Handle {
    handle: HANDLE,
}

impl Handle {
    /// Create a new Handle wrapper, taking ownership of `handle`
    pub fn new(handle: HANDLE) -> Self {
        Handle { handle }
    }

    /// Create a null handle
    pub fn null() -> Self {
        Handle {
            handle: ptr::null_mut(),
        }
    }

    /// Check if the handle is null
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Get the raw handle
    pub fn raw(&self) -> HANDLE {
        self.handle
    }

    /// Take ownership of the raw handle, preventing automatic cleanup
    pub fn take(mut self) -> HANDLE {
        let handle = self.handle;
        self.handle = ptr::null_mut();
        handle
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            // Errors on cleanup are ignored
            unsafe {
                CloseHandle(self.handle);
            }
        }
    }
}

// Send + Sync are safe because HANDLEs are process-local
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle() {
        let handle = Handle::null();
        assert!(handle.is_null());
        assert!(handle.raw().is_null());
    }

    #[test]
    fn test_take_prevents_cleanup() {
        let handle = Handle::null();
        let raw = handle.take();
        assert!(raw.is_null());
    }

    #[test]
    fn test_drop_null_handle_is_noop() {
        let handle = Handle::null();
        drop(handle);
    }
}
