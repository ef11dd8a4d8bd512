//! `malloc`-backed allocation helpers shared with generated code.
//!
//! Strings handed across the C ABI are allocated here, so a single
//! `vela_free` releases everything the runtime returns regardless of which
//! function produced it.

use core::ffi::c_void;

use crate::{builtins::fatal, error::RuntimeError};

unsafe extern "C" {
    fn malloc(size: usize) -> *mut c_void;
    fn free(ptr: *mut c_void);
}

/// Allocate `size` bytes. Allocation failure is fatal, so the result is
/// always non-null.
#[unsafe(no_mangle)]
pub extern "C" fn vela_alloc(size: usize) -> *mut c_void {
    // malloc(0) may legitimately return null; request one byte instead.
    let ptr = unsafe { malloc(size.max(1)) };
    if ptr.is_null() {
        fatal(RuntimeError::OutOfMemory);
    }
    ptr
}

/// Release memory obtained from `vela_alloc`. Null is a no-op.
///
/// # Safety
/// `ptr` must be null or a live pointer from `vela_alloc` that has not been
/// freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_free(ptr: *mut c_void) {
    if !ptr.is_null() {
        unsafe { free(ptr) };
    }
}

pub(crate) fn alloc_bytes(size: usize) -> *mut u8 {
    vela_alloc(size) as *mut u8
}
