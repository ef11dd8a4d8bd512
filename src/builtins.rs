//! Built-in functions available to every Vela program: formatted output,
//! assertions, and the fatal exit path every runtime diagnostic funnels
//! through.
//!
//! Generated code formats text through the string module and hands the
//! finished message here, so these entry points all take a single
//! NUL-terminated string.

use std::{
    borrow::Cow,
    ffi::{CStr, c_char},
    fmt::Display,
    process,
};

use crate::error::RuntimeError;

/// Print the diagnostic and terminate the process. Never returns; generated
/// code has no recoverable-error channel.
pub(crate) fn die(message: impl Display) -> ! {
    eprintln!("Panic: {message}");
    process::abort();
}

/// Fatal exit for a runtime fault; the fault's `Display` form is the
/// diagnostic.
pub(crate) fn fatal(err: RuntimeError) -> ! {
    die(err)
}

/// # Safety
/// `message` must be null or a valid NUL-terminated string.
unsafe fn message_text(message: *const c_char) -> Cow<'static, str> {
    if message.is_null() {
        return Cow::Borrowed("");
    }
    unsafe { CStr::from_ptr(message) }.to_string_lossy()
}

/// Write a preformatted message to stdout.
///
/// # Safety
/// `message` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_print(message: *const c_char) {
    print!("{}", unsafe { message_text(message) });
}

/// Write a preformatted message to stdout, followed by a newline.
///
/// # Safety
/// `message` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_println(message: *const c_char) {
    println!("{}", unsafe { message_text(message) });
}

/// Check a condition; on failure, report the message and terminate.
///
/// # Safety
/// `message` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_assert(condition: bool, message: *const c_char) {
    if !condition {
        eprintln!("Assertion failed: {}", unsafe { message_text(message) });
        process::abort();
    }
}

/// Report the message and terminate unconditionally.
///
/// # Safety
/// `message` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_panic(message: *const c_char) -> ! {
    die(unsafe { message_text(message) })
}
