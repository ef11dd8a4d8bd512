//! C string helpers and numeric conversions for generated code.
//!
//! Vela strings are NUL-terminated byte strings owned by the program. Every
//! function here that returns a string allocates it with `vela_alloc`, so
//! the caller releases it with `vela_free`.
//!
//! Parsing follows the C `atoi`/`atof` shape: skip leading whitespace, read
//! the longest numeric prefix, and yield 0 when nothing parses. Malformed
//! input has no stronger contract than that.

use std::{
    ffi::{CStr, c_char},
    ptr,
};

use crate::{builtins::die, memory::alloc_bytes};

/// Copy `bytes` into a fresh NUL-terminated allocation.
fn copy_to_c_string(bytes: &[u8]) -> *mut c_char {
    let out = alloc_bytes(bytes.len() + 1);
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
        *out.add(bytes.len()) = 0;
    }
    out as *mut c_char
}

/// # Safety
/// `s` must be a valid NUL-terminated string.
unsafe fn c_str_bytes<'a>(s: *const c_char) -> &'a [u8] {
    if s.is_null() {
        die("attempted to use a null string");
    }
    unsafe { CStr::from_ptr(s) }.to_bytes()
}

/// Longest integer prefix after optional whitespace: an optional sign
/// followed by ASCII digits.
fn int_prefix(s: &str) -> &str {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let sign_len = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == sign_len {
        return "";
    }
    &s[..end]
}

/// Longest floating-point prefix after optional whitespace: sign, digits,
/// optional fraction, optional exponent.
fn float_prefix(s: &str) -> &str {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return "";
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits_start {
            end = exp;
        }
    }
    &s[..end]
}

/// Newly allocated copy of `s1` followed by `s2`.
///
/// # Safety
/// `s1` and `s2` must be valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_concat(s1: *const c_char, s2: *const c_char) -> *mut c_char {
    let (a, b) = unsafe { (c_str_bytes(s1), c_str_bytes(s2)) };
    let mut joined = Vec::with_capacity(a.len() + b.len());
    joined.extend_from_slice(a);
    joined.extend_from_slice(b);
    copy_to_c_string(&joined)
}

/// Newly allocated copy of `s` repeated `count` times; a non-positive count
/// yields the empty string.
///
/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_repeat(s: *const c_char, count: i32) -> *mut c_char {
    let bytes = unsafe { c_str_bytes(s) };
    copy_to_c_string(&bytes.repeat(count.max(0) as usize))
}

#[unsafe(no_mangle)]
pub extern "C" fn vela_string_from_int(value: i32) -> *mut c_char {
    copy_to_c_string(value.to_string().as_bytes())
}

#[unsafe(no_mangle)]
pub extern "C" fn vela_string_from_long(value: i64) -> *mut c_char {
    copy_to_c_string(value.to_string().as_bytes())
}

/// Canonical text form with six fractional digits.
#[unsafe(no_mangle)]
pub extern "C" fn vela_string_from_float(value: f32) -> *mut c_char {
    copy_to_c_string(format!("{value:.6}").as_bytes())
}

/// Canonical text form with six fractional digits.
#[unsafe(no_mangle)]
pub extern "C" fn vela_string_from_double(value: f64) -> *mut c_char {
    copy_to_c_string(format!("{value:.6}").as_bytes())
}

/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_to_int(s: *const c_char) -> i32 {
    let text = String::from_utf8_lossy(unsafe { c_str_bytes(s) });
    int_prefix(&text).parse().unwrap_or(0)
}

/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_to_long(s: *const c_char) -> i64 {
    let text = String::from_utf8_lossy(unsafe { c_str_bytes(s) });
    int_prefix(&text).parse().unwrap_or(0)
}

/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_to_float(s: *const c_char) -> f32 {
    let text = String::from_utf8_lossy(unsafe { c_str_bytes(s) });
    float_prefix(&text).parse().unwrap_or(0.0)
}

/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_to_double(s: *const c_char) -> f64 {
    let text = String::from_utf8_lossy(unsafe { c_str_bytes(s) });
    float_prefix(&text).parse().unwrap_or(0.0)
}

/// Byte length of the string, excluding the terminating NUL.
///
/// # Safety
/// `s` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_string_len(s: *const c_char) -> usize {
    unsafe { c_str_bytes(s) }.len()
}
