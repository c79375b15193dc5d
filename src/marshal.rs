//! String marshaling across the C boundary.
//!
//! Inputs are borrowed NUL-terminated UTF-8 buffers that are copied and
//! never retained. Outputs are `CString` allocations whose ownership passes
//! to the caller, who hands them back through `yt_free_string`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Copy a caller-owned C string. Null becomes the empty string and invalid
/// UTF-8 is replaced lossily.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated buffer that stays valid
/// for the duration of the call.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Allocate a C copy of `s` whose ownership transfers to the caller.
///
/// The copy stops at the first interior NUL, which is where a C reader
/// would stop anyway.
pub fn string_into_raw(s: &str) -> *mut c_char {
    let bytes = match s.find('\0') {
        Some(end) => &s[..end],
        None => s,
    };
    // No interior NUL remains, so this cannot fail.
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Release a buffer produced by [`string_into_raw`]. Null is a no-op.
///
/// # Safety
///
/// `ptr` must come from [`string_into_raw`] and not have been freed yet.
pub unsafe fn free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr));
}
