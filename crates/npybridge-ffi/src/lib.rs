//! C ABI for the process-wide NumPy C-API bridge.
//!
//! Lets C and C++ translation units inside the same extension share the
//! tables that `npybridge-python` imports: call `npybridge_init()` once
//! during module load, then read the table pointers through the accessors.
//! This crate and `npybridge-python` are the only ones with `unsafe` at
//! their boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body` (which yields an `i32` status) and turn a panic into
/// [`NpyBridgeStatus::Panicked`](crate::status::NpyBridgeStatus::Panicked).
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(code) => code,
            Err(_) => $crate::status::NpyBridgeStatus::Panicked as i32,
        }
    };
}

/// Like `ffi_guard!`, returning `$default` on panic.
macro_rules! ffi_guard_or {
    ($default:expr, $body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(_) => $default,
        }
    };
}

pub mod init;
pub mod status;

pub use init::{
    npybridge_array_api, npybridge_init, npybridge_is_initialized,
    npybridge_runtime_feature_version, npybridge_runtime_info, npybridge_ufunc_api,
    NpyBridgeRuntimeInfo,
};
pub use status::{npybridge_status_message, NpyBridgeStatus};
