//! Initialization entry point and table accessors.
//!
//! All functions share the process-wide bridge from `npybridge-python`, so
//! tables initialized from Rust, Python, or C are the same pointers.

use std::ffi::c_void;
use std::ptr;

use npybridge_core::ApiKind;
use npybridge_python::{tables, try_ensure_initialized};

use crate::status::NpyBridgeStatus;

/// Runtime versions captured during initialization.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NpyBridgeRuntimeInfo {
    /// `PyArray_GetNDArrayCVersion()` at initialization.
    pub abi_version: u32,
    /// `PyArray_GetNDArrayCFeatureVersion()` at initialization.
    pub feature_version: u32,
    /// `PyArray_GetEndianness()` at initialization.
    pub endianness: i32,
}

/// Import and validate both NumPy tables. Idempotent.
///
/// Must run inside a live interpreter; the GIL may be held, and is released
/// while waiting for a concurrent initializer. On failure the message is
/// written to stderr and a negative status returned; the caller should
/// abort its module load.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_init() -> i32 {
    ffi_guard!({
        match try_ensure_initialized() {
            Ok(_) => NpyBridgeStatus::Ok as i32,
            Err(e) => {
                // No tracing subscriber may exist in a foreign host.
                eprintln!("npybridge: {e}");
                NpyBridgeStatus::from(&e) as i32
            }
        }
    })
}

/// 1 if both tables are published, 0 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_is_initialized() -> u8 {
    ffi_guard_or!(0, { u8::from(tables().is_some()) })
}

fn table_or_null(kind: ApiKind) -> *mut *const c_void {
    match tables() {
        Some(t) => t.table(kind).as_ptr(),
        None => ptr::null_mut(),
    }
}

/// The array API table (`void **`), or null before initialization.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_array_api() -> *mut *const c_void {
    ffi_guard_or!(ptr::null_mut(), { table_or_null(ApiKind::Array) })
}

/// The ufunc API table (`void **`), or null before initialization.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_ufunc_api() -> *mut *const c_void {
    ffi_guard_or!(ptr::null_mut(), { table_or_null(ApiKind::Ufunc) })
}

/// Runtime feature version, or 0 before initialization.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_runtime_feature_version() -> i32 {
    ffi_guard_or!(0, {
        tables().map_or(0, |t| t.runtime_feature_version().0 as i32)
    })
}

/// Write the captured runtime versions to `out`.
///
/// Returns `NotInitialized` before initialization and `InvalidArgument`
/// for a null `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_runtime_info(out: *mut NpyBridgeRuntimeInfo) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return NpyBridgeStatus::InvalidArgument as i32;
        }
        let Some(t) = tables() else {
            return NpyBridgeStatus::NotInitialized as i32;
        };
        let runtime = t.array().runtime();
        let info = NpyBridgeRuntimeInfo {
            abi_version: runtime.abi.0,
            feature_version: runtime.feature.0,
            endianness: runtime.endianness as i32,
        };
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = info };
        NpyBridgeStatus::Ok as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // These never trigger initialization, so no interpreter is needed.

    #[test]
    fn accessors_are_empty_before_init() {
        assert_eq!(npybridge_is_initialized(), 0);
        assert!(npybridge_array_api().is_null());
        assert!(npybridge_ufunc_api().is_null());
        assert_eq!(npybridge_runtime_feature_version(), 0);
    }

    #[test]
    fn runtime_info_before_init() {
        let mut info = NpyBridgeRuntimeInfo::default();
        assert_eq!(
            npybridge_runtime_info(&mut info),
            NpyBridgeStatus::NotInitialized as i32
        );
        assert_eq!(info, NpyBridgeRuntimeInfo::default());
    }

    #[test]
    fn runtime_info_rejects_null() {
        assert_eq!(
            npybridge_runtime_info(ptr::null_mut()),
            NpyBridgeStatus::InvalidArgument as i32
        );
    }
}
