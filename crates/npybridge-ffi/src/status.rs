//! C-compatible status codes for table initialization.
//!
//! [`NpyBridgeStatus`] is a `repr(i32)` enum with one code per failure in
//! the import taxonomy. Conversions from [`ImportError`] and [`InitError`]
//! are provided.

use std::ffi::c_char;

use npybridge_core::{ImportError, InitError};

/// C-compatible status code returned by the FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NpyBridgeStatus {
    /// Success.
    Ok = 0,
    /// Neither the primary nor the legacy module exists.
    ModuleNotFound = -1,
    /// A module was found but raised while importing.
    ModuleImport = -2,
    /// A capsule attribute is missing.
    AttributeMissing = -3,
    /// A capsule attribute is not a capsule.
    NotACapsule = -4,
    /// A capsule holds a null pointer.
    NullPointer = -5,
    /// `Py_ssize_t` and `Py_intptr_t` widths differ on a 1.x runtime.
    PointerWidth = -6,
    /// Compiled and runtime ABI versions are incompatible.
    AbiMismatch = -7,
    /// The runtime lacks the compiled feature version.
    FeatureMismatch = -8,
    /// The runtime reports an unknown byte order.
    UnknownEndianness = -9,
    /// The runtime byte order differs from the compiled one.
    EndiannessMismatch = -10,
    /// Any other interpreter failure.
    HostFailure = -11,
    /// The tables have not been initialized yet.
    NotInitialized = -12,
    /// An argument is null or otherwise invalid.
    InvalidArgument = -13,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl NpyBridgeStatus {
    const ALL: [Self; 15] = [
        Self::Ok,
        Self::ModuleNotFound,
        Self::ModuleImport,
        Self::AttributeMissing,
        Self::NotACapsule,
        Self::NullPointer,
        Self::PointerWidth,
        Self::AbiMismatch,
        Self::FeatureMismatch,
        Self::UnknownEndianness,
        Self::EndiannessMismatch,
        Self::HostFailure,
        Self::NotInitialized,
        Self::InvalidArgument,
        Self::Panicked,
    ];

    /// Decode a raw status code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| *s as i32 == code)
    }

    /// Static description of the status.
    pub fn message(self) -> &'static std::ffi::CStr {
        match self {
            Self::Ok => c"ok",
            Self::ModuleNotFound => c"_multiarray_umath failed to import",
            Self::ModuleImport => c"NumPy core module raised while importing",
            Self::AttributeMissing => c"capsule attribute not found",
            Self::NotACapsule => c"capsule attribute is not PyCapsule object",
            Self::NullPointer => c"capsule holds NULL pointer",
            Self::PointerWidth => {
                c"module compiled against NumPy 2.0 but running on NumPy 1.x with sizeof(size_t) != sizeof(intptr_t)"
            }
            Self::AbiMismatch => c"NumPy ABI version mismatch",
            Self::FeatureMismatch => c"NumPy C-API feature version too old",
            Self::UnknownEndianness => c"FATAL: module compiled as unknown endian",
            Self::EndiannessMismatch => {
                c"FATAL: module compiled with different endianness than detected at runtime"
            }
            Self::HostFailure => c"Python interpreter call failed",
            Self::NotInitialized => c"NumPy C-API not initialized",
            Self::InvalidArgument => c"invalid argument",
            Self::Panicked => c"panic caught at FFI boundary",
        }
    }
}

impl From<&ImportError> for NpyBridgeStatus {
    fn from(e: &ImportError) -> Self {
        match e {
            ImportError::ModuleUnavailable { .. } => NpyBridgeStatus::ModuleNotFound,
            ImportError::ModuleImport { .. } => NpyBridgeStatus::ModuleImport,
            ImportError::AttributeMissing { .. } => NpyBridgeStatus::AttributeMissing,
            ImportError::NotACapsule { .. } => NpyBridgeStatus::NotACapsule,
            ImportError::NullPointer { .. } => NpyBridgeStatus::NullPointer,
            ImportError::PointerWidth { .. } => NpyBridgeStatus::PointerWidth,
            ImportError::AbiMismatch { .. } | ImportError::UnsupportedRuntimeAbi { .. } => {
                NpyBridgeStatus::AbiMismatch
            }
            ImportError::FeatureMismatch { .. } => NpyBridgeStatus::FeatureMismatch,
            ImportError::UnknownEndianness => NpyBridgeStatus::UnknownEndianness,
            ImportError::EndiannessMismatch { .. } => NpyBridgeStatus::EndiannessMismatch,
            ImportError::Host(_) => NpyBridgeStatus::HostFailure,
        }
    }
}

impl From<&InitError> for NpyBridgeStatus {
    fn from(e: &InitError) -> Self {
        NpyBridgeStatus::from(&e.source)
    }
}

/// Static, NUL-terminated description of a status code. Unknown codes
/// yield a generic message; the pointer is never null.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn npybridge_status_message(code: i32) -> *const c_char {
    match NpyBridgeStatus::from_code(code) {
        Some(status) => status.message().as_ptr(),
        None => c"unknown npybridge status".as_ptr(),
    }
}
