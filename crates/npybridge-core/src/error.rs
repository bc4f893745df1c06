//! Error types for table import.
//!
//! [`HostError`] is what a [`Host`](crate::host::Host) reports about a single
//! call into the interpreter. [`ImportError`] is the failure of one table
//! import, after fallback handling. [`InitError`] wraps an `ImportError` with
//! the table it came from and is the only error `ensure_initialized` returns.

use std::error::Error;
use std::fmt;

use crate::table::ApiKind;
use crate::version::{AbiVersion, Endianness, FeatureVersion};

/// Failure of a single host call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    /// The module does not exist (`ModuleNotFoundError`).
    ModuleNotFound {
        /// Module that was requested.
        module: String,
        /// Interpreter message.
        reason: String,
    },
    /// The module exists but raised while importing.
    ImportFailed {
        /// Module that was requested.
        module: String,
        /// Interpreter message.
        reason: String,
    },
    /// The attribute does not exist on the module.
    AttributeMissing {
        /// Attribute that was requested.
        attr: String,
    },
    /// The attribute exists but is not exactly a capsule.
    NotACapsule {
        /// Attribute that was requested.
        attr: String,
        /// Type name of the object found instead.
        type_name: String,
    },
    /// Any other interpreter failure.
    Failed {
        /// Interpreter message.
        reason: String,
    },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleNotFound { module, reason } => {
                write!(f, "module '{module}' not found: {reason}")
            }
            Self::ImportFailed { module, reason } => {
                write!(f, "module '{module}' failed to import: {reason}")
            }
            Self::AttributeMissing { attr } => write!(f, "{attr} not found"),
            Self::NotACapsule { attr, type_name } => {
                write!(f, "{attr} is not PyCapsule object (found {type_name})")
            }
            Self::Failed { reason } => write!(f, "host call failed: {reason}"),
        }
    }
}

impl Error for HostError {}

/// Failure to import one function table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportError {
    /// Neither the primary nor the legacy module exists.
    ModuleUnavailable {
        /// Primary module name.
        primary: String,
        /// Legacy module name.
        legacy: String,
        /// Interpreter message from the legacy attempt.
        reason: String,
    },
    /// A module was found but raised while importing.
    ModuleImport {
        /// Module that raised.
        module: String,
        /// Interpreter message.
        reason: String,
    },
    /// The capsule attribute is missing from the module.
    AttributeMissing {
        /// Module searched.
        module: String,
        /// Missing attribute.
        attr: String,
    },
    /// The capsule attribute is some other object.
    NotACapsule {
        /// Capsule attribute name.
        attr: String,
        /// Type name of the object found instead.
        type_name: String,
    },
    /// The capsule holds a null pointer.
    NullPointer {
        /// Capsule attribute name.
        attr: String,
    },
    /// `Py_ssize_t` and `Py_intptr_t` differ in width while the runtime
    /// predates the 2.0 ABI.
    PointerWidth {
        /// `sizeof(Py_ssize_t)`.
        ssize_width: usize,
        /// `sizeof(Py_intptr_t)`.
        intptr_width: usize,
        /// Runtime ABI version.
        runtime: AbiVersion,
    },
    /// The runtime ABI is newer than the ABI compiled against.
    AbiMismatch {
        /// Compiled ABI version.
        compiled: AbiVersion,
        /// Runtime ABI version.
        runtime: AbiVersion,
    },
    /// The runtime ABI is older than the oldest ABI this build supports.
    UnsupportedRuntimeAbi {
        /// Compiled ABI version.
        compiled: AbiVersion,
        /// Runtime ABI version.
        runtime: AbiVersion,
        /// Oldest supported runtime ABI.
        oldest_supported: AbiVersion,
    },
    /// The runtime lacks the feature version compiled against.
    FeatureMismatch {
        /// Compiled feature version.
        compiled: FeatureVersion,
        /// Runtime feature version.
        runtime: FeatureVersion,
    },
    /// The runtime could not determine its byte order.
    UnknownEndianness,
    /// The runtime byte order differs from the compiled one.
    EndiannessMismatch {
        /// Compiled byte order.
        compiled: Endianness,
        /// Runtime byte order.
        runtime: Endianness,
    },
    /// A host call failed for a reason outside the taxonomy above.
    Host(HostError),
}

impl ImportError {
    /// Whether this is one of the binary-compatibility check failures.
    pub fn is_compatibility(&self) -> bool {
        matches!(
            self,
            Self::PointerWidth { .. }
                | Self::AbiMismatch { .. }
                | Self::UnsupportedRuntimeAbi { .. }
                | Self::FeatureMismatch { .. }
                | Self::UnknownEndianness
                | Self::EndiannessMismatch { .. }
        )
    }

    /// Whether this failure means the module could not be imported at all.
    pub fn is_module_failure(&self) -> bool {
        matches!(
            self,
            Self::ModuleUnavailable { .. } | Self::ModuleImport { .. }
        )
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleUnavailable {
                primary,
                legacy,
                reason,
            } => write!(
                f,
                "_multiarray_umath failed to import (tried '{primary}' and '{legacy}'): {reason}"
            ),
            Self::ModuleImport { module, reason } => {
                write!(f, "'{module}' failed to import: {reason}")
            }
            Self::AttributeMissing { module, attr } => {
                write!(f, "{attr} not found on '{module}'")
            }
            Self::NotACapsule { attr, type_name } => {
                write!(f, "{attr} is not PyCapsule object (found {type_name})")
            }
            Self::NullPointer { attr } => write!(f, "{attr} is NULL pointer"),
            Self::PointerWidth {
                ssize_width,
                intptr_width,
                runtime,
            } => write!(
                f,
                "module compiled against NumPy 2.0 but running on NumPy 1.x (ABI {runtime}). \
                 This is unsupported when sizeof(size_t) ({ssize_width}) != \
                 sizeof(intptr_t) ({intptr_width})."
            ),
            Self::AbiMismatch { compiled, runtime } => write!(
                f,
                "module compiled against ABI version {compiled} but this NumPy exposes {runtime}"
            ),
            Self::UnsupportedRuntimeAbi {
                compiled,
                runtime,
                oldest_supported,
            } => write!(
                f,
                "module compiled against ABI version {compiled} but this NumPy exposes {runtime}, \
                 older than the oldest supported {oldest_supported}"
            ),
            Self::FeatureMismatch { compiled, runtime } => write!(
                f,
                "module compiled against NumPy C-API version {compiled} but runtime is {runtime}"
            ),
            Self::UnknownEndianness => write!(f, "FATAL: module compiled as unknown endian"),
            Self::EndiannessMismatch { compiled, .. } => write!(
                f,
                "FATAL: module compiled as {compiled}, but detected different endianness at runtime"
            ),
            Self::Host(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Host(e) => Some(e),
            _ => None,
        }
    }
}

/// Fatal initialization failure: which table failed and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitError {
    /// Table whose import failed.
    pub kind: ApiKind,
    /// The underlying import failure.
    pub source: ImportError,
}

impl InitError {
    /// Tag an import failure with its table.
    pub fn new(kind: ApiKind, source: ImportError) -> Self {
        Self { kind, source }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiKind::Array => write!(f, "Failed to initialize NumPy C-API: {}", self.source),
            ApiKind::Ufunc => {
                write!(f, "Failed to initialize NumPy ufunc C-API: {}", self.source)
            }
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_mismatch_message_names_both_versions() {
        let e = ImportError::AbiMismatch {
            compiled: AbiVersion::NUMPY_1,
            runtime: AbiVersion::NUMPY_2,
        };
        let msg = e.to_string();
        assert!(msg.contains("0x01000009"), "{msg}");
        assert!(msg.contains("0x02000000"), "{msg}");
        assert!(e.is_compatibility());
        assert!(!e.is_module_failure());
    }

    #[test]
    fn endianness_message_names_compiled_order() {
        let e = ImportError::EndiannessMismatch {
            compiled: Endianness::Little,
            runtime: Endianness::Big,
        };
        assert_eq!(
            e.to_string(),
            "FATAL: module compiled as little endian, but detected different endianness at runtime"
        );
    }

    #[test]
    fn init_error_prefixes_table() {
        let e = InitError::new(
            ApiKind::Ufunc,
            ImportError::NullPointer {
                attr: "_UFUNC_API".into(),
            },
        );
        assert_eq!(
            e.to_string(),
            "Failed to initialize NumPy ufunc C-API: _UFUNC_API is NULL pointer"
        );
        assert!(Error::source(&e).is_some());
    }

    #[test]
    fn host_error_is_exposed_as_source() {
        let e = ImportError::Host(HostError::Failed {
            reason: "boom".into(),
        });
        assert_eq!(e.to_string(), "host call failed: boom");
        assert!(e.source().is_some());
        assert!(!e.is_compatibility());
    }
}
