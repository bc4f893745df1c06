//! Import configuration and validation.
//!
//! [`ImportConfig`] describes what the extension was compiled against and
//! where the tables live. The defaults match a build against NumPy 2.x
//! headers with the default 1.19 API target.

use std::error::Error;
use std::fmt;

use crate::version::{AbiVersion, Endianness, FeatureVersion};

/// Module that exports the capsules in NumPy 2.x.
pub const PRIMARY_MODULE: &str = "numpy._core._multiarray_umath";
/// Pre-2.0 location of the same module.
pub const LEGACY_MODULE: &str = "numpy.core._multiarray_umath";
/// Capsule attribute holding the array API table.
pub const ARRAY_CAPSULE: &str = "_ARRAY_API";
/// Capsule attribute holding the ufunc API table.
pub const UFUNC_CAPSULE: &str = "_UFUNC_API";

// ── HostLayout ─────────────────────────────────────────────────────

/// Widths of the host's size and pointer integer types, in bytes.
///
/// NumPy 1.x tables assume `Py_ssize_t` and `Py_intptr_t` share a width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostLayout {
    /// `sizeof(Py_ssize_t)`.
    pub ssize_width: usize,
    /// `sizeof(Py_intptr_t)`.
    pub intptr_width: usize,
}

impl HostLayout {
    /// Layout with explicit widths.
    pub const fn new(ssize_width: usize, intptr_width: usize) -> Self {
        Self {
            ssize_width,
            intptr_width,
        }
    }

    /// Layout of the compilation target: both are pointer-sized.
    pub const fn native() -> Self {
        Self::new(size_of::<isize>(), size_of::<*const ()>())
    }

    /// Whether size and pointer integers have the same width.
    pub const fn is_uniform(&self) -> bool {
        self.ssize_width == self.intptr_width
    }
}

impl Default for HostLayout {
    fn default() -> Self {
        Self::native()
    }
}

// ── ImportConfig ───────────────────────────────────────────────────

/// Everything the importer needs to locate and validate the tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportConfig {
    /// Module imported first. Default: [`PRIMARY_MODULE`].
    pub primary_module: String,
    /// Module imported when the primary one is not found.
    /// Default: [`LEGACY_MODULE`].
    pub legacy_module: String,
    /// Array capsule attribute. Default: [`ARRAY_CAPSULE`].
    pub array_capsule: String,
    /// Ufunc capsule attribute. Default: [`UFUNC_CAPSULE`].
    pub ufunc_capsule: String,
    /// ABI version the extension was compiled against. Default: 2.x.
    pub compiled_abi: AbiVersion,
    /// Oldest runtime ABI a build newer than the runtime still supports.
    /// Default: 1.x.
    pub min_runtime_abi: AbiVersion,
    /// Feature version the extension requires. Default: 1.19 API.
    pub compiled_feature: FeatureVersion,
    /// Byte order the extension was compiled for. Default: target.
    pub target_endianness: Endianness,
    /// Host integer widths. Default: native.
    pub layout: HostLayout,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            primary_module: PRIMARY_MODULE.to_owned(),
            legacy_module: LEGACY_MODULE.to_owned(),
            array_capsule: ARRAY_CAPSULE.to_owned(),
            ufunc_capsule: UFUNC_CAPSULE.to_owned(),
            compiled_abi: AbiVersion::NUMPY_2,
            min_runtime_abi: AbiVersion::NUMPY_1,
            compiled_feature: FeatureVersion::NUMPY_1_19,
            target_endianness: Endianness::target(),
            layout: HostLayout::native(),
        }
    }
}

impl ImportConfig {
    /// Default values with the host's integer widths. Always valid.
    pub fn with_layout(layout: HostLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Check structural invariants before any import is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("primary_module", &self.primary_module),
            ("legacy_module", &self.legacy_module),
            ("array_capsule", &self.array_capsule),
            ("ufunc_capsule", &self.ufunc_capsule),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyName { field });
            }
        }
        if self.primary_module == self.legacy_module {
            return Err(ConfigError::DuplicateModule {
                name: self.primary_module.clone(),
            });
        }
        if self.compiled_abi.0 == 0 {
            return Err(ConfigError::ZeroAbiVersion);
        }
        if self.compiled_feature.0 == 0 {
            return Err(ConfigError::ZeroFeatureVersion);
        }
        if self.min_runtime_abi > self.compiled_abi {
            return Err(ConfigError::FloorAboveCompiled {
                floor: self.min_runtime_abi,
                compiled: self.compiled_abi,
            });
        }
        if self.target_endianness == Endianness::Unknown {
            return Err(ConfigError::UnknownTargetEndianness);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`ImportConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A module or attribute name is empty.
    EmptyName {
        /// Name of the offending config field.
        field: &'static str,
    },
    /// Primary and legacy module names are identical.
    DuplicateModule {
        /// The repeated module name.
        name: String,
    },
    /// Compiled ABI version is zero.
    ZeroAbiVersion,
    /// Compiled feature version is zero.
    ZeroFeatureVersion,
    /// The oldest supported runtime ABI is newer than the compiled ABI.
    FloorAboveCompiled {
        /// Configured oldest supported runtime ABI.
        floor: AbiVersion,
        /// Configured compiled ABI.
        compiled: AbiVersion,
    },
    /// Target byte order is unknown.
    UnknownTargetEndianness,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName { field } => write!(f, "{field} must not be empty"),
            Self::DuplicateModule { name } => {
                write!(f, "primary and legacy module are both '{name}'")
            }
            Self::ZeroAbiVersion => write!(f, "compiled ABI version must be non-zero"),
            Self::ZeroFeatureVersion => write!(f, "compiled feature version must be non-zero"),
            Self::FloorAboveCompiled { floor, compiled } => write!(
                f,
                "oldest supported runtime ABI {floor} is newer than compiled ABI {compiled}"
            ),
            Self::UnknownTargetEndianness => write!(f, "target endianness must be known"),
        }
    }
}

impl Error for ConfigError {}
