//! Binary-compatibility checks run against a freshly imported array table.
//!
//! The checks run in a fixed order and the first failure wins:
//! pointer width, ABI ordering, feature version, byte order.

use crate::config::{HostLayout, ImportConfig};
use crate::error::ImportError;
use crate::version::{AbiVersion, Endianness, FeatureVersion, RuntimeVersions};

/// Run every check in order.
pub fn check_compatibility(
    config: &ImportConfig,
    runtime: &RuntimeVersions,
) -> Result<(), ImportError> {
    check_pointer_width(&config.layout, runtime.abi)?;
    check_abi(config.compiled_abi, config.min_runtime_abi, runtime.abi)?;
    check_feature(config.compiled_feature, runtime.feature)?;
    check_endianness(config.target_endianness, runtime.endianness)
}

/// 1.x tables require `Py_ssize_t` and `Py_intptr_t` to share a width.
pub fn check_pointer_width(layout: &HostLayout, runtime: AbiVersion) -> Result<(), ImportError> {
    if !layout.is_uniform() && runtime < AbiVersion::NUMPY_2 {
        return Err(ImportError::PointerWidth {
            ssize_width: layout.ssize_width,
            intptr_width: layout.intptr_width,
            runtime,
        });
    }
    Ok(())
}

/// A runtime newer than the build is rejected; a runtime older than the
/// build is accepted down to `oldest_supported`.
pub fn check_abi(
    compiled: AbiVersion,
    oldest_supported: AbiVersion,
    runtime: AbiVersion,
) -> Result<(), ImportError> {
    if compiled < runtime {
        return Err(ImportError::AbiMismatch { compiled, runtime });
    }
    if runtime < oldest_supported {
        return Err(ImportError::UnsupportedRuntimeAbi {
            compiled,
            runtime,
            oldest_supported,
        });
    }
    Ok(())
}

/// The runtime must expose every entry point the build may call.
pub fn check_feature(
    compiled: FeatureVersion,
    runtime: FeatureVersion,
) -> Result<(), ImportError> {
    if compiled > runtime {
        return Err(ImportError::FeatureMismatch { compiled, runtime });
    }
    Ok(())
}

/// Runtime byte order must be known and equal to the compiled one.
pub fn check_endianness(compiled: Endianness, runtime: Endianness) -> Result<(), ImportError> {
    if runtime == Endianness::Unknown {
        return Err(ImportError::UnknownEndianness);
    }
    if runtime != compiled {
        return Err(ImportError::EndiannessMismatch { compiled, runtime });
    }
    Ok(())
}
