//! npybridge: import NumPy's C-API function tables and check that the
//! running NumPy matches the headers an extension was compiled against.
//!
//! This is the facade crate. It re-exports the host-independent importer;
//! the PyO3 host and the process-wide bridge live in `npybridge-python`,
//! and the C ABI in `npybridge-ffi`.
//!
//! # Quick start
//!
//! ```rust
//! use std::ffi::c_void;
//! use npybridge::prelude::*;
//!
//! // An interpreter with no NumPy installed.
//! struct NoNumpy;
//! impl Host for NoNumpy {
//!     type Module = ();
//!     fn import_module(&self, name: &str) -> Result<(), HostError> {
//!         Err(HostError::ModuleNotFound {
//!             module: name.to_owned(),
//!             reason: format!("No module named '{name}'"),
//!         })
//!     }
//!     fn capsule_pointer(&self, _: &(), attr: &str) -> Result<*mut c_void, HostError> {
//!         Err(HostError::AttributeMissing { attr: attr.to_owned() })
//!     }
//!     fn runtime_versions(&self, _: TablePtr) -> RuntimeVersions {
//!         RuntimeVersions::numpy2()
//!     }
//! }
//!
//! let bridge = Bridge::with_default_config(NoNumpy);
//! let err = bridge.ensure_initialized().unwrap_err();
//! assert_eq!(err.kind, ApiKind::Array);
//! assert!(err.source.is_module_failure());
//! assert!(!bridge.is_initialized());
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`bridge`] | [`Bridge`](bridge::Bridge), the once-only initializer |
//! | [`check`] | Pointer-width, ABI, feature, and byte-order checks |
//! | [`config`] | [`ImportConfig`](config::ImportConfig) and its validation |
//! | [`error`] | Host, import, and init errors |
//! | [`host`] | The [`Host`](host::Host) interpreter seam |
//! | [`table`] | Table pointers and slot access |
//! | [`version`] | ABI and feature version markers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub use npybridge_core::{bridge, check, config, error, host, table, version};

/// Common imports for implementing a host or driving a bridge.
///
/// ```rust
/// use npybridge::prelude::*;
/// ```
pub mod prelude {
    pub use npybridge_core::{
        AbiVersion, ApiKind, ApiTables, Bridge, Endianness, FeatureVersion, Host, HostError,
        ImportConfig, ImportError, InitError, RuntimeVersions, TablePtr,
    };
}
