//! Host-independent import of NumPy's C-API function tables.
//!
//! A native extension that calls NumPy's C API must first obtain two
//! function tables, published by `numpy._core._multiarray_umath` as the
//! capsules `_ARRAY_API` and `_UFUNC_API`, and confirm that the running
//! NumPy is binary-compatible with the headers it was built against. This
//! crate implements that handshake over an abstract [`Host`], validates the
//! array table ([`check`]), and publishes both tables exactly once through
//! a [`Bridge`].
//!
//! `npybridge-python` provides the PyO3 host and the process-wide bridge.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod check;
pub mod config;
pub mod error;
pub mod host;
pub mod table;
pub mod version;

pub use bridge::Bridge;
pub use config::{ConfigError, HostLayout, ImportConfig};
pub use error::{HostError, ImportError, InitError};
pub use host::Host;
pub use table::{probe_runtime, ApiKind, ApiTables, ArrayApi, TablePtr, UfuncApi};
pub use version::{AbiVersion, Endianness, FeatureVersion, RuntimeVersions};
