//! The interpreter seam.
//!
//! [`Host`] is the minimal set of interpreter operations the importer needs.
//! `npybridge-python` implements it over PyO3; tests implement it with
//! in-memory modules.

use std::ffi::c_void;

use crate::error::HostError;
use crate::table::TablePtr;
use crate::version::RuntimeVersions;

/// Interpreter operations used during table import.
pub trait Host {
    /// Handle to an imported module.
    type Module;

    /// Import `name`. A missing module must be reported as
    /// [`HostError::ModuleNotFound`] so the importer can fall back, and the
    /// host must leave no pending interpreter error behind in that case.
    fn import_module(&self, name: &str) -> Result<Self::Module, HostError>;

    /// Fetch attribute `attr` from `module`, check that it is exactly a
    /// capsule, and return its unnamed payload (possibly null).
    fn capsule_pointer(&self, module: &Self::Module, attr: &str) -> Result<*mut c_void, HostError>;

    /// Read the runtime version markers from a non-null array table.
    fn runtime_versions(&self, table: TablePtr) -> RuntimeVersions;
}

impl<H: Host + ?Sized> Host for &H {
    type Module = H::Module;

    fn import_module(&self, name: &str) -> Result<Self::Module, HostError> {
        (**self).import_module(name)
    }

    fn capsule_pointer(&self, module: &Self::Module, attr: &str) -> Result<*mut c_void, HostError> {
        (**self).capsule_pointer(module, attr)
    }

    fn runtime_versions(&self, table: TablePtr) -> RuntimeVersions {
        (**self).runtime_versions(table)
    }
}
