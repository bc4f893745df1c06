//! PythonHost: the PyO3 implementation of [`Host`].
//!
//! Every method attaches to the interpreter for the duration of one call
//! only, so the importer can hold its init mutex without holding the GIL.

use std::ffi::c_void;
use std::ptr;

use pyo3::exceptions::{PyAttributeError, PyModuleNotFoundError};
use pyo3::prelude::*;
use pyo3::types::PyCapsule;

use npybridge_core::{probe_runtime, Host, HostError, HostLayout, RuntimeVersions, TablePtr};

/// Imports modules and reads capsules through the embedding interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct PythonHost;

impl PythonHost {
    /// Widths of `Py_ssize_t` and `Py_intptr_t` as the interpreter
    /// headers define them.
    pub fn layout() -> HostLayout {
        HostLayout::new(
            size_of::<pyo3::ffi::Py_ssize_t>(),
            size_of::<*const c_void>(),
        )
    }
}

impl Host for PythonHost {
    type Module = Py<PyModule>;

    fn import_module(&self, name: &str) -> Result<Self::Module, HostError> {
        Python::attach(|py| match py.import(name) {
            Ok(module) => Ok(module.unbind()),
            // The PyErr is consumed here, which clears it from the
            // interpreter before any fallback import.
            Err(err) if err.is_instance_of::<PyModuleNotFoundError>(py) => {
                tracing::debug!(module = name, error = %err, "module not found");
                Err(HostError::ModuleNotFound {
                    module: name.to_owned(),
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(HostError::ImportFailed {
                module: name.to_owned(),
                reason: err.to_string(),
            }),
        })
    }

    fn capsule_pointer(&self, module: &Self::Module, attr: &str) -> Result<*mut c_void, HostError> {
        Python::attach(|py| {
            let obj = match module.bind(py).getattr(attr) {
                Ok(obj) => obj,
                Err(err) if err.is_instance_of::<PyAttributeError>(py) => {
                    return Err(HostError::AttributeMissing {
                        attr: attr.to_owned(),
                    })
                }
                Err(err) => {
                    return Err(HostError::Failed {
                        reason: err.to_string(),
                    })
                }
            };

            if !obj.is_exact_instance_of::<PyCapsule>() {
                let type_name = obj
                    .get_type()
                    .name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|_| "<unknown>".to_owned());
                return Err(HostError::NotACapsule {
                    attr: attr.to_owned(),
                    type_name,
                });
            }

            // SAFETY: `obj` is an exact capsule kept alive by the bound
            // reference; NumPy's capsules are unnamed, so a null name
            // matches.
            let raw = unsafe { pyo3::ffi::PyCapsule_GetPointer(obj.as_ptr(), ptr::null()) };
            if raw.is_null() {
                // A name mismatch sets ValueError; the caller reports the
                // null payload instead.
                if let Some(err) = PyErr::take(py) {
                    tracing::debug!(attr, error = %err, "cleared capsule lookup error");
                }
            }
            Ok(raw)
        })
    }

    fn runtime_versions(&self, table: TablePtr) -> RuntimeVersions {
        // SAFETY: `table` came from NumPy's `_ARRAY_API` capsule, which is
        // far longer than the version slots and fixes their signatures.
        unsafe { probe_runtime(table) }
    }
}
