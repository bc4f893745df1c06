//! InitError -> Python exception mapping.

use pyo3::exceptions::{PyAttributeError, PyImportError, PyRuntimeError, PyTypeError};
use pyo3::PyErr;

use npybridge_core::{ImportError, InitError};

/// Python exception class raised for each import failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExceptionKind {
    Import,
    Attribute,
    Type,
    Runtime,
}

pub(crate) fn exception_kind(err: &ImportError) -> ExceptionKind {
    match err {
        ImportError::ModuleUnavailable { .. } | ImportError::ModuleImport { .. } => {
            ExceptionKind::Import
        }
        ImportError::AttributeMissing { .. } => ExceptionKind::Attribute,
        ImportError::NotACapsule { .. } => ExceptionKind::Type,
        // Null payloads, failed compatibility checks, and host failures
        // are all unrecoverable runtime conditions.
        _ => ExceptionKind::Runtime,
    }
}

/// Convert an initialization failure into the exception module init raises.
pub(crate) fn init_error_to_pyerr(err: &InitError) -> PyErr {
    let msg = err.to_string();
    match exception_kind(&err.source) {
        ExceptionKind::Import => PyImportError::new_err(msg),
        ExceptionKind::Attribute => PyAttributeError::new_err(msg),
        ExceptionKind::Type => PyTypeError::new_err(msg),
        ExceptionKind::Runtime => PyRuntimeError::new_err(msg),
    }
}
