//! PyO3 host and process-wide NumPy C-API bridge.
//!
//! Native extensions link this crate and call [`ensure_initialized`] from
//! their module init; afterwards [`tables`] hands out the array and ufunc
//! function tables. The crate also builds the `_npybridge` extension, which
//! performs the same initialization on import and exposes what it found.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(unsafe_code)]

use numpy::PyArray1;
use pyo3::prelude::*;

mod error;
mod global;
mod host;

pub use global::{bridge, ensure_initialized, tables, try_ensure_initialized};
pub use host::PythonHost;

/// Initialize the tables (no-op after the first success).
#[pyfunction]
#[pyo3(name = "ensure_initialized")]
fn py_ensure_initialized(py: Python<'_>) -> PyResult<()> {
    ensure_initialized(py).map(|_| ())
}

/// Whether both tables have been published.
#[pyfunction]
fn is_initialized() -> bool {
    bridge().is_initialized()
}

/// Runtime feature version, or `None` before initialization.
#[pyfunction]
fn runtime_feature_version() -> Option<u32> {
    tables().map(|t| t.runtime_feature_version().0)
}

/// Runtime ABI version, or `None` before initialization.
#[pyfunction]
fn runtime_abi_version() -> Option<u32> {
    tables().map(|t| t.array().runtime().abi.0)
}

/// `[abi, feature, endianness]` as a `uint32` array.
#[pyfunction]
fn runtime_info(py: Python<'_>) -> PyResult<Bound<'_, PyArray1<u32>>> {
    let tables = ensure_initialized(py)?;
    let runtime = tables.array().runtime();
    Ok(PyArray1::from_vec(
        py,
        vec![runtime.abi.0, runtime.feature.0, runtime.endianness as u32],
    ))
}

/// `(compiled_abi, min_runtime_abi, compiled_feature, endianness)` this
/// build validates against.
#[pyfunction]
fn compiled_versions() -> (u32, u32, u32, String) {
    let cfg = bridge().config();
    (
        cfg.compiled_abi.0,
        cfg.min_runtime_abi.0,
        cfg.compiled_feature.0,
        cfg.target_endianness.to_string(),
    )
}

/// The native `_npybridge` extension module.
#[pymodule]
fn _npybridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Fail the import outright if NumPy is missing or incompatible.
    ensure_initialized(m.py())?;

    m.add_function(wrap_pyfunction!(py_ensure_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(is_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(runtime_feature_version, m)?)?;
    m.add_function(wrap_pyfunction!(runtime_abi_version, m)?)?;
    m.add_function(wrap_pyfunction!(runtime_info, m)?)?;
    m.add_function(wrap_pyfunction!(compiled_versions, m)?)?;
    Ok(())
}
