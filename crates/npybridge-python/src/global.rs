//! The process-wide bridge.
//!
//! One [`Bridge`] per process, created on first access. Waiting on its init
//! mutex always happens with the GIL released (`py.detach`), and the host
//! re-attaches only inside individual calls, so a thread holding the GIL
//! never blocks a thread that is mid-import.

use std::sync::OnceLock;

use pyo3::prelude::*;

use npybridge_core::{ApiTables, Bridge, InitError};

use crate::error::init_error_to_pyerr;
use crate::host::PythonHost;

static BRIDGE: OnceLock<Bridge<PythonHost>> = OnceLock::new();

/// The process-wide bridge.
pub fn bridge() -> &'static Bridge<PythonHost> {
    BRIDGE.get_or_init(|| Bridge::with_layout(PythonHost, PythonHost::layout()))
}

/// The published tables, without attempting initialization.
pub fn tables() -> Option<&'static ApiTables> {
    bridge().get()
}

/// Initialize both tables from a thread that holds the GIL.
///
/// Extensions call this from their `#[pymodule]` function; an `Err` should
/// be returned from module init so the import fails.
pub fn ensure_initialized(py: Python<'_>) -> PyResult<&'static ApiTables> {
    let bridge = bridge();
    if let Some(tables) = bridge.get() {
        return Ok(tables);
    }
    py.detach(|| bridge.ensure_initialized())
        .map_err(|e| init_error_to_pyerr(&e))
}

/// Initialize both tables from any thread of a running interpreter,
/// keeping the Rust error.
pub fn try_ensure_initialized() -> Result<&'static ApiTables, InitError> {
    let bridge = bridge();
    if let Some(tables) = bridge.get() {
        return Ok(tables);
    }
    Python::attach(|py| py.detach(|| bridge.ensure_initialized()))
}
