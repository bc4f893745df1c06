//! Bridge profiles for benchmarking.
//!
//! - [`numpy2_bridge`]: a NumPy 2.x layout, resolved from the primary module
//! - [`legacy_bridge`]: a NumPy 1.x layout, resolved through the fallback
//! - [`warm`]: initialize a bridge so only the fast path remains

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use npybridge_core::{ApiTables, Bridge, InitError};
use npybridge_test_utils::MockHost;

/// A fresh bridge over a NumPy 2.x mock host.
pub fn numpy2_bridge() -> Bridge<MockHost> {
    Bridge::with_default_config(MockHost::numpy2())
}

/// A fresh bridge over a NumPy 1.x mock host (legacy module only).
pub fn legacy_bridge() -> Bridge<MockHost> {
    Bridge::with_default_config(MockHost::numpy1())
}

/// Run the first initialization so later calls take the fast path.
pub fn warm(bridge: &Bridge<MockHost>) -> Result<&ApiTables, InitError> {
    bridge.ensure_initialized()
}
