//! End-to-end initialization against scripted hosts.
//!
//! Each test builds a [`MockHost`] describing one NumPy install and drives
//! a fresh [`Bridge`] through `ensure_initialized` or the individual import
//! steps.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use npybridge_core::config::{ARRAY_CAPSULE, LEGACY_MODULE, PRIMARY_MODULE, UFUNC_CAPSULE};
use npybridge_core::{
    probe_runtime, AbiVersion, ApiKind, Bridge, Endianness, FeatureVersion, HostLayout,
    ImportConfig, ImportError, RuntimeVersions,
};
use npybridge_test_utils::{FakeTable, MockAttr, MockHost, MockModule};

// ── Helpers ─────────────────────────────────────────────────────

fn opposite_endianness() -> Endianness {
    match Endianness::target() {
        Endianness::Little => Endianness::Big,
        _ => Endianness::Little,
    }
}

// ── Success paths ───────────────────────────────────────────────

#[test]
fn valid_host_initializes_once() {
    let host = MockHost::numpy2();
    let array = host.table(PRIMARY_MODULE, ARRAY_CAPSULE).unwrap();
    let ufunc = host.table(PRIMARY_MODULE, UFUNC_CAPSULE).unwrap();
    let bridge = Bridge::with_default_config(host);

    let tables = bridge.ensure_initialized().unwrap();
    assert_eq!(tables.array().table().addr(), array.addr());
    assert_eq!(tables.ufunc().table().addr(), ufunc.addr());
    assert_eq!(tables.runtime_feature_version(), FeatureVersion::NUMPY_2_0);
    assert_eq!(bridge.attempts(), 1);
    let imports_after_first = bridge.host().import_count();

    for _ in 0..5 {
        let again = bridge.ensure_initialized().unwrap();
        assert_eq!(again, tables);
    }
    assert_eq!(bridge.attempts(), 1);
    assert_eq!(bridge.host().import_count(), imports_after_first);
}

#[test]
fn individual_imports_are_noops_after_init() {
    let bridge = Bridge::with_default_config(MockHost::numpy2());
    bridge.ensure_initialized().unwrap();
    let lookups = bridge.host().capsule_lookups();

    let array = bridge.import_array_api().unwrap();
    let ufunc = bridge.import_ufunc_api().unwrap();
    assert_eq!(&array, bridge.get().unwrap().array());
    assert_eq!(&ufunc, bridge.get().unwrap().ufunc());
    assert_eq!(bridge.host().capsule_lookups(), lookups);
}

#[test]
fn missing_primary_falls_back_to_legacy() {
    let bridge = Bridge::with_default_config(MockHost::numpy1());
    let tables = bridge.ensure_initialized().unwrap();
    assert_eq!(tables.array().runtime().abi, AbiVersion::NUMPY_1);
    assert_eq!(tables.runtime_feature_version(), FeatureVersion(0x11));

    let imports = bridge.host().imports();
    assert_eq!(imports[0], PRIMARY_MODULE);
    assert_eq!(imports[1], LEGACY_MODULE);
}

#[test]
fn resolve_module_prefers_primary() {
    let host = MockHost::numpy2().with_module(LEGACY_MODULE, MockModule::numpy());
    let bridge = Bridge::with_default_config(host);
    assert_eq!(bridge.resolve_module().unwrap(), PRIMARY_MODULE);
    assert_eq!(bridge.host().imports(), vec![PRIMARY_MODULE.to_owned()]);
}

#[test]
fn custom_module_names_are_honored() {
    let cfg = ImportConfig {
        primary_module: "fakenp.core".into(),
        legacy_module: "fakenp.old".into(),
        ..ImportConfig::default()
    };
    let host = MockHost::empty().with_module("fakenp.old", MockModule::numpy());
    let bridge = Bridge::new(host, cfg).unwrap();
    bridge.ensure_initialized().unwrap();
    assert_eq!(bridge.host().imports()[0], "fakenp.core");
}

#[test]
fn fake_array_table_probes_as_numpy2() {
    let runtime = unsafe { probe_runtime(FakeTable::numpy2_array().table_ptr()) };
    assert_eq!(runtime, RuntimeVersions::numpy2());
}

// ── Module failures ─────────────────────────────────────────────

#[test]
fn no_module_at_all_is_module_unavailable() {
    let bridge = Bridge::with_default_config(MockHost::empty());
    let err = bridge.ensure_initialized().unwrap_err();
    assert_eq!(err.kind, ApiKind::Array);
    assert!(matches!(err.source, ImportError::ModuleUnavailable { .. }));
    assert!(err.to_string().contains("_multiarray_umath failed to import"));
    assert!(bridge.get().is_none());
}

#[test]
fn broken_legacy_module_is_module_import() {
    let host = MockHost::empty().with_module(
        LEGACY_MODULE,
        MockModule::Broken("RuntimeError: compiled with a different Python".into()),
    );
    let bridge = Bridge::with_default_config(host);
    let err = bridge.resolve_module().unwrap_err();
    assert_eq!(
        err,
        ImportError::ModuleImport {
            module: LEGACY_MODULE.into(),
            reason: "RuntimeError: compiled with a different Python".into(),
        }
    );
}

// ── Capsule failures ────────────────────────────────────────────

#[test]
fn non_capsule_attribute_is_type_mismatch() {
    let host = MockHost::numpy2().with_attr(
        PRIMARY_MODULE,
        ARRAY_CAPSULE,
        MockAttr::Object("dict".into()),
    );
    let bridge = Bridge::with_default_config(host);
    let err = bridge.ensure_initialized().unwrap_err();
    assert_eq!(
        err.source,
        ImportError::NotACapsule {
            attr: ARRAY_CAPSULE.into(),
            type_name: "dict".into(),
        }
    );
    assert!(!bridge.is_initialized());
    assert!(bridge.get().is_none());
}

#[test]
fn null_capsule_is_rejected() {
    let host = MockHost::numpy2().with_attr(PRIMARY_MODULE, UFUNC_CAPSULE, MockAttr::NullCapsule);
    let bridge = Bridge::with_default_config(host);
    let err = bridge.ensure_initialized().unwrap_err();
    assert_eq!(err.kind, ApiKind::Ufunc);
    assert_eq!(
        err.to_string(),
        "Failed to initialize NumPy ufunc C-API: _UFUNC_API is NULL pointer"
    );
    // The array table was valid but must not leak out on its own.
    assert!(bridge.get().is_none());
}

#[test]
fn missing_ufunc_capsule_names_attribute() {
    let host = MockHost::numpy2().without_attr(PRIMARY_MODULE, UFUNC_CAPSULE);
    let bridge = Bridge::with_default_config(host);
    let err = bridge.import_ufunc_api().unwrap_err();
    assert_eq!(
        err,
        ImportError::AttributeMissing {
            module: PRIMARY_MODULE.into(),
            attr: UFUNC_CAPSULE.into(),
        }
    );
    assert!(err.to_string().starts_with("_UFUNC_API not found"));
}

// ── Compatibility failures ──────────────────────────────────────

#[test]
fn compiled_abi_exceeding_unsupported_runtime_fails() {
    let host = MockHost::numpy2().with_runtime(RuntimeVersions {
        abi: AbiVersion(0x0100_0008),
        ..RuntimeVersions::numpy2()
    });
    let bridge = Bridge::with_default_config(host);
    let err = bridge.ensure_initialized().unwrap_err();
    assert!(matches!(
        err.source,
        ImportError::UnsupportedRuntimeAbi {
            compiled: AbiVersion::NUMPY_2,
            ..
        }
    ));
    assert!(err.source.is_compatibility());
}

#[test]
fn runtime_abi_newer_than_build_fails() {
    let cfg = ImportConfig {
        compiled_abi: AbiVersion::NUMPY_1,
        ..ImportConfig::default()
    };
    let bridge = Bridge::new(MockHost::numpy2(), cfg).unwrap();
    let err = bridge.import_array_api().unwrap_err();
    assert_eq!(
        err,
        ImportError::AbiMismatch {
            compiled: AbiVersion::NUMPY_1,
            runtime: AbiVersion::NUMPY_2,
        }
    );
}

#[test]
fn host_layout_reaches_pointer_width_check() {
    let mixed = HostLayout::new(4, 8);

    let bridge = Bridge::with_layout(MockHost::numpy1(), mixed);
    assert_eq!(bridge.config().layout, mixed);
    let err = bridge.ensure_initialized().unwrap_err();
    assert_eq!(err.kind, ApiKind::Array);
    assert!(matches!(
        err.source,
        ImportError::PointerWidth {
            ssize_width: 4,
            intptr_width: 8,
            ..
        }
    ));

    // A 2.x runtime does not care about the widths.
    let bridge = Bridge::with_layout(MockHost::numpy2(), mixed);
    assert!(bridge.ensure_initialized().is_ok());
}

#[test]
fn old_feature_version_fails() {
    let cfg = ImportConfig {
        compiled_feature: FeatureVersion::NUMPY_2_0,
        ..ImportConfig::default()
    };
    let bridge = Bridge::new(MockHost::numpy1(), cfg).unwrap();
    let err = bridge.ensure_initialized().unwrap_err();
    assert!(matches!(
        err.source,
        ImportError::FeatureMismatch {
            compiled: FeatureVersion::NUMPY_2_0,
            runtime: FeatureVersion(0x11),
        }
    ));
    assert!(err.to_string().contains("NumPy C-API version 0x12"));
}

#[test]
fn endianness_mismatch_fails() {
    let host = MockHost::numpy2().with_runtime(RuntimeVersions {
        endianness: opposite_endianness(),
        ..RuntimeVersions::numpy2()
    });
    let bridge = Bridge::with_default_config(host);
    let err = bridge.ensure_initialized().unwrap_err();
    assert!(matches!(
        err.source,
        ImportError::EndiannessMismatch { .. }
    ));
    assert!(err.to_string().contains("detected different endianness"));
}

#[test]
fn unknown_runtime_endianness_fails() {
    let host = MockHost::numpy2().with_runtime(RuntimeVersions {
        endianness: Endianness::Unknown,
        ..RuntimeVersions::numpy2()
    });
    let bridge = Bridge::with_default_config(host);
    let err = bridge.ensure_initialized().unwrap_err();
    assert_eq!(err.source, ImportError::UnknownEndianness);
}

#[test]
fn failures_are_not_cached() {
    let bridge = Bridge::with_default_config(MockHost::empty());
    assert!(bridge.ensure_initialized().is_err());
    assert!(bridge.ensure_initialized().is_err());
    assert_eq!(bridge.attempts(), 2);
}

// ── Concurrency ─────────────────────────────────────────────────

#[test]
fn concurrent_first_touch_runs_slow_path_once() {
    let host = MockHost::numpy2().with_import_delay(Duration::from_millis(20));
    let bridge = Arc::new(Bridge::with_default_config(host));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || bridge.ensure_initialized().map(|t| *t).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(bridge.attempts(), 1);
    // One import per table on the winning thread.
    assert_eq!(bridge.host().import_count(), 2);
}
