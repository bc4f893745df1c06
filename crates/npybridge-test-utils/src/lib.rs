//! Test utilities and mock hosts for npybridge development.
//!
//! [`MockHost`] is an in-memory interpreter: a map of module names to
//! scripted modules whose attributes are capsules over [`FakeTable`]s, plain
//! objects, or nothing at all. It records every import so tests can assert
//! on fallback order and idempotence without a Python interpreter.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;
use std::ffi::{c_int, c_uint, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use npybridge_core::config::{ARRAY_CAPSULE, LEGACY_MODULE, PRIMARY_MODULE, UFUNC_CAPSULE};
use npybridge_core::table::slots;
use npybridge_core::{
    AbiVersion, Endianness, FeatureVersion, Host, HostError, RuntimeVersions, TablePtr,
};

// ── FakeTable ──────────────────────────────────────────────────────

/// A leaked, zero-filled function table.
///
/// Leaking matches the real tables, which outlive every reader. Each
/// constructor call leaks a new table; hosts built in a loop should use
/// [`FakeTable::shared_numpy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakeTable {
    addr: usize,
    len: usize,
}

extern "C" fn numpy2_abi() -> c_uint {
    AbiVersion::NUMPY_2.0
}

extern "C" fn numpy2_feature() -> c_uint {
    FeatureVersion::NUMPY_2_0.0
}

extern "C" fn target_endianness() -> c_int {
    Endianness::target() as c_int
}

impl FakeTable {
    /// A table of `len` null entries.
    pub fn new(len: usize) -> Self {
        let entries: &'static mut [*const c_void] =
            Box::leak(vec![std::ptr::null::<c_void>(); len].into_boxed_slice());
        Self {
            addr: entries.as_mut_ptr() as usize,
            len,
        }
    }

    /// An array table whose version slots report a NumPy 2.0 runtime on the
    /// compilation target.
    pub fn numpy2_array() -> Self {
        let entries: &'static mut [*const c_void] = Box::leak(
            vec![std::ptr::null::<c_void>(); slots::MIN_ARRAY_TABLE_LEN].into_boxed_slice(),
        );
        entries[slots::GET_NDARRAY_C_VERSION] = numpy2_abi as *const c_void;
        entries[slots::GET_NDARRAY_C_FEATURE_VERSION] = numpy2_feature as *const c_void;
        entries[slots::GET_ENDIANNESS] = target_endianness as *const c_void;
        Self {
            addr: entries.as_mut_ptr() as usize,
            len: slots::MIN_ARRAY_TABLE_LEN,
        }
    }

    /// The `(array, ufunc)` pair behind every [`MockModule::numpy`],
    /// allocated once per process.
    pub fn shared_numpy() -> (Self, Self) {
        static SHARED: OnceLock<(FakeTable, FakeTable)> = OnceLock::new();
        *SHARED.get_or_init(|| (Self::numpy2_array(), Self::new(64)))
    }

    /// Raw capsule payload.
    pub fn as_ptr(&self) -> *mut c_void {
        self.addr as *mut c_void
    }

    /// Address of the first entry.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The table as a validated pointer.
    pub fn table_ptr(&self) -> TablePtr {
        // A leaked allocation is never null, even for zero entries.
        TablePtr::new(self.as_ptr()).expect("leaked table is non-null")
    }
}

// ── MockModule ─────────────────────────────────────────────────────

/// What a module attribute resolves to.
#[derive(Clone, Debug)]
pub enum MockAttr {
    /// A capsule whose payload is the given table.
    Capsule(FakeTable),
    /// A capsule with a null payload.
    NullCapsule,
    /// Some other object, described by its type name.
    Object(String),
}

/// How importing a module behaves.
#[derive(Clone, Debug)]
pub enum MockModule {
    /// Raises `ModuleNotFoundError`.
    Missing,
    /// Raises some other exception while importing.
    Broken(String),
    /// Imports, exposing the given attributes.
    Present(HashMap<String, MockAttr>),
}

impl MockModule {
    /// A module exposing both capsules over the shared tables.
    pub fn numpy() -> Self {
        let (array, ufunc) = FakeTable::shared_numpy();
        let mut attrs = HashMap::new();
        attrs.insert(ARRAY_CAPSULE.to_owned(), MockAttr::Capsule(array));
        attrs.insert(UFUNC_CAPSULE.to_owned(), MockAttr::Capsule(ufunc));
        Self::Present(attrs)
    }
}

// ── MockHost ───────────────────────────────────────────────────────

/// Scripted [`Host`] backed by in-memory modules.
pub struct MockHost {
    modules: HashMap<String, MockModule>,
    runtime: RuntimeVersions,
    import_delay: Option<Duration>,
    imports: Mutex<Vec<String>>,
    capsule_lookups: AtomicUsize,
}

impl MockHost {
    /// A host where every import fails with `ModuleNotFoundError`.
    pub fn empty() -> Self {
        Self {
            modules: HashMap::new(),
            runtime: RuntimeVersions::numpy2(),
            import_delay: None,
            imports: Mutex::new(Vec::new()),
            capsule_lookups: AtomicUsize::new(0),
        }
    }

    /// A NumPy 2.x install: the primary module exposes both capsules.
    pub fn numpy2() -> Self {
        Self::empty().with_module(PRIMARY_MODULE, MockModule::numpy())
    }

    /// A NumPy 1.x install: only the legacy module exists.
    pub fn numpy1() -> Self {
        Self::empty()
            .with_module(LEGACY_MODULE, MockModule::numpy())
            .with_runtime(RuntimeVersions {
                abi: AbiVersion::NUMPY_1,
                feature: FeatureVersion(0x11),
                endianness: Endianness::target(),
            })
    }

    /// Register or replace a module.
    pub fn with_module(mut self, name: &str, module: MockModule) -> Self {
        self.modules.insert(name.to_owned(), module);
        self
    }

    /// Set one attribute on a present module, creating the module if needed.
    pub fn with_attr(mut self, module: &str, attr: &str, value: MockAttr) -> Self {
        let entry = self
            .modules
            .entry(module.to_owned())
            .or_insert_with(|| MockModule::Present(HashMap::new()));
        match entry {
            MockModule::Present(attrs) => {
                attrs.insert(attr.to_owned(), value);
            }
            other => {
                let mut attrs = HashMap::new();
                attrs.insert(attr.to_owned(), value);
                *other = MockModule::Present(attrs);
            }
        }
        self
    }

    /// Remove an attribute from a present module.
    pub fn without_attr(mut self, module: &str, attr: &str) -> Self {
        if let Some(MockModule::Present(attrs)) = self.modules.get_mut(module) {
            attrs.remove(attr);
        }
        self
    }

    /// Versions reported for any array table.
    pub fn with_runtime(mut self, runtime: RuntimeVersions) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sleep inside every import, widening race windows.
    pub fn with_import_delay(mut self, delay: Duration) -> Self {
        self.import_delay = Some(delay);
        self
    }

    /// Every module name passed to `import_module`, in call order.
    pub fn imports(&self) -> Vec<String> {
        self.imports.lock().unwrap().clone()
    }

    /// Number of `import_module` calls.
    pub fn import_count(&self) -> usize {
        self.imports.lock().unwrap().len()
    }

    /// Number of `capsule_pointer` calls.
    pub fn capsule_lookups(&self) -> usize {
        self.capsule_lookups.load(Ordering::SeqCst)
    }

    /// The table behind a capsule attribute, if it is one.
    pub fn table(&self, module: &str, attr: &str) -> Option<FakeTable> {
        match self.modules.get(module)? {
            MockModule::Present(attrs) => match attrs.get(attr)? {
                MockAttr::Capsule(t) => Some(*t),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::numpy2()
    }
}

impl Host for MockHost {
    type Module = String;

    fn import_module(&self, name: &str) -> Result<String, HostError> {
        self.imports.lock().unwrap().push(name.to_owned());
        if let Some(delay) = self.import_delay {
            thread::sleep(delay);
        }
        match self.modules.get(name) {
            None | Some(MockModule::Missing) => Err(HostError::ModuleNotFound {
                module: name.to_owned(),
                reason: format!("No module named '{name}'"),
            }),
            Some(MockModule::Broken(reason)) => Err(HostError::ImportFailed {
                module: name.to_owned(),
                reason: reason.clone(),
            }),
            Some(MockModule::Present(_)) => Ok(name.to_owned()),
        }
    }

    fn capsule_pointer(&self, module: &String, attr: &str) -> Result<*mut c_void, HostError> {
        self.capsule_lookups.fetch_add(1, Ordering::SeqCst);
        let attrs = match self.modules.get(module) {
            Some(MockModule::Present(attrs)) => attrs,
            _ => {
                return Err(HostError::Failed {
                    reason: format!("module '{module}' was never imported"),
                })
            }
        };
        match attrs.get(attr) {
            None => Err(HostError::AttributeMissing {
                attr: attr.to_owned(),
            }),
            Some(MockAttr::Capsule(table)) => Ok(table.as_ptr()),
            Some(MockAttr::NullCapsule) => Ok(std::ptr::null_mut()),
            Some(MockAttr::Object(type_name)) => Err(HostError::NotACapsule {
                attr: attr.to_owned(),
                type_name: type_name.clone(),
            }),
        }
    }

    fn runtime_versions(&self, _table: TablePtr) -> RuntimeVersions {
        self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numpy2_host_imports_primary_only() {
        let host = MockHost::numpy2();
        assert!(host.import_module(PRIMARY_MODULE).is_ok());
        assert!(matches!(
            host.import_module(LEGACY_MODULE),
            Err(HostError::ModuleNotFound { .. })
        ));
        assert_eq!(host.import_count(), 2);
    }

    #[test]
    fn capsule_attr_returns_table_address() {
        let host = MockHost::numpy2();
        let module = host.import_module(PRIMARY_MODULE).unwrap();
        let ptr = host.capsule_pointer(&module, ARRAY_CAPSULE).unwrap();
        let table = host.table(PRIMARY_MODULE, ARRAY_CAPSULE).unwrap();
        assert_eq!(ptr as usize, table.addr());
        assert_eq!(table.len(), slots::MIN_ARRAY_TABLE_LEN);
    }

    #[test]
    fn numpy_modules_share_tables() {
        let first = MockHost::numpy2();
        let second = MockHost::numpy1();
        for attr in [ARRAY_CAPSULE, UFUNC_CAPSULE] {
            let a = first.table(PRIMARY_MODULE, attr).unwrap();
            let b = second.table(LEGACY_MODULE, attr).unwrap();
            assert_eq!(a, b, "{attr}");
        }
        let (array, ufunc) = FakeTable::shared_numpy();
        assert_ne!(array.addr(), ufunc.addr());
        assert_eq!(array.len(), slots::MIN_ARRAY_TABLE_LEN);
    }

    #[test]
    fn with_attr_replaces_missing_module() {
        let host = MockHost::empty()
            .with_module(PRIMARY_MODULE, MockModule::Missing)
            .with_attr(PRIMARY_MODULE, ARRAY_CAPSULE, MockAttr::Object("int".into()));
        let module = host.import_module(PRIMARY_MODULE).unwrap();
        assert!(matches!(
            host.capsule_pointer(&module, ARRAY_CAPSULE),
            Err(HostError::NotACapsule { .. })
        ));
    }
}
