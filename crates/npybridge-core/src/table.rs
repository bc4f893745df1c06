//! Function-table pointers and the published table set.
//!
//! A table is a contiguous array of function pointers owned by the NumPy
//! shared library. It is never allocated or freed here and lives for the
//! rest of the process once the module is imported.

#![allow(unsafe_code)]

use std::ffi::{c_int, c_uint, c_void};
use std::fmt;
use std::ptr::NonNull;

use crate::version::{AbiVersion, Endianness, FeatureVersion, RuntimeVersions};

/// Array API slot indices used during validation.
pub mod slots {
    /// `unsigned int PyArray_GetNDArrayCVersion(void)`.
    pub const GET_NDARRAY_C_VERSION: usize = 0;
    /// `int PyArray_GetEndianness(void)`.
    pub const GET_ENDIANNESS: usize = 210;
    /// `unsigned int PyArray_GetNDArrayCFeatureVersion(void)`.
    pub const GET_NDARRAY_C_FEATURE_VERSION: usize = 211;
    /// Smallest table length that contains every slot above.
    pub const MIN_ARRAY_TABLE_LEN: usize = GET_NDARRAY_C_FEATURE_VERSION + 1;
}

/// Which of the two tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiKind {
    /// `_ARRAY_API`.
    Array,
    /// `_UFUNC_API`.
    Ufunc,
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array => write!(f, "array"),
            Self::Ufunc => write!(f, "ufunc"),
        }
    }
}

/// Non-null pointer to the first entry of a function table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TablePtr(NonNull<*const c_void>);

// SAFETY: the table is immutable memory owned by the host library for the
// whole process; sharing its address across threads is sound.
unsafe impl Send for TablePtr {}
// SAFETY: see above, reads never race with writes.
unsafe impl Sync for TablePtr {}

impl TablePtr {
    /// Wrap a capsule payload. Returns `None` for null.
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw.cast::<*const c_void>()).map(Self)
    }

    /// Pointer to the first table entry, as the C headers type it.
    pub fn as_ptr(self) -> *mut *const c_void {
        self.0.as_ptr()
    }

    /// Address of the table.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Read entry `index`.
    ///
    /// # Safety
    ///
    /// `index` must lie within the table the host published.
    pub unsafe fn slot(self, index: usize) -> *const c_void {
        // SAFETY: caller guarantees `index` is in bounds.
        unsafe { *self.0.as_ptr().add(index) }
    }
}

/// Read the version markers through the array table's own entry points.
///
/// Null slots read as zero, which every compatibility check rejects.
///
/// # Safety
///
/// `table` must point to a live array API table of at least
/// [`slots::MIN_ARRAY_TABLE_LEN`] entries whose non-null entries at the
/// indices in [`slots`] have the documented C signatures.
pub unsafe fn probe_runtime(table: TablePtr) -> RuntimeVersions {
    // SAFETY: forwarded from the caller.
    unsafe {
        let abi = call_uint(table.slot(slots::GET_NDARRAY_C_VERSION));
        let feature = call_uint(table.slot(slots::GET_NDARRAY_C_FEATURE_VERSION));
        let endian = table.slot(slots::GET_ENDIANNESS);
        let endianness = if endian.is_null() {
            Endianness::Unknown
        } else {
            let f: extern "C" fn() -> c_int = std::mem::transmute(endian);
            Endianness::from_raw(f())
        };
        RuntimeVersions {
            abi: AbiVersion(abi),
            feature: FeatureVersion(feature),
            endianness,
        }
    }
}

/// # Safety
///
/// `entry` is null or an `unsigned int (*)(void)`.
unsafe fn call_uint(entry: *const c_void) -> u32 {
    if entry.is_null() {
        return 0;
    }
    // SAFETY: forwarded from the caller.
    let f: extern "C" fn() -> c_uint = unsafe { std::mem::transmute(entry) };
    f()
}

/// A validated array API table and the runtime it was validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayApi {
    table: TablePtr,
    runtime: RuntimeVersions,
}

impl ArrayApi {
    pub(crate) fn new(table: TablePtr, runtime: RuntimeVersions) -> Self {
        Self { table, runtime }
    }

    /// The table pointer.
    pub fn table(&self) -> TablePtr {
        self.table
    }

    /// Versions captured while validating.
    pub fn runtime(&self) -> RuntimeVersions {
        self.runtime
    }

    /// Runtime feature version, used for later feature gating.
    pub fn feature_version(&self) -> FeatureVersion {
        self.runtime.feature
    }
}

/// A validated ufunc API table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UfuncApi {
    table: TablePtr,
}

impl UfuncApi {
    pub(crate) fn new(table: TablePtr) -> Self {
        Self { table }
    }

    /// The table pointer.
    pub fn table(&self) -> TablePtr {
        self.table
    }
}

/// Both tables, published together once every check has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiTables {
    array: ArrayApi,
    ufunc: UfuncApi,
}

impl ApiTables {
    pub(crate) fn new(array: ArrayApi, ufunc: UfuncApi) -> Self {
        Self { array, ufunc }
    }

    /// The array API.
    pub fn array(&self) -> &ArrayApi {
        &self.array
    }

    /// The ufunc API.
    pub fn ufunc(&self) -> &UfuncApi {
        &self.ufunc
    }

    /// Table pointer for `kind`.
    pub fn table(&self, kind: ApiKind) -> TablePtr {
        match kind {
            ApiKind::Array => self.array.table,
            ApiKind::Ufunc => self.ufunc.table,
        }
    }

    /// Runtime feature version captured during the array import.
    pub fn runtime_feature_version(&self) -> FeatureVersion {
        self.array.feature_version()
    }

    /// Whether the runtime exposes at least `required`.
    pub fn supports(&self, required: FeatureVersion) -> bool {
        self.array.feature_version() >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn abi() -> c_uint {
        0x0200_0000
    }

    extern "C" fn feature() -> c_uint {
        0x13
    }

    extern "C" fn big() -> c_int {
        2
    }

    fn table_with(entries: &mut [*const c_void]) -> TablePtr {
        TablePtr::new(entries.as_mut_ptr().cast()).unwrap()
    }

    #[test]
    fn null_payload_is_rejected() {
        assert!(TablePtr::new(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn slot_reads_entry() {
        let mut entries = [std::ptr::null::<c_void>(); 4];
        entries[2] = abi as *const c_void;
        let t = table_with(&mut entries);
        assert_eq!(unsafe { t.slot(2) }, abi as *const c_void);
        assert_eq!(t.addr(), entries.as_ptr() as usize);
    }

    #[test]
    fn probe_calls_version_slots() {
        let mut entries = vec![std::ptr::null::<c_void>(); slots::MIN_ARRAY_TABLE_LEN];
        entries[slots::GET_NDARRAY_C_VERSION] = abi as *const c_void;
        entries[slots::GET_NDARRAY_C_FEATURE_VERSION] = feature as *const c_void;
        entries[slots::GET_ENDIANNESS] = big as *const c_void;
        let runtime = unsafe { probe_runtime(table_with(&mut entries)) };
        assert_eq!(runtime.abi, AbiVersion::NUMPY_2);
        assert_eq!(runtime.feature, FeatureVersion(0x13));
        assert_eq!(runtime.endianness, Endianness::Big);
    }

    #[test]
    fn probe_reads_null_slots_as_zero() {
        let mut entries = vec![std::ptr::null::<c_void>(); slots::MIN_ARRAY_TABLE_LEN];
        let runtime = unsafe { probe_runtime(table_with(&mut entries)) };
        assert_eq!(runtime.abi, AbiVersion(0));
        assert_eq!(runtime.feature, FeatureVersion(0));
        assert_eq!(runtime.endianness, Endianness::Unknown);
    }

    #[test]
    fn tables_gate_on_feature_version() {
        let mut entries = [std::ptr::null::<c_void>(); 1];
        let t = table_with(&mut entries);
        let tables = ApiTables::new(ArrayApi::new(t, RuntimeVersions::numpy2()), UfuncApi::new(t));
        assert!(tables.supports(FeatureVersion::NUMPY_1_19));
        assert!(tables.supports(FeatureVersion::NUMPY_2_0));
        assert!(!tables.supports(FeatureVersion(0x14)));
        assert_eq!(tables.table(ApiKind::Ufunc), t);
    }
}
