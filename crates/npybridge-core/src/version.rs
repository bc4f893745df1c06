//! NumPy ABI and feature version markers, and the runtime byte order.
//!
//! NumPy publishes two independent compatibility markers through its array
//! API table: the *ABI version* (`NPY_ABI_VERSION`, bumped only when the
//! binary layout breaks) and the *feature version* (`NPY_x_y_API_VERSION`,
//! bumped whenever new entry points are appended to the tables).

use std::fmt;

/// Binary-interface version reported by `PyArray_GetNDArrayCVersion()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbiVersion(pub u32);

impl AbiVersion {
    /// ABI of every NumPy 1.x release since 1.0.
    pub const NUMPY_1: Self = Self(0x0100_0009);
    /// ABI introduced with NumPy 2.0.
    pub const NUMPY_2: Self = Self(0x0200_0000);

    /// Major ABI generation (the top byte).
    pub const fn major(self) -> u32 {
        self.0 >> 24
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Feature (C-API) version reported by `PyArray_GetNDArrayCFeatureVersion()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureVersion(pub u32);

/// First NumPy release exposing each feature version.
const RELEASES: &[(u32, &str)] = &[
    (0x07, "1.7"),
    (0x08, "1.8"),
    (0x09, "1.9"),
    (0x0a, "1.10"),
    (0x0b, "1.13"),
    (0x0c, "1.14"),
    (0x0d, "1.16"),
    (0x0e, "1.20"),
    (0x0f, "1.22"),
    (0x10, "1.23"),
    (0x11, "1.25"),
    (0x12, "2.0"),
    (0x13, "2.1"),
    (0x14, "2.3"),
];

impl FeatureVersion {
    /// `NPY_1_19_API_VERSION`, the default build target of NumPy 2.x headers.
    pub const NUMPY_1_19: Self = Self(0x0d);
    /// `NPY_2_0_API_VERSION`.
    pub const NUMPY_2_0: Self = Self(0x12);

    /// The first NumPy release that exposes this feature version, if known.
    pub fn release(self) -> Option<&'static str> {
        RELEASES
            .iter()
            .find(|(v, _)| *v == self.0)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for FeatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)?;
        if let Some(release) = self.release() {
            write!(f, " (NumPy >= {release})")?;
        }
        Ok(())
    }
}

/// CPU byte order as reported by `PyArray_GetEndianness()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Endianness {
    /// `NPY_CPU_UNKNOWN_ENDIAN`.
    Unknown = 0,
    /// `NPY_CPU_LITTLE`.
    Little = 1,
    /// `NPY_CPU_BIG`.
    Big = 2,
}

impl Endianness {
    /// Decode the integer returned by the runtime. Out-of-range values
    /// are treated as unknown.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Little,
            2 => Self::Big,
            _ => Self::Unknown,
        }
    }

    /// Byte order this crate was compiled for.
    pub const fn target() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown endian"),
            Self::Little => write!(f, "little endian"),
            Self::Big => write!(f, "big endian"),
        }
    }
}

/// Version markers read from a live array API table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeVersions {
    /// Runtime ABI version.
    pub abi: AbiVersion,
    /// Runtime feature version.
    pub feature: FeatureVersion,
    /// Runtime byte order.
    pub endianness: Endianness,
}

impl RuntimeVersions {
    /// Markers of a NumPy 2.0 runtime on the compilation target.
    pub const fn numpy2() -> Self {
        Self {
            abi: AbiVersion::NUMPY_2,
            feature: FeatureVersion::NUMPY_2_0,
            endianness: Endianness::target(),
        }
    }
}
