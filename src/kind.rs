//! Element kind classification.
//!
//! This module enumerates the closed set of primitive lane kinds a vector
//! can carry and exposes, per kind, its bit width, numeric precision,
//! integral/floating classification and same-width counterpart kinds.
//!
//! The set is fixed at six members. All derived data (lookup tables,
//! cross-width links) is computed exactly once, on first use, from the
//! closed enumeration; the tables are immutable and shared afterwards, so
//! concurrent first access is safe without locking.
//!
//! # Classification Paths
//!
//! - [`classify`] resolves a kind from a runtime type tag (`"i32"`, `"f64"`,
//!   ...) with a masked-hash fast path and a linear-scan fallback.
//! - [`SimdElement`] is the compile-time counterpart: a sealed trait mapping
//!   exactly the six supported primitive types to their kinds.
//! - [`ElementKind::from_ordinal`] and [`ElementKind::from_basic_code`] are
//!   O(1) table lookups keyed by 1-based ordinal and by the composite
//!   basic-type code.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{no_such_conversion, unsupported_kind, Result};

/// Numeric classification of an element kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericClass {
    /// Two's-complement integer lanes.
    Integral,
    /// IEEE 754 binary floating-point lanes.
    Floating,
}

impl fmt::Display for NumericClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericClass::Integral => write!(f, "integral"),
            NumericClass::Floating => write!(f, "floating"),
        }
    }
}

/// One of the six supported primitive element kinds.
///
/// Exactly one kind exists per (bit width, numeric class) pair. Instances
/// are plain `Copy` values; every derived attribute below is a constant
/// lookup, never a computation on the hot path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 32-bit floating point (`f32`).
    Float32,
    /// 64-bit floating point (`f64`).
    Float64,
    /// 8-bit integer (`i8`).
    Int8,
    /// 16-bit integer (`i16`).
    Int16,
    /// 32-bit integer (`i32`).
    Int32,
    /// 64-bit integer (`i64`).
    Int64,
}

/// Size of the masked-hash classification table. Must be a power of two.
const CODE_TABLE_SIZE: usize = 16;

/// Number of kinds plus one; ordinal 0 is reserved as "absent".
const ORDINAL_TABLE_SIZE: usize = 7;

/// One-time lookup tables over the closed kind set.
struct KindTables {
    /// Keyed by [`ElementKind::canonical_code`].
    by_code: [Option<ElementKind>; CODE_TABLE_SIZE],
    /// Keyed by 1-based ordinal; slot 0 stays empty.
    by_ordinal: [Option<ElementKind>; ORDINAL_TABLE_SIZE],
    /// Keyed by the composite basic-type code.
    by_basic_code: [Option<ElementKind>; CODE_TABLE_SIZE],
    /// Same-width integral counterpart, per ordinal-1.
    integral_of: [Option<ElementKind>; 6],
    /// Same-width floating counterpart, per ordinal-1.
    floating_of: [Option<ElementKind>; 6],
}

static TABLES: OnceLock<KindTables> = OnceLock::new();

/// Hashes a type tag into the code-table index space.
///
/// The first and last characters of the closed tag set (`"f32"`, `"f64"`,
/// `"i8"`, `"i16"`, `"i32"`, `"i64"`) disambiguate every member once mixed;
/// collision freedom over the set is asserted at table build.
#[inline(always)]
fn switch_key(tag: &str) -> Option<usize> {
    let bytes = tag.as_bytes();
    let first = *bytes.first()?;
    let last = *bytes.last()?;
    Some(((first ^ (last << 1)) & (CODE_TABLE_SIZE as u8 - 1)) as usize)
}

fn tables() -> &'static KindTables {
    TABLES.get_or_init(|| {
        let mut by_code = [None; CODE_TABLE_SIZE];
        let mut by_ordinal = [None; ORDINAL_TABLE_SIZE];
        let mut by_basic_code = [None; CODE_TABLE_SIZE];
        let mut integral_of = [None; 6];
        let mut floating_of = [None; 6];

        for &kind in &ElementKind::ALL {
            let code = kind.canonical_code() as usize;
            assert!(by_code[code].is_none(), "canonical code collision");
            by_code[code] = Some(kind);

            let ordinal = kind.ordinal();
            assert!(by_ordinal[ordinal].is_none(), "ordinal collision");
            by_ordinal[ordinal] = Some(kind);

            let basic = kind.basic_code();
            assert!(by_basic_code[basic].is_none(), "basic-type code collision");
            by_basic_code[basic] = Some(kind);

            // Cross-width links: the unique same-width kind of the other
            // numeric class, when one exists. Absence is a valid terminal
            // state, not a build defect.
            for &other in &ElementKind::ALL {
                if other.bit_size() != kind.bit_size() || other == kind {
                    continue;
                }
                match other.numeric_class() {
                    NumericClass::Integral => integral_of[ordinal - 1] = Some(other),
                    NumericClass::Floating => floating_of[ordinal - 1] = Some(other),
                }
            }
            if kind.is_integral() {
                integral_of[ordinal - 1] = Some(kind);
            } else {
                floating_of[ordinal - 1] = Some(kind);
            }
        }

        KindTables {
            by_code,
            by_ordinal,
            by_basic_code,
            integral_of,
            floating_of,
        }
    })
}

impl ElementKind {
    /// The closed set, in ordinal order.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Int8,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::Int64,
    ];

    /// Size of one lane of this kind, in bits. Always a power of two.
    #[inline(always)]
    pub const fn bit_size(self) -> usize {
        match self {
            ElementKind::Float32 => 32,
            ElementKind::Float64 => 64,
            ElementKind::Int8 => 8,
            ElementKind::Int16 => 16,
            ElementKind::Int32 => 32,
            ElementKind::Int64 => 64,
        }
    }

    /// Base-2 logarithm of [`bit_size`](Self::bit_size).
    #[inline(always)]
    pub const fn bit_size_log2(self) -> u32 {
        self.bit_size().trailing_zeros()
    }

    /// Significant-value precision in bits.
    ///
    /// For floating kinds this is the significand width including the
    /// implicit bit (24 for `f32`, 53 for `f64`); for integral kinds it
    /// equals the bit size.
    #[inline(always)]
    pub const fn precision_bits(self) -> usize {
        match self {
            ElementKind::Float32 => 24,
            ElementKind::Float64 => 53,
            _ => self.bit_size(),
        }
    }

    /// Integral or floating classification.
    #[inline(always)]
    pub const fn numeric_class(self) -> NumericClass {
        match self {
            ElementKind::Float32 | ElementKind::Float64 => NumericClass::Floating,
            _ => NumericClass::Integral,
        }
    }

    /// `true` for the floating kinds.
    #[inline(always)]
    pub const fn is_floating(self) -> bool {
        matches!(self.numeric_class(), NumericClass::Floating)
    }

    /// `true` for the integral kinds.
    #[inline(always)]
    pub const fn is_integral(self) -> bool {
        matches!(self.numeric_class(), NumericClass::Integral)
    }

    /// The external type tag this kind classifies from.
    #[inline(always)]
    pub const fn tag(self) -> &'static str {
        match self {
            ElementKind::Float32 => "f32",
            ElementKind::Float64 => "f64",
            ElementKind::Int8 => "i8",
            ElementKind::Int16 => "i16",
            ElementKind::Int32 => "i32",
            ElementKind::Int64 => "i64",
        }
    }

    /// 1-based position in the closed set; 0 is reserved as "absent".
    #[inline(always)]
    pub const fn ordinal(self) -> usize {
        match self {
            ElementKind::Float32 => 1,
            ElementKind::Float64 => 2,
            ElementKind::Int8 => 3,
            ElementKind::Int16 => 4,
            ElementKind::Int32 => 5,
            ElementKind::Int64 => 6,
        }
    }

    /// The fast classification key: a deterministic hash of the tag's first
    /// and last characters, unique per kind over the closed set.
    #[inline(always)]
    pub fn canonical_code(self) -> u8 {
        let bytes = self.tag().as_bytes();
        (bytes[0] ^ (bytes[bytes.len() - 1] << 1)) & (CODE_TABLE_SIZE as u8 - 1)
    }

    /// The composite basic-type code: `(bit_size_log2 - 3)` in the low bits,
    /// `0x4` for floating kinds, `0x8` for integral kinds.
    #[inline(always)]
    pub const fn basic_code(self) -> usize {
        let width_part = (self.bit_size_log2() - 3) as usize;
        let class_part = if self.is_floating() { 0x4 } else { 0x8 };
        width_part | class_part
    }

    /// Resolves a kind from its 1-based ordinal.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedKind` for 0 and anything past the closed set.
    #[inline]
    pub fn from_ordinal(ordinal: usize) -> Result<ElementKind> {
        tables()
            .by_ordinal
            .get(ordinal)
            .copied()
            .flatten()
            .ok_or_else(|| unsupported_kind(format!("ordinal {ordinal}")))
    }

    /// Resolves a kind from its composite basic-type code.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedKind` when the code names no kind.
    #[inline]
    pub fn from_basic_code(code: usize) -> Result<ElementKind> {
        tables()
            .by_basic_code
            .get(code)
            .copied()
            .flatten()
            .ok_or_else(|| unsupported_kind(format!("basic code {code}")))
    }

    /// The integral kind sharing this kind's bit width.
    ///
    /// For integral kinds this is the kind itself. Every supported width has
    /// an integral member, so this lookup cannot fail today; the `Result`
    /// keeps the signature symmetric with
    /// [`same_width_floating`](Self::same_width_floating).
    #[inline]
    pub fn same_width_integral(self) -> Result<ElementKind> {
        tables().integral_of[self.ordinal() - 1]
            .ok_or_else(|| no_such_conversion(self, NumericClass::Integral))
    }

    /// The floating kind sharing this kind's bit width.
    ///
    /// # Errors
    ///
    /// Fails with `NoSuchConversion` for the 8- and 16-bit integral kinds,
    /// which have no same-width floating counterpart.
    #[inline]
    pub fn same_width_floating(self) -> Result<ElementKind> {
        tables().floating_of[self.ordinal() - 1]
            .ok_or_else(|| no_such_conversion(self, NumericClass::Floating))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Resolves an element kind from a runtime type tag.
///
/// Fast path: a masked hash of the tag's first and last characters indexes a
/// precomputed table, and the candidate is verified by full tag equality.
/// On a miss the closed set is scanned linearly before giving up.
///
/// # Errors
///
/// Fails with `UnsupportedKind` when the tag names no supported kind.
///
/// # Examples
///
/// ```rust
/// use lanely::kind::{classify, ElementKind};
///
/// assert_eq!(classify("i32").unwrap(), ElementKind::Int32);
/// assert!(classify("u32").is_err());
/// ```
#[inline]
pub fn classify(tag: &str) -> Result<ElementKind> {
    if let Some(key) = switch_key(tag) {
        if let Some(kind) = tables().by_code[key] {
            if kind.tag() == tag {
                return Ok(kind);
            }
        }
    }

    // Hash miss or stale candidate: full scan over the closed set.
    ElementKind::ALL
        .iter()
        .copied()
        .find(|kind| kind.tag() == tag)
        .ok_or_else(|| unsupported_kind(tag))
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// Compile-time classification: the sealed set of primitive types usable as
/// vector lanes, each carrying its [`ElementKind`].
pub trait SimdElement: sealed::Sealed + Copy + num::Num {
    /// The kind describing lanes of this type.
    const KIND: ElementKind;
}

impl SimdElement for f32 {
    const KIND: ElementKind = ElementKind::Float32;
}

impl SimdElement for f64 {
    const KIND: ElementKind = ElementKind::Float64;
}

impl SimdElement for i8 {
    const KIND: ElementKind = ElementKind::Int8;
}

impl SimdElement for i16 {
    const KIND: ElementKind = ElementKind::Int16;
}

impl SimdElement for i32 {
    const KIND: ElementKind = ElementKind::Int32;
}

impl SimdElement for i64 {
    const KIND: ElementKind = ElementKind::Int64;
}

/// The kind of a lane element type, resolved at compile time.
#[inline(always)]
pub const fn kind_of<T: SimdElement>() -> ElementKind {
    T::KIND
}
