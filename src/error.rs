//! Error types for lanely operations.
//!
//! This module defines custom error types that provide better error handling
//! than panicking, allowing applications to gracefully handle failures when
//! negotiating kinds, shapes and shuffle indices.

use std::fmt;

use crate::kind::{ElementKind, NumericClass};
use crate::species::Species;

/// Errors that can occur during lanely operations.
///
/// Every failure is local and synchronous: it is raised at the point of
/// violation and surfaced to the caller. Nothing is retried or recovered
/// internally, and there is no partial-failure mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanelyError {
    /// A type tag does not name any supported element kind.
    UnsupportedKind {
        /// The tag that failed to classify.
        tag: String,
    },
    /// A kind has no same-width counterpart of the requested numeric class.
    NoSuchConversion {
        /// The kind the conversion started from.
        from: ElementKind,
        /// The numeric class the caller asked for.
        target: NumericClass,
    },
    /// A bit size matches neither a fixed shape nor the platform-max rule.
    UnsupportedShape {
        /// The bit size that failed to resolve.
        bit_size: usize,
    },
    /// An operation was applied across incompatible kind/shape pairings.
    SpeciesMismatch {
        /// The species the operation required.
        expected: Species,
        /// The species actually supplied.
        found: Species,
    },
    /// A lane index fell outside its canonical bounds.
    IndexOutOfRange {
        /// The offending index value, as observed.
        found: i64,
        /// The largest index that would have been accepted.
        max_valid: i64,
    },
}

impl fmt::Display for LanelyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanelyError::UnsupportedKind { tag } => {
                write!(f, "Unsupported element kind: no kind matches tag {tag:?}")
            }
            LanelyError::NoSuchConversion { from, target } => write!(
                f,
                "No such conversion: {} has no same-width {} counterpart",
                from, target
            ),
            LanelyError::UnsupportedShape { bit_size } => {
                write!(f, "Unsupported shape: no vector shape of {bit_size} bits")
            }
            LanelyError::SpeciesMismatch { expected, found } => write!(
                f,
                "Species mismatch: expected {expected}, found {found}"
            ),
            LanelyError::IndexOutOfRange { found, max_valid } => write!(
                f,
                "Index {found} out of range for result of size {}",
                max_valid + 1
            ),
        }
    }
}

impl std::error::Error for LanelyError {}

/// Result type alias for lanely operations.
pub type Result<T> = std::result::Result<T, LanelyError>;

/// Creates an unsupported-kind error.
pub fn unsupported_kind(tag: impl Into<String>) -> LanelyError {
    LanelyError::UnsupportedKind { tag: tag.into() }
}

/// Creates a no-such-conversion error.
pub fn no_such_conversion(from: ElementKind, target: NumericClass) -> LanelyError {
    LanelyError::NoSuchConversion { from, target }
}

/// Creates an unsupported-shape error.
pub fn unsupported_shape(bit_size: usize) -> LanelyError {
    LanelyError::UnsupportedShape { bit_size }
}

/// Creates a species-mismatch error.
pub fn species_mismatch(expected: Species, found: Species) -> LanelyError {
    LanelyError::SpeciesMismatch { expected, found }
}

/// Creates an index-out-of-range error from the offending value and the
/// largest acceptable index.
pub fn index_out_of_range(found: i64, max_valid: i64) -> LanelyError {
    LanelyError::IndexOutOfRange { found, max_valid }
}
