//! Species: the pairing of an element kind and a vector shape.
//!
//! A species is a derived pair, not a stored entity: it fixes the lane
//! count of every vector and shuffle built against it
//! (`lane_count = shape bits / kind bits`) and guards cross-species misuse
//! through identity comparison.

use std::fmt;

use crate::error::{species_mismatch, unsupported_shape, Result};
use crate::kind::ElementKind;
use crate::shape::VectorShape;

/// An element kind paired with a vector shape.
///
/// Construction rejects shapes too narrow to hold a single lane of the
/// kind, so `lane_count() >= 1` holds for every live value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Species {
    kind: ElementKind,
    shape: VectorShape,
}

impl Species {
    /// Pairs a kind with a shape.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedShape` when the shape cannot hold one lane of
    /// the kind (e.g. a 64-bit kind in a shape narrower than 64 bits).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lanely::{ElementKind, Species, VectorShape};
    ///
    /// let species = Species::of(ElementKind::Int32, VectorShape::S256).unwrap();
    /// assert_eq!(species.lane_count(), 8);
    /// ```
    #[inline]
    pub fn of(kind: ElementKind, shape: VectorShape) -> Result<Species> {
        if shape.bit_size() < kind.bit_size() {
            return Err(unsupported_shape(shape.bit_size()));
        }
        Ok(Species { kind, shape })
    }

    /// The element kind of this species.
    #[inline(always)]
    pub fn kind(self) -> ElementKind {
        self.kind
    }

    /// The vector shape of this species.
    #[inline(always)]
    pub fn shape(self) -> VectorShape {
        self.shape
    }

    /// Number of lanes in a vector of this species. Always at least 1.
    #[inline(always)]
    pub fn lane_count(self) -> usize {
        self.shape.bit_size() / self.kind.bit_size()
    }

    /// Guards an operation against cross-species misuse.
    ///
    /// # Errors
    ///
    /// Fails with `SpeciesMismatch` unless `self` equals `expected`.
    #[inline]
    pub fn check(self, expected: Species) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(species_mismatch(expected, self))
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Species[{} x {}]", self.kind, self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_count() {
        let cases = [
            (ElementKind::Int8, VectorShape::S128, 16),
            (ElementKind::Int32, VectorShape::S256, 8),
            (ElementKind::Float64, VectorShape::S512, 8),
            (ElementKind::Int64, VectorShape::S64, 1),
        ];
        for (kind, shape, lanes) in cases {
            assert_eq!(Species::of(kind, shape).unwrap().lane_count(), lanes);
        }
    }

    #[test]
    fn test_lane_count_at_least_one() {
        for kind in ElementKind::ALL {
            for shape in VectorShape::ALL {
                if let Ok(species) = Species::of(kind, shape) {
                    assert!(species.lane_count() >= 1);
                }
            }
        }
    }

    #[test]
    fn test_check_accepts_identical_species() {
        let a = Species::of(ElementKind::Float32, VectorShape::S128).unwrap();
        let b = Species::of(ElementKind::Float32, VectorShape::S128).unwrap();
        assert!(a.check(b).is_ok());
    }

    #[test]
    fn test_check_rejects_kind_mismatch() {
        let expected = Species::of(ElementKind::Int32, VectorShape::S256).unwrap();
        let found = Species::of(ElementKind::Float32, VectorShape::S256).unwrap();
        let error = found.check(expected).unwrap_err();
        assert_eq!(error, crate::error::species_mismatch(expected, found));
    }

    #[test]
    fn test_check_rejects_shape_mismatch() {
        let expected = Species::of(ElementKind::Int32, VectorShape::S256).unwrap();
        let found = Species::of(ElementKind::Int32, VectorShape::S128).unwrap();
        assert!(found.check(expected).is_err());
    }

    #[test]
    fn test_display() {
        let species = Species::of(ElementKind::Int32, VectorShape::S256).unwrap();
        assert_eq!(format!("{species}"), "Species[i32 x S256]");
    }
}
