//! Shuffle index engine.
//!
//! A [`Shuffle`] is an immutable, fixed-length sequence of per-lane source
//! indices tied to a species: one entry per lane, used to permute,
//! broadcast or gather lanes of vectors of that species.
//!
//! # Encoding
//!
//! Construction funnels every logical index through a single wrap-encode
//! step. With `n` lanes, a logical index `v` is reduced by floor modulo to
//! `wrapped` in `[0, n)`; if `v` was already canonical it is stored as-is
//! (non-negative), otherwise `wrapped - n` is stored (in `[-n, -1]`),
//! preserving the wrapped magnitude while flagging the lane as "required
//! wraparound". Decoding hands back the stored values verbatim, so
//! downstream consumers can observe which lanes were out of range at
//! construction time.
//!
//! Validation is lazy and vectorized: [`check_indexes`](Shuffle::check_indexes),
//! [`wrap_indexes`](Shuffle::wrap_indexes) and
//! [`lane_is_valid`](Shuffle::lane_is_valid) all reduce to the per-lane
//! "< 0" comparison over the stored buffer.
//!
//! # Immutability
//!
//! A shuffle is never mutated: every transform either returns the receiver
//! unchanged (no allocation) or allocates a new instance. Shuffles may be
//! freely shared across concurrent readers.

use std::fmt;

use crate::error::{index_out_of_range, Result};
use crate::species::Species;
use crate::vector;

/// An immutable permutation of the lanes of one species.
///
/// # Examples
///
/// ```rust
/// use lanely::{ElementKind, Shuffle, Species, VectorShape};
///
/// let species = Species::of(ElementKind::Int32, VectorShape::S256).unwrap();
///
/// // Rotate lanes down by one; lane 0 pulls from (wrapped) lane 7.
/// let rotate = Shuffle::from_fn(species, |i| i as i32 - 1);
/// assert!(rotate.check_indexes().is_err());
///
/// let rotate = Shuffle::from_fn(species, |i| i as i32 - 1).wrap_indexes();
/// assert_eq!(rotate.to_vec(), vec![7, 0, 1, 2, 3, 4, 5, 6]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shuffle {
    species: Species,
    lanes: Box<[i32]>,
}

/// Floor-style modulo: result always in `[0, n)`, negative inputs included.
///
/// For power-of-two `n` this is a mask against `n - 1`; the general path
/// corrects the sign of the truncated remainder. Both agree bit-for-bit.
#[inline(always)]
fn floor_mod(v: i64, n: i64) -> i64 {
    debug_assert!(n > 0);
    if n & (n - 1) == 0 {
        v & (n - 1)
    } else {
        let rem = v % n;
        if rem < 0 {
            rem + n
        } else {
            rem
        }
    }
}

/// The single authoritative wrap-encode step: canonical indices are stored
/// unchanged, anything else as `wrapped - n`.
#[inline(always)]
fn partially_wrap(v: i64, n: i64) -> i32 {
    let wrapped = floor_mod(v, n);
    if wrapped == v {
        wrapped as i32
    } else {
        (wrapped - n) as i32
    }
}

impl Shuffle {
    /// Largest lane count any species can produce.
    pub const MAX_LANES: usize = 256;

    /// Builds a shuffle from `lane_count` logical indices read from
    /// `indices` starting at `offset`. Out-of-range indices are wrap-encoded,
    /// not rejected; use [`check_indexes`](Self::check_indexes) to reject
    /// them afterwards.
    ///
    /// # Panics
    ///
    /// Panics when the slice holds fewer than `offset + lane_count` values.
    pub fn from_indices(species: Species, indices: &[i32], offset: usize) -> Shuffle {
        let n = species.lane_count();
        assert!(
            offset + n <= indices.len(),
            "index source too short: need {} values at offset {offset}, have {}",
            n,
            indices.len()
        );

        Self::encode(species, |i| indices[offset + i] as i64)
    }

    /// Builds a shuffle by invoking `f` once per lane position, in order.
    pub fn from_fn(species: Species, mut f: impl FnMut(usize) -> i32) -> Shuffle {
        Self::encode(species, |i| f(i) as i64)
    }

    /// Wraps an already-encoded buffer. Trusted; used when rebuilding.
    pub(crate) fn from_raw(species: Species, lanes: Box<[i32]>) -> Shuffle {
        debug_assert_eq!(lanes.len(), species.lane_count());
        debug_assert!(lanes.iter().all(|&s| {
            let n = species.lane_count() as i32;
            -n <= s && s < n
        }));

        Shuffle { species, lanes }
    }

    /// The identity shuffle: lane `i` sources lane `i`.
    pub fn iota(species: Species) -> Shuffle {
        Self::from_fn(species, |i| i as i32)
    }

    /// An arithmetic-progression shuffle: lane `i` gets `start + i * step`.
    ///
    /// With `wrap` set, out-of-range indices are wrapped into the canonical
    /// range; otherwise they are rejected.
    ///
    /// # Errors
    ///
    /// Fails with `IndexOutOfRange` when `wrap` is false and the progression
    /// leaves `[0, lane_count)`.
    pub fn iota_with(species: Species, start: i64, step: i64, wrap: bool) -> Result<Shuffle> {
        let shuffle = Self::encode(species, |i| start + i as i64 * step);
        if wrap {
            Ok(shuffle.wrap_indexes())
        } else {
            shuffle.check_indexes()
        }
    }

    /// The length-`n` builder every construction form funnels through.
    fn encode(species: Species, mut logical: impl FnMut(usize) -> i64) -> Shuffle {
        let n = species.lane_count();
        debug_assert!(n <= Self::MAX_LANES);

        let lanes = (0..n).map(|i| partially_wrap(logical(i), n as i64)).collect();
        Shuffle { species, lanes }
    }

    /// The species this shuffle permutes.
    #[inline(always)]
    pub fn species(&self) -> Species {
        self.species
    }

    /// Number of lanes. Always at least 1.
    #[inline(always)]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// The stored (encoded) value of one lane.
    ///
    /// Non-negative means the lane's logical index was canonical at
    /// construction; negative means it required wraparound.
    ///
    /// # Panics
    ///
    /// Panics when `i` is not a lane of this shuffle.
    #[inline(always)]
    pub fn lane(&self, i: usize) -> i32 {
        self.lanes[i]
    }

    /// The stored lane values, verbatim: wraparound flags included.
    pub fn to_vec(&self) -> Vec<i32> {
        self.lanes.to_vec()
    }

    /// Copies the stored lane values verbatim into `dest` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics when `dest` cannot hold `lane_count` values at `offset`.
    pub fn copy_into(&self, dest: &mut [i32], offset: usize) {
        assert!(
            offset + self.lanes.len() <= dest.len(),
            "destination too short: need {} slots at offset {offset}, have {}",
            self.lanes.len(),
            dest.len()
        );

        dest[offset..offset + self.lanes.len()].copy_from_slice(&self.lanes);
    }

    /// Validates that no lane required wraparound at construction.
    ///
    /// Runs the vectorized "< 0" comparison over the stored lanes; on
    /// success returns the receiver unchanged, with no allocation.
    ///
    /// # Errors
    ///
    /// Fails with `IndexOutOfRange` carrying the stored value of the
    /// leftmost flagged lane and `lane_count - 1` as the maximum valid
    /// index.
    pub fn check_indexes(self) -> Result<Shuffle> {
        if let Some(lane) = vector::first_below_zero(&self.lanes) {
            let max_valid = self.lanes.len() as i64 - 1;
            return Err(index_out_of_range(self.lanes[lane] as i64, max_valid));
        }
        Ok(self)
    }

    /// Forces every lane into the canonical range `[0, lane_count)`.
    ///
    /// Returns the receiver unchanged (no allocation) when no lane carries
    /// the wraparound flag. Otherwise rebuilds: for power-of-two lane counts
    /// the repair is the branch-free `s + (s & n)` fixup (for such `n` the
    /// sign condition and `n`'s bit pattern coincide in the relevant bit);
    /// the general path adds `n` to the still-negative lanes.
    pub fn wrap_indexes(self) -> Shuffle {
        if !vector::any_below_zero(&self.lanes) {
            return self;
        }

        let n = self.lanes.len() as i32;
        let fixed: Box<[i32]> = if n & (n - 1) == 0 {
            self.lanes.iter().map(|&s| s + (s & n)).collect()
        } else {
            vector::add_where_negative(&self.lanes, n)
        };

        Shuffle::from_raw(self.species, fixed)
    }

    /// Per-lane validity mask: `true` where the stored value is
    /// non-negative, i.e. the lane was canonical at construction. Neither
    /// mutates nor rebuilds.
    pub fn lane_is_valid(&self) -> Box<[bool]> {
        let mut mask = vector::below_zero_mask(&self.lanes);
        for flag in mask.iter_mut() {
            *flag = !*flag;
        }
        mask
    }

    /// Scalar single-lane check: fails unless `i` is already canonical.
    ///
    /// # Errors
    ///
    /// Fails with `IndexOutOfRange { found: i, max_valid: lane_count - 1 }`
    /// when the floor-modulo wrap of `i` differs from `i`.
    pub fn check_index(&self, i: i32) -> Result<i32> {
        let wrapped = self.wrap_index(i);
        if wrapped == i {
            Ok(wrapped)
        } else {
            Err(index_out_of_range(i as i64, self.lanes.len() as i64 - 1))
        }
    }

    /// Scalar single-lane wrap: the floor-modulo reduction of `i` into
    /// `[0, lane_count)`, unconditionally.
    #[inline]
    pub fn wrap_index(&self, i: i32) -> i32 {
        floor_mod(i as i64, self.lanes.len() as i64) as i32
    }

    /// Guards a lane-level operation against cross-species misuse.
    ///
    /// # Errors
    ///
    /// Fails with `SpeciesMismatch` unless this shuffle's species equals
    /// `expected`.
    #[inline]
    pub fn check_species(&self, expected: Species) -> Result<()> {
        self.species.check(expected)
    }
}

impl fmt::Display for Shuffle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shuffle[{}](", self.species)?;
        for (i, lane) in self.lanes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lane}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ElementKind;
    use crate::shape::VectorShape;
    use rand::Rng;

    /// 8 lanes of i32.
    fn species_8() -> Species {
        Species::of(ElementKind::Int32, VectorShape::S256).unwrap()
    }

    /// 3 lanes is not constructible from the closed shape set, so the
    /// non-power-of-two paths are exercised through the helpers directly.
    fn all_lane_species() -> Vec<Species> {
        let mut result = Vec::new();
        for kind in ElementKind::ALL {
            for shape in [
                VectorShape::S64,
                VectorShape::S128,
                VectorShape::S256,
                VectorShape::S512,
            ] {
                if let Ok(species) = Species::of(kind, shape) {
                    result.push(species);
                }
            }
        }
        result
    }

    mod wrap_encode_tests {
        use super::*;

        #[test]
        fn test_floor_mod_matches_euclidean() {
            for n in 1..=64i64 {
                for v in -3 * n..3 * n {
                    assert_eq!(floor_mod(v, n), v.rem_euclid(n), "v={v} n={n}");
                }
            }
        }

        #[test]
        fn test_pot_and_general_paths_agree() {
            // The masking fast path only fires for power-of-two counts; it
            // must agree bit-for-bit with the sign-corrected remainder.
            for n in 1..=64i64 {
                for v in [-129, -64, -9, -1, 0, 1, 7, 63, 64, 128, 1000] {
                    let general = ((v % n) + n) % n;
                    assert_eq!(floor_mod(v, n), general);
                }
            }
        }

        #[test]
        fn test_partially_wrap_canonical_stored_unchanged() {
            for v in 0..8 {
                assert_eq!(partially_wrap(v, 8), v as i32);
            }
        }

        #[test]
        fn test_partially_wrap_flags_out_of_range() {
            // wrapped - n, always in [-n, -1].
            assert_eq!(partially_wrap(-1, 8), -1);
            assert_eq!(partially_wrap(8, 8), -8);
            assert_eq!(partially_wrap(15, 8), -1);
            assert_eq!(partially_wrap(-9, 8), -1);

            for v in -100..100i64 {
                for n in [5i64, 7, 8, 12, 16] {
                    let s = partially_wrap(v, n) as i64;
                    assert!(-n <= s && s < n, "stored {s} out of [-{n}, {n})");
                }
            }
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_round_trip_canonical_indices() {
            let mut rng = rand::rng();
            for species in all_lane_species() {
                let n = species.lane_count();
                let indices: Vec<i32> =
                    (0..n).map(|_| rng.random_range(0..n as i32)).collect();

                let shuffle = Shuffle::from_indices(species, &indices, 0);
                assert_eq!(shuffle.to_vec(), indices);
            }
        }

        #[test]
        fn test_from_indices_at_offset() {
            let species = species_8();
            let buffer: Vec<i32> = (0..12).collect();
            let shuffle = Shuffle::from_indices(species, &buffer, 2);
            assert_eq!(shuffle.to_vec(), vec![2, 3, 4, 5, 6, 7, -8, -7]);
        }

        #[test]
        #[should_panic(expected = "index source too short")]
        fn test_from_indices_short_source_panics() {
            Shuffle::from_indices(species_8(), &[0, 1, 2], 0);
        }

        #[test]
        fn test_identity_generator() {
            let shuffle = Shuffle::from_fn(species_8(), |i| i as i32);
            assert_eq!(shuffle.to_vec(), vec![0, 1, 2, 3, 4, 5, 6, 7]);

            let checked = shuffle.clone().check_indexes().unwrap();
            assert_eq!(checked, shuffle);
        }

        #[test]
        fn test_iota_is_identity() {
            for species in all_lane_species() {
                let expected: Vec<i32> = (0..species.lane_count() as i32).collect();
                assert_eq!(Shuffle::iota(species).to_vec(), expected);
            }
        }

        #[test]
        fn test_iota_with_wrap_rotates() {
            let shuffle = Shuffle::iota_with(species_8(), -1, 1, true).unwrap();
            assert_eq!(shuffle.to_vec(), vec![7, 0, 1, 2, 3, 4, 5, 6]);
        }

        #[test]
        fn test_iota_with_checked_rejects_escape() {
            let error = Shuffle::iota_with(species_8(), 1, 1, false).unwrap_err();
            assert_eq!(error, crate::error::index_out_of_range(-8, 7));
        }

        #[test]
        fn test_copy_into_at_offset() {
            let shuffle = Shuffle::from_fn(species_8(), |i| i as i32 - 1);
            let mut dest = [99i32; 10];
            shuffle.copy_into(&mut dest, 1);
            assert_eq!(dest, [99, -1, 0, 1, 2, 3, 4, 5, 6, 99]);
        }
    }

    mod check_tests {
        use super::*;

        #[test]
        fn test_check_indexes_reports_leftmost_flagged_lane() {
            // f(i) = i - 1: lane 0's logical index -1 wraps and is flagged.
            let shuffle = Shuffle::from_fn(species_8(), |i| i as i32 - 1);
            assert_eq!(shuffle.lane(0), -1);

            let error = shuffle.check_indexes().unwrap_err();
            assert_eq!(error, crate::error::index_out_of_range(-1, 7));
        }

        #[test]
        fn test_check_indexes_passes_clean_shuffle() {
            let shuffle = Shuffle::from_fn(species_8(), |i| (i as i32 + 3) % 8);
            let lanes = shuffle.to_vec();
            let checked = shuffle.check_indexes().unwrap();
            assert_eq!(checked.to_vec(), lanes);
        }

        #[test]
        fn test_lane_is_valid_mask() {
            let shuffle = Shuffle::from_fn(species_8(), |i| i as i32 - 1);
            let mask = shuffle.lane_is_valid();
            assert!(!mask[0]);
            assert!(mask[1..].iter().all(|&ok| ok));

            // No mutation: the stored lanes are untouched.
            assert_eq!(shuffle.lane(0), -1);
        }

        #[test]
        fn test_check_index_scalar() {
            let shuffle = Shuffle::iota(species_8());

            assert_eq!(shuffle.check_index(0).unwrap(), 0);
            assert_eq!(shuffle.check_index(7).unwrap(), 7);

            let error = shuffle.check_index(-1).unwrap_err();
            assert_eq!(error, crate::error::index_out_of_range(-1, 7));
            assert!(shuffle.check_index(8).is_err());
        }

        #[test]
        fn test_negative_inputs_wrap_and_fail_check() {
            let shuffle = Shuffle::iota(species_8());
            let n = 8i32;
            for v in -n..0 {
                assert_eq!(shuffle.wrap_index(v), v + n);
                assert_eq!(
                    shuffle.check_index(v).unwrap_err(),
                    crate::error::index_out_of_range(v as i64, 7)
                );
            }
        }

        #[test]
        fn test_check_species() {
            let shuffle = Shuffle::iota(species_8());
            assert!(shuffle.check_species(species_8()).is_ok());

            let other = Species::of(ElementKind::Float32, VectorShape::S256).unwrap();
            assert!(shuffle.check_species(other).is_err());
        }
    }

    mod wrap_tests {
        use super::*;

        #[test]
        fn test_wrap_indexes_repairs_flagged_lanes() {
            let shuffle = Shuffle::from_fn(species_8(), |i| i as i32 - 1);
            let wrapped = shuffle.wrap_indexes();
            assert_eq!(wrapped.to_vec(), vec![7, 0, 1, 2, 3, 4, 5, 6]);
            assert!(wrapped.lane_is_valid().iter().all(|&ok| ok));
        }

        #[test]
        fn test_wrap_indexes_clean_shuffle_is_identity() {
            let shuffle = Shuffle::iota(species_8());
            let lanes_before = shuffle.to_vec();
            let wrapped = shuffle.wrap_indexes();
            assert_eq!(wrapped.to_vec(), lanes_before);
        }

        #[test]
        fn test_wrap_indexes_idempotent() {
            let mut rng = rand::rng();
            for species in all_lane_species() {
                let n = species.lane_count() as i32;
                let shuffle = Shuffle::from_fn(species, |_| rng.random_range(-3 * n..3 * n));

                let once = shuffle.wrap_indexes();
                let twice = once.clone().wrap_indexes();
                assert_eq!(once, twice);
            }
        }

        #[test]
        fn test_wrap_matches_floor_modulo_of_original() {
            let mut rng = rand::rng();
            for species in all_lane_species() {
                let n = species.lane_count() as i32;
                let logical: Vec<i32> =
                    (0..n).map(|_| rng.random_range(-3 * n..3 * n)).collect();

                let wrapped = Shuffle::from_indices(species, &logical, 0).wrap_indexes();
                for (lane, &v) in wrapped.to_vec().iter().zip(&logical) {
                    assert_eq!(*lane, (v as i64).rem_euclid(n as i64) as i32);
                }
            }
        }
    }
}
