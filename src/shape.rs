//! Vector shape negotiation.
//!
//! A shape is the total bit width of a vector value, independent of the
//! element kind it carries. The set is closed: four fixed widths (64, 128,
//! 256 and 512 bits) plus one platform-max variant whose width is resolved
//! once, on first use, from the platform capability probe.
//!
//! # Capability Probe
//!
//! [`CapabilityProbe`] is the seam to the platform oracle: it reports the
//! maximum hardware lane count per element kind, or `None` when the platform
//! reports nothing usable. [`PlatformProbe`] implements it from the cfg
//! flags emitted by `build.rs` (`avx512`, `avx2`, `sse`, `neon`,
//! `fallback`). Every probe-derived width is floored at 64 bits.
//!
//! # Memoization
//!
//! The platform-max width and the preferred shape are process-wide values
//! computed from fixed inputs. They are published through a relaxed atomic:
//! concurrent first callers may recompute redundantly, but every
//! recomputation is deterministic and equal, so last-writer-wins publication
//! is correct without a lock.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{unsupported_shape, Result};
use crate::kind::ElementKind;

/// Largest resolvable vector width, in bits, at the 32-bit element reference.
const MAX_BIT_SIZE: usize = 2048;

/// Resolution increment, in bits, at the 32-bit element reference.
const BIT_SIZE_INCREMENT: usize = 128;

/// Element width the resolution bounds are expressed against.
const REFERENCE_ELEMENT_BITS: usize = 32;

/// Narrowest shape any platform is assumed to support.
const MIN_BIT_SIZE: usize = 64;

/// Memoized platform-max width; 0 means "not yet resolved".
static MAX_SHAPE_BITS: AtomicUsize = AtomicUsize::new(0);

/// One of the supported vector shapes.
///
/// The four fixed variants carry exactly their labeled width. [`SMax`]
/// resolves to the widest width usable uniformly across every element kind
/// on this platform.
///
/// [`SMax`]: VectorShape::SMax
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VectorShape {
    /// 64-bit vectors.
    S64,
    /// 128-bit vectors.
    S128,
    /// 256-bit vectors.
    S256,
    /// 512-bit vectors.
    S512,
    /// The platform-maximum shape; width resolved lazily.
    SMax,
}

/// Platform capability oracle: maximum hardware lane count per element kind.
///
/// `None` means the platform reports nothing usable for that kind; callers
/// fall back to the 64-bit floor.
pub trait CapabilityProbe {
    /// Maximum supported lane count for vectors of `kind`.
    fn max_lane_count(&self, kind: ElementKind) -> Option<usize>;
}

/// The build-time capability probe.
///
/// `build.rs` detects the host CPU and emits exactly one of the cfg flags
/// consulted here; the probe turns the winning register width into a lane
/// count per kind.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlatformProbe;

impl PlatformProbe {
    /// Widest vector register the build targets, in bits.
    pub const MAX_VECTOR_BITS: usize = if cfg!(avx512) {
        512
    } else if cfg!(avx2) {
        256
    } else if cfg!(any(sse, neon)) {
        128
    } else {
        64
    };
}

impl CapabilityProbe for PlatformProbe {
    #[inline(always)]
    fn max_lane_count(&self, kind: ElementKind) -> Option<usize> {
        Some(Self::MAX_VECTOR_BITS / kind.bit_size())
    }
}

/// Widest usable vector width for one kind, in bits: the probe's lane count
/// times the lane width, floored at 64 bits so a probe reporting nothing
/// usable still yields the narrowest shape.
#[inline]
pub fn max_bit_size_for(kind: ElementKind, probe: &dyn CapabilityProbe) -> usize {
    let lanes = probe.max_lane_count(kind).unwrap_or(0);
    (lanes * kind.bit_size()).max(MIN_BIT_SIZE)
}

/// The width usable uniformly across every element kind: the governing
/// minimum of [`max_bit_size_for`] over the closed kind set.
#[inline]
fn governing_min_bits(probe: &dyn CapabilityProbe) -> usize {
    ElementKind::ALL
        .iter()
        .map(|&kind| max_bit_size_for(kind, probe))
        .min()
        .unwrap_or(MIN_BIT_SIZE)
}

impl VectorShape {
    /// The closed shape set, fixed variants first.
    pub const ALL: [VectorShape; 5] = [
        VectorShape::S64,
        VectorShape::S128,
        VectorShape::S256,
        VectorShape::S512,
        VectorShape::SMax,
    ];

    /// Total width of this shape, in bits. Always a positive multiple of 64.
    ///
    /// For [`SMax`](VectorShape::SMax) the width is resolved on first call
    /// from the platform probe and memoized (benign race, see module docs).
    #[inline]
    pub fn bit_size(self) -> usize {
        match self {
            VectorShape::S64 => 64,
            VectorShape::S128 => 128,
            VectorShape::S256 => 256,
            VectorShape::S512 => 512,
            VectorShape::SMax => Self::max_shape_bits(),
        }
    }

    /// Base-2 logarithm of [`bit_size`](Self::bit_size).
    #[inline]
    pub fn bit_size_log2(self) -> u32 {
        self.bit_size().trailing_zeros()
    }

    fn max_shape_bits() -> usize {
        let cached = MAX_SHAPE_BITS.load(Ordering::Relaxed);
        if cached != 0 {
            return cached;
        }
        let bits = governing_min_bits(&PlatformProbe);
        MAX_SHAPE_BITS.store(bits, Ordering::Relaxed);
        bits
    }

    /// Resolves a shape from a requested bit size.
    ///
    /// The four fixed widths match exactly. Any other positive width up to
    /// 2048 bits in 128-bit increments resolves to the platform-max shape.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedShape` for zero, oversized or misaligned
    /// widths.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lanely::shape::VectorShape;
    ///
    /// assert_eq!(VectorShape::for_bit_size(128).unwrap(), VectorShape::S128);
    /// assert!(VectorShape::for_bit_size(100).is_err());
    /// ```
    #[inline]
    pub fn for_bit_size(bit_size: usize) -> Result<VectorShape> {
        match bit_size {
            64 => Ok(VectorShape::S64),
            128 => Ok(VectorShape::S128),
            256 => Ok(VectorShape::S256),
            512 => Ok(VectorShape::S512),
            bits if bits > 0 && bits <= MAX_BIT_SIZE && bits % BIT_SIZE_INCREMENT == 0 => {
                Ok(VectorShape::SMax)
            }
            bits => Err(unsupported_shape(bits)),
        }
    }

    /// Resolves a shape for an index vector of `element_size_bits`-wide
    /// lanes.
    ///
    /// Same rule as [`for_bit_size`](Self::for_bit_size), but the maximum
    /// and the increment scale with the element width relative to the 32-bit
    /// reference: index vectors of narrower elements carry proportionally
    /// more lanes within the same physical width budget, so their bit-size
    /// bounds shrink by the same factor.
    #[inline]
    pub fn for_index_bit_size(index_bit_size: usize, element_size_bits: usize) -> Result<VectorShape> {
        debug_assert!(
            element_size_bits.is_power_of_two() && element_size_bits >= 8,
            "element size must be a supported lane width"
        );

        let max = MAX_BIT_SIZE * element_size_bits / REFERENCE_ELEMENT_BITS;
        let step = BIT_SIZE_INCREMENT * element_size_bits / REFERENCE_ELEMENT_BITS;

        match index_bit_size {
            64 => Ok(VectorShape::S64),
            128 => Ok(VectorShape::S128),
            256 => Ok(VectorShape::S256),
            512 => Ok(VectorShape::S512),
            bits if bits > 0 && bits <= max && bits % step == 0 => Ok(VectorShape::SMax),
            bits => Err(unsupported_shape(bits)),
        }
    }

    /// The single shape usable uniformly across every element kind on this
    /// platform, memoized after the first call.
    ///
    /// Equal to `for_bit_size(min over kinds of max_bit_size_for(kind))`
    /// against the platform probe.
    ///
    /// # Errors
    ///
    /// Fails with `UnsupportedShape` only if the probe-derived width
    /// violates the shape rules, which indicates a defective probe.
    #[inline]
    pub fn preferred() -> Result<VectorShape> {
        Self::for_bit_size(Self::max_shape_bits())
    }

    /// [`preferred`](Self::preferred) against an explicit probe, uncached.
    #[inline]
    pub fn preferred_with(probe: &dyn CapabilityProbe) -> Result<VectorShape> {
        Self::for_bit_size(governing_min_bits(probe))
    }

    /// The platform-maximum shape for one specific kind, uncached: the
    /// cross-kind governing minimum does not apply here.
    #[inline]
    pub fn largest_for(kind: ElementKind) -> Result<VectorShape> {
        Self::largest_for_with(kind, &PlatformProbe)
    }

    /// [`largest_for`](Self::largest_for) against an explicit probe.
    #[inline]
    pub fn largest_for_with(kind: ElementKind, probe: &dyn CapabilityProbe) -> Result<VectorShape> {
        Self::for_bit_size(max_bit_size_for(kind, probe))
    }
}

impl fmt::Display for VectorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorShape::S64 => write!(f, "S64"),
            VectorShape::S128 => write!(f, "S128"),
            VectorShape::S256 => write!(f, "S256"),
            VectorShape::S512 => write!(f, "S512"),
            VectorShape::SMax => write!(f, "SMax"),
        }
    }
}
