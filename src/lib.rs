//! Lane-kind classification, vector shape negotiation and the shuffle index
//! engine for SIMD species.
//!
//! Three components, leaf-first:
//!
//! - [`kind`] enumerates the closed set of primitive element kinds and their
//!   derived attributes (bit width, precision, numeric class, same-width
//!   counterparts).
//! - [`shape`] enumerates the supported vector bit widths, resolves shapes
//!   from requested sizes, and negotiates the platform-preferred shape
//!   through the capability probe.
//! - [`shuffle`] represents and validates per-lane source indices used to
//!   reorder, broadcast or gather the lanes of a vector of one species
//!   (a [`Species`] is a kind paired with a shape).
//!
//! Everything is an immutable shared value; there are no locks, and no
//! operation blocks or performs I/O.

pub mod bounds;
pub mod error;
pub mod kind;
pub mod shape;
pub mod shuffle;
pub mod species;

pub(crate) mod vector;

pub use error::{LanelyError, Result};
pub use kind::{classify, kind_of, ElementKind, NumericClass, SimdElement};
pub use shape::{CapabilityProbe, PlatformProbe, VectorShape};
pub use shuffle::Shuffle;
pub use species::Species;
