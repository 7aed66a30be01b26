//! Process-wide out-of-bounds check policy for bulk memory access.
//!
//! Bulk gather/scatter collaborators validate their base indices through
//! one of three levels, chosen once per process from the
//! `LANELY_INDEX_CHECK` environment variable (`"0"`, `"1"` or `"2"`;
//! default `2`):
//!
//! - level 0, [`Trusted`](CheckPolicy::Trusted): no validation, the caller
//!   asserts correctness;
//! - level 1, [`Standard`](CheckPolicy::Standard): the index itself must
//!   lie in `[0, length)`;
//! - level 2, [`Conservative`](CheckPolicy::Conservative): the entire
//!   contiguous window of vector-length elements starting at the index must
//!   stay within `[0, length)`.
//!
//! These checks reuse the shuffle engine's error type but are not called by
//! it; they exist for the external bulk-access collaborator, which needs a
//! stricter window guarantee than single-lane shuffle validation.

use std::sync::OnceLock;

use crate::error::{index_out_of_range, Result};

/// Out-of-bounds check level, ordered weakest to strictest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckPolicy {
    /// Level 0: no validation.
    Trusted,
    /// Level 1: single-index bounds check.
    Standard,
    /// Level 2: whole-window bounds check.
    Conservative,
}

static POLICY: OnceLock<CheckPolicy> = OnceLock::new();

impl CheckPolicy {
    /// Parses a policy level; anything unrecognized yields the strictest.
    fn from_level(level: &str) -> CheckPolicy {
        match level.trim() {
            "0" => CheckPolicy::Trusted,
            "1" => CheckPolicy::Standard,
            _ => CheckPolicy::Conservative,
        }
    }
}

/// The process-wide check policy, read once from `LANELY_INDEX_CHECK`.
#[inline]
pub fn check_policy() -> CheckPolicy {
    *POLICY.get_or_init(|| {
        std::env::var("LANELY_INDEX_CHECK")
            .map(|level| CheckPolicy::from_level(&level))
            .unwrap_or(CheckPolicy::Conservative)
    })
}

/// Validates a bulk-access base index under the process-wide policy.
///
/// See [`check_access_with`] for the per-level semantics.
#[inline]
pub fn check_access(index: i64, vector_len: usize, length: usize) -> Result<i64> {
    check_access_with(check_policy(), index, vector_len, length)
}

/// Validates a bulk-access base index under an explicit policy.
///
/// `index` is the base element index, `vector_len` the number of contiguous
/// elements the access touches, `length` the extent of the accessed buffer.
/// Returns the index unchanged on success.
///
/// The standard and conservative levels are deliberately asymmetric: level 1
/// checks only the base index against `[0, length)`, level 2 checks the
/// whole window `[index, index + vector_len)`. All arithmetic is `i64`, so
/// the boundary cannot overflow.
///
/// # Errors
///
/// Fails with `IndexOutOfRange { found: index, max_valid: length - 1 }`
/// when the checked condition does not hold.
#[inline]
pub fn check_access_with(
    policy: CheckPolicy,
    index: i64,
    vector_len: usize,
    length: usize,
) -> Result<i64> {
    let in_bounds = match policy {
        CheckPolicy::Trusted => true,
        CheckPolicy::Standard => index >= 0 && index < length as i64,
        CheckPolicy::Conservative => {
            index >= 0 && index + vector_len as i64 <= length as i64
        }
    };

    if in_bounds {
        Ok(index)
    } else {
        Err(index_out_of_range(index, length as i64 - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_accepts_anything() {
        assert_eq!(
            check_access_with(CheckPolicy::Trusted, -5, 8, 16).unwrap(),
            -5
        );
        assert_eq!(
            check_access_with(CheckPolicy::Trusted, 1000, 8, 16).unwrap(),
            1000
        );
    }

    #[test]
    fn test_standard_checks_single_index() {
        let policy = CheckPolicy::Standard;

        assert_eq!(check_access_with(policy, 0, 8, 16).unwrap(), 0);
        assert_eq!(check_access_with(policy, 15, 8, 16).unwrap(), 15);

        assert!(check_access_with(policy, -1, 8, 16).is_err());
        assert!(check_access_with(policy, 16, 8, 16).is_err());
    }

    #[test]
    fn test_conservative_checks_whole_window() {
        let policy = CheckPolicy::Conservative;

        // Window [8, 16) just fits a 16-element buffer.
        assert_eq!(check_access_with(policy, 8, 8, 16).unwrap(), 8);
        // One further and the window hangs over the end.
        let error = check_access_with(policy, 9, 8, 16).unwrap_err();
        assert_eq!(error, crate::error::index_out_of_range(9, 15));

        assert!(check_access_with(policy, -1, 8, 16).is_err());
    }

    #[test]
    fn test_conservative_is_stricter_than_standard() {
        // Indices the standard level accepts but the window level rejects.
        for index in 9..16 {
            assert!(check_access_with(CheckPolicy::Standard, index, 8, 16).is_ok());
            assert!(check_access_with(CheckPolicy::Conservative, index, 8, 16).is_err());
        }
    }

    #[test]
    fn test_policy_ordering() {
        assert!(CheckPolicy::Trusted < CheckPolicy::Standard);
        assert!(CheckPolicy::Standard < CheckPolicy::Conservative);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(CheckPolicy::from_level("0"), CheckPolicy::Trusted);
        assert_eq!(CheckPolicy::from_level("1"), CheckPolicy::Standard);
        assert_eq!(CheckPolicy::from_level("2"), CheckPolicy::Conservative);
        assert_eq!(CheckPolicy::from_level(" 1 "), CheckPolicy::Standard);
        assert_eq!(CheckPolicy::from_level("garbage"), CheckPolicy::Conservative);
    }

    #[test]
    fn test_global_policy_is_stable() {
        assert_eq!(check_policy(), check_policy());
    }
}
