//! Vectorized primitives over shuffle index lanes.
//!
//! The shuffle engine validates and repairs its encoded lane buffers through
//! four bulk operations: an any-true reduction of the per-lane "< 0"
//! comparison, a leftmost-flagged-lane search, a materialized comparison
//! mask, and a masked add that repairs flagged lanes. This module provides
//! those operations over `&[i32]` buffers.
//!
//! Dispatch follows the build-time cfg flags: an AVX2 path (8-lane chunks,
//! also used under `avx512`), a NEON path (4-lane chunks), and a scalar
//! path that doubles as the tail handler for both accelerated paths. All
//! paths agree bit-for-bit.

mod scalar {
    #[inline(always)]
    pub(super) fn any_below_zero(lanes: &[i32]) -> bool {
        lanes.iter().any(|&lane| lane < 0)
    }

    #[inline(always)]
    pub(super) fn first_below_zero(lanes: &[i32]) -> Option<usize> {
        lanes.iter().position(|&lane| lane < 0)
    }

    #[inline(always)]
    pub(super) fn below_zero_mask(lanes: &[i32]) -> Box<[bool]> {
        lanes.iter().map(|&lane| lane < 0).collect()
    }

    /// Writes `lane + n` for negative lanes, `lane` otherwise, into `dst`.
    #[inline(always)]
    pub(super) fn add_into(dst: &mut [i32], src: &[i32], n: i32) {
        debug_assert_eq!(dst.len(), src.len());
        for (out, &lane) in dst.iter_mut().zip(src) {
            *out = if lane < 0 { lane + n } else { lane };
        }
    }
}

#[cfg(any(avx2, avx512))]
mod x86 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;

    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    use super::scalar;

    const CHUNK: usize = 8;

    #[inline]
    pub(super) unsafe fn any_below_zero(lanes: &[i32]) -> bool {
        let zero = _mm256_setzero_si256();
        let mut chunks = lanes.chunks_exact(CHUNK);
        for chunk in chunks.by_ref() {
            let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            let mask = _mm256_cmpgt_epi32(zero, v);
            if _mm256_movemask_ps(_mm256_castsi256_ps(mask)) != 0 {
                return true;
            }
        }
        scalar::any_below_zero(chunks.remainder())
    }

    #[inline]
    pub(super) unsafe fn first_below_zero(lanes: &[i32]) -> Option<usize> {
        let zero = _mm256_setzero_si256();
        let mut base = 0;
        let mut chunks = lanes.chunks_exact(CHUNK);
        for chunk in chunks.by_ref() {
            let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            let mask = _mm256_cmpgt_epi32(zero, v);
            let bits = _mm256_movemask_ps(_mm256_castsi256_ps(mask)) as u32;
            if bits != 0 {
                return Some(base + bits.trailing_zeros() as usize);
            }
            base += CHUNK;
        }
        scalar::first_below_zero(chunks.remainder()).map(|i| base + i)
    }

    #[inline]
    pub(super) unsafe fn add_into(dst: &mut [i32], src: &[i32], n: i32) {
        debug_assert_eq!(dst.len(), src.len());

        let zero = _mm256_setzero_si256();
        let addend = _mm256_set1_epi32(n);
        let whole = src.len() / CHUNK * CHUNK;

        let mut i = 0;
        while i < whole {
            let v = _mm256_loadu_si256(src.as_ptr().add(i) as *const __m256i);
            // The comparison mask is all-ones exactly where the lane is
            // negative, so masking the addend reproduces the +n repair
            // without branching.
            let mask = _mm256_cmpgt_epi32(zero, v);
            let fixed = _mm256_add_epi32(v, _mm256_and_si256(mask, addend));
            _mm256_storeu_si256(dst.as_mut_ptr().add(i) as *mut __m256i, fixed);
            i += CHUNK;
        }
        scalar::add_into(&mut dst[whole..], &src[whole..], n);
    }
}

#[cfg(neon)]
mod arm {
    use std::arch::aarch64::*;

    use super::scalar;

    const CHUNK: usize = 4;

    #[inline]
    pub(super) unsafe fn any_below_zero(lanes: &[i32]) -> bool {
        let mut chunks = lanes.chunks_exact(CHUNK);
        for chunk in chunks.by_ref() {
            let mask = vcltzq_s32(vld1q_s32(chunk.as_ptr()));
            if vmaxvq_u32(mask) != 0 {
                return true;
            }
        }
        scalar::any_below_zero(chunks.remainder())
    }

    #[inline]
    pub(super) unsafe fn first_below_zero(lanes: &[i32]) -> Option<usize> {
        let mut base = 0;
        let mut chunks = lanes.chunks_exact(CHUNK);
        for chunk in chunks.by_ref() {
            let mask = vcltzq_s32(vld1q_s32(chunk.as_ptr()));
            if vmaxvq_u32(mask) != 0 {
                return scalar::first_below_zero(chunk).map(|i| base + i);
            }
            base += CHUNK;
        }
        scalar::first_below_zero(chunks.remainder()).map(|i| base + i)
    }

    #[inline]
    pub(super) unsafe fn add_into(dst: &mut [i32], src: &[i32], n: i32) {
        debug_assert_eq!(dst.len(), src.len());

        let addend = vdupq_n_s32(n);
        let whole = src.len() / CHUNK * CHUNK;

        let mut i = 0;
        while i < whole {
            let v = vld1q_s32(src.as_ptr().add(i));
            let mask = vreinterpretq_s32_u32(vcltzq_s32(v));
            let fixed = vaddq_s32(v, vandq_s32(mask, addend));
            vst1q_s32(dst.as_mut_ptr().add(i), fixed);
            i += CHUNK;
        }
        scalar::add_into(&mut dst[whole..], &src[whole..], n);
    }
}

/// Any-true reduction of the per-lane "< 0" comparison.
#[inline]
pub(crate) fn any_below_zero(lanes: &[i32]) -> bool {
    #[cfg(any(avx2, avx512))]
    return unsafe { x86::any_below_zero(lanes) };

    #[cfg(neon)]
    return unsafe { arm::any_below_zero(lanes) };

    #[cfg(not(any(avx2, avx512, neon)))]
    scalar::any_below_zero(lanes)
}

/// Position of the leftmost lane whose value is below zero.
#[inline]
pub(crate) fn first_below_zero(lanes: &[i32]) -> Option<usize> {
    #[cfg(any(avx2, avx512))]
    return unsafe { x86::first_below_zero(lanes) };

    #[cfg(neon)]
    return unsafe { arm::first_below_zero(lanes) };

    #[cfg(not(any(avx2, avx512, neon)))]
    scalar::first_below_zero(lanes)
}

/// Materialized per-lane "< 0" comparison mask.
#[inline]
pub(crate) fn below_zero_mask(lanes: &[i32]) -> Box<[bool]> {
    scalar::below_zero_mask(lanes)
}

/// A copy of `lanes` with `n` added to every negative lane.
#[inline]
pub(crate) fn add_where_negative(lanes: &[i32], n: i32) -> Box<[i32]> {
    let mut out = vec![0i32; lanes.len()].into_boxed_slice();

    #[cfg(any(avx2, avx512))]
    unsafe {
        x86::add_into(&mut out, lanes, n)
    };

    #[cfg(neon)]
    unsafe {
        arm::add_into(&mut out, lanes, n)
    };

    #[cfg(not(any(avx2, avx512, neon)))]
    scalar::add_into(&mut out, lanes, n);

    out
}
