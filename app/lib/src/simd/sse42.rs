//! SSE4.2 (128-bit) implementations of the kernel operations.
//!
//! Every kernel follows the same reduction shape: four independent
//! register accumulators in the main loop, a widest-first drain of up to
//! three whole registers, a pairwise accumulator merge, a horizontal
//! collapse by repeated half-width shifts, and a scalar tail. Inputs
//! smaller than one main-loop iteration fall back to the scalar tier.
//!
//! The odd-width reversal kernels in this module are shared with the
//! AVX2 dispatch path, which is why they only require SSSE3-level
//! shuffles.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::combine::BitCombine;
use crate::simd::scalar;
use crate::simd::tables;

// 64-bit lane min/max are synthesized from cmpgt + blendv since SSE has
// no native epi64/epu64 variants.

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn max_epi64(a: __m128i, b: __m128i) -> __m128i {
    _mm_blendv_epi8(b, a, _mm_cmpgt_epi64(a, b))
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn min_epi64(a: __m128i, b: __m128i) -> __m128i {
    _mm_blendv_epi8(a, b, _mm_cmpgt_epi64(a, b))
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn max_epu64(a: __m128i, b: __m128i) -> __m128i {
    let bias = _mm_set1_epi64x(i64::MIN);
    let gt = _mm_cmpgt_epi64(_mm_xor_si128(a, bias), _mm_xor_si128(b, bias));
    _mm_blendv_epi8(b, a, gt)
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn min_epu64(a: __m128i, b: __m128i) -> __m128i {
    let bias = _mm_set1_epi64x(i64::MIN);
    let gt = _mm_cmpgt_epi64(_mm_xor_si128(a, bias), _mm_xor_si128(b, bias));
    _mm_blendv_epi8(a, b, gt)
}

// Lane-0 extraction per element type, applied after the horizontal
// collapse has funneled the result into the lowest lane.

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_u8(v: __m128i) -> u8 {
    _mm_extract_epi8::<0>(v) as u8
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_i8(v: __m128i) -> i8 {
    _mm_extract_epi8::<0>(v) as i8
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_u16(v: __m128i) -> u16 {
    _mm_extract_epi16::<0>(v) as u16
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_i16(v: __m128i) -> i16 {
    _mm_extract_epi16::<0>(v) as i16
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_u32(v: __m128i) -> u32 {
    _mm_cvtsi128_si32(v) as u32
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_i32(v: __m128i) -> i32 {
    _mm_cvtsi128_si32(v)
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_u64(v: __m128i) -> u64 {
    _mm_cvtsi128_si64(v) as u64
}

#[inline]
#[target_feature(enable = "sse4.2")]
pub(crate) unsafe fn first_i64(v: __m128i) -> i64 {
    _mm_cvtsi128_si64(v)
}

/// Stamp out one integer min/max reduction.
///
/// `$shift` lists the byte shifts of the horizontal collapse, from half
/// a register down to one element.
macro_rules! reduce_minmax {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $lanes:expr, $identity:expr,
     $vop:path, $extract:path, $scalar:path, $cmp:tt, [$($shift:expr),+]) => {
        $(#[$doc])*
        #[target_feature(enable = "sse4.2")]
        pub unsafe fn $name(values: &[$ty]) -> Option<$ty> {
            const LANES: usize = $lanes;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let identity = $identity;
            let mut acc0 = identity;
            let mut acc1 = identity;
            let mut acc2 = identity;
            let mut acc3 = identity;
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                acc0 = $vop(acc0, _mm_loadu_si128(ptr.add(i) as *const __m128i));
                acc1 = $vop(acc1, _mm_loadu_si128(ptr.add(i + LANES) as *const __m128i));
                acc2 = $vop(acc2, _mm_loadu_si128(ptr.add(i + 2 * LANES) as *const __m128i));
                acc3 = $vop(acc3, _mm_loadu_si128(ptr.add(i + 3 * LANES) as *const __m128i));
                i += 4 * LANES;
            }
            // At most three whole registers remain; fold them into the
            // first chain, widest spans first.
            while i + LANES <= len {
                acc0 = $vop(acc0, _mm_loadu_si128(ptr.add(i) as *const __m128i));
                i += LANES;
            }
            let mut acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            $( acc = $vop(acc, _mm_srli_si128::<{ $shift }>(acc)); )+
            let mut best = $extract(acc);
            while i < len {
                if values[i] $cmp best {
                    best = values[i];
                }
                i += 1;
            }
            Some(best)
        }
    };
}

reduce_minmax!(
    /// Maximum of a `u8` slice (SSE4.2 implementation).
    max_u8_sse42, u8, 16, _mm_setzero_si128(),
    _mm_max_epu8, first_u8, scalar::max_u8_scalar, >, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Minimum of a `u8` slice (SSE4.2 implementation).
    min_u8_sse42, u8, 16, _mm_set1_epi8(-1),
    _mm_min_epu8, first_u8, scalar::min_u8_scalar, <, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Maximum of an `i8` slice (SSE4.2 implementation).
    max_i8_sse42, i8, 16, _mm_set1_epi8(i8::MIN),
    _mm_max_epi8, first_i8, scalar::max_i8_scalar, >, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Minimum of an `i8` slice (SSE4.2 implementation).
    min_i8_sse42, i8, 16, _mm_set1_epi8(i8::MAX),
    _mm_min_epi8, first_i8, scalar::min_i8_scalar, <, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Maximum of a `u16` slice (SSE4.2 implementation).
    max_u16_sse42, u16, 8, _mm_setzero_si128(),
    _mm_max_epu16, first_u16, scalar::max_u16_scalar, >, [8, 4, 2]
);
reduce_minmax!(
    /// Minimum of a `u16` slice (SSE4.2 implementation).
    min_u16_sse42, u16, 8, _mm_set1_epi16(-1),
    _mm_min_epu16, first_u16, scalar::min_u16_scalar, <, [8, 4, 2]
);
reduce_minmax!(
    /// Maximum of an `i16` slice (SSE4.2 implementation).
    max_i16_sse42, i16, 8, _mm_set1_epi16(i16::MIN),
    _mm_max_epi16, first_i16, scalar::max_i16_scalar, >, [8, 4, 2]
);
reduce_minmax!(
    /// Minimum of an `i16` slice (SSE4.2 implementation).
    min_i16_sse42, i16, 8, _mm_set1_epi16(i16::MAX),
    _mm_min_epi16, first_i16, scalar::min_i16_scalar, <, [8, 4, 2]
);
reduce_minmax!(
    /// Maximum of a `u32` slice (SSE4.2 implementation).
    max_u32_sse42, u32, 4, _mm_setzero_si128(),
    _mm_max_epu32, first_u32, scalar::max_u32_scalar, >, [8, 4]
);
reduce_minmax!(
    /// Minimum of a `u32` slice (SSE4.2 implementation).
    min_u32_sse42, u32, 4, _mm_set1_epi32(-1),
    _mm_min_epu32, first_u32, scalar::min_u32_scalar, <, [8, 4]
);
reduce_minmax!(
    /// Maximum of an `i32` slice (SSE4.2 implementation).
    max_i32_sse42, i32, 4, _mm_set1_epi32(i32::MIN),
    _mm_max_epi32, first_i32, scalar::max_i32_scalar, >, [8, 4]
);
reduce_minmax!(
    /// Minimum of an `i32` slice (SSE4.2 implementation).
    min_i32_sse42, i32, 4, _mm_set1_epi32(i32::MAX),
    _mm_min_epi32, first_i32, scalar::min_i32_scalar, <, [8, 4]
);
reduce_minmax!(
    /// Maximum of a `u64` slice (SSE4.2 implementation).
    max_u64_sse42, u64, 2, _mm_setzero_si128(),
    max_epu64, first_u64, scalar::max_u64_scalar, >, [8]
);
reduce_minmax!(
    /// Minimum of a `u64` slice (SSE4.2 implementation).
    min_u64_sse42, u64, 2, _mm_set1_epi64x(-1),
    min_epu64, first_u64, scalar::min_u64_scalar, <, [8]
);
reduce_minmax!(
    /// Maximum of an `i64` slice (SSE4.2 implementation).
    max_i64_sse42, i64, 2, _mm_set1_epi64x(i64::MIN),
    max_epi64, first_i64, scalar::max_i64_scalar, >, [8]
);
reduce_minmax!(
    /// Minimum of an `i64` slice (SSE4.2 implementation).
    min_i64_sse42, i64, 2, _mm_set1_epi64x(i64::MAX),
    min_epi64, first_i64, scalar::min_i64_scalar, <, [8]
);

/// Stamp out one float min/max reduction.
///
/// `MAXPS`/`MINPS` silently drop a NaN in the first operand, so NaN
/// lanes are tracked separately with unordered compares and checked once
/// at the end. Any NaN makes the result NaN.
macro_rules! reduce_minmax_f32 {
    ($(#[$doc:meta])* $name:ident, $init:expr, $vop:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "sse4.2")]
        pub unsafe fn $name(values: &[f32]) -> Option<f32> {
            const LANES: usize = 4;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let mut acc0 = _mm_set1_ps($init);
            let mut acc1 = acc0;
            let mut acc2 = acc0;
            let mut acc3 = acc0;
            let mut nan = _mm_setzero_ps();
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                let v0 = _mm_loadu_ps(ptr.add(i));
                let v1 = _mm_loadu_ps(ptr.add(i + LANES));
                let v2 = _mm_loadu_ps(ptr.add(i + 2 * LANES));
                let v3 = _mm_loadu_ps(ptr.add(i + 3 * LANES));
                nan = _mm_or_ps(nan, _mm_cmpunord_ps(v0, v1));
                nan = _mm_or_ps(nan, _mm_cmpunord_ps(v2, v3));
                acc0 = $vop(acc0, v0);
                acc1 = $vop(acc1, v1);
                acc2 = $vop(acc2, v2);
                acc3 = $vop(acc3, v3);
                i += 4 * LANES;
            }
            while i + LANES <= len {
                let v = _mm_loadu_ps(ptr.add(i));
                nan = _mm_or_ps(nan, _mm_cmpunord_ps(v, v));
                acc0 = $vop(acc0, v);
                i += LANES;
            }
            let mut acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            acc = $vop(acc, _mm_movehl_ps(acc, acc));
            acc = $vop(acc, _mm_shuffle_ps::<0b01>(acc, acc));
            let mut best = _mm_cvtss_f32(acc);
            let mut saw_nan = _mm_movemask_ps(nan) != 0;
            while i < len {
                let v = values[i];
                if v.is_nan() {
                    saw_nan = true;
                } else if v $cmp best {
                    best = v;
                }
                i += 1;
            }
            if saw_nan {
                return Some(f32::NAN);
            }
            Some(best)
        }
    };
}

macro_rules! reduce_minmax_f64 {
    ($(#[$doc:meta])* $name:ident, $init:expr, $vop:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "sse4.2")]
        pub unsafe fn $name(values: &[f64]) -> Option<f64> {
            const LANES: usize = 2;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let mut acc0 = _mm_set1_pd($init);
            let mut acc1 = acc0;
            let mut acc2 = acc0;
            let mut acc3 = acc0;
            let mut nan = _mm_setzero_pd();
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                let v0 = _mm_loadu_pd(ptr.add(i));
                let v1 = _mm_loadu_pd(ptr.add(i + LANES));
                let v2 = _mm_loadu_pd(ptr.add(i + 2 * LANES));
                let v3 = _mm_loadu_pd(ptr.add(i + 3 * LANES));
                nan = _mm_or_pd(nan, _mm_cmpunord_pd(v0, v1));
                nan = _mm_or_pd(nan, _mm_cmpunord_pd(v2, v3));
                acc0 = $vop(acc0, v0);
                acc1 = $vop(acc1, v1);
                acc2 = $vop(acc2, v2);
                acc3 = $vop(acc3, v3);
                i += 4 * LANES;
            }
            while i + LANES <= len {
                let v = _mm_loadu_pd(ptr.add(i));
                nan = _mm_or_pd(nan, _mm_cmpunord_pd(v, v));
                acc0 = $vop(acc0, v);
                i += LANES;
            }
            let mut acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            acc = $vop(acc, _mm_unpackhi_pd(acc, acc));
            let mut best = _mm_cvtsd_f64(acc);
            let mut saw_nan = _mm_movemask_pd(nan) != 0;
            while i < len {
                let v = values[i];
                if v.is_nan() {
                    saw_nan = true;
                } else if v $cmp best {
                    best = v;
                }
                i += 1;
            }
            if saw_nan {
                return Some(f64::NAN);
            }
            Some(best)
        }
    };
}

reduce_minmax_f32!(
    /// Maximum of an `f32` slice; NaN if any element is NaN.
    max_f32_sse42, f32::NEG_INFINITY, _mm_max_ps, scalar::max_f32_scalar, >
);
reduce_minmax_f32!(
    /// Minimum of an `f32` slice; NaN if any element is NaN.
    min_f32_sse42, f32::INFINITY, _mm_min_ps, scalar::min_f32_scalar, <
);
reduce_minmax_f64!(
    /// Maximum of an `f64` slice; NaN if any element is NaN.
    max_f64_sse42, f64::NEG_INFINITY, _mm_max_pd, scalar::max_f64_scalar, >
);
reduce_minmax_f64!(
    /// Minimum of an `f64` slice; NaN if any element is NaN.
    min_f64_sse42, f64::INFINITY, _mm_min_pd, scalar::min_f64_scalar, <
);

/// Sortedness check for `u8` slices (SSE4.2 implementation).
///
/// Compares each window against itself shifted by one element; the pair
/// of loads stitches chunk boundaries without extra handling. A chunk is
/// in order iff `min(a, b) == a` in every lane.
#[target_feature(enable = "sse4.2")]
pub unsafe fn is_sorted_u8_sse42(values: &[u8]) -> bool {
    const LANES: usize = 16;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u8_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        let b = _mm_loadu_si128(ptr.add(i + 1) as *const __m128i);
        let ok = _mm_cmpeq_epi8(_mm_min_epu8(a, b), a);
        if _mm_movemask_epi8(ok) != 0xFFFF {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u8_scalar(&values[i..])
}

/// Sortedness check for `u32` slices (SSE4.2 implementation).
#[target_feature(enable = "sse4.2")]
pub unsafe fn is_sorted_u32_sse42(values: &[u32]) -> bool {
    const LANES: usize = 4;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        let b = _mm_loadu_si128(ptr.add(i + 1) as *const __m128i);
        let ok = _mm_cmpeq_epi32(_mm_min_epu32(a, b), a);
        if _mm_movemask_epi8(ok) != 0xFFFF {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u32_scalar(&values[i..])
}

/// Sortedness check for `i32` slices (SSE4.2 implementation).
///
/// Signed lanes use the greater-than compare directly: a chunk is in
/// order iff no lane has `a > b`.
#[target_feature(enable = "sse4.2")]
pub unsafe fn is_sorted_i32_sse42(values: &[i32]) -> bool {
    const LANES: usize = 4;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_i32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        let b = _mm_loadu_si128(ptr.add(i + 1) as *const __m128i);
        if _mm_movemask_epi8(_mm_cmpgt_epi32(a, b)) != 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_i32_scalar(&values[i..])
}

/// Sortedness check for `f64` slices (SSE4.2 implementation).
///
/// Requires `a <= b` in every lane; an ordered compare involving NaN is
/// false, so any NaN fails its window.
#[target_feature(enable = "sse4.2")]
pub unsafe fn is_sorted_f64_sse42(values: &[f64]) -> bool {
    const LANES: usize = 2;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_f64_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm_loadu_pd(ptr.add(i));
        let b = _mm_loadu_pd(ptr.add(i + 1));
        if _mm_movemask_pd(_mm_cmple_pd(a, b)) != 0b11 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_f64_scalar(&values[i..])
}

/// Apply a bit-combine to a register against a broadcast operand.
#[inline]
#[target_feature(enable = "sse4.2")]
unsafe fn combine_block(v: __m128i, operand: __m128i, combine: BitCombine) -> __m128i {
    let ones = _mm_set1_epi8(-1);
    match combine {
        BitCombine::Identity => v,
        BitCombine::And => _mm_and_si128(v, operand),
        BitCombine::Or => _mm_or_si128(v, operand),
        BitCombine::Xor => _mm_xor_si128(v, operand),
        BitCombine::AndNot => _mm_andnot_si128(operand, v),
        BitCombine::OrNot => _mm_or_si128(v, _mm_xor_si128(operand, ones)),
        BitCombine::Nand => _mm_xor_si128(_mm_and_si128(v, operand), ones),
        BitCombine::Nor => _mm_xor_si128(_mm_or_si128(v, operand), ones),
        BitCombine::Xnor => _mm_xor_si128(_mm_xor_si128(v, operand), ones),
        BitCombine::Not => _mm_xor_si128(v, ones),
    }
}

#[inline]
#[target_feature(enable = "sse4.2")]
unsafe fn popcount128(v: __m128i) -> u64 {
    let lo = (_mm_cvtsi128_si64(v) as u64).count_ones() as u64;
    let hi = (_mm_extract_epi64::<1>(v) as u64).count_ones() as u64;
    lo + hi
}

/// Count set bits after combining with a broadcast operand (SSE4.2
/// implementation).
///
/// Combines in-register, then counts the two extracted 64-bit lanes with
/// scalar popcounts, accumulated over four independent chains.
#[target_feature(enable = "sse4.2")]
pub unsafe fn count_bits_sse42(data: &[u8], combine: BitCombine, operand: u8) -> u64 {
    const LANES: usize = 16;
    let len = data.len();
    if combine == BitCombine::Not {
        return 8 * len as u64 - count_bits_sse42(data, BitCombine::Identity, operand);
    }
    if len < 4 * LANES {
        return scalar::count_bits_scalar(data, combine, operand);
    }
    let ptr = data.as_ptr();
    let op = _mm_set1_epi8(operand as i8);
    let mut total0 = 0u64;
    let mut total1 = 0u64;
    let mut total2 = 0u64;
    let mut total3 = 0u64;
    let mut i = 0usize;
    while i + 4 * LANES <= len {
        let v0 = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        let v1 = _mm_loadu_si128(ptr.add(i + LANES) as *const __m128i);
        let v2 = _mm_loadu_si128(ptr.add(i + 2 * LANES) as *const __m128i);
        let v3 = _mm_loadu_si128(ptr.add(i + 3 * LANES) as *const __m128i);
        total0 += popcount128(combine_block(v0, op, combine));
        total1 += popcount128(combine_block(v1, op, combine));
        total2 += popcount128(combine_block(v2, op, combine));
        total3 += popcount128(combine_block(v3, op, combine));
        i += 4 * LANES;
    }
    while i + LANES <= len {
        let v = _mm_loadu_si128(ptr.add(i) as *const __m128i);
        total0 += popcount128(combine_block(v, op, combine));
        i += LANES;
    }
    total0 + total1 + total2 + total3 + scalar::count_bits_scalar(&data[i..], combine, operand)
}

/// Bitwise equality of two equal-length slices (SSE4.2 implementation).
///
/// Short-circuits on the first 64-byte block with a differing lane.
#[target_feature(enable = "sse4.2")]
pub unsafe fn bits_equal_sse42(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    const LANES: usize = 16;
    let len = a.len();
    if len < LANES {
        return scalar::bits_equal_scalar(a, b);
    }
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut i = 0usize;
    while i + 4 * LANES <= len {
        let e0 = _mm_cmpeq_epi8(
            _mm_loadu_si128(pa.add(i) as *const __m128i),
            _mm_loadu_si128(pb.add(i) as *const __m128i),
        );
        let e1 = _mm_cmpeq_epi8(
            _mm_loadu_si128(pa.add(i + LANES) as *const __m128i),
            _mm_loadu_si128(pb.add(i + LANES) as *const __m128i),
        );
        let e2 = _mm_cmpeq_epi8(
            _mm_loadu_si128(pa.add(i + 2 * LANES) as *const __m128i),
            _mm_loadu_si128(pb.add(i + 2 * LANES) as *const __m128i),
        );
        let e3 = _mm_cmpeq_epi8(
            _mm_loadu_si128(pa.add(i + 3 * LANES) as *const __m128i),
            _mm_loadu_si128(pb.add(i + 3 * LANES) as *const __m128i),
        );
        let all = _mm_and_si128(_mm_and_si128(e0, e1), _mm_and_si128(e2, e3));
        if _mm_movemask_epi8(all) != 0xFFFF {
            return false;
        }
        i += 4 * LANES;
    }
    while i + LANES <= len {
        let eq = _mm_cmpeq_epi8(
            _mm_loadu_si128(pa.add(i) as *const __m128i),
            _mm_loadu_si128(pb.add(i) as *const __m128i),
        );
        if _mm_movemask_epi8(eq) != 0xFFFF {
            return false;
        }
        i += LANES;
    }
    scalar::bits_equal_scalar(&a[i..], &b[i..])
}

// Element reversal within narrow words for the remainder cascade. The
// overlapped fused pairs below write every byte's final value, so
// overlapping stores in the middle are benign.

#[inline]
pub(crate) fn rev_word_u64(x: u64, width: usize) -> u64 {
    match width {
        1 => x.swap_bytes(),
        2 => {
            let y = x.swap_bytes();
            ((y & 0x00FF_00FF_00FF_00FF) << 8) | ((y >> 8) & 0x00FF_00FF_00FF_00FF)
        }
        4 => x.rotate_left(32),
        _ => x,
    }
}

#[inline]
pub(crate) fn rev_word_u32(x: u32, width: usize) -> u32 {
    match width {
        1 => x.swap_bytes(),
        2 => x.rotate_left(16),
        _ => x,
    }
}

#[inline]
pub(crate) unsafe fn fused_swap_u64(base: *mut u8, lo: usize, hi: usize, width: usize) {
    let a = (base.add(lo) as *const u64).read_unaligned();
    let b = (base.add(hi - 8) as *const u64).read_unaligned();
    (base.add(lo) as *mut u64).write_unaligned(rev_word_u64(b, width));
    (base.add(hi - 8) as *mut u64).write_unaligned(rev_word_u64(a, width));
}

#[inline]
pub(crate) unsafe fn fused_swap_u32(base: *mut u8, lo: usize, hi: usize, width: usize) {
    let a = (base.add(lo) as *const u32).read_unaligned();
    let b = (base.add(hi - 4) as *const u32).read_unaligned();
    (base.add(lo) as *mut u32).write_unaligned(rev_word_u32(b, width));
    (base.add(hi - 4) as *mut u32).write_unaligned(rev_word_u32(a, width));
}

/// In-place reversal at power-of-two element widths (SSE4.2
/// implementation).
///
/// Fused reverse-and-swap: four cursors walk inward two blocks per side,
/// each 16-byte block is reversed in-register with a width-specific
/// shuffle and stored on the opposite side. The remainder descends
/// through overlapped 16-, 8-, and 4-byte fused pairs down to a single
/// two-byte exchange.
///
/// `data.len()` must be a multiple of `width`; `width` must be one of
/// 1, 2, 4, 8, or 16.
#[target_feature(enable = "sse4.2")]
pub unsafe fn reverse_pow2_sse42(data: &mut [u8], width: usize) {
    debug_assert_eq!(data.len() % width, 0);
    let base = data.as_mut_ptr();
    let mut lo = 0usize;
    let mut hi = data.len();

    if width == 16 {
        // The block is the element; swapping whole registers suffices.
        while hi - lo >= 32 {
            let l = _mm_loadu_si128(base.add(lo) as *const __m128i);
            let h = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
            _mm_storeu_si128(base.add(hi - 16) as *mut __m128i, l);
            _mm_storeu_si128(base.add(lo) as *mut __m128i, h);
            lo += 16;
            hi -= 16;
        }
        // Zero or one element remains in the middle.
        return;
    }

    let mask = tables::pow2_width_table(width);
    let mask = _mm_loadu_si128(mask.as_ptr() as *const __m128i);

    while hi - lo >= 64 {
        let l0 = _mm_loadu_si128(base.add(lo) as *const __m128i);
        let l1 = _mm_loadu_si128(base.add(lo + 16) as *const __m128i);
        let h1 = _mm_loadu_si128(base.add(hi - 32) as *const __m128i);
        let h0 = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
        _mm_storeu_si128(base.add(hi - 16) as *mut __m128i, _mm_shuffle_epi8(l0, mask));
        _mm_storeu_si128(base.add(hi - 32) as *mut __m128i, _mm_shuffle_epi8(l1, mask));
        _mm_storeu_si128(base.add(lo) as *mut __m128i, _mm_shuffle_epi8(h0, mask));
        _mm_storeu_si128(base.add(lo + 16) as *mut __m128i, _mm_shuffle_epi8(h1, mask));
        lo += 32;
        hi -= 32;
    }
    if hi - lo >= 32 {
        let l = _mm_loadu_si128(base.add(lo) as *const __m128i);
        let h = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
        _mm_storeu_si128(base.add(hi - 16) as *mut __m128i, _mm_shuffle_epi8(l, mask));
        _mm_storeu_si128(base.add(lo) as *mut __m128i, _mm_shuffle_epi8(h, mask));
        lo += 16;
        hi -= 16;
    }
    if hi - lo >= 16 {
        // Overlapped pair: both stores write final values, so the shared
        // middle bytes are written consistently.
        let l = _mm_loadu_si128(base.add(lo) as *const __m128i);
        let h = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
        _mm_storeu_si128(base.add(hi - 16) as *mut __m128i, _mm_shuffle_epi8(l, mask));
        _mm_storeu_si128(base.add(lo) as *mut __m128i, _mm_shuffle_epi8(h, mask));
        return;
    }
    if hi - lo >= 8 {
        fused_swap_u64(base, lo, hi, width);
        return;
    }
    if hi - lo >= 4 {
        fused_swap_u32(base, lo, hi, width);
        return;
    }
    // Below four bytes only single-byte elements still need work; a lone
    // two-byte element is its own mirror image, as is a single byte.
    if width == 1 && hi - lo >= 2 {
        let a = *base.add(lo);
        let b = *base.add(hi - 1);
        *base.add(lo) = b;
        *base.add(hi - 1) = a;
    }
}

/// In-place reversal at odd element widths 3, 5, and 6 (SSSE3 shuffles,
/// shared by the SSE4.2 and AVX2 dispatch paths).
///
/// Each side loads 16 bytes covering the largest whole group of elements
/// (5, 3, or 2), reverses the group with a precomputed shuffle table, and
/// copies only the group payload to the opposite side. The middle
/// remainder falls back to the scalar element exchange.
#[target_feature(enable = "ssse3")]
pub unsafe fn reverse_odd_sse42(data: &mut [u8], width: usize) {
    debug_assert_eq!(data.len() % width, 0);
    let Some((group, lo_tab, hi_tab)) = tables::odd_width_tables(width) else {
        return scalar::reverse_elements_scalar(data, width);
    };
    let payload = group * width;
    let lo_mask = _mm_loadu_si128(lo_tab.as_ptr() as *const __m128i);
    let hi_mask = _mm_loadu_si128(hi_tab.as_ptr() as *const __m128i);
    let base = data.as_mut_ptr();
    let mut lo = 0usize;
    let mut hi = data.len();
    while hi - lo >= 2 * payload {
        let l = _mm_loadu_si128(base.add(lo) as *const __m128i);
        let h = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
        let mut l_buf = [0u8; 16];
        let mut h_buf = [0u8; 16];
        _mm_storeu_si128(l_buf.as_mut_ptr() as *mut __m128i, _mm_shuffle_epi8(l, lo_mask));
        _mm_storeu_si128(h_buf.as_mut_ptr() as *mut __m128i, _mm_shuffle_epi8(h, hi_mask));
        std::ptr::copy_nonoverlapping(h_buf.as_ptr(), base.add(lo), payload);
        std::ptr::copy_nonoverlapping(l_buf.as_ptr(), base.add(hi - payload), payload);
        lo += payload;
        hi -= payload;
    }
    scalar::reverse_elements_scalar(&mut data[lo..hi], width);
}

/// Leftmost index in a sorted window strictly greater than `value`,
/// found by scanning 16-byte blocks backward from the end.
///
/// A block whose lanes are all greater than `value` is skipped in one
/// compare; the first block containing a lane `<= value` pinpoints the
/// boundary with a leading-zero count on the lane mask.
#[target_feature(enable = "sse4.2")]
unsafe fn insert_position_sse42(window: &[u8], value: u8) -> usize {
    const LANES: usize = 16;
    let ptr = window.as_ptr();
    let splat = _mm_set1_epi8(value as i8);
    let mut j = window.len();
    while j >= LANES {
        let blk = _mm_loadu_si128(ptr.add(j - LANES) as *const __m128i);
        let le = _mm_cmpeq_epi8(_mm_min_epu8(blk, splat), blk);
        let mask = _mm_movemask_epi8(le) as u32;
        if mask != 0 {
            let last_le = 31 - mask.leading_zeros() as usize;
            return j - LANES + last_le + 1;
        }
        j -= LANES;
    }
    scalar::insert_position_scalar(&window[..j], value)
}

/// Insertion sort for byte slices (SSE4.2 implementation).
#[target_feature(enable = "sse4.2")]
pub unsafe fn insertion_sort_sse42(data: &mut [u8]) {
    for i in 1..data.len() {
        let value = data[i];
        let idx = insert_position_sse42(&data[..i], value);
        if idx < i {
            data.copy_within(idx..i, idx + 1);
            data[idx] = value;
        }
    }
}

/// Counting sort for byte slices (SSE4.2 implementation).
///
/// Scalar histogram pass with min/max tracking, then bucket emission by
/// broadcast stores. The broadcast register is incremented in place by
/// subtracting all-ones between buckets, including skipped empty ones.
#[target_feature(enable = "sse4.2")]
pub unsafe fn counting_sort_sse42(data: &mut [u8]) {
    const LANES: usize = 16;
    if data.len() <= 1 {
        return;
    }

    let mut counts = [0usize; 256];
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for &byte in data.iter() {
        counts[byte as usize] += 1;
        if byte < min {
            min = byte;
        }
        if byte > max {
            max = byte;
        }
    }

    let base = data.as_mut_ptr();
    let minus_one = _mm_set1_epi8(-1);
    let mut fill = _mm_set1_epi8(min as i8);
    let mut out = 0usize;
    for value in min..=max {
        let count = counts[value as usize];
        if count > 0 {
            let mut i = 0usize;
            while i + LANES <= count {
                _mm_storeu_si128(base.add(out + i) as *mut __m128i, fill);
                i += LANES;
            }
            if i < count {
                data[out + i..out + count].fill(value);
            }
            out += count;
        }
        fill = _mm_sub_epi8(fill, minus_one);
    }
    debug_assert_eq!(out, data.len());
}

/// Hybrid byte sort (SSE4.2 implementation): insertion sort below
/// `threshold` elements, counting sort at or above.
#[target_feature(enable = "sse4.2")]
pub unsafe fn sort_u8_sse42(data: &mut [u8], threshold: usize) {
    if data.len() < threshold {
        insertion_sort_sse42(data);
    } else {
        counting_sort_sse42(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_sse42() -> bool {
        is_x86_feature_detected!("sse4.2")
    }

    #[test]
    fn test_minmax_matches_scalar() {
        if !has_sse42() {
            return;
        }
        let bytes: Vec<u8> = (0..997u32).map(|i| (i * 31 % 251) as u8).collect();
        unsafe {
            assert_eq!(max_u8_sse42(&bytes), scalar::max_u8_scalar(&bytes));
            assert_eq!(min_u8_sse42(&bytes), scalar::min_u8_scalar(&bytes));
        }

        let longs: Vec<i64> = (0..133).map(|i| (i * 7919 - 500_000) as i64).collect();
        unsafe {
            assert_eq!(max_i64_sse42(&longs), scalar::max_i64_scalar(&longs));
            assert_eq!(min_i64_sse42(&longs), scalar::min_i64_scalar(&longs));
        }

        let wide: Vec<u64> = (0..67).map(|i| u64::MAX - i * 3).collect();
        unsafe {
            assert_eq!(max_u64_sse42(&wide), Some(u64::MAX));
            assert_eq!(min_u64_sse42(&wide), Some(u64::MAX - 66 * 3));
        }
    }

    #[test]
    fn test_minmax_small_inputs() {
        if !has_sse42() {
            return;
        }
        unsafe {
            assert_eq!(max_u8_sse42(&[]), None);
            assert_eq!(max_u8_sse42(&[5, 3, 8, 1, 9, 2]), Some(9));
            assert_eq!(min_u8_sse42(&[5, 3, 8, 1, 9, 2]), Some(1));
            assert_eq!(max_i16_sse42(&[-3, 7]), Some(7));
        }
    }

    #[test]
    fn test_minmax_float_nan() {
        if !has_sse42() {
            return;
        }
        let mut values: Vec<f64> = (0..100).map(|i| i as f64 * 0.5 - 10.0).collect();
        unsafe {
            assert_eq!(max_f64_sse42(&values), Some(39.5));
            assert_eq!(min_f64_sse42(&values), Some(-10.0));
        }
        values[57] = f64::NAN;
        unsafe {
            assert!(max_f64_sse42(&values).unwrap().is_nan());
            assert!(min_f64_sse42(&values).unwrap().is_nan());
        }
        // NaN in the scalar tail (odd length leaves one element there).
        values[57] = 0.0;
        values.push(f64::NAN);
        unsafe {
            assert!(max_f64_sse42(&values).unwrap().is_nan());
        }
    }

    #[test]
    fn test_is_sorted() {
        if !has_sse42() {
            return;
        }
        let sorted: Vec<u32> = (0..500).collect();
        let mut unsorted = sorted.clone();
        unsorted.swap(200, 201);
        unsafe {
            assert!(is_sorted_u32_sse42(&sorted));
            assert!(!is_sorted_u32_sse42(&unsorted));
        }

        // Failure straddling a chunk boundary.
        let mut bytes: Vec<u8> = (0..200u32).map(|i| (i / 2) as u8).collect();
        unsafe {
            assert!(is_sorted_u8_sse42(&bytes));
        }
        bytes.swap(15, 16);
        unsafe {
            assert!(!is_sorted_u8_sse42(&bytes));
        }

        let signed: Vec<i32> = (-250..250).collect();
        unsafe {
            assert!(is_sorted_i32_sse42(&signed));
        }

        let mut floats: Vec<f64> = (0..64).map(f64::from).collect();
        unsafe {
            assert!(is_sorted_f64_sse42(&floats));
        }
        floats[30] = f64::NAN;
        unsafe {
            assert!(!is_sorted_f64_sse42(&floats));
        }
    }

    #[test]
    fn test_count_bits_matches_scalar() {
        if !has_sse42() {
            return;
        }
        let data: Vec<u8> = (0..777u32).map(|i| (i * 13 % 256) as u8).collect();
        for combine in crate::combine::BitCombine::ALL {
            for operand in [0x00u8, 0x5A, 0xFF] {
                let expected = scalar::count_bits_scalar(&data, combine, operand);
                let got = unsafe { count_bits_sse42(&data, combine, operand) };
                assert_eq!(got, expected, "combine={:?} operand={:#x}", combine, operand);
            }
        }
    }

    #[test]
    fn test_bits_equal() {
        if !has_sse42() {
            return;
        }
        let a: Vec<u8> = (0..300u32).map(|i| (i % 256) as u8).collect();
        let mut b = a.clone();
        unsafe {
            assert!(bits_equal_sse42(&a, &b));
        }
        // Flip one byte in each region: unrolled body, drain, tail.
        for pos in [10usize, 270, 298] {
            b[pos] ^= 0x80;
            unsafe {
                assert!(!bits_equal_sse42(&a, &b));
            }
            b[pos] ^= 0x80;
        }
    }

    #[test]
    fn test_reverse_pow2() {
        if !has_sse42() {
            return;
        }
        for width in [1usize, 2, 4, 8, 16] {
            for count in [0usize, 1, 2, 3, 7, 16, 33, 100, 1024] {
                let original: Vec<u8> =
                    (0..count * width).map(|i| (i % 251) as u8).collect();
                let mut data = original.clone();
                let mut expected = original.clone();
                scalar::reverse_elements_scalar(&mut expected, width);
                unsafe {
                    reverse_pow2_sse42(&mut data, width);
                }
                assert_eq!(data, expected, "width={} count={}", width, count);
            }
        }
    }

    #[test]
    fn test_reverse_odd() {
        if !has_sse42() {
            return;
        }
        for width in [3usize, 5, 6] {
            for count in [0usize, 1, 2, 4, 5, 9, 10, 11, 63, 256] {
                let original: Vec<u8> =
                    (0..count * width).map(|i| (i % 249) as u8).collect();
                let mut data = original.clone();
                let mut expected = original.clone();
                scalar::reverse_elements_scalar(&mut expected, width);
                unsafe {
                    reverse_odd_sse42(&mut data, width);
                }
                assert_eq!(data, expected, "width={} count={}", width, count);
            }
        }
    }

    #[test]
    fn test_insert_position() {
        if !has_sse42() {
            return;
        }
        let window: Vec<u8> = (0..64u32).map(|i| (i * 4) as u8).collect();
        unsafe {
            assert_eq!(insert_position_sse42(&window, 0), 1);
            assert_eq!(insert_position_sse42(&window, 7), 2);
            assert_eq!(insert_position_sse42(&window, 255), 64);
            assert_eq!(
                insert_position_sse42(&window, 130),
                scalar::insert_position_scalar(&window, 130)
            );
        }
    }

    #[test]
    fn test_sort_both_paths() {
        if !has_sse42() {
            return;
        }
        for len in [0usize, 1, 6, 100, 499, 500, 5000] {
            let input: Vec<u8> = (0..len as u32).map(|i| (i * 97 % 256) as u8).collect();
            let mut expected = input.clone();
            expected.sort_unstable();
            let mut data = input.clone();
            unsafe {
                sort_u8_sse42(&mut data, 500);
            }
            assert_eq!(data, expected, "len={}", len);
        }
    }
}
