//! AVX2 (256-bit) implementations of the kernel operations.
//!
//! Same reduction shape as the 128-bit tier at twice the register width:
//! four independent accumulators, a widest-first drain, a pairwise
//! merge, then a horizontal collapse that folds the two 128-bit halves
//! together and finishes with the half-width shift cascade. The 128-bit
//! collapse stage and the 64-bit lane min/max borrow the helpers from
//! the SSE4.2 module, whose features AVX2 implies.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::combine::BitCombine;
use crate::simd::scalar;
use crate::simd::sse42;
use crate::simd::tables;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn max_epi64_256(a: __m256i, b: __m256i) -> __m256i {
    _mm256_blendv_epi8(b, a, _mm256_cmpgt_epi64(a, b))
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn min_epi64_256(a: __m256i, b: __m256i) -> __m256i {
    _mm256_blendv_epi8(a, b, _mm256_cmpgt_epi64(a, b))
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn max_epu64_256(a: __m256i, b: __m256i) -> __m256i {
    let bias = _mm256_set1_epi64x(i64::MIN);
    let gt = _mm256_cmpgt_epi64(_mm256_xor_si256(a, bias), _mm256_xor_si256(b, bias));
    _mm256_blendv_epi8(b, a, gt)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn min_epu64_256(a: __m256i, b: __m256i) -> __m256i {
    let bias = _mm256_set1_epi64x(i64::MIN);
    let gt = _mm256_cmpgt_epi64(_mm256_xor_si256(a, bias), _mm256_xor_si256(b, bias));
    _mm256_blendv_epi8(a, b, gt)
}

/// Stamp out one integer min/max reduction.
///
/// `$vop128` folds the two 128-bit halves during the collapse; `$shift`
/// lists the byte shifts of the final cascade.
macro_rules! reduce_minmax {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $lanes:expr, $identity:expr,
     $vop:path, $vop128:path, $extract:path, $scalar:path, $cmp:tt, [$($shift:expr),+]) => {
        $(#[$doc])*
        #[target_feature(enable = "avx2")]
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
                acc0 = $vop(acc0, _mm256_loadu_si256(ptr.add(i) as *const __m256i));
                acc1 = $vop(acc1, _mm256_loadu_si256(ptr.add(i + LANES) as *const __m256i));
                acc2 = $vop(acc2, _mm256_loadu_si256(ptr.add(i + 2 * LANES) as *const __m256i));
                acc3 = $vop(acc3, _mm256_loadu_si256(ptr.add(i + 3 * LANES) as *const __m256i));
                i += 4 * LANES;
            }
            // At most three whole registers remain.
            while i + LANES <= len {
                acc0 = $vop(acc0, _mm256_loadu_si256(ptr.add(i) as *const __m256i));
                i += LANES;
            }
            let acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            let mut acc = $vop128(
                _mm256_castsi256_si128(acc),
                _mm256_extracti128_si256::<1>(acc),
            );
            $( acc = $vop128(acc, _mm_srli_si128::<{ $shift }>(acc)); )+
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
    /// Maximum of a `u8` slice (AVX2 implementation).
    max_u8_avx2, u8, 32, _mm256_setzero_si256(),
    _mm256_max_epu8, _mm_max_epu8, sse42::first_u8, scalar::max_u8_scalar, >, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Minimum of a `u8` slice (AVX2 implementation).
    min_u8_avx2, u8, 32, _mm256_set1_epi8(-1),
    _mm256_min_epu8, _mm_min_epu8, sse42::first_u8, scalar::min_u8_scalar, <, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Maximum of an `i8` slice (AVX2 implementation).
    max_i8_avx2, i8, 32, _mm256_set1_epi8(i8::MIN),
    _mm256_max_epi8, _mm_max_epi8, sse42::first_i8, scalar::max_i8_scalar, >, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Minimum of an `i8` slice (AVX2 implementation).
    min_i8_avx2, i8, 32, _mm256_set1_epi8(i8::MAX),
    _mm256_min_epi8, _mm_min_epi8, sse42::first_i8, scalar::min_i8_scalar, <, [8, 4, 2, 1]
);
reduce_minmax!(
    /// Maximum of a `u16` slice (AVX2 implementation).
    max_u16_avx2, u16, 16, _mm256_setzero_si256(),
    _mm256_max_epu16, _mm_max_epu16, sse42::first_u16, scalar::max_u16_scalar, >, [8, 4, 2]
);
reduce_minmax!(
    /// Minimum of a `u16` slice (AVX2 implementation).
    min_u16_avx2, u16, 16, _mm256_set1_epi16(-1),
    _mm256_min_epu16, _mm_min_epu16, sse42::first_u16, scalar::min_u16_scalar, <, [8, 4, 2]
);
reduce_minmax!(
    /// Maximum of an `i16` slice (AVX2 implementation).
    max_i16_avx2, i16, 16, _mm256_set1_epi16(i16::MIN),
    _mm256_max_epi16, _mm_max_epi16, sse42::first_i16, scalar::max_i16_scalar, >, [8, 4, 2]
);
reduce_minmax!(
    /// Minimum of an `i16` slice (AVX2 implementation).
    min_i16_avx2, i16, 16, _mm256_set1_epi16(i16::MAX),
    _mm256_min_epi16, _mm_min_epi16, sse42::first_i16, scalar::min_i16_scalar, <, [8, 4, 2]
);
reduce_minmax!(
    /// Maximum of a `u32` slice (AVX2 implementation).
    max_u32_avx2, u32, 8, _mm256_setzero_si256(),
    _mm256_max_epu32, _mm_max_epu32, sse42::first_u32, scalar::max_u32_scalar, >, [8, 4]
);
reduce_minmax!(
    /// Minimum of a `u32` slice (AVX2 implementation).
    min_u32_avx2, u32, 8, _mm256_set1_epi32(-1),
    _mm256_min_epu32, _mm_min_epu32, sse42::first_u32, scalar::min_u32_scalar, <, [8, 4]
);
reduce_minmax!(
    /// Maximum of an `i32` slice (AVX2 implementation).
    max_i32_avx2, i32, 8, _mm256_set1_epi32(i32::MIN),
    _mm256_max_epi32, _mm_max_epi32, sse42::first_i32, scalar::max_i32_scalar, >, [8, 4]
);
reduce_minmax!(
    /// Minimum of an `i32` slice (AVX2 implementation).
    min_i32_avx2, i32, 8, _mm256_set1_epi32(i32::MAX),
    _mm256_min_epi32, _mm_min_epi32, sse42::first_i32, scalar::min_i32_scalar, <, [8, 4]
);
reduce_minmax!(
    /// Maximum of a `u64` slice (AVX2 implementation).
    max_u64_avx2, u64, 4, _mm256_setzero_si256(),
    max_epu64_256, sse42::max_epu64, sse42::first_u64, scalar::max_u64_scalar, >, [8]
);
reduce_minmax!(
    /// Minimum of a `u64` slice (AVX2 implementation).
    min_u64_avx2, u64, 4, _mm256_set1_epi64x(-1),
    min_epu64_256, sse42::min_epu64, sse42::first_u64, scalar::min_u64_scalar, <, [8]
);
reduce_minmax!(
    /// Maximum of an `i64` slice (AVX2 implementation).
    max_i64_avx2, i64, 4, _mm256_set1_epi64x(i64::MIN),
    max_epi64_256, sse42::max_epi64, sse42::first_i64, scalar::max_i64_scalar, >, [8]
);
reduce_minmax!(
    /// Minimum of an `i64` slice (AVX2 implementation).
    min_i64_avx2, i64, 4, _mm256_set1_epi64x(i64::MAX),
    min_epi64_256, sse42::min_epi64, sse42::first_i64, scalar::min_i64_scalar, <, [8]
);

/// Float min/max reductions with the same NaN tracking as the 128-bit
/// tier: unordered-compare masks accumulate NaN sightings, checked once
/// after the collapse.
macro_rules! reduce_minmax_f32 {
    ($(#[$doc:meta])* $name:ident, $init:expr, $vop:path, $vop128:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "avx2")]
        pub unsafe fn $name(values: &[f32]) -> Option<f32> {
            const LANES: usize = 8;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let mut acc0 = _mm256_set1_ps($init);
            let mut acc1 = acc0;
            let mut acc2 = acc0;
            let mut acc3 = acc0;
            let mut nan = _mm256_setzero_ps();
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                let v0 = _mm256_loadu_ps(ptr.add(i));
                let v1 = _mm256_loadu_ps(ptr.add(i + LANES));
                let v2 = _mm256_loadu_ps(ptr.add(i + 2 * LANES));
                let v3 = _mm256_loadu_ps(ptr.add(i + 3 * LANES));
                nan = _mm256_or_ps(nan, _mm256_cmp_ps::<_CMP_UNORD_Q>(v0, v1));
                nan = _mm256_or_ps(nan, _mm256_cmp_ps::<_CMP_UNORD_Q>(v2, v3));
                acc0 = $vop(acc0, v0);
                acc1 = $vop(acc1, v1);
                acc2 = $vop(acc2, v2);
                acc3 = $vop(acc3, v3);
                i += 4 * LANES;
            }
            while i + LANES <= len {
                let v = _mm256_loadu_ps(ptr.add(i));
                nan = _mm256_or_ps(nan, _mm256_cmp_ps::<_CMP_UNORD_Q>(v, v));
                acc0 = $vop(acc0, v);
                i += LANES;
            }
            let acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            let mut acc = $vop128(
                _mm256_castps256_ps128(acc),
                _mm256_extractf128_ps::<1>(acc),
            );
            acc = $vop128(acc, _mm_movehl_ps(acc, acc));
            acc = $vop128(acc, _mm_shuffle_ps::<0b01>(acc, acc));
            let mut best = _mm_cvtss_f32(acc);
            let mut saw_nan = _mm256_movemask_ps(nan) != 0;
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
    ($(#[$doc:meta])* $name:ident, $init:expr, $vop:path, $vop128:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "avx2")]
        pub unsafe fn $name(values: &[f64]) -> Option<f64> {
            const LANES: usize = 4;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let mut acc0 = _mm256_set1_pd($init);
            let mut acc1 = acc0;
            let mut acc2 = acc0;
            let mut acc3 = acc0;
            let mut nan = _mm256_setzero_pd();
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                let v0 = _mm256_loadu_pd(ptr.add(i));
                let v1 = _mm256_loadu_pd(ptr.add(i + LANES));
                let v2 = _mm256_loadu_pd(ptr.add(i + 2 * LANES));
                let v3 = _mm256_loadu_pd(ptr.add(i + 3 * LANES));
                nan = _mm256_or_pd(nan, _mm256_cmp_pd::<_CMP_UNORD_Q>(v0, v1));
                nan = _mm256_or_pd(nan, _mm256_cmp_pd::<_CMP_UNORD_Q>(v2, v3));
                acc0 = $vop(acc0, v0);
                acc1 = $vop(acc1, v1);
                acc2 = $vop(acc2, v2);
                acc3 = $vop(acc3, v3);
                i += 4 * LANES;
            }
            while i + LANES <= len {
                let v = _mm256_loadu_pd(ptr.add(i));
                nan = _mm256_or_pd(nan, _mm256_cmp_pd::<_CMP_UNORD_Q>(v, v));
                acc0 = $vop(acc0, v);
                i += LANES;
            }
            let acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            let mut acc = $vop128(
                _mm256_castpd256_pd128(acc),
                _mm256_extractf128_pd::<1>(acc),
            );
            acc = $vop128(acc, _mm_unpackhi_pd(acc, acc));
            let mut best = _mm_cvtsd_f64(acc);
            let mut saw_nan = _mm256_movemask_pd(nan) != 0;
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
    max_f32_avx2, f32::NEG_INFINITY, _mm256_max_ps, _mm_max_ps, scalar::max_f32_scalar, >
);
reduce_minmax_f32!(
    /// Minimum of an `f32` slice; NaN if any element is NaN.
    min_f32_avx2, f32::INFINITY, _mm256_min_ps, _mm_min_ps, scalar::min_f32_scalar, <
);
reduce_minmax_f64!(
    /// Maximum of an `f64` slice; NaN if any element is NaN.
    max_f64_avx2, f64::NEG_INFINITY, _mm256_max_pd, _mm_max_pd, scalar::max_f64_scalar, >
);
reduce_minmax_f64!(
    /// Minimum of an `f64` slice; NaN if any element is NaN.
    min_f64_avx2, f64::INFINITY, _mm256_min_pd, _mm_min_pd, scalar::min_f64_scalar, <
);

/// Sortedness check for `u8` slices (AVX2 implementation).
#[target_feature(enable = "avx2")]
pub unsafe fn is_sorted_u8_avx2(values: &[u8]) -> bool {
    const LANES: usize = 32;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u8_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        let b = _mm256_loadu_si256(ptr.add(i + 1) as *const __m256i);
        let ok = _mm256_cmpeq_epi8(_mm256_min_epu8(a, b), a);
        if _mm256_movemask_epi8(ok) != -1 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u8_scalar(&values[i..])
}

/// Sortedness check for `u32` slices (AVX2 implementation).
#[target_feature(enable = "avx2")]
pub unsafe fn is_sorted_u32_avx2(values: &[u32]) -> bool {
    const LANES: usize = 8;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        let b = _mm256_loadu_si256(ptr.add(i + 1) as *const __m256i);
        let ok = _mm256_cmpeq_epi32(_mm256_min_epu32(a, b), a);
        if _mm256_movemask_epi8(ok) != -1 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u32_scalar(&values[i..])
}

/// Sortedness check for `i32` slices (AVX2 implementation).
#[target_feature(enable = "avx2")]
pub unsafe fn is_sorted_i32_avx2(values: &[i32]) -> bool {
    const LANES: usize = 8;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_i32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        let b = _mm256_loadu_si256(ptr.add(i + 1) as *const __m256i);
        if _mm256_movemask_epi8(_mm256_cmpgt_epi32(a, b)) != 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_i32_scalar(&values[i..])
}

/// Sortedness check for `f64` slices (AVX2 implementation). NaN fails
/// its ordered compares.
#[target_feature(enable = "avx2")]
pub unsafe fn is_sorted_f64_avx2(values: &[f64]) -> bool {
    const LANES: usize = 4;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_f64_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = _mm256_loadu_pd(ptr.add(i));
        let b = _mm256_loadu_pd(ptr.add(i + 1));
        if _mm256_movemask_pd(_mm256_cmp_pd::<_CMP_LE_OQ>(a, b)) != 0xF {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_f64_scalar(&values[i..])
}

/// Apply a bit-combine to a register against a broadcast operand.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn combine_block(v: __m256i, operand: __m256i, combine: BitCombine) -> __m256i {
    let ones = _mm256_set1_epi8(-1);
    match combine {
        BitCombine::Identity => v,
        BitCombine::And => _mm256_and_si256(v, operand),
        BitCombine::Or => _mm256_or_si256(v, operand),
        BitCombine::Xor => _mm256_xor_si256(v, operand),
        BitCombine::AndNot => _mm256_andnot_si256(operand, v),
        BitCombine::OrNot => _mm256_or_si256(v, _mm256_xor_si256(operand, ones)),
        BitCombine::Nand => _mm256_xor_si256(_mm256_and_si256(v, operand), ones),
        BitCombine::Nor => _mm256_xor_si256(_mm256_or_si256(v, operand), ones),
        BitCombine::Xnor => _mm256_xor_si256(_mm256_xor_si256(v, operand), ones),
        BitCombine::Not => _mm256_xor_si256(v, ones),
    }
}

/// Per-byte popcount via the nibble lookup table, summed into four
/// 64-bit lanes with `VPSADBW`.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn popcount256(v: __m256i) -> __m256i {
    let lut = _mm256_setr_epi8(
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4,
        0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4,
    );
    let low_mask = _mm256_set1_epi8(0x0F);
    let lo = _mm256_and_si256(v, low_mask);
    let hi = _mm256_and_si256(_mm256_srli_epi16::<4>(v), low_mask);
    let counts = _mm256_add_epi8(
        _mm256_shuffle_epi8(lut, lo),
        _mm256_shuffle_epi8(lut, hi),
    );
    _mm256_sad_epu8(counts, _mm256_setzero_si256())
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn sum_epi64(v: __m256i) -> u64 {
    let lo = _mm256_castsi256_si128(v);
    let hi = _mm256_extracti128_si256::<1>(v);
    let pair = _mm_add_epi64(lo, hi);
    (_mm_cvtsi128_si64(pair) as u64).wrapping_add(_mm_extract_epi64::<1>(pair) as u64)
}

/// Count set bits after combining with a broadcast operand (AVX2
/// implementation).
///
/// Each register is combined in place, popcounted per byte through the
/// nibble table, and accumulated as 64-bit lane sums across four
/// independent chains.
#[target_feature(enable = "avx2")]
pub unsafe fn count_bits_avx2(data: &[u8], combine: BitCombine, operand: u8) -> u64 {
    const LANES: usize = 32;
    let len = data.len();
    if combine == BitCombine::Not {
        return 8 * len as u64 - count_bits_avx2(data, BitCombine::Identity, operand);
    }
    if len < 4 * LANES {
        return scalar::count_bits_scalar(data, combine, operand);
    }
    let ptr = data.as_ptr();
    let op = _mm256_set1_epi8(operand as i8);
    let mut acc0 = _mm256_setzero_si256();
    let mut acc1 = acc0;
    let mut acc2 = acc0;
    let mut acc3 = acc0;
    let mut i = 0usize;
    while i + 4 * LANES <= len {
        let v0 = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        let v1 = _mm256_loadu_si256(ptr.add(i + LANES) as *const __m256i);
        let v2 = _mm256_loadu_si256(ptr.add(i + 2 * LANES) as *const __m256i);
        let v3 = _mm256_loadu_si256(ptr.add(i + 3 * LANES) as *const __m256i);
        acc0 = _mm256_add_epi64(acc0, popcount256(combine_block(v0, op, combine)));
        acc1 = _mm256_add_epi64(acc1, popcount256(combine_block(v1, op, combine)));
        acc2 = _mm256_add_epi64(acc2, popcount256(combine_block(v2, op, combine)));
        acc3 = _mm256_add_epi64(acc3, popcount256(combine_block(v3, op, combine)));
        i += 4 * LANES;
    }
    while i + LANES <= len {
        let v = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
        acc0 = _mm256_add_epi64(acc0, popcount256(combine_block(v, op, combine)));
        i += LANES;
    }
    let acc = _mm256_add_epi64(_mm256_add_epi64(acc0, acc1), _mm256_add_epi64(acc2, acc3));
    sum_epi64(acc) + scalar::count_bits_scalar(&data[i..], combine, operand)
}

/// Bitwise equality of two equal-length slices (AVX2 implementation).
#[target_feature(enable = "avx2")]
pub unsafe fn bits_equal_avx2(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    const LANES: usize = 32;
    let len = a.len();
    if len < LANES {
        return scalar::bits_equal_scalar(a, b);
    }
    let pa = a.as_ptr();
    let pb = b.as_ptr();
    let mut i = 0usize;
    while i + 4 * LANES <= len {
        let e0 = _mm256_cmpeq_epi8(
            _mm256_loadu_si256(pa.add(i) as *const __m256i),
            _mm256_loadu_si256(pb.add(i) as *const __m256i),
        );
        let e1 = _mm256_cmpeq_epi8(
            _mm256_loadu_si256(pa.add(i + LANES) as *const __m256i),
            _mm256_loadu_si256(pb.add(i + LANES) as *const __m256i),
        );
        let e2 = _mm256_cmpeq_epi8(
            _mm256_loadu_si256(pa.add(i + 2 * LANES) as *const __m256i),
            _mm256_loadu_si256(pb.add(i + 2 * LANES) as *const __m256i),
        );
        let e3 = _mm256_cmpeq_epi8(
            _mm256_loadu_si256(pa.add(i + 3 * LANES) as *const __m256i),
            _mm256_loadu_si256(pb.add(i + 3 * LANES) as *const __m256i),
        );
        let all = _mm256_and_si256(_mm256_and_si256(e0, e1), _mm256_and_si256(e2, e3));
        if _mm256_movemask_epi8(all) != -1 {
            return false;
        }
        i += 4 * LANES;
    }
    while i + LANES <= len {
        let eq = _mm256_cmpeq_epi8(
            _mm256_loadu_si256(pa.add(i) as *const __m256i),
            _mm256_loadu_si256(pb.add(i) as *const __m256i),
        );
        if _mm256_movemask_epi8(eq) != -1 {
            return false;
        }
        i += LANES;
    }
    scalar::bits_equal_scalar(&a[i..], &b[i..])
}

/// Reverse a 256-bit register at a power-of-two element width below 16:
/// a per-lane byte shuffle followed by a lane swap.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rev256(v: __m256i, mask: __m256i) -> __m256i {
    let shuffled = _mm256_shuffle_epi8(v, mask);
    _mm256_permute2x128_si256::<0x01>(shuffled, shuffled)
}

/// In-place reversal at power-of-two element widths (AVX2
/// implementation).
///
/// Same fused reverse-and-swap walk as the 128-bit tier with 32-byte
/// blocks; the remainder descends through an overlapped 32-byte pair, a
/// 16-byte pair, and the narrow word cascade.
#[target_feature(enable = "avx2")]
pub unsafe fn reverse_pow2_avx2(data: &mut [u8], width: usize) {
    debug_assert_eq!(data.len() % width, 0);
    let base = data.as_mut_ptr();
    let mut lo = 0usize;
    let mut hi = data.len();

    if width == 16 {
        // Each 32-byte block holds two whole elements; the lane swap is
        // the block reversal.
        while hi - lo >= 64 {
            let l = _mm256_loadu_si256(base.add(lo) as *const __m256i);
            let h = _mm256_loadu_si256(base.add(hi - 32) as *const __m256i);
            _mm256_storeu_si256(
                base.add(hi - 32) as *mut __m256i,
                _mm256_permute2x128_si256::<0x01>(l, l),
            );
            _mm256_storeu_si256(
                base.add(lo) as *mut __m256i,
                _mm256_permute2x128_si256::<0x01>(h, h),
            );
            lo += 32;
            hi -= 32;
        }
        if hi - lo >= 32 {
            let l = _mm256_loadu_si256(base.add(lo) as *const __m256i);
            let h = _mm256_loadu_si256(base.add(hi - 32) as *const __m256i);
            _mm256_storeu_si256(
                base.add(hi - 32) as *mut __m256i,
                _mm256_permute2x128_si256::<0x01>(l, l),
            );
            _mm256_storeu_si256(
                base.add(lo) as *mut __m256i,
                _mm256_permute2x128_si256::<0x01>(h, h),
            );
        }
        // Zero or one element remains in the middle.
        return;
    }

    let table = tables::pow2_width_table(width);
    let mask = _mm256_broadcastsi128_si256(_mm_loadu_si128(table.as_ptr() as *const __m128i));
    let mask128 = _mm_loadu_si128(table.as_ptr() as *const __m128i);

    while hi - lo >= 128 {
        let l0 = _mm256_loadu_si256(base.add(lo) as *const __m256i);
        let l1 = _mm256_loadu_si256(base.add(lo + 32) as *const __m256i);
        let h1 = _mm256_loadu_si256(base.add(hi - 64) as *const __m256i);
        let h0 = _mm256_loadu_si256(base.add(hi - 32) as *const __m256i);
        _mm256_storeu_si256(base.add(hi - 32) as *mut __m256i, rev256(l0, mask));
        _mm256_storeu_si256(base.add(hi - 64) as *mut __m256i, rev256(l1, mask));
        _mm256_storeu_si256(base.add(lo) as *mut __m256i, rev256(h0, mask));
        _mm256_storeu_si256(base.add(lo + 32) as *mut __m256i, rev256(h1, mask));
        lo += 64;
        hi -= 64;
    }
    if hi - lo >= 64 {
        let l = _mm256_loadu_si256(base.add(lo) as *const __m256i);
        let h = _mm256_loadu_si256(base.add(hi - 32) as *const __m256i);
        _mm256_storeu_si256(base.add(hi - 32) as *mut __m256i, rev256(l, mask));
        _mm256_storeu_si256(base.add(lo) as *mut __m256i, rev256(h, mask));
        lo += 32;
        hi -= 32;
    }
    if hi - lo >= 32 {
        // Overlapped pair finishes the span.
        let l = _mm256_loadu_si256(base.add(lo) as *const __m256i);
        let h = _mm256_loadu_si256(base.add(hi - 32) as *const __m256i);
        _mm256_storeu_si256(base.add(hi - 32) as *mut __m256i, rev256(l, mask));
        _mm256_storeu_si256(base.add(lo) as *mut __m256i, rev256(h, mask));
        return;
    }
    if hi - lo >= 16 {
        let l = _mm_loadu_si128(base.add(lo) as *const __m128i);
        let h = _mm_loadu_si128(base.add(hi - 16) as *const __m128i);
        _mm_storeu_si128(base.add(hi - 16) as *mut __m128i, _mm_shuffle_epi8(l, mask128));
        _mm_storeu_si128(base.add(lo) as *mut __m128i, _mm_shuffle_epi8(h, mask128));
        return;
    }
    if hi - lo >= 8 {
        sse42::fused_swap_u64(base, lo, hi, width);
        return;
    }
    if hi - lo >= 4 {
        sse42::fused_swap_u32(base, lo, hi, width);
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

/// Leftmost index in a sorted window strictly greater than `value`,
/// scanning 32-byte blocks backward.
#[target_feature(enable = "avx2")]
unsafe fn insert_position_avx2(window: &[u8], value: u8) -> usize {
    const LANES: usize = 32;
    let ptr = window.as_ptr();
    let splat = _mm256_set1_epi8(value as i8);
    let mut j = window.len();
    while j >= LANES {
        let blk = _mm256_loadu_si256(ptr.add(j - LANES) as *const __m256i);
        let le = _mm256_cmpeq_epi8(_mm256_min_epu8(blk, splat), blk);
        let mask = _mm256_movemask_epi8(le) as u32;
        if mask != 0 {
            let last_le = 31 - mask.leading_zeros() as usize;
            return j - LANES + last_le + 1;
        }
        j -= LANES;
    }
    scalar::insert_position_scalar(&window[..j], value)
}

/// Insertion sort for byte slices (AVX2 implementation).
#[target_feature(enable = "avx2")]
pub unsafe fn insertion_sort_avx2(data: &mut [u8]) {
    for i in 1..data.len() {
        let value = data[i];
        let idx = insert_position_avx2(&data[..i], value);
        if idx < i {
            data.copy_within(idx..i, idx + 1);
            data[idx] = value;
        }
    }
}

/// Counting sort for byte slices (AVX2 implementation). Emission uses
/// 32-byte broadcast stores; the fill register is incremented in place
/// by subtracting all-ones between buckets.
#[target_feature(enable = "avx2")]
pub unsafe fn counting_sort_avx2(data: &mut [u8]) {
    const LANES: usize = 32;
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
    let minus_one = _mm256_set1_epi8(-1);
    let mut fill = _mm256_set1_epi8(min as i8);
    let mut out = 0usize;
    for value in min..=max {
        let count = counts[value as usize];
        if count > 0 {
            let mut i = 0usize;
            while i + LANES <= count {
                _mm256_storeu_si256(base.add(out + i) as *mut __m256i, fill);
                i += LANES;
            }
            if i < count {
                data[out + i..out + count].fill(value);
            }
            out += count;
        }
        fill = _mm256_sub_epi8(fill, minus_one);
    }
    debug_assert_eq!(out, data.len());
}

/// Hybrid byte sort (AVX2 implementation): insertion sort below
/// `threshold` elements, counting sort at or above.
#[target_feature(enable = "avx2")]
pub unsafe fn sort_u8_avx2(data: &mut [u8], threshold: usize) {
    if data.len() < threshold {
        insertion_sort_avx2(data);
    } else {
        counting_sort_avx2(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_avx2() -> bool {
        is_x86_feature_detected!("avx2")
    }

    #[test]
    fn test_minmax_matches_scalar() {
        if !has_avx2() {
            return;
        }
        let bytes: Vec<u8> = (0..1333u32).map(|i| (i * 29 % 253) as u8).collect();
        unsafe {
            assert_eq!(max_u8_avx2(&bytes), scalar::max_u8_scalar(&bytes));
            assert_eq!(min_u8_avx2(&bytes), scalar::min_u8_scalar(&bytes));
        }

        let shorts: Vec<i16> = (0..517).map(|i| (i * 131 - 30_000) as i16).collect();
        unsafe {
            assert_eq!(max_i16_avx2(&shorts), scalar::max_i16_scalar(&shorts));
            assert_eq!(min_i16_avx2(&shorts), scalar::min_i16_scalar(&shorts));
        }

        let longs: Vec<i64> = (0..99).map(|i| (i * 7919 - 400_000) as i64).collect();
        unsafe {
            assert_eq!(max_i64_avx2(&longs), scalar::max_i64_scalar(&longs));
            assert_eq!(min_i64_avx2(&longs), scalar::min_i64_scalar(&longs));
        }

        // Unsigned 64-bit ordering must survive the sign-bias trick.
        let wide: Vec<u64> = (0..48).map(|i| u64::MAX - i * 17).collect();
        unsafe {
            assert_eq!(max_u64_avx2(&wide), Some(u64::MAX));
            assert_eq!(min_u64_avx2(&wide), Some(u64::MAX - 47 * 17));
        }
    }

    #[test]
    fn test_minmax_float_nan() {
        if !has_avx2() {
            return;
        }
        let mut values: Vec<f32> = (0..200).map(|i| i as f32 * 0.25 - 20.0).collect();
        unsafe {
            assert_eq!(max_f32_avx2(&values), Some(29.75));
            assert_eq!(min_f32_avx2(&values), Some(-20.0));
        }
        values[123] = f32::NAN;
        unsafe {
            assert!(max_f32_avx2(&values).unwrap().is_nan());
            assert!(min_f32_avx2(&values).unwrap().is_nan());
        }
    }

    #[test]
    fn test_is_sorted() {
        if !has_avx2() {
            return;
        }
        let sorted: Vec<u8> = (0..600u32).map(|i| (i / 3) as u8).collect();
        unsafe {
            assert!(is_sorted_u8_avx2(&sorted));
        }
        let mut broken = sorted.clone();
        broken.swap(31, 32);
        unsafe {
            assert!(!is_sorted_u8_avx2(&broken));
        }

        let ints: Vec<u32> = (0..300).collect();
        let signed: Vec<i32> = (-150..150).collect();
        let floats: Vec<f64> = (0..100).map(f64::from).collect();
        unsafe {
            assert!(is_sorted_u32_avx2(&ints));
            assert!(is_sorted_i32_avx2(&signed));
            assert!(is_sorted_f64_avx2(&floats));
        }
    }

    #[test]
    fn test_count_bits_matches_scalar() {
        if !has_avx2() {
            return;
        }
        let data: Vec<u8> = (0..2001u32).map(|i| (i * 11 % 256) as u8).collect();
        for combine in crate::combine::BitCombine::ALL {
            for operand in [0x00u8, 0xA5, 0xFF] {
                let expected = scalar::count_bits_scalar(&data, combine, operand);
                let got = unsafe { count_bits_avx2(&data, combine, operand) };
                assert_eq!(got, expected, "combine={:?} operand={:#x}", combine, operand);
            }
        }
    }

    #[test]
    fn test_bits_equal() {
        if !has_avx2() {
            return;
        }
        let a: Vec<u8> = (0..700u32).map(|i| (i % 256) as u8).collect();
        let mut b = a.clone();
        unsafe {
            assert!(bits_equal_avx2(&a, &b));
        }
        for pos in [0usize, 129, 640, 699] {
            b[pos] = b[pos].wrapping_add(1);
            unsafe {
                assert!(!bits_equal_avx2(&a, &b));
            }
            b[pos] = b[pos].wrapping_sub(1);
        }
    }

    #[test]
    fn test_reverse_pow2() {
        if !has_avx2() {
            return;
        }
        for width in [1usize, 2, 4, 8, 16] {
            for count in [0usize, 1, 2, 3, 5, 9, 17, 31, 64, 129, 1024] {
                let original: Vec<u8> =
                    (0..count * width).map(|i| (i % 247) as u8).collect();
                let mut data = original.clone();
                let mut expected = original.clone();
                scalar::reverse_elements_scalar(&mut expected, width);
                unsafe {
                    reverse_pow2_avx2(&mut data, width);
                }
                assert_eq!(data, expected, "width={} count={}", width, count);
            }
        }
    }

    #[test]
    fn test_sort_both_paths() {
        if !has_avx2() {
            return;
        }
        for len in [0usize, 1, 6, 64, 499, 500, 4096] {
            let input: Vec<u8> = (0..len as u32).map(|i| (i * 61 % 256) as u8).collect();
            let mut expected = input.clone();
            expected.sort_unstable();
            let mut data = input.clone();
            unsafe {
                sort_u8_avx2(&mut data, 500);
            }
            assert_eq!(data, expected, "len={}", len);
        }
    }
}
