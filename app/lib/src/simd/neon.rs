//! NEON (128-bit) implementations of the kernel operations for aarch64.
//!
//! The reduction shape matches the x86 tiers: four independent
//! accumulators, a widest-first drain, a pairwise merge, and a scalar
//! tail. The horizontal collapse uses the across-lanes reductions
//! (`vmaxvq`/`vminvq`) the ISA provides directly instead of a shift
//! cascade. Odd-width reversal shares the shuffle tables with the x86
//! tiers through `vqtbl1q_u8`, which has the same index-per-output-byte
//! semantics as `pshufb`.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use crate::combine::BitCombine;
use crate::simd::scalar;
use crate::simd::tables;

/// Stamp out one integer min/max reduction with a native lane-wise op
/// and across-lanes collapse.
macro_rules! reduce_minmax {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $lanes:expr, $identity:expr,
     $load:path, $vop:path, $collapse:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "neon")]
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
                acc0 = $vop(acc0, $load(ptr.add(i)));
                acc1 = $vop(acc1, $load(ptr.add(i + LANES)));
                acc2 = $vop(acc2, $load(ptr.add(i + 2 * LANES)));
                acc3 = $vop(acc3, $load(ptr.add(i + 3 * LANES)));
                i += 4 * LANES;
            }
            // At most three whole registers remain.
            while i + LANES <= len {
                acc0 = $vop(acc0, $load(ptr.add(i)));
                i += LANES;
            }
            let acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            let mut best = $collapse(acc);
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
    /// Maximum of a `u8` slice (NEON implementation).
    max_u8_neon, u8, 16, vdupq_n_u8(u8::MIN),
    vld1q_u8, vmaxq_u8, vmaxvq_u8, scalar::max_u8_scalar, >
);
reduce_minmax!(
    /// Minimum of a `u8` slice (NEON implementation).
    min_u8_neon, u8, 16, vdupq_n_u8(u8::MAX),
    vld1q_u8, vminq_u8, vminvq_u8, scalar::min_u8_scalar, <
);
reduce_minmax!(
    /// Maximum of an `i8` slice (NEON implementation).
    max_i8_neon, i8, 16, vdupq_n_s8(i8::MIN),
    vld1q_s8, vmaxq_s8, vmaxvq_s8, scalar::max_i8_scalar, >
);
reduce_minmax!(
    /// Minimum of an `i8` slice (NEON implementation).
    min_i8_neon, i8, 16, vdupq_n_s8(i8::MAX),
    vld1q_s8, vminq_s8, vminvq_s8, scalar::min_i8_scalar, <
);
reduce_minmax!(
    /// Maximum of a `u16` slice (NEON implementation).
    max_u16_neon, u16, 8, vdupq_n_u16(u16::MIN),
    vld1q_u16, vmaxq_u16, vmaxvq_u16, scalar::max_u16_scalar, >
);
reduce_minmax!(
    /// Minimum of a `u16` slice (NEON implementation).
    min_u16_neon, u16, 8, vdupq_n_u16(u16::MAX),
    vld1q_u16, vminq_u16, vminvq_u16, scalar::min_u16_scalar, <
);
reduce_minmax!(
    /// Maximum of an `i16` slice (NEON implementation).
    max_i16_neon, i16, 8, vdupq_n_s16(i16::MIN),
    vld1q_s16, vmaxq_s16, vmaxvq_s16, scalar::max_i16_scalar, >
);
reduce_minmax!(
    /// Minimum of an `i16` slice (NEON implementation).
    min_i16_neon, i16, 8, vdupq_n_s16(i16::MAX),
    vld1q_s16, vminq_s16, vminvq_s16, scalar::min_i16_scalar, <
);
reduce_minmax!(
    /// Maximum of a `u32` slice (NEON implementation).
    max_u32_neon, u32, 4, vdupq_n_u32(u32::MIN),
    vld1q_u32, vmaxq_u32, vmaxvq_u32, scalar::max_u32_scalar, >
);
reduce_minmax!(
    /// Minimum of a `u32` slice (NEON implementation).
    min_u32_neon, u32, 4, vdupq_n_u32(u32::MAX),
    vld1q_u32, vminq_u32, vminvq_u32, scalar::min_u32_scalar, <
);
reduce_minmax!(
    /// Maximum of an `i32` slice (NEON implementation).
    max_i32_neon, i32, 4, vdupq_n_s32(i32::MIN),
    vld1q_s32, vmaxq_s32, vmaxvq_s32, scalar::max_i32_scalar, >
);
reduce_minmax!(
    /// Minimum of an `i32` slice (NEON implementation).
    min_i32_neon, i32, 4, vdupq_n_s32(i32::MAX),
    vld1q_s32, vminq_s32, vminvq_s32, scalar::min_i32_scalar, <
);

// 64-bit lanes have no native min/max or across-lanes reduce; compare
// and select per lane, then pick between the two extracted lanes.

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vmaxq_s64_(a: int64x2_t, b: int64x2_t) -> int64x2_t {
    vbslq_s64(vcgtq_s64(a, b), a, b)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vminq_s64_(a: int64x2_t, b: int64x2_t) -> int64x2_t {
    vbslq_s64(vcgtq_s64(a, b), b, a)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vmaxq_u64_(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
    vbslq_u64(vcgtq_u64(a, b), a, b)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vminq_u64_(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
    vbslq_u64(vcgtq_u64(a, b), b, a)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vmaxvq_s64_(v: int64x2_t) -> i64 {
    let a = vgetq_lane_s64::<0>(v);
    let b = vgetq_lane_s64::<1>(v);
    if a > b { a } else { b }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vminvq_s64_(v: int64x2_t) -> i64 {
    let a = vgetq_lane_s64::<0>(v);
    let b = vgetq_lane_s64::<1>(v);
    if a < b { a } else { b }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vmaxvq_u64_(v: uint64x2_t) -> u64 {
    let a = vgetq_lane_u64::<0>(v);
    let b = vgetq_lane_u64::<1>(v);
    if a > b { a } else { b }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn vminvq_u64_(v: uint64x2_t) -> u64 {
    let a = vgetq_lane_u64::<0>(v);
    let b = vgetq_lane_u64::<1>(v);
    if a < b { a } else { b }
}

reduce_minmax!(
    /// Maximum of a `u64` slice (NEON implementation).
    max_u64_neon, u64, 2, vdupq_n_u64(u64::MIN),
    vld1q_u64, vmaxq_u64_, vmaxvq_u64_, scalar::max_u64_scalar, >
);
reduce_minmax!(
    /// Minimum of a `u64` slice (NEON implementation).
    min_u64_neon, u64, 2, vdupq_n_u64(u64::MAX),
    vld1q_u64, vminq_u64_, vminvq_u64_, scalar::min_u64_scalar, <
);
reduce_minmax!(
    /// Maximum of an `i64` slice (NEON implementation).
    max_i64_neon, i64, 2, vdupq_n_s64(i64::MIN),
    vld1q_s64, vmaxq_s64_, vmaxvq_s64_, scalar::max_i64_scalar, >
);
reduce_minmax!(
    /// Minimum of an `i64` slice (NEON implementation).
    min_i64_neon, i64, 2, vdupq_n_s64(i64::MAX),
    vld1q_s64, vminq_s64_, vminvq_s64_, scalar::min_i64_scalar, <
);

/// Stamp out one float min/max reduction.
///
/// `FMAX`/`FMIN` propagate NaN through both the lane-wise op and the
/// across-lanes collapse, so a NaN anywhere in the vectorized body
/// surfaces in `best`; the scalar tail tracks NaN explicitly. Any NaN
/// makes the result NaN.
macro_rules! reduce_minmax_float {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $lanes:expr, $init:expr,
     $dup:path, $load:path, $vop:path, $collapse:path, $scalar:path, $cmp:tt) => {
        $(#[$doc])*
        #[target_feature(enable = "neon")]
        pub unsafe fn $name(values: &[$ty]) -> Option<$ty> {
            const LANES: usize = $lanes;
            let len = values.len();
            if len < 4 * LANES {
                return $scalar(values);
            }
            let ptr = values.as_ptr();
            let identity = $dup($init);
            let mut acc0 = identity;
            let mut acc1 = identity;
            let mut acc2 = identity;
            let mut acc3 = identity;
            let mut i = 0usize;
            while i + 4 * LANES <= len {
                acc0 = $vop(acc0, $load(ptr.add(i)));
                acc1 = $vop(acc1, $load(ptr.add(i + LANES)));
                acc2 = $vop(acc2, $load(ptr.add(i + 2 * LANES)));
                acc3 = $vop(acc3, $load(ptr.add(i + 3 * LANES)));
                i += 4 * LANES;
            }
            while i + LANES <= len {
                acc0 = $vop(acc0, $load(ptr.add(i)));
                i += LANES;
            }
            let acc = $vop($vop(acc0, acc1), $vop(acc2, acc3));
            let mut best = $collapse(acc);
            let mut saw_nan = false;
            while i < len {
                let v = values[i];
                if v.is_nan() {
                    saw_nan = true;
                } else if v $cmp best {
                    best = v;
                }
                i += 1;
            }
            if saw_nan || best.is_nan() {
                return Some(<$ty>::NAN);
            }
            Some(best)
        }
    };
}

reduce_minmax_float!(
    /// Maximum of an `f32` slice; NaN if any element is NaN.
    max_f32_neon, f32, 4, f32::NEG_INFINITY,
    vdupq_n_f32, vld1q_f32, vmaxq_f32, vmaxvq_f32, scalar::max_f32_scalar, >
);
reduce_minmax_float!(
    /// Minimum of an `f32` slice; NaN if any element is NaN.
    min_f32_neon, f32, 4, f32::INFINITY,
    vdupq_n_f32, vld1q_f32, vminq_f32, vminvq_f32, scalar::min_f32_scalar, <
);
reduce_minmax_float!(
    /// Maximum of an `f64` slice; NaN if any element is NaN.
    max_f64_neon, f64, 2, f64::NEG_INFINITY,
    vdupq_n_f64, vld1q_f64, vmaxq_f64, vmaxvq_f64, scalar::max_f64_scalar, >
);
reduce_minmax_float!(
    /// Minimum of an `f64` slice; NaN if any element is NaN.
    min_f64_neon, f64, 2, f64::INFINITY,
    vdupq_n_f64, vld1q_f64, vminq_f64, vminvq_f64, scalar::min_f64_scalar, <
);

/// Sortedness check for `u8` slices (NEON implementation).
///
/// Compares each window with itself shifted one element; any lane with
/// `prev > next` fails the whole slice.
#[target_feature(enable = "neon")]
pub unsafe fn is_sorted_u8_neon(values: &[u8]) -> bool {
    const LANES: usize = 16;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u8_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = vld1q_u8(ptr.add(i));
        let b = vld1q_u8(ptr.add(i + 1));
        if vmaxvq_u8(vcgtq_u8(a, b)) != 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u8_scalar(&values[i..])
}

/// Sortedness check for `u32` slices (NEON implementation).
#[target_feature(enable = "neon")]
pub unsafe fn is_sorted_u32_neon(values: &[u32]) -> bool {
    const LANES: usize = 4;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_u32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = vld1q_u32(ptr.add(i));
        let b = vld1q_u32(ptr.add(i + 1));
        if vmaxvq_u32(vcgtq_u32(a, b)) != 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_u32_scalar(&values[i..])
}

/// Sortedness check for `i32` slices (NEON implementation).
#[target_feature(enable = "neon")]
pub unsafe fn is_sorted_i32_neon(values: &[i32]) -> bool {
    const LANES: usize = 4;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_i32_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = vld1q_s32(ptr.add(i));
        let b = vld1q_s32(ptr.add(i + 1));
        if vmaxvq_u32(vcgtq_s32(a, b)) != 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_i32_scalar(&values[i..])
}

/// Sortedness check for `f64` slices (NEON implementation). A NaN lane
/// fails its ordered compare.
#[target_feature(enable = "neon")]
pub unsafe fn is_sorted_f64_neon(values: &[f64]) -> bool {
    const LANES: usize = 2;
    let len = values.len();
    if len <= LANES {
        return scalar::is_sorted_f64_scalar(values);
    }
    let ptr = values.as_ptr();
    let mut i = 0usize;
    while i + LANES + 1 <= len {
        let a = vld1q_f64(ptr.add(i));
        let b = vld1q_f64(ptr.add(i + 1));
        let ok = vcleq_f64(a, b);
        if vgetq_lane_u64::<0>(ok) == 0 || vgetq_lane_u64::<1>(ok) == 0 {
            return false;
        }
        i += LANES;
    }
    scalar::is_sorted_f64_scalar(&values[i..])
}

/// Apply a bit-combine to a register against a broadcast operand.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn combine_block(v: uint8x16_t, operand: uint8x16_t, combine: BitCombine) -> uint8x16_t {
    match combine {
        BitCombine::Identity => v,
        BitCombine::And => vandq_u8(v, operand),
        BitCombine::Or => vorrq_u8(v, operand),
        BitCombine::Xor => veorq_u8(v, operand),
        BitCombine::AndNot => vbicq_u8(v, operand),
        BitCombine::OrNot => vornq_u8(v, operand),
        BitCombine::Nand => vmvnq_u8(vandq_u8(v, operand)),
        BitCombine::Nor => vmvnq_u8(vorrq_u8(v, operand)),
        BitCombine::Xnor => vmvnq_u8(veorq_u8(v, operand)),
        BitCombine::Not => vmvnq_u8(v),
    }
}

/// Count set bits after combining with a broadcast operand (NEON
/// implementation). `vcntq_u8` counts per byte; `vaddlvq_u8` sums the
/// register into a scalar accumulated over four independent chains.
#[target_feature(enable = "neon")]
pub unsafe fn count_bits_neon(data: &[u8], combine: BitCombine, operand: u8) -> u64 {
    const LANES: usize = 16;
    let len = data.len();
    if combine == BitCombine::Not {
        return 8 * len as u64 - count_bits_neon(data, BitCombine::Identity, operand);
    }
    if len < 4 * LANES {
        return scalar::count_bits_scalar(data, combine, operand);
    }
    let ptr = data.as_ptr();
    let op = vdupq_n_u8(operand);
    let mut total0 = 0u64;
    let mut total1 = 0u64;
    let mut total2 = 0u64;
    let mut total3 = 0u64;
    let mut i = 0usize;
    while i + 4 * LANES <= len {
        total0 += vaddlvq_u8(vcntq_u8(combine_block(vld1q_u8(ptr.add(i)), op, combine))) as u64;
        total1 += vaddlvq_u8(vcntq_u8(combine_block(vld1q_u8(ptr.add(i + LANES)), op, combine))) as u64;
        total2 += vaddlvq_u8(vcntq_u8(combine_block(vld1q_u8(ptr.add(i + 2 * LANES)), op, combine))) as u64;
        total3 += vaddlvq_u8(vcntq_u8(combine_block(vld1q_u8(ptr.add(i + 3 * LANES)), op, combine))) as u64;
        i += 4 * LANES;
    }
    while i + LANES <= len {
        total0 += vaddlvq_u8(vcntq_u8(combine_block(vld1q_u8(ptr.add(i)), op, combine))) as u64;
        i += LANES;
    }
    total0 + total1 + total2 + total3 + scalar::count_bits_scalar(&data[i..], combine, operand)
}

/// Bitwise equality of two equal-length slices (NEON implementation).
/// A block is equal iff the lane-wise compare has no zero lane.
#[target_feature(enable = "neon")]
pub unsafe fn bits_equal_neon(a: &[u8], b: &[u8]) -> bool {
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
        let e0 = vceqq_u8(vld1q_u8(pa.add(i)), vld1q_u8(pb.add(i)));
        let e1 = vceqq_u8(vld1q_u8(pa.add(i + LANES)), vld1q_u8(pb.add(i + LANES)));
        let e2 = vceqq_u8(vld1q_u8(pa.add(i + 2 * LANES)), vld1q_u8(pb.add(i + 2 * LANES)));
        let e3 = vceqq_u8(vld1q_u8(pa.add(i + 3 * LANES)), vld1q_u8(pb.add(i + 3 * LANES)));
        let all = vandq_u8(vandq_u8(e0, e1), vandq_u8(e2, e3));
        if vminvq_u8(all) != 0xFF {
            return false;
        }
        i += 4 * LANES;
    }
    while i + LANES <= len {
        let eq = vceqq_u8(vld1q_u8(pa.add(i)), vld1q_u8(pb.add(i)));
        if vminvq_u8(eq) != 0xFF {
            return false;
        }
        i += LANES;
    }
    scalar::bits_equal_scalar(&a[i..], &b[i..])
}

// Narrow-word element reversal for the remainder cascade; mirrors the
// helpers in the x86 tier.

#[inline]
fn rev_word_u64(x: u64, width: usize) -> u64 {
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
fn rev_word_u32(x: u32, width: usize) -> u32 {
    match width {
        1 => x.swap_bytes(),
        2 => x.rotate_left(16),
        _ => x,
    }
}

#[inline]
unsafe fn fused_swap_u64(base: *mut u8, lo: usize, hi: usize, width: usize) {
    let a = (base.add(lo) as *const u64).read_unaligned();
    let b = (base.add(hi - 8) as *const u64).read_unaligned();
    (base.add(lo) as *mut u64).write_unaligned(rev_word_u64(b, width));
    (base.add(hi - 8) as *mut u64).write_unaligned(rev_word_u64(a, width));
}

#[inline]
unsafe fn fused_swap_u32(base: *mut u8, lo: usize, hi: usize, width: usize) {
    let a = (base.add(lo) as *const u32).read_unaligned();
    let b = (base.add(hi - 4) as *const u32).read_unaligned();
    (base.add(lo) as *mut u32).write_unaligned(rev_word_u32(b, width));
    (base.add(hi - 4) as *mut u32).write_unaligned(rev_word_u32(a, width));
}

/// In-place reversal at power-of-two element widths (NEON
/// implementation).
///
/// Same fused reverse-and-swap walk as the x86 128-bit tier; blocks are
/// reversed through `vqtbl1q_u8` with the shared width tables.
#[target_feature(enable = "neon")]
pub unsafe fn reverse_pow2_neon(data: &mut [u8], width: usize) {
    debug_assert_eq!(data.len() % width, 0);
    let base = data.as_mut_ptr();
    let mut lo = 0usize;
    let mut hi = data.len();

    if width == 16 {
        while hi - lo >= 32 {
            let l = vld1q_u8(base.add(lo));
            let h = vld1q_u8(base.add(hi - 16));
            vst1q_u8(base.add(hi - 16), l);
            vst1q_u8(base.add(lo), h);
            lo += 16;
            hi -= 16;
        }
        return;
    }

    let mask = vld1q_u8(tables::pow2_width_table(width).as_ptr());

    while hi - lo >= 64 {
        let l0 = vld1q_u8(base.add(lo));
        let l1 = vld1q_u8(base.add(lo + 16));
        let h1 = vld1q_u8(base.add(hi - 32));
        let h0 = vld1q_u8(base.add(hi - 16));
        vst1q_u8(base.add(hi - 16), vqtbl1q_u8(l0, mask));
        vst1q_u8(base.add(hi - 32), vqtbl1q_u8(l1, mask));
        vst1q_u8(base.add(lo), vqtbl1q_u8(h0, mask));
        vst1q_u8(base.add(lo + 16), vqtbl1q_u8(h1, mask));
        lo += 32;
        hi -= 32;
    }
    if hi - lo >= 32 {
        let l = vld1q_u8(base.add(lo));
        let h = vld1q_u8(base.add(hi - 16));
        vst1q_u8(base.add(hi - 16), vqtbl1q_u8(l, mask));
        vst1q_u8(base.add(lo), vqtbl1q_u8(h, mask));
        lo += 16;
        hi -= 16;
    }
    if hi - lo >= 16 {
        // Overlapped pair; both stores write final values.
        let l = vld1q_u8(base.add(lo));
        let h = vld1q_u8(base.add(hi - 16));
        vst1q_u8(base.add(hi - 16), vqtbl1q_u8(l, mask));
        vst1q_u8(base.add(lo), vqtbl1q_u8(h, mask));
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

/// In-place reversal at odd element widths 3, 5, and 6 (NEON
/// implementation, shared shuffle tables with the x86 tiers).
#[target_feature(enable = "neon")]
pub unsafe fn reverse_odd_neon(data: &mut [u8], width: usize) {
    debug_assert_eq!(data.len() % width, 0);
    let Some((group, lo_tab, hi_tab)) = tables::odd_width_tables(width) else {
        return scalar::reverse_elements_scalar(data, width);
    };
    let payload = group * width;
    let lo_mask = vld1q_u8(lo_tab.as_ptr());
    let hi_mask = vld1q_u8(hi_tab.as_ptr());
    let base = data.as_mut_ptr();
    let mut lo = 0usize;
    let mut hi = data.len();
    while hi - lo >= 2 * payload {
        let l = vld1q_u8(base.add(lo));
        let h = vld1q_u8(base.add(hi - 16));
        let mut l_buf = [0u8; 16];
        let mut h_buf = [0u8; 16];
        vst1q_u8(l_buf.as_mut_ptr(), vqtbl1q_u8(l, lo_mask));
        vst1q_u8(h_buf.as_mut_ptr(), vqtbl1q_u8(h, hi_mask));
        std::ptr::copy_nonoverlapping(h_buf.as_ptr(), base.add(lo), payload);
        std::ptr::copy_nonoverlapping(l_buf.as_ptr(), base.add(hi - payload), payload);
        lo += payload;
        hi -= payload;
    }
    scalar::reverse_elements_scalar(&mut data[lo..hi], width);
}

/// Leftmost index in a sorted window strictly greater than `value`,
/// scanning 16-byte blocks backward. The compare mask is inspected as
/// two 64-bit halves to locate the last lane `<= value`.
#[target_feature(enable = "neon")]
unsafe fn insert_position_neon(window: &[u8], value: u8) -> usize {
    const LANES: usize = 16;
    let ptr = window.as_ptr();
    let splat = vdupq_n_u8(value);
    let mut j = window.len();
    while j >= LANES {
        let blk = vld1q_u8(ptr.add(j - LANES));
        let le = vreinterpretq_u64_u8(vcleq_u8(blk, splat));
        let lo_half = vgetq_lane_u64::<0>(le);
        let hi_half = vgetq_lane_u64::<1>(le);
        if hi_half != 0 {
            let last = 8 + (63 - hi_half.leading_zeros() as usize) / 8;
            return j - LANES + last + 1;
        }
        if lo_half != 0 {
            let last = (63 - lo_half.leading_zeros() as usize) / 8;
            return j - LANES + last + 1;
        }
        j -= LANES;
    }
    scalar::insert_position_scalar(&window[..j], value)
}

/// Insertion sort for byte slices (NEON implementation).
#[target_feature(enable = "neon")]
pub unsafe fn insertion_sort_neon(data: &mut [u8]) {
    for i in 1..data.len() {
        let value = data[i];
        let idx = insert_position_neon(&data[..i], value);
        if idx < i {
            data.copy_within(idx..i, idx + 1);
            data[idx] = value;
        }
    }
}

/// Counting sort for byte slices (NEON implementation). Bucket emission
/// uses broadcast stores with an in-register increment between buckets.
#[target_feature(enable = "neon")]
pub unsafe fn counting_sort_neon(data: &mut [u8]) {
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
    let one = vdupq_n_u8(1);
    let mut fill = vdupq_n_u8(min);
    let mut out = 0usize;
    for value in min..=max {
        let count = counts[value as usize];
        if count > 0 {
            let mut i = 0usize;
            while i + LANES <= count {
                vst1q_u8(base.add(out + i), fill);
                i += LANES;
            }
            if i < count {
                data[out + i..out + count].fill(value);
            }
            out += count;
        }
        fill = vaddq_u8(fill, one);
    }
    debug_assert_eq!(out, data.len());
}

/// Hybrid byte sort (NEON implementation): insertion sort below
/// `threshold` elements, counting sort at or above.
#[target_feature(enable = "neon")]
pub unsafe fn sort_u8_neon(data: &mut [u8], threshold: usize) {
    if data.len() < threshold {
        insertion_sort_neon(data);
    } else {
        counting_sort_neon(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_neon() -> bool {
        std::arch::is_aarch64_feature_detected!("neon")
    }

    #[test]
    fn test_minmax_matches_scalar() {
        if !has_neon() {
            return;
        }
        let bytes: Vec<u8> = (0..911u32).map(|i| (i * 37 % 251) as u8).collect();
        unsafe {
            assert_eq!(max_u8_neon(&bytes), scalar::max_u8_scalar(&bytes));
            assert_eq!(min_u8_neon(&bytes), scalar::min_u8_scalar(&bytes));
        }

        let longs: Vec<i64> = (0..77).map(|i| (i * 6007 - 200_000) as i64).collect();
        unsafe {
            assert_eq!(max_i64_neon(&longs), scalar::max_i64_scalar(&longs));
            assert_eq!(min_i64_neon(&longs), scalar::min_i64_scalar(&longs));
        }

        let wide: Vec<u64> = (0..50).map(|i| u64::MAX - i * 9).collect();
        unsafe {
            assert_eq!(max_u64_neon(&wide), Some(u64::MAX));
            assert_eq!(min_u64_neon(&wide), Some(u64::MAX - 49 * 9));
        }
    }

    #[test]
    fn test_minmax_float_nan() {
        if !has_neon() {
            return;
        }
        let mut values: Vec<f64> = (0..120).map(|i| i as f64 * 0.5 - 30.0).collect();
        unsafe {
            assert_eq!(max_f64_neon(&values), Some(29.5));
            assert_eq!(min_f64_neon(&values), Some(-30.0));
        }
        values[64] = f64::NAN;
        unsafe {
            assert!(max_f64_neon(&values).unwrap().is_nan());
            assert!(min_f64_neon(&values).unwrap().is_nan());
        }
    }

    #[test]
    fn test_is_sorted() {
        if !has_neon() {
            return;
        }
        let sorted: Vec<u8> = (0..400u32).map(|i| (i / 2) as u8).collect();
        let mut broken = sorted.clone();
        broken.swap(99, 100);
        unsafe {
            assert!(is_sorted_u8_neon(&sorted));
            assert!(!is_sorted_u8_neon(&broken));
        }

        let mut floats: Vec<f64> = (0..64).map(f64::from).collect();
        unsafe {
            assert!(is_sorted_f64_neon(&floats));
        }
        floats[10] = f64::NAN;
        unsafe {
            assert!(!is_sorted_f64_neon(&floats));
        }
    }

    #[test]
    fn test_count_bits_matches_scalar() {
        if !has_neon() {
            return;
        }
        let data: Vec<u8> = (0..888u32).map(|i| (i * 17 % 256) as u8).collect();
        for combine in crate::combine::BitCombine::ALL {
            for operand in [0x00u8, 0x3C, 0xFF] {
                let expected = scalar::count_bits_scalar(&data, combine, operand);
                let got = unsafe { count_bits_neon(&data, combine, operand) };
                assert_eq!(got, expected, "combine={:?} operand={:#x}", combine, operand);
            }
        }
    }

    #[test]
    fn test_bits_equal() {
        if !has_neon() {
            return;
        }
        let a: Vec<u8> = (0..256u32).map(|i| i as u8).collect();
        let mut b = a.clone();
        unsafe {
            assert!(bits_equal_neon(&a, &b));
        }
        b[200] ^= 0x10;
        unsafe {
            assert!(!bits_equal_neon(&a, &b));
        }
    }

    #[test]
    fn test_reverse() {
        if !has_neon() {
            return;
        }
        for width in [1usize, 2, 3, 4, 5, 6, 8, 16] {
            for count in [0usize, 1, 2, 5, 9, 33, 128, 1000] {
                let original: Vec<u8> =
                    (0..count * width).map(|i| (i % 251) as u8).collect();
                let mut data = original.clone();
                let mut expected = original.clone();
                scalar::reverse_elements_scalar(&mut expected, width);
                unsafe {
                    if width.is_power_of_two() {
                        reverse_pow2_neon(&mut data, width);
                    } else {
                        reverse_odd_neon(&mut data, width);
                    }
                }
                assert_eq!(data, expected, "width={} count={}", width, count);
            }
        }
    }

    #[test]
    fn test_sort_both_paths() {
        if !has_neon() {
            return;
        }
        for len in [0usize, 1, 6, 100, 499, 500, 3000] {
            let input: Vec<u8> = (0..len as u32).map(|i| (i * 89 % 256) as u8).collect();
            let mut expected = input.clone();
            expected.sort_unstable();
            let mut data = input.clone();
            unsafe {
                sort_u8_neon(&mut data, 500);
            }
            assert_eq!(data, expected, "len={}", len);
        }
    }
}
