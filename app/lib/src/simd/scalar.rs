//! Scalar (non-SIMD) implementations of the kernel operations.
//!
//! These implementations serve as fallbacks when SIMD instructions are not
//! available or are disabled. They are also the reference semantics: every
//! SIMD tier must produce exactly the same results, and the cross-tier
//! equivalence tests compare against these functions.

use crate::combine::BitCombine;

/// Generate scalar min/max reductions for integer element types.
///
/// Returns `None` for the empty slice; otherwise a plain linear fold.
macro_rules! scalar_minmax_int {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $fold:ident) => {
        $(#[$doc])*
        pub fn $name(values: &[$ty]) -> Option<$ty> {
            values.iter().copied().$fold()
        }
    };
}

scalar_minmax_int!(
    /// Maximum of a `u8` slice (scalar implementation).
    max_u8_scalar, u8, max
);
scalar_minmax_int!(
    /// Minimum of a `u8` slice (scalar implementation).
    min_u8_scalar, u8, min
);
scalar_minmax_int!(
    /// Maximum of an `i8` slice (scalar implementation).
    max_i8_scalar, i8, max
);
scalar_minmax_int!(
    /// Minimum of an `i8` slice (scalar implementation).
    min_i8_scalar, i8, min
);
scalar_minmax_int!(
    /// Maximum of a `u16` slice (scalar implementation).
    max_u16_scalar, u16, max
);
scalar_minmax_int!(
    /// Minimum of a `u16` slice (scalar implementation).
    min_u16_scalar, u16, min
);
scalar_minmax_int!(
    /// Maximum of an `i16` slice (scalar implementation).
    max_i16_scalar, i16, max
);
scalar_minmax_int!(
    /// Minimum of an `i16` slice (scalar implementation).
    min_i16_scalar, i16, min
);
scalar_minmax_int!(
    /// Maximum of a `u32` slice (scalar implementation).
    max_u32_scalar, u32, max
);
scalar_minmax_int!(
    /// Minimum of a `u32` slice (scalar implementation).
    min_u32_scalar, u32, min
);
scalar_minmax_int!(
    /// Maximum of an `i32` slice (scalar implementation).
    max_i32_scalar, i32, max
);
scalar_minmax_int!(
    /// Minimum of an `i32` slice (scalar implementation).
    min_i32_scalar, i32, min
);
scalar_minmax_int!(
    /// Maximum of a `u64` slice (scalar implementation).
    max_u64_scalar, u64, max
);
scalar_minmax_int!(
    /// Minimum of a `u64` slice (scalar implementation).
    min_u64_scalar, u64, min
);
scalar_minmax_int!(
    /// Maximum of an `i64` slice (scalar implementation).
    max_i64_scalar, i64, max
);
scalar_minmax_int!(
    /// Minimum of an `i64` slice (scalar implementation).
    min_i64_scalar, i64, min
);

/// Generate scalar min/max reductions for float element types.
///
/// NaN policy: if any element is NaN the result is NaN. The empty slice
/// returns `None`.
macro_rules! scalar_minmax_float {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $cmp:tt) => {
        $(#[$doc])*
        pub fn $name(values: &[$ty]) -> Option<$ty> {
            let mut iter = values.iter().copied();
            let mut best = iter.next()?;
            for value in iter {
                if value.is_nan() {
                    return Some(<$ty>::NAN);
                }
                if value $cmp best {
                    best = value;
                }
            }
            if best.is_nan() {
                return Some(<$ty>::NAN);
            }
            Some(best)
        }
    };
}

scalar_minmax_float!(
    /// Maximum of an `f32` slice; NaN if any element is NaN.
    max_f32_scalar, f32, >
);
scalar_minmax_float!(
    /// Minimum of an `f32` slice; NaN if any element is NaN.
    min_f32_scalar, f32, <
);
scalar_minmax_float!(
    /// Maximum of an `f64` slice; NaN if any element is NaN.
    max_f64_scalar, f64, >
);
scalar_minmax_float!(
    /// Minimum of an `f64` slice; NaN if any element is NaN.
    min_f64_scalar, f64, <
);

/// Generate scalar sortedness checks.
///
/// A slice is sorted iff every adjacent pair satisfies `prev <= next`.
/// Short-circuits on the first failing pair. For floats a comparison
/// involving NaN fails, so any NaN in a slice of length >= 2 makes it
/// unsorted.
macro_rules! scalar_is_sorted {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(values: &[$ty]) -> bool {
            values.windows(2).all(|pair| pair[0] <= pair[1])
        }
    };
}

scalar_is_sorted!(
    /// Sortedness check for `u8` slices (scalar implementation).
    is_sorted_u8_scalar, u8
);
scalar_is_sorted!(
    /// Sortedness check for `u32` slices (scalar implementation).
    is_sorted_u32_scalar, u32
);
scalar_is_sorted!(
    /// Sortedness check for `i32` slices (scalar implementation).
    is_sorted_i32_scalar, i32
);
scalar_is_sorted!(
    /// Sortedness check for `f64` slices; NaN fails its comparisons.
    is_sorted_f64_scalar, f64
);

/// Count set bits after combining each byte with a broadcast operand.
///
/// The main loop folds 8-byte words; the tail descends through 4-, 2-,
/// and 1-byte reads. `Not` is computed as `total_bits - count(Identity)`.
pub fn count_bits_scalar(data: &[u8], combine: BitCombine, operand: u8) -> u64 {
    if combine == BitCombine::Not {
        let total_bits = 8 * data.len() as u64;
        return total_bits - count_bits_scalar(data, BitCombine::Identity, operand);
    }

    let operand_wide = u64::from_le_bytes([operand; 8]);
    let mut total = 0u64;

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let word = u64::from_le_bytes(chunk.try_into().unwrap());
        total += combine.apply_u64(word, operand_wide).count_ones() as u64;
    }

    let mut rest = chunks.remainder();
    if rest.len() >= 4 {
        let word = u32::from_le_bytes(rest[..4].try_into().unwrap());
        let operand_word = u32::from_le_bytes([operand; 4]);
        total += (combine.apply_u64(word as u64, operand_word as u64) as u32).count_ones() as u64;
        rest = &rest[4..];
    }
    if rest.len() >= 2 {
        let word = u16::from_le_bytes(rest[..2].try_into().unwrap());
        let operand_word = u16::from_le_bytes([operand; 2]);
        total += (combine.apply_u64(word as u64, operand_word as u64) as u16).count_ones() as u64;
        rest = &rest[2..];
    }
    if let Some(&byte) = rest.first() {
        total += combine.apply_u8(byte, operand).count_ones() as u64;
    }

    total
}

/// Compare two equal-length byte slices, short-circuiting on the first
/// differing 8-byte word (then 4-, 2-, 1-byte tail reads).
pub fn bits_equal_scalar(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut a_chunks = a.chunks_exact(8);
    let mut b_chunks = b.chunks_exact(8);
    for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
        let wa = u64::from_le_bytes(ca.try_into().unwrap());
        let wb = u64::from_le_bytes(cb.try_into().unwrap());
        if wa != wb {
            return false;
        }
    }

    a_chunks.remainder() == b_chunks.remainder()
}

/// Reverse `data` in place as a sequence of `width`-byte elements.
///
/// Generic two-pointer exchange: swaps the two outermost remaining
/// elements and moves inward. Used directly for widths and tiers without
/// a specialized SIMD path, and as the middle-remainder handler of the
/// SIMD paths.
///
/// `data.len()` must be a multiple of `width` (validated by the caller).
pub fn reverse_elements_scalar(data: &mut [u8], width: usize) {
    debug_assert!(width > 0);
    debug_assert_eq!(data.len() % width, 0);

    if width == 1 {
        data.reverse();
        return;
    }

    let count = data.len() / width;
    let mut lo = 0usize;
    let mut hi = count.saturating_sub(1);
    while lo < hi {
        let (a, b) = (lo * width, hi * width);
        for k in 0..width {
            data.swap(a + k, b + k);
        }
        lo += 1;
        hi -= 1;
    }
}

/// Leftmost index in a sorted window whose element is strictly greater
/// than `value`, found by a backward linear scan.
///
/// Returns `window.len()` when no element is greater.
pub fn insert_position_scalar(window: &[u8], value: u8) -> usize {
    let mut j = window.len();
    while j > 0 {
        if window[j - 1] <= value {
            return j;
        }
        j -= 1;
    }
    0
}

/// Insertion sort for byte slices (scalar implementation).
///
/// For each element, finds the leftmost strictly-greater element in the
/// sorted prefix, shifts `[idx, i)` right by one, and drops the element
/// into the freed slot.
pub fn insertion_sort_scalar(data: &mut [u8]) {
    for i in 1..data.len() {
        let value = data[i];
        let idx = insert_position_scalar(&data[..i], value);
        if idx < i {
            data.copy_within(idx..i, idx + 1);
            data[idx] = value;
        }
    }
}

/// Counting sort for byte slices (scalar implementation).
///
/// One linear pass counts occurrences into 256 stack counters while
/// tracking the observed min and max; a second pass emits each bucket's
/// run in ascending value order.
pub fn counting_sort_scalar(data: &mut [u8]) {
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

    let mut out = 0usize;
    for value in min..=max {
        let count = counts[value as usize];
        data[out..out + count].fill(value);
        out += count;
    }
    debug_assert_eq!(out, data.len());
}

/// Hybrid byte sort (scalar implementation).
///
/// Insertion sort below `threshold` elements, counting sort at or above.
pub fn sort_u8_scalar(data: &mut [u8], threshold: usize) {
    if data.len() < threshold {
        insertion_sort_scalar(data);
    } else {
        counting_sort_scalar(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_int_basic() {
        assert_eq!(max_u8_scalar(&[5, 3, 8, 1, 9, 2]), Some(9));
        assert_eq!(min_u8_scalar(&[5, 3, 8, 1, 9, 2]), Some(1));
        assert_eq!(max_i32_scalar(&[-5, 3, -8]), Some(3));
        assert_eq!(min_i32_scalar(&[-5, 3, -8]), Some(-8));
        assert_eq!(max_u64_scalar(&[u64::MAX, 0]), Some(u64::MAX));
        assert_eq!(min_i64_scalar(&[i64::MIN, 0]), Some(i64::MIN));
    }

    #[test]
    fn test_minmax_empty() {
        assert_eq!(max_u8_scalar(&[]), None);
        assert_eq!(min_f64_scalar(&[]), None);
        assert_eq!(max_i64_scalar(&[]), None);
    }

    #[test]
    fn test_minmax_signedness() {
        // 0xFF is the largest u8 but -1 as i8.
        assert_eq!(max_u8_scalar(&[0xFF, 0x01]), Some(0xFF));
        assert_eq!(max_i8_scalar(&[-1, 1]), Some(1));
        assert_eq!(min_i8_scalar(&[-1, 1]), Some(-1));
    }

    #[test]
    fn test_minmax_float_nan() {
        assert!(max_f64_scalar(&[1.0, f64::NAN, 2.0]).unwrap().is_nan());
        assert!(min_f32_scalar(&[f32::NAN]).unwrap().is_nan());
        assert_eq!(max_f64_scalar(&[1.0, 2.0, -3.0]), Some(2.0));
        assert_eq!(min_f64_scalar(&[1.0, 2.0, -3.0]), Some(-3.0));
    }

    #[test]
    fn test_is_sorted() {
        assert!(is_sorted_u8_scalar(&[]));
        assert!(is_sorted_u8_scalar(&[7]));
        assert!(is_sorted_u8_scalar(&[1, 2, 2, 3]));
        assert!(!is_sorted_u8_scalar(&[5, 3, 8, 1, 9, 2]));
        assert!(is_sorted_i32_scalar(&[-5, -1, 0, 3]));
        assert!(!is_sorted_f64_scalar(&[1.0, f64::NAN, 2.0]));
    }

    #[test]
    fn test_count_bits_identity() {
        // [5,3,8,1,9,2] popcounts: 2+2+1+1+2+1 = 9.
        assert_eq!(
            count_bits_scalar(&[5, 3, 8, 1, 9, 2], BitCombine::Identity, 0),
            9
        );
        assert_eq!(count_bits_scalar(&[], BitCombine::Identity, 0), 0);
    }

    #[test]
    fn test_count_bits_combines() {
        let data = [0xF0u8, 0x0F, 0xAA];
        assert_eq!(count_bits_scalar(&data, BitCombine::And, 0), 0);
        assert_eq!(count_bits_scalar(&data, BitCombine::Or, 0xFF), 24);
        assert_eq!(
            count_bits_scalar(&data, BitCombine::Not, 0),
            24 - count_bits_scalar(&data, BitCombine::Identity, 0)
        );
        // Uniform data XOR its own value is all zeros.
        let uniform = [0x5Au8; 37];
        assert_eq!(count_bits_scalar(&uniform, BitCombine::Xor, 0x5A), 0);
    }

    #[test]
    fn test_count_bits_tail_sizes() {
        // Exercise every tail length in the 8/4/2/1 cascade.
        for len in 0..32 {
            let data: Vec<u8> = (0..len as u8).collect();
            let expected: u64 = data.iter().map(|b| b.count_ones() as u64).sum();
            assert_eq!(
                count_bits_scalar(&data, BitCombine::Identity, 0),
                expected,
                "len={}",
                len
            );
        }
    }

    #[test]
    fn test_bits_equal() {
        assert!(bits_equal_scalar(&[], &[]));
        assert!(bits_equal_scalar(&[1, 2, 3], &[1, 2, 3]));
        assert!(!bits_equal_scalar(&[1, 2, 3], &[1, 2, 4]));
        let a: Vec<u8> = (0..100).collect();
        let mut b = a.clone();
        assert!(bits_equal_scalar(&a, &b));
        b[63] ^= 1;
        assert!(!bits_equal_scalar(&a, &b));
    }

    #[test]
    fn test_reverse_elements() {
        let mut bytes = vec![5u8, 3, 8, 1, 9, 2];
        reverse_elements_scalar(&mut bytes, 1);
        assert_eq!(bytes, vec![2, 9, 1, 8, 3, 5]);

        let mut pairs = vec![1u8, 2, 3, 4, 5, 6];
        reverse_elements_scalar(&mut pairs, 2);
        assert_eq!(pairs, vec![5, 6, 3, 4, 1, 2]);

        let mut triples = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        reverse_elements_scalar(&mut triples, 3);
        assert_eq!(triples, vec![7, 8, 9, 4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_reverse_involution() {
        for width in [1usize, 2, 3, 4, 5, 6, 8, 16] {
            let original: Vec<u8> = (0..(width * 11) as u8).collect();
            let mut data = original.clone();
            reverse_elements_scalar(&mut data, width);
            reverse_elements_scalar(&mut data, width);
            assert_eq!(data, original, "width={}", width);
        }
    }

    #[test]
    fn test_insert_position() {
        assert_eq!(insert_position_scalar(&[], 5), 0);
        assert_eq!(insert_position_scalar(&[1, 3, 5, 7], 4), 2);
        assert_eq!(insert_position_scalar(&[1, 3, 5, 7], 0), 0);
        assert_eq!(insert_position_scalar(&[1, 3, 5, 7], 9), 4);
        // Equal elements insert after the run, keeping the scan stable.
        assert_eq!(insert_position_scalar(&[2, 2, 2], 2), 3);
    }

    #[test]
    fn test_sorts_agree() {
        let input: Vec<u8> = (0..=255u8).rev().cycle().take(700).collect();
        let mut expected = input.clone();
        expected.sort_unstable();

        let mut by_insertion = input.clone();
        insertion_sort_scalar(&mut by_insertion);
        assert_eq!(by_insertion, expected);

        let mut by_counting = input.clone();
        counting_sort_scalar(&mut by_counting);
        assert_eq!(by_counting, expected);
    }

    #[test]
    fn test_sort_edge_cases() {
        let mut empty: Vec<u8> = vec![];
        sort_u8_scalar(&mut empty, 500);
        assert!(empty.is_empty());

        let mut single = vec![42u8];
        sort_u8_scalar(&mut single, 500);
        assert_eq!(single, vec![42]);

        let mut uniform = vec![7u8; 600];
        sort_u8_scalar(&mut uniform, 500);
        assert_eq!(uniform, vec![7u8; 600]);

        let mut concrete = vec![5u8, 3, 8, 1, 9, 2];
        sort_u8_scalar(&mut concrete, 500);
        assert_eq!(concrete, vec![1, 2, 3, 5, 8, 9]);
    }
}
