//! Property-based tests for the kernel operations.
//!
//! Uses proptest to verify algebraic identities hold for arbitrary inputs.
//! The dispatcher under test uses whatever tier the host CPU selects; the
//! scalar-only dispatcher serves as the reference implementation.

use proptest::prelude::*;

use lanekit::{BitCombine, ElementWidth, SimdDispatcher};

fn combine_strategy() -> impl Strategy<Value = BitCombine> {
    prop::sample::select(BitCombine::ALL.to_vec())
}

fn width_strategy() -> impl Strategy<Value = ElementWidth> {
    prop::sample::select(ElementWidth::ALL.to_vec())
}

proptest! {
    /// max agrees with the iterator fold.
    #[test]
    fn prop_max_u32_matches_iterator(values in prop::collection::vec(any::<u32>(), 0..300)) {
        let d = SimdDispatcher::detect();
        prop_assert_eq!(d.max_u32(&values), values.iter().copied().max());
        prop_assert_eq!(d.min_u32(&values), values.iter().copied().min());
    }

    /// Signed reductions agree with the iterator fold.
    #[test]
    fn prop_minmax_i64_matches_iterator(values in prop::collection::vec(any::<i64>(), 0..300)) {
        let d = SimdDispatcher::detect();
        prop_assert_eq!(d.max_i64(&values), values.iter().copied().max());
        prop_assert_eq!(d.min_i64(&values), values.iter().copied().min());
    }

    /// Accelerated reductions agree with the scalar tier on f64, NaN-free.
    #[test]
    fn prop_minmax_f64_matches_scalar(
        values in prop::collection::vec(-1e12f64..1e12, 0..300)
    ) {
        let d = SimdDispatcher::detect();
        let reference = SimdDispatcher::scalar_only();
        prop_assert_eq!(d.max_f64(&values), reference.max_f64(&values));
        prop_assert_eq!(d.min_f64(&values), reference.min_f64(&values));
    }

    /// Bit counting agrees with the scalar tier for every combine.
    #[test]
    fn prop_count_bits_matches_scalar(
        data in prop::collection::vec(any::<u8>(), 0..600),
        combine in combine_strategy(),
        operand: u8,
    ) {
        let d = SimdDispatcher::detect();
        let reference = SimdDispatcher::scalar_only();
        prop_assert_eq!(
            d.count_bits(&data, combine, operand),
            reference.count_bits(&data, combine, operand)
        );
    }

    /// Identity and Not partition the total bit count.
    #[test]
    fn prop_count_bits_not_complement(data in prop::collection::vec(any::<u8>(), 0..600)) {
        let d = SimdDispatcher::detect();
        let identity = d.count_bits(&data, BitCombine::Identity, 0);
        let not = d.count_bits(&data, BitCombine::Not, 0);
        prop_assert_eq!(identity + not, 8 * data.len() as u64);
    }

    /// XOR of a uniform buffer with its own byte clears every bit.
    #[test]
    fn prop_count_bits_xor_self_is_zero(byte: u8, len in 0usize..600) {
        let d = SimdDispatcher::detect();
        let data = vec![byte; len];
        prop_assert_eq!(d.count_bits(&data, BitCombine::Xor, byte), 0);
    }

    /// A buffer is always bitwise equal to itself, and never equal after
    /// a single bit flip.
    #[test]
    fn prop_bits_equal_reflexive(data in prop::collection::vec(any::<u8>(), 1..600), flip in any::<prop::sample::Index>()) {
        let d = SimdDispatcher::detect();
        prop_assert!(d.bits_equal(&data, &data.clone()));

        let mut flipped = data.clone();
        let i = flip.index(flipped.len());
        flipped[i] ^= 1;
        prop_assert!(!d.bits_equal(&data, &flipped));
    }

    /// is_sorted agrees with the standard library.
    #[test]
    fn prop_is_sorted_matches_std(values in prop::collection::vec(any::<i32>(), 0..400)) {
        let d = SimdDispatcher::detect();
        prop_assert_eq!(d.is_sorted_i32(&values), values.windows(2).all(|w| w[0] <= w[1]));
    }

    /// A sorted copy always passes the sortedness check.
    #[test]
    fn prop_sorted_input_is_sorted(mut values in prop::collection::vec(any::<u32>(), 0..400)) {
        let d = SimdDispatcher::detect();
        values.sort_unstable();
        prop_assert!(d.is_sorted_u32(&values));
    }

    /// Reversal is an involution at every element width.
    #[test]
    fn prop_reverse_involution(
        elements in 0usize..120,
        width in width_strategy(),
        seed: u64,
    ) {
        let d = SimdDispatcher::detect();
        let w = width.bytes();
        let data: Vec<u8> = (0..elements * w)
            .map(|i| (seed.wrapping_mul(i as u64 + 1) >> 32) as u8)
            .collect();
        let mut twice = data.clone();
        d.reverse_elements(&mut twice, width).unwrap();
        d.reverse_elements(&mut twice, width).unwrap();
        prop_assert_eq!(twice, data);
    }

    /// Reversal matches the standard library on a typed view.
    #[test]
    fn prop_reverse_u32_matches_std(mut values in prop::collection::vec(any::<u32>(), 0..200)) {
        let d = SimdDispatcher::detect();
        let mut expected = values.clone();
        expected.reverse();
        d.reverse_u32(&mut values);
        prop_assert_eq!(values, expected);
    }

    /// Sorting produces a sorted permutation of the input.
    #[test]
    fn prop_sort_u8_is_sorted_permutation(mut data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let d = SimdDispatcher::detect();
        let mut expected = data.clone();
        expected.sort_unstable();
        d.sort_u8(&mut data);
        prop_assert_eq!(data, expected);
    }

    /// Signed sort matches the standard library's signed order.
    #[test]
    fn prop_sort_i8_matches_std(mut data in prop::collection::vec(any::<i8>(), 0..2000)) {
        let d = SimdDispatcher::detect();
        let mut expected = data.clone();
        expected.sort_unstable();
        d.sort_i8(&mut data);
        prop_assert_eq!(data, expected);
    }
}
