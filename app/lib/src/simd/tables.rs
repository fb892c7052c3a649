//! Precomputed byte-shuffle index tables for odd element widths.
//!
//! Widths 3, 5, and 6 do not divide a 16-byte register evenly, so their
//! reversal kernels operate on the largest whole group of elements that
//! fits: `k = 16 / width` elements, `k * width` payload bytes per load.
//!
//! Each width has two tables. The low-side table reverses `k` elements
//! sitting at the start of a register (a load taken at the low cursor).
//! The high-side table reverses `k` elements sitting at the *end* of the
//! 16-byte payload (a load taken 16 bytes before the high cursor), so its
//! source indices are offset by `16 - k * width`. Indices past the payload
//! are don't-care bytes; the kernels copy only the payload out of the
//! shuffled register.
//!
//! The same tables feed `_mm_shuffle_epi8` on x86 and `vqtbl1q_u8` on
//! aarch64, which share the index-per-output-byte semantics.

/// Elements per 16-byte register at width 3 (15 payload bytes).
pub const GROUP_W3: usize = 5;
/// Elements per 16-byte register at width 5 (15 payload bytes).
pub const GROUP_W5: usize = 3;
/// Elements per 16-byte register at width 6 (12 payload bytes).
pub const GROUP_W6: usize = 2;

/// Reverse a 16-byte block of width-1 elements (plain byte reversal).
pub const REV128_W1: [u8; 16] = [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
/// Reverse a 16-byte block of width-2 elements.
pub const REV128_W2: [u8; 16] = [14, 15, 12, 13, 10, 11, 8, 9, 6, 7, 4, 5, 2, 3, 0, 1];
/// Reverse a 16-byte block of width-4 elements.
pub const REV128_W4: [u8; 16] = [12, 13, 14, 15, 8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3];
/// Reverse a 16-byte block of width-8 elements.
pub const REV128_W8: [u8; 16] = [8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7];

/// Block-reversal table for a power-of-two width below 16.
pub fn pow2_width_table(width: usize) -> &'static [u8; 16] {
    match width {
        1 => &REV128_W1,
        2 => &REV128_W2,
        4 => &REV128_W4,
        _ => &REV128_W8,
    }
}

/// Reverse 5 width-3 elements at the start of a register.
pub const REV_LO_W3: [u8; 16] = [12, 13, 14, 9, 10, 11, 6, 7, 8, 3, 4, 5, 0, 1, 2, 15];

/// Reverse 5 width-3 elements at the end of the payload (offset 1).
pub const REV_HI_W3: [u8; 16] = [13, 14, 15, 10, 11, 12, 7, 8, 9, 4, 5, 6, 1, 2, 3, 0];

/// Reverse 3 width-5 elements at the start of a register.
pub const REV_LO_W5: [u8; 16] = [10, 11, 12, 13, 14, 5, 6, 7, 8, 9, 0, 1, 2, 3, 4, 15];

/// Reverse 3 width-5 elements at the end of the payload (offset 1).
pub const REV_HI_W5: [u8; 16] = [11, 12, 13, 14, 15, 6, 7, 8, 9, 10, 1, 2, 3, 4, 5, 0];

/// Reverse 2 width-6 elements at the start of a register.
pub const REV_LO_W6: [u8; 16] = [6, 7, 8, 9, 10, 11, 0, 1, 2, 3, 4, 5, 12, 13, 14, 15];

/// Reverse 2 width-6 elements at the end of the payload (offset 4).
pub const REV_HI_W6: [u8; 16] = [10, 11, 12, 13, 14, 15, 4, 5, 6, 7, 8, 9, 0, 0, 0, 0];

/// Group size and table pair for an odd width, or `None` for widths with
/// a dedicated power-of-two path.
pub fn odd_width_tables(width: usize) -> Option<(usize, &'static [u8; 16], &'static [u8; 16])> {
    match width {
        3 => Some((GROUP_W3, &REV_LO_W3, &REV_HI_W3)),
        5 => Some((GROUP_W5, &REV_LO_W5, &REV_HI_W5)),
        6 => Some((GROUP_W6, &REV_LO_W6, &REV_HI_W6)),
        _ => None,
    }
}
