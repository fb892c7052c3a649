//! Bitwise combine operators for the bit-counting kernel.
//!
//! This module defines the `BitCombine` enum which selects the bitwise
//! pre-combination applied between each loaded block and a broadcast
//! operand before population counting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// A bitwise combine applied before population counting.
///
/// [`SimdDispatcher::count_bits`](crate::SimdDispatcher::count_bits) combines
/// every input byte with a broadcast operand byte using one of these
/// operators, then counts the set bits of the result:
///
/// - `Identity`: count bits of the input itself (operand ignored)
/// - `And`, `Or`, `Xor`: the plain binary operators
/// - `AndNot`: `a & !b`
/// - `OrNot`: `a | !b`
/// - `Nand`, `Nor`, `Xnor`: negated binary operators
/// - `Not`: `!a` (operand ignored)
///
/// `Not` is never counted directly: the kernels compute it as
/// `total_bits - count(Identity)`, which avoids a negation per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitCombine {
    /// Count bits of the input unchanged.
    Identity,
    /// `a & b`
    And,
    /// `a | b`
    Or,
    /// `a ^ b`
    Xor,
    /// `a & !b`
    AndNot,
    /// `a | !b`
    OrNot,
    /// `!(a & b)`
    Nand,
    /// `!(a | b)`
    Nor,
    /// `!(a ^ b)`
    Xnor,
    /// `!a` (operand ignored)
    Not,
}

impl BitCombine {
    /// All combine operators, in declaration order.
    ///
    /// Useful for exhaustive testing and CLI help text.
    pub const ALL: [BitCombine; 10] = [
        BitCombine::Identity,
        BitCombine::And,
        BitCombine::Or,
        BitCombine::Xor,
        BitCombine::AndNot,
        BitCombine::OrNot,
        BitCombine::Nand,
        BitCombine::Nor,
        BitCombine::Xnor,
        BitCombine::Not,
    ];

    /// Apply the combine to a single byte against an operand byte.
    #[inline]
    pub const fn apply_u8(self, a: u8, b: u8) -> u8 {
        match self {
            BitCombine::Identity => a,
            BitCombine::And => a & b,
            BitCombine::Or => a | b,
            BitCombine::Xor => a ^ b,
            BitCombine::AndNot => a & !b,
            BitCombine::OrNot => a | !b,
            BitCombine::Nand => !(a & b),
            BitCombine::Nor => !(a | b),
            BitCombine::Xnor => !(a ^ b),
            BitCombine::Not => !a,
        }
    }

    /// Apply the combine to a 64-bit word against an operand word.
    ///
    /// The operand is expected to be the byte operand splatted across all
    /// eight byte positions, matching the broadcast the SIMD tiers use.
    #[inline]
    pub const fn apply_u64(self, a: u64, b: u64) -> u64 {
        match self {
            BitCombine::Identity => a,
            BitCombine::And => a & b,
            BitCombine::Or => a | b,
            BitCombine::Xor => a ^ b,
            BitCombine::AndNot => a & !b,
            BitCombine::OrNot => a | !b,
            BitCombine::Nand => !(a & b),
            BitCombine::Nor => !(a | b),
            BitCombine::Xnor => !(a ^ b),
            BitCombine::Not => !a,
        }
    }

    /// Whether the result depends on the operand byte.
    ///
    /// `Identity` and `Not` ignore the operand entirely.
    #[inline]
    pub const fn uses_operand(self) -> bool {
        !matches!(self, BitCombine::Identity | BitCombine::Not)
    }

    /// The canonical lower-case name of the operator.
    pub const fn name(self) -> &'static str {
        match self {
            BitCombine::Identity => "identity",
            BitCombine::And => "and",
            BitCombine::Or => "or",
            BitCombine::Xor => "xor",
            BitCombine::AndNot => "andnot",
            BitCombine::OrNot => "ornot",
            BitCombine::Nand => "nand",
            BitCombine::Nor => "nor",
            BitCombine::Xnor => "xnor",
            BitCombine::Not => "not",
        }
    }
}

impl fmt::Display for BitCombine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BitCombine {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" | "id" => Ok(BitCombine::Identity),
            "and" => Ok(BitCombine::And),
            "or" => Ok(BitCombine::Or),
            "xor" => Ok(BitCombine::Xor),
            "andnot" => Ok(BitCombine::AndNot),
            "ornot" => Ok(BitCombine::OrNot),
            "nand" => Ok(BitCombine::Nand),
            "nor" => Ok(BitCombine::Nor),
            "xnor" => Ok(BitCombine::Xnor),
            "not" => Ok(BitCombine::Not),
            other => Err(KernelError::UnknownCombine(other.to_string())),
        }
    }
}
