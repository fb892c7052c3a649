//! Fixed element byte-widths for width-dispatched operations.
//!
//! The reversal engine operates on buffers of fixed-width elements and is
//! dispatched by element byte-width. This module defines the closed set of
//! supported widths and the boundary validation that turns an externally
//! supplied width into a checked value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// A supported fixed element byte-width.
///
/// Power-of-two widths (1, 2, 4, 8, 16) have dedicated SIMD reversal paths;
/// the non-power-of-two widths (3, 5, 6) use shuffle-table repacking in the
/// 128-bit tiers and a generic scalar exchange elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementWidth {
    /// 1-byte elements.
    W1,
    /// 2-byte elements.
    W2,
    /// 3-byte elements (non-power-of-two).
    W3,
    /// 4-byte elements.
    W4,
    /// 5-byte elements (non-power-of-two).
    W5,
    /// 6-byte elements (non-power-of-two).
    W6,
    /// 8-byte elements.
    W8,
    /// 16-byte elements.
    W16,
}

impl ElementWidth {
    /// All supported widths, narrowest first.
    pub const ALL: [ElementWidth; 8] = [
        ElementWidth::W1,
        ElementWidth::W2,
        ElementWidth::W3,
        ElementWidth::W4,
        ElementWidth::W5,
        ElementWidth::W6,
        ElementWidth::W8,
        ElementWidth::W16,
    ];

    /// The width in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            ElementWidth::W1 => 1,
            ElementWidth::W2 => 2,
            ElementWidth::W3 => 3,
            ElementWidth::W4 => 4,
            ElementWidth::W5 => 5,
            ElementWidth::W6 => 6,
            ElementWidth::W8 => 8,
            ElementWidth::W16 => 16,
        }
    }

    /// Whether the width is a power of two.
    #[inline]
    pub const fn is_power_of_two(self) -> bool {
        self.bytes().is_power_of_two()
    }
}

impl fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

impl TryFrom<usize> for ElementWidth {
    type Error = KernelError;

    fn try_from(width: usize) -> Result<Self, Self::Error> {
        match width {
            1 => Ok(ElementWidth::W1),
            2 => Ok(ElementWidth::W2),
            3 => Ok(ElementWidth::W3),
            4 => Ok(ElementWidth::W4),
            5 => Ok(ElementWidth::W5),
            6 => Ok(ElementWidth::W6),
            8 => Ok(ElementWidth::W8),
            16 => Ok(ElementWidth::W16),
            other => Err(KernelError::UnsupportedWidth { width: other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_round_trip() {
        for width in ElementWidth::ALL {
            let parsed = ElementWidth::try_from(width.bytes()).unwrap();
            assert_eq!(parsed, width);
        }
    }

    #[test]
    fn test_unsupported_widths() {
        for width in [0usize, 7, 9, 12, 32] {
            let err = ElementWidth::try_from(width).unwrap_err();
            assert!(matches!(err, KernelError::UnsupportedWidth { .. }));
        }
    }

    #[test]
    fn test_power_of_two_classification() {
        assert!(ElementWidth::W1.is_power_of_two());
        assert!(ElementWidth::W2.is_power_of_two());
        assert!(ElementWidth::W4.is_power_of_two());
        assert!(ElementWidth::W8.is_power_of_two());
        assert!(ElementWidth::W16.is_power_of_two());
        assert!(!ElementWidth::W3.is_power_of_two());
        assert!(!ElementWidth::W5.is_power_of_two());
        assert!(!ElementWidth::W6.is_power_of_two());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ElementWidth::W3), "3");
        assert_eq!(format!("{}", ElementWidth::W16), "16");
    }
}
