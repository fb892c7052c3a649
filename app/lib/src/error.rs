//! Error types for the lanekit kernel library.
//!
//! This module defines the errors that can occur at the validated boundary
//! of the library: element-width validation, combine-operator parsing, and
//! buffer shape checks.
//!
//! In-core precondition violations (mismatched dual-buffer lengths, slices
//! that are not a whole number of elements after validation) are programming
//! errors and are asserted, not returned. See the `# Panics` sections on the
//! affected [`SimdDispatcher`](crate::SimdDispatcher) methods.

use thiserror::Error;

/// Main error type for the lanekit library.
///
/// All fallible boundary operations return `Result<T, KernelError>`.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Unsupported element byte-width.
    ///
    /// The reversal engine supports fixed element widths of
    /// 1, 2, 3, 4, 5, 6, 8, and 16 bytes.
    #[error("unsupported element width: {width} bytes (supported: 1, 2, 3, 4, 5, 6, 8, 16)")]
    UnsupportedWidth {
        /// The rejected element width in bytes
        width: usize,
    },

    /// Buffer length is not a whole number of elements.
    ///
    /// Occurs when a byte buffer handed to a width-dispatched operation
    /// cannot be split into elements of the requested width.
    #[error("buffer length {len} is not a multiple of element width {width}")]
    LengthNotMultiple {
        /// Buffer length in bytes
        len: usize,
        /// Element width in bytes
        width: usize,
    },

    /// Unknown bitwise combine operator name.
    ///
    /// Raised when parsing a combine operator name from external input
    /// (CLI flags, config files).
    #[error("unknown combine operator: {0:?}")]
    UnknownCombine(String),
}

/// Type alias for Results using `KernelError`.
pub type Result<T> = std::result::Result<T, KernelError>;
