//! # Lanekit
//!
//! Tiered SIMD kernels for flat numeric arrays.
//!
//! This library provides hardware-accelerated primitives for the operations
//! that dominate columnar scans: min/max reduction, bit counting, bitwise
//! equality, sortedness checking, in-place element reversal, and byte
//! sorting. Each operation ships as a family of kernels at several SIMD
//! tiers, and a dispatcher selects the widest tier the CPU supports once at
//! construction time.
//!
//! ## Features
//!
//! - **Min/max reduction**: Over ten element types (`u8`/`i8` through
//!   `u64`/`i64`, `f32`, `f64`) with NaN-propagating float semantics
//! - **Bit counting**: Population count fused with a bitwise combine
//!   (AND, OR, XOR, and their negated forms) against a broadcast operand
//! - **Bitwise equality**: Short-circuiting block comparison of buffers
//! - **Sortedness checking**: Non-decreasing order detection without
//!   materializing a sorted copy
//! - **Element reversal**: In-place reversal at element widths 1 through
//!   16 bytes, including the odd widths 3, 5, and 6
//! - **Byte sort**: Hybrid insertion/counting sort for `u8` and `i8`
//! - **SIMD acceleration**: Uses AVX2, SSE4.2, or NEON instructions when
//!   available, with a scalar fallback on every platform
//! - **Thread-safe**: All public types implement `Send + Sync`
//!
//! ## Quick Start
//!
//! ```rust
//! use lanekit::{BitCombine, ElementWidth, SimdDispatcher};
//!
//! let dispatcher = SimdDispatcher::detect();
//!
//! // Reductions
//! assert_eq!(dispatcher.max_u8(&[5, 3, 8, 1, 9, 2]), Some(9));
//! assert_eq!(dispatcher.min_u8(&[5, 3, 8, 1, 9, 2]), Some(1));
//!
//! // Bit counting with a combine
//! assert_eq!(dispatcher.count_bits(&[0xFF, 0x0F], BitCombine::And, 0x0F), 8);
//!
//! // In-place reversal of 4-byte elements
//! let mut data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
//! dispatcher.reverse_elements(&mut data, ElementWidth::W4)?;
//! assert_eq!(data, vec![5, 6, 7, 8, 1, 2, 3, 4]);
//!
//! // Hybrid byte sort
//! let mut bytes = vec![5u8, 3, 8, 1, 9, 2];
//! dispatcher.sort_u8(&mut bytes);
//! assert_eq!(bytes, vec![1, 2, 3, 5, 8, 9]);
//! # Ok::<(), lanekit::KernelError>(())
//! ```
//!
//! ## Configuration
//!
//! Tiers can be disabled individually, which forces the dispatcher onto a
//! narrower implementation. This is how the test suite checks cross-tier
//! equivalence:
//!
//! ```rust
//! use lanekit::{KernelConfig, SimdConfig, SimdDispatcher};
//!
//! // Run everything through the scalar tier.
//! let config = KernelConfig::default().with_simd_config(SimdConfig::disabled());
//! let dispatcher = SimdDispatcher::with_config(config);
//! assert!(!dispatcher.is_accelerated());
//! ```
//!
//! ## Thread Safety
//!
//! The [`SimdDispatcher`] holds only detection results and configuration,
//! so a single instance can be shared across threads (via `Arc`) that run
//! kernels concurrently on disjoint buffers. [`KernelStats`] uses atomic
//! counters for lock-free updates from multiple threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod combine;
pub mod config;
pub mod element;
pub mod error;
pub mod simd;
pub mod stats;

// Re-exports for convenience
pub use combine::BitCombine;
pub use config::{KernelConfig, SimdConfig, DEFAULT_INSERTION_SORT_THRESHOLD};
pub use element::ElementWidth;
pub use error::{KernelError, Result};
pub use simd::{CpuFeatures, SimdDispatcher, SimdLevel};
pub use stats::{KernelStats, StatsSnapshot};
