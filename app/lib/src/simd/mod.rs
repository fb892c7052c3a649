//! SIMD acceleration module for the lanekit array kernels.
//!
//! This module provides hardware-accelerated implementations of the core
//! kernel operations:
//!
//! - Min/max reduction over integer and float slices
//! - Bit counting with a bitwise combine against a broadcast operand
//! - Bitwise equality of byte buffers
//! - Sortedness checking
//! - In-place element reversal at fixed byte widths
//! - Hybrid insertion/counting byte sort
//!
//! The module automatically detects available CPU features at runtime and
//! selects the best available implementation:
//!
//! - **AVX2**: 256-bit vectors on modern x86_64 CPUs
//! - **SSE4.2**: 128-bit vectors on older x86_64 CPUs
//! - **NEON**: 128-bit vectors on ARM64 CPUs
//! - **Scalar**: Fallback for all platforms
//!
//! # Example
//!
//! ```rust
//! use lanekit::simd::SimdDispatcher;
//!
//! let dispatcher = SimdDispatcher::detect();
//! assert_eq!(dispatcher.max_u8(&[5, 3, 8, 1, 9, 2]), Some(9));
//! ```

mod dispatcher;
mod scalar;
mod tables;

#[cfg(target_arch = "x86_64")]
mod avx2;

#[cfg(target_arch = "x86_64")]
mod sse42;

#[cfg(target_arch = "aarch64")]
mod neon;

pub use dispatcher::{CpuFeatures, SimdDispatcher, SimdLevel};
