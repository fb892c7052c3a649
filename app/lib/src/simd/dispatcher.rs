//! SIMD dispatcher with runtime CPU feature detection.
//!
//! This module provides the main entry point for the kernel operations,
//! automatically selecting the best available implementation based on CPU
//! features. Detection happens once when the dispatcher is constructed;
//! every operation branches on the stored level exactly once and runs the
//! whole input on the selected tier.

use crate::combine::BitCombine;
use crate::config::{KernelConfig, SimdConfig};
use crate::element::ElementWidth;
use crate::error::{KernelError, Result};
use crate::simd::scalar;

/// Detected CPU features for SIMD acceleration.
///
/// This struct holds the results of runtime CPU feature detection,
/// indicating which SIMD instruction sets are available on the current CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFeatures {
    /// AVX2 is available (x86_64 only).
    pub avx2: bool,
    /// SSE4.2 is available (x86_64 only).
    pub sse42: bool,
    /// NEON is available (ARM64 only).
    pub neon: bool,
}

impl CpuFeatures {
    /// Detect CPU features at runtime.
    ///
    /// The detection is performed once and the results can be cached for
    /// the lifetime of the program.
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        Self {
            avx2: std::arch::is_x86_feature_detected!("avx2"),
            sse42: std::arch::is_x86_feature_detected!("sse4.2"),
            neon: false,
        }
    }

    /// Detect CPU features at runtime (ARM64 version).
    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Self {
        // NEON is mandatory on ARM64, so it's always available
        Self {
            avx2: false,
            sse42: false,
            neon: true,
        }
    }

    /// Detect CPU features at runtime (fallback for other architectures).
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Self {
        Self {
            avx2: false,
            sse42: false,
            neon: false,
        }
    }

    /// Create a CpuFeatures with no SIMD support.
    ///
    /// Useful for testing scalar fallback implementations.
    pub fn none() -> Self {
        Self {
            avx2: false,
            sse42: false,
            neon: false,
        }
    }

    /// Check if any SIMD instruction set is available.
    pub fn has_any(&self) -> bool {
        self.avx2 || self.sse42 || self.neon
    }
}

impl Default for CpuFeatures {
    fn default() -> Self {
        Self::detect()
    }
}

/// The SIMD implementation level being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// AVX2 (256-bit vectors, x86_64).
    Avx2,
    /// SSE4.2 (128-bit vectors, x86_64).
    Sse42,
    /// NEON (128-bit vectors, ARM64).
    Neon,
    /// Scalar fallback (no SIMD).
    Scalar,
}

impl std::fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimdLevel::Avx2 => write!(f, "AVX2"),
            SimdLevel::Sse42 => write!(f, "SSE4.2"),
            SimdLevel::Neon => write!(f, "NEON"),
            SimdLevel::Scalar => write!(f, "Scalar"),
        }
    }
}

macro_rules! dispatch_minmax {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $scalar:path, $sse42:path, $avx2:path, $neon:path) => {
        $(#[$doc])*
        pub fn $name(&self, values: &[$ty]) -> Option<$ty> {
            match self.level {
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 => {
                    // Safety: We've verified AVX2 is available
                    unsafe { $avx2(values) }
                }
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Sse42 => {
                    // Safety: We've verified SSE4.2 is available
                    unsafe { $sse42(values) }
                }
                #[cfg(target_arch = "aarch64")]
                SimdLevel::Neon => {
                    // Safety: NEON is always available on ARM64
                    unsafe { $neon(values) }
                }
                _ => $scalar(values),
            }
        }
    };
}

macro_rules! dispatch_is_sorted {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $scalar:path, $sse42:path, $avx2:path, $neon:path) => {
        $(#[$doc])*
        pub fn $name(&self, values: &[$ty]) -> bool {
            match self.level {
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 => {
                    // Safety: We've verified AVX2 is available
                    unsafe { $avx2(values) }
                }
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Sse42 => {
                    // Safety: We've verified SSE4.2 is available
                    unsafe { $sse42(values) }
                }
                #[cfg(target_arch = "aarch64")]
                SimdLevel::Neon => {
                    // Safety: NEON is always available on ARM64
                    unsafe { $neon(values) }
                }
                _ => $scalar(values),
            }
        }
    };
}

/// SIMD dispatcher for hardware-accelerated array kernels.
///
/// The dispatcher automatically selects the best available SIMD
/// implementation based on runtime CPU feature detection and user
/// configuration.
///
/// # Example
///
/// ```rust
/// use lanekit::SimdDispatcher;
///
/// let dispatcher = SimdDispatcher::detect();
/// println!("Using SIMD level: {}", dispatcher.level());
///
/// assert_eq!(dispatcher.max_u8(&[5, 3, 8, 1, 9, 2]), Some(9));
/// assert_eq!(dispatcher.min_u8(&[5, 3, 8, 1, 9, 2]), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct SimdDispatcher {
    /// Detected CPU features.
    features: CpuFeatures,
    /// User configuration.
    config: KernelConfig,
    /// The selected SIMD level.
    level: SimdLevel,
}

impl SimdDispatcher {
    /// Create a new dispatcher with automatic CPU detection.
    ///
    /// This detects available CPU features and selects the best SIMD level
    /// with all instruction sets enabled.
    pub fn detect() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create a new dispatcher with the given configuration.
    ///
    /// The configuration allows disabling specific SIMD instruction sets,
    /// which can be useful for testing or compatibility.
    pub fn with_config(config: KernelConfig) -> Self {
        let features = CpuFeatures::detect();
        let level = Self::select_level(&features, &config.simd_config);
        Self {
            features,
            config,
            level,
        }
    }

    /// Create a dispatcher that only uses scalar operations.
    ///
    /// This is useful for testing or when SIMD causes issues.
    pub fn scalar_only() -> Self {
        Self::with_config(KernelConfig::default().with_simd_config(SimdConfig::disabled()))
    }

    /// Select the best SIMD level based on features and configuration.
    fn select_level(features: &CpuFeatures, config: &SimdConfig) -> SimdLevel {
        // Priority: AVX2 > SSE4.2 > NEON > Scalar
        if features.avx2 && config.enable_avx2 {
            SimdLevel::Avx2
        } else if features.sse42 && config.enable_sse42 {
            SimdLevel::Sse42
        } else if features.neon && config.enable_neon {
            SimdLevel::Neon
        } else {
            SimdLevel::Scalar
        }
    }

    /// Get the detected CPU features.
    pub fn features(&self) -> CpuFeatures {
        self.features
    }

    /// Get the current configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get the selected SIMD level.
    pub fn level(&self) -> SimdLevel {
        self.level
    }

    /// Check if SIMD acceleration is being used.
    pub fn is_accelerated(&self) -> bool {
        self.level != SimdLevel::Scalar
    }

    dispatch_minmax!(
        /// Maximum element of a `u8` slice, or `None` for the empty slice.
        max_u8, u8, scalar::max_u8_scalar,
        super::sse42::max_u8_sse42, super::avx2::max_u8_avx2, super::neon::max_u8_neon
    );
    dispatch_minmax!(
        /// Minimum element of a `u8` slice, or `None` for the empty slice.
        min_u8, u8, scalar::min_u8_scalar,
        super::sse42::min_u8_sse42, super::avx2::min_u8_avx2, super::neon::min_u8_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `i8` slice, or `None` for the empty slice.
        max_i8, i8, scalar::max_i8_scalar,
        super::sse42::max_i8_sse42, super::avx2::max_i8_avx2, super::neon::max_i8_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `i8` slice, or `None` for the empty slice.
        min_i8, i8, scalar::min_i8_scalar,
        super::sse42::min_i8_sse42, super::avx2::min_i8_avx2, super::neon::min_i8_neon
    );
    dispatch_minmax!(
        /// Maximum element of a `u16` slice, or `None` for the empty slice.
        max_u16, u16, scalar::max_u16_scalar,
        super::sse42::max_u16_sse42, super::avx2::max_u16_avx2, super::neon::max_u16_neon
    );
    dispatch_minmax!(
        /// Minimum element of a `u16` slice, or `None` for the empty slice.
        min_u16, u16, scalar::min_u16_scalar,
        super::sse42::min_u16_sse42, super::avx2::min_u16_avx2, super::neon::min_u16_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `i16` slice, or `None` for the empty slice.
        max_i16, i16, scalar::max_i16_scalar,
        super::sse42::max_i16_sse42, super::avx2::max_i16_avx2, super::neon::max_i16_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `i16` slice, or `None` for the empty slice.
        min_i16, i16, scalar::min_i16_scalar,
        super::sse42::min_i16_sse42, super::avx2::min_i16_avx2, super::neon::min_i16_neon
    );
    dispatch_minmax!(
        /// Maximum element of a `u32` slice, or `None` for the empty slice.
        max_u32, u32, scalar::max_u32_scalar,
        super::sse42::max_u32_sse42, super::avx2::max_u32_avx2, super::neon::max_u32_neon
    );
    dispatch_minmax!(
        /// Minimum element of a `u32` slice, or `None` for the empty slice.
        min_u32, u32, scalar::min_u32_scalar,
        super::sse42::min_u32_sse42, super::avx2::min_u32_avx2, super::neon::min_u32_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `i32` slice, or `None` for the empty slice.
        max_i32, i32, scalar::max_i32_scalar,
        super::sse42::max_i32_sse42, super::avx2::max_i32_avx2, super::neon::max_i32_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `i32` slice, or `None` for the empty slice.
        min_i32, i32, scalar::min_i32_scalar,
        super::sse42::min_i32_sse42, super::avx2::min_i32_avx2, super::neon::min_i32_neon
    );
    dispatch_minmax!(
        /// Maximum element of a `u64` slice, or `None` for the empty slice.
        max_u64, u64, scalar::max_u64_scalar,
        super::sse42::max_u64_sse42, super::avx2::max_u64_avx2, super::neon::max_u64_neon
    );
    dispatch_minmax!(
        /// Minimum element of a `u64` slice, or `None` for the empty slice.
        min_u64, u64, scalar::min_u64_scalar,
        super::sse42::min_u64_sse42, super::avx2::min_u64_avx2, super::neon::min_u64_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `i64` slice, or `None` for the empty slice.
        max_i64, i64, scalar::max_i64_scalar,
        super::sse42::max_i64_sse42, super::avx2::max_i64_avx2, super::neon::max_i64_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `i64` slice, or `None` for the empty slice.
        min_i64, i64, scalar::min_i64_scalar,
        super::sse42::min_i64_sse42, super::avx2::min_i64_avx2, super::neon::min_i64_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `f32` slice, or `None` for the empty
        /// slice. If any element is NaN the result is NaN.
        max_f32, f32, scalar::max_f32_scalar,
        super::sse42::max_f32_sse42, super::avx2::max_f32_avx2, super::neon::max_f32_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `f32` slice, or `None` for the empty
        /// slice. If any element is NaN the result is NaN.
        min_f32, f32, scalar::min_f32_scalar,
        super::sse42::min_f32_sse42, super::avx2::min_f32_avx2, super::neon::min_f32_neon
    );
    dispatch_minmax!(
        /// Maximum element of an `f64` slice, or `None` for the empty
        /// slice. If any element is NaN the result is NaN.
        max_f64, f64, scalar::max_f64_scalar,
        super::sse42::max_f64_sse42, super::avx2::max_f64_avx2, super::neon::max_f64_neon
    );
    dispatch_minmax!(
        /// Minimum element of an `f64` slice, or `None` for the empty
        /// slice. If any element is NaN the result is NaN.
        min_f64, f64, scalar::min_f64_scalar,
        super::sse42::min_f64_sse42, super::avx2::min_f64_avx2, super::neon::min_f64_neon
    );

    dispatch_is_sorted!(
        /// Whether a `u8` slice is sorted in non-decreasing order.
        /// Empty and single-element slices are sorted.
        is_sorted_u8, u8, scalar::is_sorted_u8_scalar,
        super::sse42::is_sorted_u8_sse42, super::avx2::is_sorted_u8_avx2,
        super::neon::is_sorted_u8_neon
    );
    dispatch_is_sorted!(
        /// Whether a `u32` slice is sorted in non-decreasing order.
        is_sorted_u32, u32, scalar::is_sorted_u32_scalar,
        super::sse42::is_sorted_u32_sse42, super::avx2::is_sorted_u32_avx2,
        super::neon::is_sorted_u32_neon
    );
    dispatch_is_sorted!(
        /// Whether an `i32` slice is sorted in non-decreasing order.
        is_sorted_i32, i32, scalar::is_sorted_i32_scalar,
        super::sse42::is_sorted_i32_sse42, super::avx2::is_sorted_i32_avx2,
        super::neon::is_sorted_i32_neon
    );
    dispatch_is_sorted!(
        /// Whether an `f64` slice is sorted in non-decreasing order.
        /// Comparisons involving NaN fail, so any NaN in a slice of two or
        /// more elements makes it unsorted.
        is_sorted_f64, f64, scalar::is_sorted_f64_scalar,
        super::sse42::is_sorted_f64_sse42, super::avx2::is_sorted_f64_avx2,
        super::neon::is_sorted_f64_neon
    );

    /// Count the set bits of `data` after combining each byte with a
    /// broadcast `operand` under `combine`.
    ///
    /// `Identity` with a zero operand is a plain population count.
    /// `Not` ignores the operand and is computed as the total bit count
    /// minus the identity count, without a second pass over the data.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lanekit::{BitCombine, SimdDispatcher};
    ///
    /// let dispatcher = SimdDispatcher::detect();
    /// let count = dispatcher.count_bits(&[5, 3, 8, 1, 9, 2], BitCombine::Identity, 0);
    /// assert_eq!(count, 9);
    /// ```
    pub fn count_bits(&self, data: &[u8], combine: BitCombine, operand: u8) -> u64 {
        if combine == BitCombine::Not {
            return 8 * data.len() as u64 - self.count_bits(data, BitCombine::Identity, operand);
        }
        match self.level {
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => {
                // Safety: We've verified AVX2 is available
                unsafe { super::avx2::count_bits_avx2(data, combine, operand) }
            }
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse42 => {
                // Safety: We've verified SSE4.2 is available
                unsafe { super::sse42::count_bits_sse42(data, combine, operand) }
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => {
                // Safety: NEON is always available on ARM64
                unsafe { super::neon::count_bits_neon(data, combine, operand) }
            }
            _ => scalar::count_bits_scalar(data, combine, operand),
        }
    }

    /// Whether two byte slices are bitwise identical, short-circuiting on
    /// the first differing block.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths. Comparing buffers of
    /// unequal length is a caller bug, not a recoverable condition.
    pub fn bits_equal(&self, a: &[u8], b: &[u8]) -> bool {
        assert_eq!(
            a.len(),
            b.len(),
            "bits_equal requires equal-length buffers"
        );
        match self.level {
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => {
                // Safety: We've verified AVX2 is available
                unsafe { super::avx2::bits_equal_avx2(a, b) }
            }
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse42 => {
                // Safety: We've verified SSE4.2 is available
                unsafe { super::sse42::bits_equal_sse42(a, b) }
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => {
                // Safety: NEON is always available on ARM64
                unsafe { super::neon::bits_equal_neon(a, b) }
            }
            _ => scalar::bits_equal_scalar(a, b),
        }
    }

    /// Reverse a byte slice in place.
    pub fn reverse_bytes(&self, data: &mut [u8]) {
        self.reverse_dispatch(data, 1);
    }

    /// Reverse a byte slice in place as a sequence of `width`-byte
    /// elements, preserving the byte order within each element.
    ///
    /// Reversal is an involution: applying it twice restores the input.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::LengthNotMultiple`] if `data.len()` is not
    /// a whole number of elements.
    pub fn reverse_elements(&self, data: &mut [u8], width: ElementWidth) -> Result<()> {
        let w = width.bytes();
        if data.len() % w != 0 {
            return Err(KernelError::LengthNotMultiple {
                len: data.len(),
                width: w,
            });
        }
        self.reverse_dispatch(data, w);
        Ok(())
    }

    /// Reverse a `u16` slice in place.
    pub fn reverse_u16(&self, values: &mut [u16]) {
        // Safety: u16 has no invalid bit patterns and the byte view covers
        // exactly the same allocation.
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(values.as_mut_ptr() as *mut u8, values.len() * 2)
        };
        self.reverse_dispatch(bytes, 2);
    }

    /// Reverse a `u32` slice in place.
    pub fn reverse_u32(&self, values: &mut [u32]) {
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(values.as_mut_ptr() as *mut u8, values.len() * 4)
        };
        self.reverse_dispatch(bytes, 4);
    }

    /// Reverse a `u64` slice in place.
    pub fn reverse_u64(&self, values: &mut [u64]) {
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(values.as_mut_ptr() as *mut u8, values.len() * 8)
        };
        self.reverse_dispatch(bytes, 8);
    }

    /// Reverse a `u128` slice in place.
    pub fn reverse_u128(&self, values: &mut [u128]) {
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(values.as_mut_ptr() as *mut u8, values.len() * 16)
        };
        self.reverse_dispatch(bytes, 16);
    }

    /// Width-validated reversal dispatch. `data.len()` is already a
    /// multiple of `width` here.
    fn reverse_dispatch(&self, data: &mut [u8], width: usize) {
        if width.is_power_of_two() {
            match self.level {
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 => {
                    // Safety: We've verified AVX2 is available
                    unsafe { super::avx2::reverse_pow2_avx2(data, width) }
                }
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Sse42 => {
                    // Safety: We've verified SSE4.2 is available
                    unsafe { super::sse42::reverse_pow2_sse42(data, width) }
                }
                #[cfg(target_arch = "aarch64")]
                SimdLevel::Neon => {
                    // Safety: NEON is always available on ARM64
                    unsafe { super::neon::reverse_pow2_neon(data, width) }
                }
                _ => scalar::reverse_elements_scalar(data, width),
            }
        } else {
            // Odd widths have 128-bit table-shuffle kernels only; the
            // AVX2 level shares them since its feature set covers SSSE3.
            match self.level {
                #[cfg(target_arch = "x86_64")]
                SimdLevel::Avx2 | SimdLevel::Sse42 => {
                    // Safety: We've verified SSSE3-capable SIMD is available
                    unsafe { super::sse42::reverse_odd_sse42(data, width) }
                }
                #[cfg(target_arch = "aarch64")]
                SimdLevel::Neon => {
                    // Safety: NEON is always available on ARM64
                    unsafe { super::neon::reverse_odd_neon(data, width) }
                }
                _ => scalar::reverse_elements_scalar(data, width),
            }
        }
    }

    /// Sort a byte slice in place in ascending order.
    ///
    /// Inputs below the configured insertion-sort threshold use an
    /// insertion sort with a vectorized backward scan; larger inputs use
    /// a counting sort with vectorized bucket emission.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lanekit::SimdDispatcher;
    ///
    /// let dispatcher = SimdDispatcher::detect();
    /// let mut data = vec![5u8, 3, 8, 1, 9, 2];
    /// dispatcher.sort_u8(&mut data);
    /// assert_eq!(data, vec![1, 2, 3, 5, 8, 9]);
    /// ```
    pub fn sort_u8(&self, data: &mut [u8]) {
        let threshold = self.config.insertion_sort_threshold;
        match self.level {
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => {
                // Safety: We've verified AVX2 is available
                unsafe { super::avx2::sort_u8_avx2(data, threshold) }
            }
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse42 => {
                // Safety: We've verified SSE4.2 is available
                unsafe { super::sse42::sort_u8_sse42(data, threshold) }
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => {
                // Safety: NEON is always available on ARM64
                unsafe { super::neon::sort_u8_neon(data, threshold) }
            }
            _ => scalar::sort_u8_scalar(data, threshold),
        }
    }

    /// Sort an `i8` slice in place in ascending signed order.
    ///
    /// Flipping the sign bit maps signed order onto unsigned order, so
    /// the slice is remapped, sorted as unsigned bytes, and mapped back.
    pub fn sort_i8(&self, data: &mut [i8]) {
        // Safety: i8 and u8 have identical layout.
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut u8, data.len())
        };
        for b in bytes.iter_mut() {
            *b ^= 0x80;
        }
        self.sort_u8(bytes);
        for b in bytes.iter_mut() {
            *b ^= 0x80;
        }
    }
}

impl Default for SimdDispatcher {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_features_detect() {
        let features = CpuFeatures::detect();
        // Just verify it doesn't panic
        println!("Detected features: {:?}", features);
    }

    #[test]
    fn test_cpu_features_none() {
        let features = CpuFeatures::none();
        assert!(!features.avx2);
        assert!(!features.sse42);
        assert!(!features.neon);
        assert!(!features.has_any());
    }

    #[test]
    fn test_dispatcher_scalar_only() {
        let dispatcher = SimdDispatcher::scalar_only();
        assert_eq!(dispatcher.level(), SimdLevel::Scalar);
        assert!(!dispatcher.is_accelerated());
    }

    #[test]
    fn test_simd_level_display() {
        assert_eq!(format!("{}", SimdLevel::Avx2), "AVX2");
        assert_eq!(format!("{}", SimdLevel::Sse42), "SSE4.2");
        assert_eq!(format!("{}", SimdLevel::Neon), "NEON");
        assert_eq!(format!("{}", SimdLevel::Scalar), "Scalar");
    }

    #[test]
    fn test_minmax_concrete() {
        let dispatcher = SimdDispatcher::detect();
        assert_eq!(dispatcher.max_u8(&[5, 3, 8, 1, 9, 2]), Some(9));
        assert_eq!(dispatcher.min_u8(&[5, 3, 8, 1, 9, 2]), Some(1));
        assert_eq!(dispatcher.max_u8(&[]), None);
        assert_eq!(dispatcher.max_i32(&[-7, 2, -1]), Some(2));
        assert_eq!(dispatcher.min_f64(&[2.5, -1.5, 0.0]), Some(-1.5));
    }

    #[test]
    fn test_minmax_nan_policy() {
        let dispatcher = SimdDispatcher::detect();
        let values: Vec<f32> = (0..100)
            .map(|i| if i == 63 { f32::NAN } else { i as f32 })
            .collect();
        assert!(dispatcher.max_f32(&values).unwrap().is_nan());
        assert!(dispatcher.min_f32(&values).unwrap().is_nan());
    }

    #[test]
    fn test_is_sorted() {
        let dispatcher = SimdDispatcher::detect();
        let sorted: Vec<u32> = (0..1000).collect();
        let mut unsorted = sorted.clone();
        unsorted.swap(500, 501);
        assert!(dispatcher.is_sorted_u32(&sorted));
        assert!(!dispatcher.is_sorted_u32(&unsorted));
        assert!(dispatcher.is_sorted_u8(&[]));
        assert!(dispatcher.is_sorted_u8(&[1]));
    }

    #[test]
    fn test_count_bits_not_rewrite() {
        let dispatcher = SimdDispatcher::detect();
        let data: Vec<u8> = (0..500u32).map(|i| (i % 256) as u8).collect();
        let identity = dispatcher.count_bits(&data, BitCombine::Identity, 0);
        let not = dispatcher.count_bits(&data, BitCombine::Not, 0);
        assert_eq!(identity + not, 8 * data.len() as u64);
    }

    #[test]
    fn test_bits_equal() {
        let dispatcher = SimdDispatcher::detect();
        let a: Vec<u8> = (0..400u32).map(|i| (i % 256) as u8).collect();
        let mut b = a.clone();
        assert!(dispatcher.bits_equal(&a, &b));
        b[333] ^= 1;
        assert!(!dispatcher.bits_equal(&a, &b));
    }

    #[test]
    #[should_panic(expected = "equal-length buffers")]
    fn test_bits_equal_length_mismatch_panics() {
        let dispatcher = SimdDispatcher::detect();
        dispatcher.bits_equal(&[1, 2, 3], &[1, 2]);
    }

    #[test]
    fn test_reverse_bytes() {
        let dispatcher = SimdDispatcher::detect();
        let mut data = vec![5u8, 3, 8, 1, 9, 2];
        dispatcher.reverse_bytes(&mut data);
        assert_eq!(data, vec![2, 9, 1, 8, 3, 5]);
    }

    #[test]
    fn test_reverse_elements_width_validation() {
        let dispatcher = SimdDispatcher::detect();
        let mut data = vec![0u8; 10];
        let err = dispatcher
            .reverse_elements(&mut data, ElementWidth::W3)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::LengthNotMultiple { len: 10, width: 3 }
        ));
        assert!(dispatcher
            .reverse_elements(&mut data, ElementWidth::W2)
            .is_ok());
    }

    #[test]
    fn test_reverse_typed() {
        let dispatcher = SimdDispatcher::detect();
        let mut values: Vec<u32> = (0..100).collect();
        dispatcher.reverse_u32(&mut values);
        let expected: Vec<u32> = (0..100).rev().collect();
        assert_eq!(values, expected);

        let mut wide: Vec<u128> = (0..9).collect();
        dispatcher.reverse_u128(&mut wide);
        let expected: Vec<u128> = (0..9).rev().collect();
        assert_eq!(wide, expected);
    }

    #[test]
    fn test_sort_u8() {
        let dispatcher = SimdDispatcher::detect();
        let mut small = vec![5u8, 3, 8, 1, 9, 2];
        dispatcher.sort_u8(&mut small);
        assert_eq!(small, vec![1, 2, 3, 5, 8, 9]);

        let mut large: Vec<u8> = (0..2000u32).map(|i| (i * 53 % 256) as u8).collect();
        let mut expected = large.clone();
        expected.sort_unstable();
        dispatcher.sort_u8(&mut large);
        assert_eq!(large, expected);
    }

    #[test]
    fn test_sort_i8_signed_order() {
        let dispatcher = SimdDispatcher::detect();
        let mut data = vec![3i8, -1, 127, -128, 0, -1];
        dispatcher.sort_i8(&mut data);
        assert_eq!(data, vec![-128, -1, -1, 0, 3, 127]);
    }

    #[test]
    fn test_threshold_respected() {
        // A tiny threshold forces the counting path even for short input.
        let config = KernelConfig::default().with_insertion_sort_threshold(2);
        let dispatcher = SimdDispatcher::with_config(config);
        let mut data = vec![9u8, 4, 7, 1];
        dispatcher.sort_u8(&mut data);
        assert_eq!(data, vec![1, 4, 7, 9]);
    }
}
