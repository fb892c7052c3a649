//! Configuration types for the lanekit kernel library.
//!
//! This module provides configuration structs for controlling SIMD tier
//! selection and the tuning knobs of the hybrid sort.

use serde::{Deserialize, Serialize};

/// Default element count below which the hybrid sort uses insertion sort.
///
/// Counting sort is O(N + 256) but pays a fixed two-pass, 256-counter
/// overhead; empirically insertion sort wins below roughly 500 elements.
pub const DEFAULT_INSERTION_SORT_THRESHOLD: usize = 500;

/// Configuration for the kernel dispatcher.
///
/// Controls SIMD tier selection and the insertion/counting sort crossover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// SIMD instruction set configuration.
    ///
    /// Controls which SIMD tiers are eligible for selection.
    pub simd_config: SimdConfig,

    /// Element count below which the byte sort uses insertion sort
    /// instead of counting sort.
    ///
    /// Default: 500 elements
    pub insertion_sort_threshold: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            simd_config: SimdConfig::default(),
            insertion_sort_threshold: DEFAULT_INSERTION_SORT_THRESHOLD,
        }
    }
}

impl KernelConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SIMD configuration.
    pub fn with_simd_config(mut self, config: SimdConfig) -> Self {
        self.simd_config = config;
        self
    }

    /// Set the insertion/counting sort crossover threshold.
    pub fn with_insertion_sort_threshold(mut self, threshold: usize) -> Self {
        self.insertion_sort_threshold = threshold;
        self
    }
}

/// SIMD instruction set configuration.
///
/// Controls which SIMD tiers are eligible for hardware acceleration. The
/// library detects available CPU features at runtime and selects the widest
/// enabled tier. Tier selection happens once per dispatcher, never per call
/// or per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimdConfig {
    /// Enable the 256-bit AVX2 tier (x86_64 only).
    ///
    /// AVX2 provides 256-bit wide vector operations and is widely supported
    /// on modern x86_64 CPUs (Intel Haswell+, AMD Excavator+).
    ///
    /// Default: true
    pub enable_avx2: bool,

    /// Enable the 128-bit SSE4.2 tier (x86_64 only).
    ///
    /// SSE4.2 provides 128-bit wide vector operations including the 64-bit
    /// compare primitives the reduction kernels need; it is the fallback
    /// tier on x86_64 CPUs without AVX2.
    ///
    /// Default: true
    pub enable_sse42: bool,

    /// Enable the 128-bit NEON tier (ARM64 only).
    ///
    /// NEON provides 128-bit wide vector operations and is standard on
    /// ARM64 CPUs (Apple Silicon, AWS Graviton, etc.).
    ///
    /// Default: true
    pub enable_neon: bool,
}

impl Default for SimdConfig {
    fn default() -> Self {
        Self {
            enable_avx2: true,
            enable_sse42: true,
            enable_neon: true,
        }
    }
}

impl SimdConfig {
    /// Create a new SIMD configuration with all tiers enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration with all SIMD tiers disabled.
    ///
    /// This forces the library to use scalar implementations, which is
    /// useful for debugging and for cross-tier equivalence testing.
    pub fn disabled() -> Self {
        Self {
            enable_avx2: false,
            enable_sse42: false,
            enable_neon: false,
        }
    }

    /// Enable or disable the AVX2 tier.
    pub fn with_avx2(mut self, enable: bool) -> Self {
        self.enable_avx2 = enable;
        self
    }

    /// Enable or disable the SSE4.2 tier.
    pub fn with_sse42(mut self, enable: bool) -> Self {
        self.enable_sse42 = enable;
        self
    }

    /// Enable or disable the NEON tier.
    pub fn with_neon(mut self, enable: bool) -> Self {
        self.enable_neon = enable;
        self
    }

    /// Check if any SIMD tier is enabled.
    pub fn is_any_enabled(&self) -> bool {
        self.enable_avx2 || self.enable_sse42 || self.enable_neon
    }
}
