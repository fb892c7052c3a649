//! Kernel statistics tracking.
//!
//! This module provides thread-safe statistics tracking for kernel
//! invocations using atomic counters. Statistics include bytes scanned and
//! per-operation-family call counts.
//!
//! All counters use `Ordering::Relaxed`: they are independent and only need
//! eventual consistency, never synchronization with other memory operations.
//! For a consistent point-in-time view use [`KernelStats::snapshot`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Thread-safe kernel invocation statistics.
///
/// Uses atomic operations for all counters so a single instance can be
/// shared (via `Arc`) between threads that run kernels concurrently on
/// disjoint buffers.
///
/// # Example
///
/// ```
/// use lanekit::KernelStats;
///
/// let stats = KernelStats::new();
/// stats.record_reduction(1024);
/// stats.record_sort(500);
///
/// let snapshot = stats.snapshot();
/// assert_eq!(snapshot.bytes_scanned, 1524);
/// assert_eq!(snapshot.reductions, 1);
/// assert_eq!(snapshot.sorts, 1);
/// ```
#[derive(Debug, Default)]
pub struct KernelStats {
    /// Total bytes read or written by kernels.
    bytes_scanned: AtomicU64,
    /// Number of reduction kernel calls (min/max/popcount).
    reductions: AtomicUsize,
    /// Number of comparison kernel calls (equality, sortedness).
    comparisons: AtomicUsize,
    /// Number of reversal kernel calls.
    reversals: AtomicUsize,
    /// Number of sort kernel calls.
    sorts: AtomicUsize,
}

impl KernelStats {
    /// Create a new statistics tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reduction kernel call over `bytes` input bytes.
    pub fn record_reduction(&self, bytes: u64) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        self.reductions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a comparison kernel call over `bytes` input bytes.
    pub fn record_comparison(&self, bytes: u64) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        self.comparisons.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reversal kernel call over `bytes` input bytes.
    pub fn record_reversal(&self, bytes: u64) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        self.reversals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sort kernel call over `bytes` input bytes.
    pub fn record_sort(&self, bytes: u64) {
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        self.sorts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bytes scanned by all recorded kernel calls.
    pub fn bytes_scanned(&self) -> u64 {
        self.bytes_scanned.load(Ordering::Relaxed)
    }

    /// Total number of recorded kernel calls across all families.
    pub fn total_calls(&self) -> usize {
        self.reductions.load(Ordering::Relaxed)
            + self.comparisons.load(Ordering::Relaxed)
            + self.reversals.load(Ordering::Relaxed)
            + self.sorts.load(Ordering::Relaxed)
    }

    /// Create a point-in-time copy of all counters.
    ///
    /// The snapshot may interleave with concurrent updates; each individual
    /// counter value is still valid.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            reductions: self.reductions.load(Ordering::Relaxed),
            comparisons: self.comparisons.load(Ordering::Relaxed),
            reversals: self.reversals.load(Ordering::Relaxed),
            sorts: self.sorts.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.bytes_scanned.store(0, Ordering::Relaxed);
        self.reductions.store(0, Ordering::Relaxed);
        self.comparisons.store(0, Ordering::Relaxed);
        self.reversals.store(0, Ordering::Relaxed);
        self.sorts.store(0, Ordering::Relaxed);
    }
}

/// Immutable point-in-time copy of [`KernelStats`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Total bytes read or written by kernels.
    pub bytes_scanned: u64,
    /// Number of reduction kernel calls.
    pub reductions: usize,
    /// Number of comparison kernel calls.
    pub comparisons: usize,
    /// Number of reversal kernel calls.
    pub reversals: usize,
    /// Number of sort kernel calls.
    pub sorts: usize,
}

impl StatsSnapshot {
    /// Total number of kernel calls across all families.
    pub fn total_calls(&self) -> usize {
        self.reductions + self.comparisons + self.reversals + self.sorts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = KernelStats::new();
        assert_eq!(stats.bytes_scanned(), 0);
        assert_eq!(stats.total_calls(), 0);
    }

    #[test]
    fn test_record_and_snapshot() {
        let stats = KernelStats::new();
        stats.record_reduction(100);
        stats.record_reduction(50);
        stats.record_comparison(20);
        stats.record_reversal(30);
        stats.record_sort(40);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.bytes_scanned, 240);
        assert_eq!(snapshot.reductions, 2);
        assert_eq!(snapshot.comparisons, 1);
        assert_eq!(snapshot.reversals, 1);
        assert_eq!(snapshot.sorts, 1);
        assert_eq!(snapshot.total_calls(), 5);
    }

    #[test]
    fn test_reset() {
        let stats = KernelStats::new();
        stats.record_sort(1000);
        stats.reset();
        assert_eq!(stats.bytes_scanned(), 0);
        assert_eq!(stats.total_calls(), 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = KernelStats::new();
        stats.record_comparison(8);
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(json.contains("\"bytes_scanned\":8"));
        assert!(json.contains("\"comparisons\":1"));
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(KernelStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_reduction(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.bytes_scanned(), 400);
        assert_eq!(stats.snapshot().reductions, 400);
    }
}
