//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Recorder ==
/// Lock-free counters updated by the store.
///
/// Hits are recorded while holding only a read lock, so every counter is atomic.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    oversize_rejections: AtomicU64,
    busy_timeouts: AtomicU64,
    make_room_runs: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_oversize_rejection(&self) {
        self.oversize_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy(&self) {
        self.busy_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_make_room(&self) {
        self.make_room_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds a snapshot; size fields are filled in by the store.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            oversize_rejections: self.oversize_rejections.load(Ordering::Relaxed),
            busy_timeouts: self.busy_timeouts.load(Ordering::Relaxed),
            make_room_runs: self.make_room_runs.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or stale)
    pub misses: u64,
    /// Number of stored values
    pub insertions: u64,
    /// Number of entries removed to make room
    pub evictions: u64,
    /// Number of entries removed because their refresh TTL elapsed
    pub expirations: u64,
    /// Number of values too large to ever fit
    pub oversize_rejections: u64,
    /// Number of lock acquisitions that timed out
    pub busy_timeouts: u64,
    /// Number of MakeRoom passes
    pub make_room_runs: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current payload bytes held
    pub current_size: usize,
    /// Configured ceiling, None = unbounded
    pub max_size: Option<usize>,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total cache lookups served.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}
