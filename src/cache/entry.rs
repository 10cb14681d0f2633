//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with refresh TTL and
//! access bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Process-local origin for entry timestamps
static CLOCK_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

// == Cache Entry ==
/// Represents a single cached value with its bookkeeping metadata.
///
/// Access counters are atomics so hits can be recorded while the store is
/// only read-locked.
#[derive(Debug)]
pub struct CacheEntry {
    /// The key this entry is stored under
    pub key: String,
    /// The rendered content
    pub value: String,
    /// Write timestamp (monotonic nanoseconds)
    pub last_updated: u64,
    /// Entry is stale once `now > last_updated + refresh_ttl`
    pub refresh_ttl: Option<Duration>,
    access_count: AtomicU64,
    last_accessed: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `refresh_ttl` - Optional time after which the entry goes stale
    pub fn new(key: String, value: String, refresh_ttl: Option<Duration>) -> Self {
        Self::new_at(key, value, refresh_ttl, current_timestamp_ns())
    }

    pub(crate) fn new_at(
        key: String,
        value: String,
        refresh_ttl: Option<Duration>,
        now: u64,
    ) -> Self {
        Self {
            key,
            value,
            last_updated: now,
            refresh_ttl,
            access_count: AtomicU64::new(0),
            last_accessed: AtomicU64::new(now),
        }
    }

    /// Payload size counted against the store ceiling.
    pub fn size(&self) -> usize {
        self.value.len()
    }

    /// Number of cache hits served by this entry.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    /// Timestamp of the most recent hit, or of the write if never hit.
    pub fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Relaxed)
    }

    // == Touch ==
    /// Records a cache hit.
    pub fn touch(&self, now: u64) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        self.last_accessed.fetch_max(now, Ordering::Relaxed);
    }

    /// Timestamp after which the entry is stale, None if it never goes stale.
    pub fn expires_at(&self) -> Option<u64> {
        self.refresh_ttl
            .map(|ttl| self.last_updated.saturating_add(duration_to_ns(ttl)))
    }

    // == Is Stale ==
    /// Checks whether the refresh TTL has elapsed at `now`.
    ///
    /// The boundary instant itself still counts as fresh.
    pub fn is_stale_at(&self, now: u64) -> bool {
        match self.expires_at() {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns nanoseconds elapsed since the process-local clock origin.
///
/// Monotonic, so entry ordering is unaffected by wall-clock adjustments.
pub fn current_timestamp_ns() -> u64 {
    duration_to_ns(CLOCK_ORIGIN.elapsed())
}

fn duration_to_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
