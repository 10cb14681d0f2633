//! Cache Store Module
//!
//! Main cache engine: a size-accounted table behind a bounded-wait
//! reader/writer lock, with MakeRoom eviction and refresh TTLs.

use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ns;
use crate::cache::eviction::{EvictionCoordinator, EvictionReport, StoreState};
use crate::cache::{CacheEntry, CacheStats, StatsRecorder};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Size-bounded store of rendered content.
///
/// Reads share the lock, mutations take it exclusively. Every lock
/// acquisition waits at most `lock_timeout` and reports
/// [`CacheError::CacheBusy`] instead of blocking indefinitely.
#[derive(Debug)]
pub struct CacheStore {
    /// Entry table and running size
    state: RwLock<StoreState>,
    /// Normalized configuration
    config: CacheConfig,
    /// Present only when the store has a ceiling
    coordinator: Option<EvictionCoordinator>,
    /// Performance statistics
    stats: StatsRecorder,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. Fractions in `config` are clamped to `[0, 1]`.
    pub fn new(config: CacheConfig) -> Self {
        let config = config.normalized();
        Self {
            state: RwLock::new(StoreState::default()),
            coordinator: EvictionCoordinator::from_config(&config),
            config,
            stats: StatsRecorder::default(),
        }
    }

    /// Creates a store with the given ceiling and default tuning.
    pub fn with_max_size(max_size: Option<usize>) -> Self {
        Self::new(CacheConfig::with_max_size(max_size))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .try_read_for(self.config.lock_timeout)
            .ok_or_else(|| self.busy("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .try_write_for(self.config.lock_timeout)
            .ok_or_else(|| self.busy("write"))
    }

    fn busy(&self, access: &str) -> CacheError {
        self.stats.record_busy();
        warn!(
            timeout_ms = self.config.lock_timeout.as_millis() as u64,
            "Timed out waiting for {} access to the cache", access
        );
        CacheError::CacheBusy(format!(
            "no {} access within {:?}",
            access, self.config.lock_timeout
        ))
    }

    // == Try Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` on a miss. A stale entry is removed and reported as
    /// a miss, unless another writer refreshed it in the meantime.
    pub fn try_get(&self, key: &str) -> Result<Option<String>> {
        let now = current_timestamp_ns();
        {
            let state = self.read()?;
            match state.entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return Ok(None);
                }
                Some(entry) if !entry.is_stale_at(now) => {
                    entry.touch(now);
                    self.stats.record_hit();
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        let mut state = self.write()?;
        let now = current_timestamp_ns();
        let fresh = match state.entries.get(key) {
            Some(entry) if !entry.is_stale_at(now) => {
                entry.touch(now);
                Some(entry.value.clone())
            }
            _ => None,
        };

        match fresh {
            Some(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                if state.remove(key).is_some() {
                    self.stats.record_expirations(1);
                    debug!(key, "Dropped stale cache entry");
                }
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous value under the same key.
    ///
    /// A value larger than the ceiling is logged and dropped without error.
    /// Otherwise MakeRoom runs first whenever the insert would overshoot.
    ///
    /// # Arguments
    /// * `key` - Non-empty key
    /// * `value` - The rendered content
    /// * `ttl` - Optional refresh TTL
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = key.into();
        let value = value.into();
        validate_key(&key)?;

        let size = value.len();
        if let Some(max_size) = self.config.max_size {
            if size > max_size {
                warn!(
                    key = %key,
                    size,
                    max_size,
                    "Value exceeds cache ceiling, not caching"
                );
                self.stats.record_oversize_rejection();
                return Ok(());
            }
        }

        let mut state = self.write()?;
        let now = current_timestamp_ns();

        // The replaced value no longer counts against the ceiling
        state.remove(&key);

        if let Some(coordinator) = &self.coordinator {
            if !coordinator.fits(&state, size) {
                let report = coordinator.make_room(&mut state, size, now);
                self.record_report(&report);
            }
        }

        state.insert(CacheEntry::new_at(key, value, ttl, now));
        self.stats.record_insertion();
        Ok(())
    }

    // == Remove ==
    /// Removes an entry by key, returning whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut state = self.write()?;
        Ok(state.remove(key).is_some())
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.write()?;
        let dropped = state.len();
        state.clear();
        info!(dropped, "Cache cleared");
        Ok(())
    }

    // == Get Or Compute ==
    /// Returns the cached value, or produces, stores and returns it.
    ///
    /// Concurrent misses on one key may each run `producer`; the last store
    /// wins. A busy lock while storing the fresh value is not an error, the
    /// value is still returned.
    pub fn get_or_compute<F>(&self, key: &str, producer: F, ttl: Option<Duration>) -> Result<String>
    where
        F: FnOnce() -> String,
    {
        validate_key(key)?;
        if let Some(value) = self.try_get(key)? {
            return Ok(value);
        }

        let value = producer();
        match self.set(key, value.clone(), ttl) {
            Ok(()) => {}
            Err(err) if err.is_retryable() => {
                debug!(key, "Skipped storing computed value: {}", err);
            }
            Err(err) => return Err(err),
        }
        Ok(value)
    }

    // == Make Room ==
    /// Frees space for `requested` more bytes.
    ///
    /// Unbounded stores have nothing to do and return an empty report.
    pub fn make_room(&self, requested: usize) -> Result<EvictionReport> {
        let Some(coordinator) = &self.coordinator else {
            return Ok(EvictionReport {
                requested,
                ..EvictionReport::default()
            });
        };

        let mut state = self.write()?;
        let report = coordinator.make_room(&mut state, requested, current_timestamp_ns());
        self.record_report(&report);
        Ok(report)
    }

    fn record_report(&self, report: &EvictionReport) {
        self.stats.record_make_room();
        self.stats.record_evictions(report.evicted() as u64);
        self.stats.record_expirations(report.expired as u64);
    }

    // == Cleanup Expired ==
    /// Removes all stale entries, returning how many were removed.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let mut state = self.write()?;
        let removed = state.expire(current_timestamp_ns());
        self.stats.record_expirations(removed as u64);
        Ok(removed)
    }

    // == Contains Key ==
    /// Checks for an entry without staleness handling or access bookkeeping.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.read()?.entries.contains_key(key))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> Result<CacheStats> {
        let state = self.read()?;
        let mut stats = self.stats.snapshot();
        stats.total_entries = state.len();
        stats.current_size = state.current_size();
        stats.max_size = self.config.max_size;
        Ok(stats)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Payload bytes currently held.
    pub fn current_size(&self) -> Result<usize> {
        Ok(self.read()?.current_size())
    }

    /// Configured ceiling, None = unbounded.
    pub fn max_size(&self) -> Option<usize> {
        self.config.max_size
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Holds exclusive access, for exercising lock timeouts.
    #[cfg(test)]
    pub(crate) fn lock_exclusive(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write()
    }

    /// Sums entry sizes from scratch, for checking the running counter.
    #[cfg(test)]
    pub(crate) fn recount_size(&self) -> usize {
        self.state
            .read()
            .entries
            .values()
            .map(CacheEntry::size)
            .sum()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "cache key cannot be empty".to_string(),
        ));
    }
    Ok(())
}
