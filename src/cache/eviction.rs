//! Eviction Module
//!
//! Implements the multi-phase MakeRoom pass that frees space in a store.
//!
//! Phases, in order:
//! 1. Expire every entry whose refresh TTL elapsed.
//! 2. Classify a snapshot into three sorted views (recency, frequency, size)
//!    built concurrently, and derive the "hot" protection thresholds.
//! 3. Size pass over the largest entries, skipping hot ones.
//! 4. Recency/frequency pass over the coldest entries, skipping hot ones.
//! 5. TTL-proximity pass over entries closest to going stale.
//! 6. Forced pass ignoring hotness, so a request that fits the ceiling always
//!    gets its room.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info};

use crate::cache::CacheEntry;
use crate::config::CacheConfig;

// == Store State ==
/// The mutable table guarded by the store lock.
///
/// `current_size` always equals the summed payload size of `entries` once a
/// method returns.
#[derive(Debug, Default)]
pub struct StoreState {
    pub(crate) entries: HashMap<String, CacheEntry>,
    pub(crate) current_size: usize,
}

impl StoreState {
    /// Inserts an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.current_size += entry.size();
        let previous = self.entries.insert(entry.key.clone(), entry);
        if let Some(old) = &previous {
            self.current_size -= old.size();
        }
        previous
    }

    /// Removes an entry by key, releasing its size.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if let Some(entry) = &removed {
            self.current_size -= entry.size();
        }
        removed
    }

    /// Empties the table.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Removes every entry stale at `now`, returning the removed count.
    pub fn expire(&mut self, now: u64) -> usize {
        let stale: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_stale_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &stale {
            self.remove(key);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn current_size(&self) -> usize {
        self.current_size
    }
}

// == Eviction Report ==
/// Outcome of one MakeRoom pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Bytes the caller asked to make room for
    pub requested: usize,
    /// Entries dropped because their TTL elapsed
    pub expired: usize,
    /// Entries removed by the size pass
    pub size_pass: usize,
    /// Entries removed by the recency/frequency pass
    pub cold_pass: usize,
    /// Entries removed by the TTL-proximity pass
    pub ttl_pass: usize,
    /// Entries removed regardless of hotness
    pub forced_pass: usize,
    /// Payload bytes released by all phases
    pub bytes_freed: usize,
}

impl EvictionReport {
    /// Entries removed to make room, not counting expirations.
    pub fn evicted(&self) -> usize {
        self.size_pass + self.cold_pass + self.ttl_pass + self.forced_pass
    }
}

// == Candidate ==
/// Immutable copy of the fields the sort workers need.
#[derive(Debug, Clone)]
struct Candidate {
    key: String,
    size: usize,
    access_count: u64,
    last_accessed: u64,
    expires_at: Option<u64>,
}

impl Candidate {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            size: entry.size(),
            access_count: entry.access_count(),
            last_accessed: entry.last_accessed(),
            expires_at: entry.expires_at(),
        }
    }
}

/// Sorted index views over a candidate snapshot.
struct SortedViews {
    by_date: Vec<usize>,
    by_count: Vec<usize>,
    by_size: Vec<usize>,
}

impl SortedViews {
    /// Builds the three views with a fork-join, joined before returning.
    fn build(candidates: &[Candidate]) -> Self {
        let ((by_date, by_count), by_size) = rayon::join(
            || {
                rayon::join(
                    || sorted_indices(candidates, coldest_by_date),
                    || sorted_indices(candidates, coldest_by_count),
                )
            },
            || sorted_indices(candidates, largest_first),
        );

        Self {
            by_date,
            by_count,
            by_size,
        }
    }
}

fn sorted_indices(
    candidates: &[Candidate],
    order: fn(&Candidate, &Candidate) -> Ordering,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..candidates.len()).collect();
    indices.sort_unstable_by(|&a, &b| order(&candidates[a], &candidates[b]));
    indices
}

fn coldest_by_date(a: &Candidate, b: &Candidate) -> Ordering {
    a.last_accessed
        .cmp(&b.last_accessed)
        .then(a.access_count.cmp(&b.access_count))
        .then_with(|| a.key.cmp(&b.key))
}

fn coldest_by_count(a: &Candidate, b: &Candidate) -> Ordering {
    a.access_count
        .cmp(&b.access_count)
        .then(a.last_accessed.cmp(&b.last_accessed))
        .then_with(|| a.key.cmp(&b.key))
}

fn largest_first(a: &Candidate, b: &Candidate) -> Ordering {
    b.size
        .cmp(&a.size)
        .then(a.last_accessed.cmp(&b.last_accessed))
        .then_with(|| a.key.cmp(&b.key))
}

/// Number of items covered by `fraction` of `len`, rounded up.
fn fraction_len(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).ceil() as usize).min(len)
}

// == Hot Thresholds ==
/// Protection thresholds derived from the recency and frequency views.
#[derive(Debug, Clone, Copy)]
struct HotThresholds {
    date: Option<u64>,
    count: Option<u64>,
}

impl HotThresholds {
    fn derive(
        candidates: &[Candidate],
        views: &SortedViews,
        p_date: f64,
        p_count: f64,
    ) -> Self {
        Self {
            date: percentile(&views.by_date, p_date, |i| candidates[i].last_accessed),
            count: percentile(&views.by_count, p_count, |i| candidates[i].access_count),
        }
    }

    /// An entry is hot when it clears both the recency and the frequency bar.
    fn is_hot(&self, candidate: &Candidate) -> bool {
        match (self.date, self.count) {
            (Some(date), Some(count)) => {
                candidate.access_count >= count && candidate.last_accessed >= date
            }
            _ => false,
        }
    }
}

/// Value at the `(1 - protected)` percentile of an ascending view.
///
/// None when the protected fraction covers no entries.
fn percentile(view: &[usize], protected: f64, value: impl Fn(usize) -> u64) -> Option<u64> {
    let covered = fraction_len(view.len(), protected);
    if covered == 0 {
        return None;
    }
    Some(value(view[view.len() - covered]))
}

// == Eviction Coordinator ==
/// Frees space in a bounded store.
#[derive(Debug, Clone)]
pub struct EvictionCoordinator {
    max_size: usize,
    additional_free_space: usize,
    p_date: f64,
    p_count: f64,
    p_size_remove: f64,
    p_time_remove: f64,
}

impl EvictionCoordinator {
    /// Builds a coordinator for a bounded config, None when the store is unbounded.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        let config = config.clone().normalized();
        config.max_size.map(|max_size| Self {
            max_size,
            additional_free_space: config.additional_free_space,
            p_date: config.p_date,
            p_count: config.p_count,
            p_size_remove: config.p_size_remove,
            p_time_remove: config.p_time_remove,
        })
    }

    /// Whether `requested` more bytes fit under the ceiling.
    pub fn fits(&self, state: &StoreState, requested: usize) -> bool {
        self.within(state, requested, 0)
    }

    fn within(&self, state: &StoreState, requested: usize, margin: usize) -> bool {
        state
            .current_size
            .saturating_add(requested)
            .saturating_add(margin)
            <= self.max_size
    }

    // == Make Room ==
    /// Runs every phase needed to fit `requested` more bytes.
    ///
    /// Never fails. When `requested <= max_size` the store is guaranteed to
    /// satisfy `current_size + requested <= max_size` on return.
    pub fn make_room(&self, state: &mut StoreState, requested: usize, now: u64) -> EvictionReport {
        let size_before = state.current_size;
        let mut report = EvictionReport {
            requested,
            ..EvictionReport::default()
        };
        let margin = self.additional_free_space;

        report.expired = state.expire(now);

        if !self.within(state, requested, margin) {
            let candidates: Vec<Candidate> =
                state.entries.values().map(Candidate::from_entry).collect();
            let views = SortedViews::build(&candidates);
            let hot = HotThresholds::derive(&candidates, &views, self.p_date, self.p_count);

            report.size_pass = self.size_pass(state, &candidates, &views, &hot, requested);
            report.cold_pass = self.cold_pass(state, &candidates, &views, &hot, requested);
            report.ttl_pass = self.ttl_pass(state, &candidates, requested);
            report.forced_pass = self.forced_pass(state, &candidates, &views, requested);
        }

        report.bytes_freed = size_before - state.current_size;

        if report.expired > 0 || report.evicted() > 0 {
            info!(
                requested,
                expired = report.expired,
                size_pass = report.size_pass,
                cold_pass = report.cold_pass,
                ttl_pass = report.ttl_pass,
                forced_pass = report.forced_pass,
                bytes_freed = report.bytes_freed,
                current_size = state.current_size,
                "MakeRoom completed"
            );
        }

        report
    }

    /// Largest-first removal of non-hot entries until the request fits.
    fn size_pass(
        &self,
        state: &mut StoreState,
        candidates: &[Candidate],
        views: &SortedViews,
        hot: &HotThresholds,
        requested: usize,
    ) -> usize {
        let mut removed = 0;
        let considered = fraction_len(views.by_size.len(), self.p_size_remove);

        for &idx in views.by_size.iter().take(considered) {
            if self.fits(state, requested) {
                break;
            }
            let candidate = &candidates[idx];
            if hot.is_hot(candidate) {
                continue;
            }
            if evict(state, candidate, "size") {
                removed += 1;
            }
        }
        removed
    }

    /// Lockstep walk over the coldest-by-date and coldest-by-count views.
    fn cold_pass(
        &self,
        state: &mut StoreState,
        candidates: &[Candidate],
        views: &SortedViews,
        hot: &HotThresholds,
        requested: usize,
    ) -> usize {
        let margin = self.additional_free_space;
        let mut removed = 0;

        for (&by_date, &by_count) in views.by_date.iter().zip(&views.by_count) {
            for idx in [by_date, by_count] {
                if self.within(state, requested, margin) {
                    return removed;
                }
                let candidate = &candidates[idx];
                if hot.is_hot(candidate) {
                    continue;
                }
                if evict(state, candidate, "cold") {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Removes the entries closest to going stale anyway.
    fn ttl_pass(&self, state: &mut StoreState, candidates: &[Candidate], requested: usize) -> usize {
        let margin = self.additional_free_space;
        if self.within(state, requested, margin) {
            return 0;
        }

        let mut expiring: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| candidate.expires_at.is_some())
            .collect();
        expiring.sort_unstable_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut removed = 0;
        let considered = fraction_len(expiring.len(), self.p_time_remove);
        for candidate in expiring.into_iter().take(considered) {
            if self.within(state, requested, margin) {
                break;
            }
            if evict(state, candidate, "ttl") {
                removed += 1;
            }
        }
        removed
    }

    /// Removes coldest entries regardless of hotness until the request fits.
    fn forced_pass(
        &self,
        state: &mut StoreState,
        candidates: &[Candidate],
        views: &SortedViews,
        requested: usize,
    ) -> usize {
        let mut removed = 0;

        for (&by_date, &by_count) in views.by_date.iter().zip(&views.by_count) {
            for idx in [by_date, by_count] {
                if self.fits(state, requested) {
                    return removed;
                }
                if evict(state, &candidates[idx], "forced") {
                    removed += 1;
                }
            }
        }
        removed
    }
}

/// Removes a candidate if an earlier phase has not already done so.
fn evict(state: &mut StoreState, candidate: &Candidate, phase: &'static str) -> bool {
    match state.remove(&candidate.key) {
        Some(entry) => {
            debug!(key = %entry.key, size = entry.size(), phase, "evicted cache entry");
            true
        }
        None => false,
    }
}
