//! Cache Module
//!
//! Provides a size-bounded in-memory store with refresh TTLs and
//! multi-phase MakeRoom eviction.

mod entry;
mod eviction;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ns, CacheEntry};
pub use eviction::{EvictionCoordinator, EvictionReport, StoreState};
pub use stats::{CacheStats, StatsRecorder};
pub use store::CacheStore;
