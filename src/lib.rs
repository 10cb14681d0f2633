//! Render Cache - adaptive response cache for rendered HTML fragments
//!
//! Provides a size-bounded store with multi-phase eviction and hierarchical
//! range caching for content trees that mix static and dynamic children.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, CacheStore, EvictionReport};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use render::{CachingMode, Content, Dynamic, Element, RenderContext, Text};
pub use tasks::spawn_cleanup_task;
