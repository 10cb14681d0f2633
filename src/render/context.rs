//! Render Context Module
//!
//! Carries the store handle and the process default caching mode through a render.

use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::render::{CachingMode, Content};

// == Render Context ==
/// Per-render handle to the cache.
///
/// Store failures never fail a render: a busy or rejecting store degrades to
/// rendering the content directly.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    cache: &'a CacheStore,
    default_mode: CachingMode,
}

impl<'a> RenderContext<'a> {
    /// Creates a context. An `Inherit` default has nothing to inherit from and
    /// is treated as `NotCacheable`.
    pub fn new(cache: &'a CacheStore, default_mode: CachingMode) -> Self {
        let default_mode = match default_mode {
            CachingMode::Inherit => {
                debug!("Inherit is not a valid root default, rendering uncached");
                CachingMode::NotCacheable
            }
            explicit => explicit,
        };
        Self {
            cache,
            default_mode,
        }
    }

    pub fn default_mode(&self) -> CachingMode {
        self.default_mode
    }

    // == Render Root ==
    /// Renders a whole tree rooted at `node` under `key`.
    pub fn render_root(&self, node: &dyn Content, key: &str) -> String {
        let mut out = String::new();
        node.is_cacheable(self, key, self.default_mode, Some(&mut out));
        out
    }

    // == Cached ==
    /// Serves `key` from the store, producing and storing it on a miss.
    pub fn cached(&self, key: &str, producer: &dyn Fn() -> String, ttl: Option<Duration>) -> String {
        match self.cache.get_or_compute(key, producer, ttl) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, "Cache unavailable, rendering directly: {}", err);
                producer()
            }
        }
    }
}
