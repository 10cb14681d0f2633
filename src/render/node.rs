//! Content Node Module
//!
//! The render contract shared by every node, plus the leaf node kinds.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::render::{CachingMode, RenderContext};

// == Content ==
/// A node in a renderable content tree.
pub trait Content: Send + Sync {
    /// The node's own caching mode before inheritance.
    fn own_mode(&self) -> CachingMode {
        CachingMode::Inherit
    }

    /// Refresh TTL applied to cache entries holding this node's output.
    fn refresh_ttl(&self) -> Option<Duration> {
        None
    }

    /// Renders the node to a string without consulting the cache.
    ///
    /// Must return identical output for repeated calls within one request.
    fn render(&self, ctx: &RenderContext<'_>) -> String;

    // == Is Cacheable ==
    /// Reports whether the whole subtree under this node is cacheable.
    ///
    /// With a `sink`, also appends the node's output: from the cache under
    /// `key` when the effective mode is `Cacheable`, freshly rendered otherwise.
    fn is_cacheable(
        &self,
        ctx: &RenderContext<'_>,
        key: &str,
        inherited: CachingMode,
        sink: Option<&mut String>,
    ) -> bool {
        let effective = self.own_mode().resolve(inherited);
        if let Some(sink) = sink {
            if effective.is_cacheable() {
                sink.push_str(&ctx.cached(key, &|| self.render(ctx), self.refresh_ttl()));
            } else {
                sink.push_str(&self.render(ctx));
            }
        }
        effective.is_cacheable()
    }
}

/// Shorter of two optional TTLs; None means no expiry.
pub(crate) fn min_ttl(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

// == Text ==
/// Literal markup; inherits its caching mode.
#[derive(Debug, Clone)]
pub struct Text {
    content: String,
    mode: CachingMode,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: CachingMode::Inherit,
        }
    }

    pub fn with_mode(mut self, mode: CachingMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Content for Text {
    fn own_mode(&self) -> CachingMode {
        self.mode
    }

    fn render(&self, _ctx: &RenderContext<'_>) -> String {
        self.content.clone()
    }
}

// == Dynamic ==
type Producer = Arc<dyn Fn() -> String + Send + Sync>;

/// Content produced by a closure on every render.
///
/// Not cacheable unless a mode is set explicitly.
#[derive(Clone)]
pub struct Dynamic {
    producer: Producer,
    mode: CachingMode,
    ttl: Option<Duration>,
}

impl Dynamic {
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
            mode: CachingMode::NotCacheable,
            ttl: None,
        }
    }

    pub fn with_mode(mut self, mode: CachingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Caches the output as `Cacheable` content refreshed every `ttl`.
    pub fn refreshed_every(mut self, ttl: Duration) -> Self {
        self.mode = CachingMode::Cacheable;
        self.ttl = Some(ttl);
        self
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("mode", &self.mode)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Content for Dynamic {
    fn own_mode(&self) -> CachingMode {
        self.mode
    }

    fn refresh_ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn render(&self, _ctx: &RenderContext<'_>) -> String {
        (self.producer)()
    }
}
