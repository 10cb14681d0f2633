//! Render Module
//!
//! Content trees rendered through the cache with hierarchical range caching.

mod container;
mod context;
mod mode;
mod node;

pub use container::Element;
pub use context::RenderContext;
pub use mode::CachingMode;
pub use node::{Content, Dynamic, Text};
