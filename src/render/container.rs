//! Container Module
//!
//! Range caching for nodes with children. A container caches its head markup
//! under `{key}/pre`, then walks its children and caches every maximal run of
//! fully cacheable siblings as one entry:
//!
//! - a single-child run under `{key}/{i}`, even when that child is itself a
//!   fully cacheable container
//! - a longer run as one merged blob under `{key}/{first}-{last}`
//!
//! Children that are not fully cacheable are rendered in place, so their own
//! cacheable descendants still get range cached one level down. The tail markup
//! is appended literally.

use std::fmt;
use std::time::Duration;

use crate::render::node::min_ttl;
use crate::render::{CachingMode, Content, RenderContext};

// == Element ==
/// Container node: head markup, ordered children, tail markup.
pub struct Element {
    head: String,
    tail: String,
    children: Vec<Box<dyn Content>>,
    mode: CachingMode,
    ttl: Option<Duration>,
}

impl Element {
    /// Creates `<tag>...</tag>`.
    pub fn new(tag: &str) -> Self {
        Self::with_markup(format!("<{}>", tag), format!("</{}>", tag))
    }

    /// Creates a container with arbitrary opening and closing markup.
    pub fn with_markup(head: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
            children: Vec::new(),
            mode: CachingMode::Inherit,
            ttl: None,
        }
    }

    /// Creates a container with no markup of its own.
    pub fn fragment() -> Self {
        Self::with_markup(String::new(), String::new())
    }

    pub fn child(mut self, child: impl Content + 'static) -> Self {
        self.push(child);
        self
    }

    pub fn push(&mut self, child: impl Content + 'static) {
        self.children.push(Box::new(child));
    }

    pub fn with_mode(mut self, mode: CachingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Appends the run `[first, end)` of fully cacheable children.
    ///
    /// The entry expires with the shortest TTL among the container and the
    /// children it holds.
    fn flush_run(
        &self,
        ctx: &RenderContext<'_>,
        key: &str,
        first: usize,
        end: usize,
        sink: &mut String,
    ) {
        if end <= first {
            return;
        }

        let run = &self.children[first..end];
        let ttl = run
            .iter()
            .fold(self.ttl, |ttl, child| min_ttl(ttl, child.refresh_ttl()));
        let producer = || {
            run.iter()
                .map(|child| child.render(ctx))
                .collect::<String>()
        };
        let entry_key = match end - first {
            1 => child_key(key, first),
            _ => run_key(key, first, end - 1),
        };
        sink.push_str(&ctx.cached(&entry_key, &producer, ttl));
    }
}

fn child_key(key: &str, index: usize) -> String {
    format!("{}/{}", key, index)
}

fn run_key(key: &str, first: usize, last: usize) -> String {
    format!("{}/{}-{}", key, first, last)
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("children", &self.children.len())
            .field("mode", &self.mode)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Content for Element {
    fn own_mode(&self) -> CachingMode {
        self.mode
    }

    fn refresh_ttl(&self) -> Option<Duration> {
        self.children
            .iter()
            .fold(self.ttl, |ttl, child| min_ttl(ttl, child.refresh_ttl()))
    }

    fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = self.head.clone();
        for child in &self.children {
            out.push_str(&child.render(ctx));
        }
        out.push_str(&self.tail);
        out
    }

    fn is_cacheable(
        &self,
        ctx: &RenderContext<'_>,
        key: &str,
        inherited: CachingMode,
        sink: Option<&mut String>,
    ) -> bool {
        let effective = self.mode.resolve(inherited);

        let Some(sink) = sink else {
            return effective.is_cacheable()
                && self
                    .children
                    .iter()
                    .enumerate()
                    .all(|(i, child)| child.is_cacheable(ctx, &child_key(key, i), effective, None));
        };

        if !self.head.is_empty() {
            let head = || self.head.clone();
            sink.push_str(&ctx.cached(&format!("{}/pre", key), &head, self.ttl));
        }

        let mut fully_static = effective.is_cacheable();
        let mut first_run = 0;
        for (i, child) in self.children.iter().enumerate() {
            let key_i = child_key(key, i);
            if child.is_cacheable(ctx, &key_i, effective, None) {
                continue;
            }

            fully_static = false;
            self.flush_run(ctx, key, first_run, i, sink);
            child.is_cacheable(ctx, &key_i, effective, Some(&mut *sink));
            first_run = i + 1;
        }
        self.flush_run(ctx, key, first_run, self.children.len(), sink);

        sink.push_str(&self.tail);
        fully_static
    }
}
