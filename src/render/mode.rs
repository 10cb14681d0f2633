//! Caching Mode Module
//!
//! Tri-state caching flag attached to content nodes.

use serde::{Deserialize, Serialize};

// == Caching Mode ==
/// Whether a node's rendered output may be served from the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachingMode {
    /// Output is deterministic and may be cached
    Cacheable,
    /// Output changes per request and must be rendered fresh
    NotCacheable,
    /// Use whatever the enclosing node resolved to
    #[default]
    Inherit,
}

impl CachingMode {
    // == Resolve ==
    /// Effective mode of a node: its own mode if explicit, otherwise the inherited one.
    pub fn resolve(self, inherited: CachingMode) -> CachingMode {
        match self {
            CachingMode::Inherit => inherited,
            explicit => explicit,
        }
    }

    /// True only for an explicit `Cacheable`; an unresolved `Inherit` counts as not cacheable.
    pub fn is_cacheable(self) -> bool {
        self == CachingMode::Cacheable
    }
}

impl From<bool> for CachingMode {
    fn from(cacheable: bool) -> Self {
        if cacheable {
            CachingMode::Cacheable
        } else {
            CachingMode::NotCacheable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_mode_wins() {
        assert_eq!(
            CachingMode::Cacheable.resolve(CachingMode::NotCacheable),
            CachingMode::Cacheable
        );
        assert_eq!(
            CachingMode::NotCacheable.resolve(CachingMode::Cacheable),
            CachingMode::NotCacheable
        );
    }

    #[test]
    fn test_inherit_takes_callers_mode() {
        assert_eq!(
            CachingMode::Inherit.resolve(CachingMode::Cacheable),
            CachingMode::Cacheable
        );
        assert_eq!(
            CachingMode::Inherit.resolve(CachingMode::NotCacheable),
            CachingMode::NotCacheable
        );
    }

    #[test]
    fn test_unresolved_inherit_is_not_cacheable() {
        assert!(!CachingMode::Inherit.resolve(CachingMode::Inherit).is_cacheable());
        assert!(CachingMode::from(true).is_cacheable());
        assert!(!CachingMode::from(false).is_cacheable());
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&CachingMode::NotCacheable).unwrap();
        assert_eq!(json, "\"not_cacheable\"");
        let mode: CachingMode = serde_json::from_str("\"cacheable\"").unwrap();
        assert_eq!(mode, CachingMode::Cacheable);
    }
}
