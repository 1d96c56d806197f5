//! Caching layer for derived registry views
//!
//! Registries cache what they compute from their catalog (sorted choices,
//! item lists, hierarchy maps) in a [`CacheBackend`]. The catalog is always
//! the source of truth; any write to a registry deletes its keys.
//!
//! Features:
//! - TTL (time-to-live) support
//! - Bounded size with expired-first eviction
//! - Statistics tracking
//!
//! Keys are namespaced per registry instance: `stratagem:<registry>#<id>:<view>`.
//! The id keeps two registries with the same name apart in a shared backend.

mod memory;

pub use memory::{CacheStats, MemoryCache, MemoryCacheConfig};

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::signals::RegistryId;

/// Default TTL for cached views (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Prefix shared by every key the library writes
pub const KEY_PREFIX: &str = "stratagem";

/// Cached value; registries downcast to the concrete view type
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// Storage for cached registry views
///
/// Backends may fail; registries log the failure and recompute from the
/// catalog instead of propagating it.
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Fetch a live entry
    fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Store an entry for `ttl`
    fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()>;

    /// Remove the given keys; missing keys are ignored
    fn delete_many(&self, keys: &[String]) -> Result<()>;

    /// Remove every entry
    fn clear(&self) -> Result<()>;
}

/// Backend that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl CacheBackend for NullCache {
    fn get(&self, _key: &str) -> Result<Option<CacheValue>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    fn delete_many(&self, _keys: &[String]) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the cache key for one view of one registry
pub fn cache_key(registry: &str, id: RegistryId, view: &str) -> String {
    format!("{}:{}{}:{}", KEY_PREFIX, registry, id, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let id = RegistryId::next();
        assert_eq!(
            cache_key("Notifiers", id, "choices"),
            format!("stratagem:Notifiers#{}:choices", id.as_u64())
        );
        assert_ne!(cache_key("Notifiers", id, "choices"), cache_key("Notifiers", RegistryId::next(), "choices"));
    }

    #[test]
    fn test_null_cache_never_hits() {
        let cache = NullCache;
        cache.set("k", Arc::new(1u32), DEFAULT_CACHE_TTL).unwrap();
        assert!(cache.get("k").unwrap().is_none());
        cache.delete_many(&["k".to_string()]).unwrap();
        cache.clear().unwrap();
    }

    #[test]
    fn test_backends_are_object_safe() {
        let backends: Vec<Arc<dyn CacheBackend>> = vec![Arc::new(NullCache), Arc::new(MemoryCache::new())];

        for backend in backends {
            backend.set("k", Arc::new("v".to_string()), DEFAULT_CACHE_TTL).unwrap();
            backend.clear().unwrap();
            assert!(backend.get("k").unwrap().is_none());
        }
    }
}
