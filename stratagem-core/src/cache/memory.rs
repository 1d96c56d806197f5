//! In-process TTL cache
//!
//! The default backend. Entries expire after their TTL; when the cache is
//! full, expired entries go first, then the oldest.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::{CacheBackend, CacheValue, DEFAULT_CACHE_TTL};
use crate::error::Result;

/// Configuration for the memory cache
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// TTL used by [`MemoryCache::insert`]
    pub default_ttl: Duration,
    /// Maximum number of entries
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_CACHE_TTL,
            max_entries: 1000,
        }
    }
}

impl MemoryCacheConfig {
    /// Set default TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set max entries
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: CacheValue,
    cached_at: Instant,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Thread-safe in-memory cache
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedEntry>>,
    config: MemoryCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCache {
    /// Create a new cache with default config
    pub fn new() -> Self {
        Self::with_config(MemoryCacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Store with the configured default TTL
    pub fn insert(&self, key: &str, value: CacheValue) {
        self.store(key, value, self.config.default_ttl);
    }

    /// Fetch a live entry, counting the hit or miss
    pub fn lookup(&self, key: &str) -> Option<CacheValue> {
        let entries = self.entries.read();

        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, key: &str, value: CacheValue, ttl: Duration) {
        let now = Instant::now();
        let entry = CachedEntry {
            value,
            cached_at: now,
            expires_at: now.checked_add(ttl),
        };

        let mut entries = self.entries.write();

        if !entries.contains_key(key) && entries.len() >= self.config.max_entries {
            self.evict_expired(&mut entries);

            if entries.len() >= self.config.max_entries {
                self.evict_oldest(&mut entries);
            }
        }

        entries.insert(key.to_string(), entry);
    }

    /// Remove every key starting with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.write().retain(|k, _| !k.starts_with(prefix));
    }

    fn evict_expired(&self, entries: &mut HashMap<String, CachedEntry>) {
        let before = entries.len();
        entries.retain(|_, v| !v.is_expired());
        let evicted = before - entries.len();
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    fn evict_oldest(&self, entries: &mut HashMap<String, CachedEntry>) {
        if let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, v)| v.cached_at)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest_key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            entries: entries.len(),
            max_entries: self.config.max_entries,
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Get number of entries (including expired ones not yet evicted)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.lookup(key))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        self.store(key, value, ttl);
        Ok(())
    }

    fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Maximum entries allowed
    pub max_entries: usize,
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
    /// Total evictions
    pub evictions: u64,
}
