//! Application context
//!
//! [`AppContext`] owns what registries share inside one application: the
//! configuration, one cache backend, one signal hub, the index of known
//! registries and the relationships between them.
//!
//! ```text
//!   AppContext
//!   ├── config ──────────┐
//!   ├── cache  ──────────┼─► registry_builder() / hierarchical_builder()
//!   ├── signals ─────────┘
//!   ├── registries: [Notifiers, Providers, Models, ...]
//!   └── relationships: Providers → [Models]
//! ```
//!
//! Only registries bound to a discovery source join the index. Abstract
//! registries (no source) are skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheBackend, MemoryCache, MemoryCacheConfig};
use crate::config::StratagemConfig;
use crate::error::{Result, StratagemError};
use crate::hierarchy::{HierarchicalBuilder, RelationshipIndex};
use crate::registry::{RegistryBuilder, RegistryHandle, RegistryHealth, RegistryInfo};
use crate::signals::SignalHub;

/// Diagnostic id: a registry's discovery source name is empty
pub const CHECK_EMPTY_SOURCE: &str = "stratagem.E001";
/// Diagnostic id: a hierarchical registry's parent is not in the index
pub const CHECK_UNKNOWN_PARENT: &str = "stratagem.W001";

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One configuration problem found by [`AppContext::check`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub id: &'static str,
    pub severity: Severity,
    pub message: String,
    pub hint: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Registries and the state they share
pub struct AppContext {
    config: StratagemConfig,
    cache: Arc<dyn CacheBackend>,
    signals: Arc<SignalHub>,
    registries: RwLock<Vec<Arc<dyn RegistryHandle>>>,
    relationships: RelationshipIndex,
}

impl AppContext {
    /// Context with a memory cache sized from `config`
    pub fn new(config: StratagemConfig) -> Self {
        let cache = MemoryCache::with_config(
            MemoryCacheConfig::default()
                .with_ttl(config.cache_ttl())
                .with_max_entries(config.max_cache_entries),
        );
        Self::with_cache(config, Arc::new(cache))
    }

    /// Context sharing the given cache backend
    pub fn with_cache(config: StratagemConfig, cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            config,
            cache,
            signals: Arc::new(SignalHub::new()),
            registries: RwLock::new(Vec::new()),
            relationships: RelationshipIndex::new(),
        }
    }

    pub fn config(&self) -> &StratagemConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    pub fn signals(&self) -> &Arc<SignalHub> {
        &self.signals
    }

    pub fn relationships(&self) -> &RelationshipIndex {
        &self.relationships
    }

    /// Registry builder wired to this context's config, cache and signals
    pub fn registry_builder<I: ?Sized + 'static>(&self, name: impl Into<String>) -> RegistryBuilder<I> {
        RegistryBuilder::new(name)
            .with_config(self.config.clone())
            .with_cache(Arc::clone(&self.cache))
            .with_signals(Arc::clone(&self.signals))
    }

    /// Same as [`registry_builder`](Self::registry_builder), for a hierarchical registry
    pub fn hierarchical_builder<I: ?Sized + 'static>(&self, name: impl Into<String>) -> HierarchicalBuilder<I> {
        self.registry_builder(name).hierarchical()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registry index
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a registry to the index
    ///
    /// Returns whether it joined. Registries without a discovery source and
    /// registries already present are left out. A hierarchical registry that
    /// already has a parent gets that relationship recorded.
    pub fn add(&self, registry: Arc<dyn RegistryHandle>) -> Result<bool> {
        if registry.discovery_source().is_none() {
            debug!(registry = %registry.name(), "Skipping registry without discovery source");
            return Ok(false);
        }

        {
            let mut registries = self.registries.write();
            if registries.iter().any(|r| r.id() == registry.id()) {
                return Ok(false);
            }
            registries.push(Arc::clone(&registry));
        }
        debug!(registry = %registry.name(), "Registered new registry");

        if registry.is_hierarchical() {
            if let Some(parent) = registry.parent() {
                self.relationships.register_child(&parent, &registry)?;
            }
        }

        Ok(true)
    }

    /// Make `child` a child of `parent`
    pub fn relate(&self, parent: &Arc<dyn RegistryHandle>, child: &Arc<dyn RegistryHandle>) -> Result<()> {
        self.relationships.register_child(parent, child)
    }

    /// Indexed registries in the order they were added
    pub fn registries(&self) -> Vec<Arc<dyn RegistryHandle>> {
        self.registries.read().clone()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn RegistryHandle>> {
        self.registries
            .read()
            .iter()
            .find(|r| r.name() == name)
            .cloned()
            .ok_or_else(|| StratagemError::RegistryNotFound { name: name.to_string() })
    }

    pub fn len(&self) -> usize {
        self.registries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.read().is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Bulk operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Reload every indexed registry; returns the total implementation count
    pub fn discover_registries(&self) -> Result<usize> {
        let mut total = 0;
        for registry in self.registries() {
            total += registry.reload()?;
        }
        info!(registries = self.len(), implementations = total, "Registries discovered");
        Ok(total)
    }

    pub fn clear_all_cache(&self) {
        for registry in self.registries() {
            registry.clear_cache();
        }
    }

    /// Health of every indexed registry, by name
    pub fn health(&self) -> BTreeMap<String, RegistryHealth> {
        self.registries()
            .iter()
            .map(|r| (r.name().to_string(), r.check_health()))
            .collect()
    }

    /// Configuration diagnostics
    pub fn check(&self) -> Vec<Diagnostic> {
        let registries = self.registries();
        let mut diagnostics = Vec::new();

        for registry in &registries {
            if registry.discovery_source().is_some_and(|s| s.trim().is_empty()) {
                diagnostics.push(Diagnostic {
                    id: CHECK_EMPTY_SOURCE,
                    severity: Severity::Error,
                    message: format!("Registry '{}' has an empty discovery source name", registry.name()),
                    hint: "Pass a non-empty name to discover_from.".to_string(),
                });
            }

            if !registry.is_hierarchical() {
                continue;
            }
            if let Some(parent) = registry.parent() {
                if !registries.iter().any(|r| r.id() == parent.id()) {
                    diagnostics.push(Diagnostic {
                        id: CHECK_UNKNOWN_PARENT,
                        severity: Severity::Warning,
                        message: format!(
                            "Hierarchical registry '{}' references parent '{}' which is not in the index",
                            registry.name(),
                            parent.name()
                        ),
                        hint: "Bind the parent registry to a discovery source and add it.".to_string(),
                    });
                }
            }
        }

        diagnostics
    }

    /// Every indexed registry with its children and implementations
    pub fn describe(&self) -> Vec<RegistryInfo> {
        self.registries()
            .iter()
            .map(|registry| {
                let mut info = registry.describe();
                info.children = self
                    .relationships
                    .get_children_registries(registry.as_ref())
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                info
            })
            .collect()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(StratagemConfig::default())
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.registries().iter().map(|r| r.name().to_string()).collect();
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("registries", &names)
            .field("relationships", &self.relationships)
            .finish()
    }
}
