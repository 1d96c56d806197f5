//! Implementation registry
//!
//! A [`Registry`] is the catalog of implementations for one capability. The
//! catalog is the source of truth; every read path derives from it and the
//! derived views are cached.
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │        Registry<I>           │
//!   │ ┌──────────────────────────┐ │   register / unregister
//!   │ │ RwLock<Catalog>          │◄├── (store + invalidate under
//!   │ │  slug → CatalogEntry     │ │    the write lock)
//!   │ │  type name → impl        │ │
//!   │ └───────────┬──────────────┘ │
//!   │             │ derive         │
//!   │ ┌───────────▼──────────────┐ │
//!   │ │ CacheBackend             │ │   get_choices / get_items
//!   │ │  stratagem:<name>#<id>:* │ │
//!   │ └──────────────────────────┘ │
//!   │ hooks ─ signals              │   after the lock is released
//!   └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use stratagem_core::implementation::Implementation;
//! use stratagem_core::registry::{Lookup, Registry};
//!
//! trait Notifier: Send + Sync {
//!     fn channel(&self) -> &'static str;
//! }
//!
//! struct Email;
//! impl Notifier for Email {
//!     fn channel(&self) -> &'static str { "email" }
//! }
//!
//! type NotifierImpl = Implementation<dyn Notifier>;
//!
//! let registry = Registry::<dyn Notifier>::builder("Notifiers").build();
//! registry.register(NotifierImpl::new::<Email>("email", || Box::new(Email))).unwrap();
//!
//! let notifier = registry.get(Lookup::slug("email")).unwrap();
//! assert_eq!(notifier.channel(), "email");
//! assert_eq!(registry.get_choices(), vec![("email".to_string(), "Email".to_string())]);
//! ```

mod entry;
mod handle;
mod hooks;

pub use entry::CatalogEntry;
pub use handle::{ImplementationInfo, RegistryHandle, RegistryHealth, RegistryInfo};
pub use hooks::{validate_default, DefaultHooks, HookScope, RegistryHooks};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, error, info, warn};

use crate::cache::{cache_key, CacheBackend, CacheValue, MemoryCache, MemoryCacheConfig};
use crate::config::StratagemConfig;
use crate::context::Context;
use crate::discovery::{DiscoverySource, Plugin};
use crate::error::{Result, StratagemError};
use crate::implementation::{is_qualified_name, Declaration, Implementation};
use crate::signals::{RegistryEvent, RegistryId, SignalHub};

/// Cache view: sorted `(slug, label)` pairs
pub const CHOICES_VIEW: &str = "choices";
/// Cache view: `(slug, implementation)` pairs in declaration order
pub const ITEMS_VIEW: &str = "items";
/// Cache view: time the choices were last computed
pub const LAST_UPDATED_VIEW: &str = "last_updated";

/// `(slug, label)` pair
pub type Choice = (String, String);

/// Selects an implementation by slug or by path-qualified type name
///
/// Exactly one selector must be set; empty strings count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lookup<'a> {
    slug: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> Lookup<'a> {
    /// Both selectors, either of which may be absent
    pub fn new(slug: Option<&'a str>, name: Option<&'a str>) -> Self {
        Self { slug, name }
    }

    /// Select by slug
    pub fn slug(slug: &'a str) -> Self {
        Self {
            slug: Some(slug),
            name: None,
        }
    }

    /// Select by path-qualified type name
    pub fn name(name: &'a str) -> Self {
        Self {
            slug: None,
            name: Some(name),
        }
    }

    /// Whether any non-empty selector is set
    pub fn is_set(&self) -> bool {
        self.selector().is_ok()
    }

    fn selector(&self) -> Result<Selector<'a>> {
        let slug = self.slug.filter(|s| !s.is_empty());
        let name = self.name.filter(|n| !n.is_empty());

        match (slug, name) {
            (Some(slug), None) => Ok(Selector::Slug(slug)),
            (None, Some(name)) => Ok(Selector::Name(name)),
            (None, None) => Err(StratagemError::InvalidSelector {
                reason: "either a slug or a type name must be provided".to_string(),
            }),
            (Some(_), Some(_)) => Err(StratagemError::InvalidSelector {
                reason: "provide a slug or a type name, not both".to_string(),
            }),
        }
    }
}

impl fmt::Display for Lookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slug, self.name) {
            (Some(slug), _) if !slug.is_empty() => write!(f, "{}", slug),
            (_, Some(name)) => write!(f, "{}", name),
            _ => write!(f, "<unset>"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Selector<'a> {
    Slug(&'a str),
    Name(&'a str),
}

/// Something that may or may not belong to a registry
pub enum Candidate<'a, I: ?Sized> {
    /// A slug or a path-qualified type name
    Id(&'a str),
    /// An implementation declaration
    Class(&'a Implementation<I>),
    /// A concrete instance, identified by its runtime type
    Instance(&'a dyn Any),
}

pub(crate) struct Catalog<I: ?Sized> {
    pub(crate) entries: HashMap<String, CatalogEntry<I>>,
    pub(crate) names: HashMap<&'static str, Arc<Implementation<I>>>,
    next_sequence: u64,
}

impl<I: ?Sized> Catalog<I> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            names: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Entries in declaration order
    pub(crate) fn in_declaration_order(&self) -> Vec<&CatalogEntry<I>> {
        let mut entries: Vec<&CatalogEntry<I>> = self.entries.values().collect();
        entries.sort_by_key(|e| e.sequence);
        entries
    }

    /// Entries by priority, ties in declaration order
    pub(crate) fn in_priority_order(&self) -> Vec<&CatalogEntry<I>> {
        let mut entries: Vec<&CatalogEntry<I>> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.priority, e.sequence));
        entries
    }

    fn is_registered_type(&self, type_id: TypeId) -> bool {
        self.entries
            .values()
            .any(|e| e.implementation.concrete_type_id() == type_id)
    }

    fn known_type(&self, type_id: TypeId) -> Option<&Arc<Implementation<I>>> {
        self.names.values().find(|imp| imp.concrete_type_id() == type_id)
    }
}

/// Catalog of interchangeable implementations of capability `I`
pub struct Registry<I: ?Sized + 'static> {
    id: RegistryId,
    name: String,
    interface: Option<&'static str>,
    source: Option<DiscoverySource<I>>,
    plugins: RwLock<Vec<Plugin<I>>>,
    config: StratagemConfig,
    hooks: Arc<dyn RegistryHooks<I>>,
    cache: Arc<dyn CacheBackend>,
    signals: Arc<SignalHub>,
    views: Vec<&'static str>,
    catalog: RwLock<Catalog<I>>,
}

impl<I: ?Sized + 'static> Registry<I> {
    /// Start building a registry
    pub fn builder(name: impl Into<String>) -> RegistryBuilder<I> {
        RegistryBuilder::new(name)
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface every implementation must declare
    pub fn interface(&self) -> Option<&'static str> {
        self.interface
    }

    /// Name of the declaration source, `None` for abstract registries
    pub fn discovery_source(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }

    pub(crate) fn declarations(&self) -> &'static [Declaration<I>] {
        match &self.source {
            Some(source) => source.declarations,
            None => &[],
        }
    }

    pub fn config(&self) -> &StratagemConfig {
        &self.config
    }

    pub fn signals(&self) -> &Arc<SignalHub> {
        &self.signals
    }

    /// Lifetime of cached views
    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl()
    }

    pub(crate) fn scope(&self) -> HookScope<'_> {
        HookScope {
            registry: &self.name,
            interface: self.interface,
        }
    }

    pub(crate) fn read_catalog(&self) -> RwLockReadGuard<'_, Catalog<I>> {
        self.catalog.read()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Write paths
    // ═══════════════════════════════════════════════════════════════════════

    /// Validate, store and announce an implementation
    ///
    /// Re-registering the same type under a slug is silent; a different type
    /// replaces the old one (logged) and keeps its declaration position.
    pub fn register(&self, implementation: Implementation<I>) -> Result<()> {
        let scope = self.scope();
        self.hooks.validate_implementation(&scope, &implementation)?;

        let implementation = Arc::new(implementation);
        let mut entry = self.hooks.build_metadata(&scope, &implementation);
        let slug = implementation.slug().to_string();

        {
            let mut catalog = self.catalog.write();
            catalog
                .names
                .insert(implementation.type_name(), Arc::clone(&implementation));

            match catalog.entries.get(&slug) {
                Some(existing) => {
                    if existing.implementation.concrete_type_id() != implementation.concrete_type_id() {
                        warn!(
                            registry = %self.name,
                            slug = %slug,
                            old = existing.implementation.type_name(),
                            new = implementation.type_name(),
                            "Overwriting slug"
                        );
                    }
                    entry.sequence = existing.sequence;
                }
                None => {
                    entry.sequence = catalog.next_sequence;
                    catalog.next_sequence += 1;
                }
            }

            catalog.entries.insert(slug.clone(), entry.clone());
            self.invalidate();
        }

        self.hooks.on_register(&scope, &slug, &entry);
        self.signals.send(&RegistryEvent::Registered {
            registry_id: self.id,
            registry: self.name.clone(),
            slug: slug.clone(),
            type_name: implementation.type_name(),
        });
        info!(registry = %self.name, slug = %slug, "Implementation registered");

        Ok(())
    }

    /// Remove an implementation by slug
    pub fn unregister(&self, slug: &str) -> Result<CatalogEntry<I>> {
        let entry = {
            let mut catalog = self.catalog.write();
            let popped = catalog.entries.remove(slug);
            if popped.is_some() {
                self.invalidate();
            }
            popped
        };

        let Some(entry) = entry else {
            warn!(registry = %self.name, slug = %slug, "Attempted to unregister missing slug");
            return Err(self.not_found(slug));
        };

        self.hooks.on_unregister(&self.scope(), slug, &entry);
        self.signals.send(&RegistryEvent::Unregistered {
            registry_id: self.id,
            registry: self.name.clone(),
            slug: slug.to_string(),
        });
        info!(registry = %self.name, slug = %slug, "Implementation unregistered");

        Ok(entry)
    }

    /// Record a type in the name table without registering it
    pub fn declare(&self, implementation: Implementation<I>) {
        self.catalog
            .write()
            .names
            .insert(implementation.type_name(), Arc::new(implementation));
    }

    /// Drop the catalog and derived caches, keeping the name table
    pub(crate) fn reset(&self) {
        let mut catalog = self.catalog.write();
        catalog.entries.clear();
        catalog.next_sequence = 0;
        self.invalidate();
    }

    /// Attach a plugin; it is loaded on the next discovery
    pub fn add_plugin(&self, plugin: Plugin<I>) {
        self.plugins.write().push(plugin);
    }

    pub(crate) fn plugins(&self) -> Vec<Plugin<I>> {
        self.plugins.read().clone()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lookups
    // ═══════════════════════════════════════════════════════════════════════

    /// Instantiate the selected implementation
    pub fn get(&self, lookup: Lookup<'_>) -> Result<Box<I>> {
        Ok(self.get_class(lookup)?.instantiate())
    }

    /// The selected implementation, without instantiating it
    ///
    /// Names resolve through the name table, so a declared but unregistered
    /// type still resolves.
    pub fn get_class(&self, lookup: Lookup<'_>) -> Result<Arc<Implementation<I>>> {
        match lookup.selector()? {
            Selector::Slug(slug) => {
                let catalog = self.catalog.read();
                match catalog.entries.get(slug) {
                    Some(entry) => Ok(Arc::clone(&entry.implementation)),
                    None => {
                        error!(registry = %self.name, slug = %slug, "Requested slug not found");
                        Err(self.not_found(slug))
                    }
                }
            }
            Selector::Name(name) => self.resolve_name(name),
        }
    }

    /// Like [`get`](Self::get), but falls back to `default` as a slug, then `None`
    pub fn get_or_default(&self, lookup: Lookup<'_>, default: Option<&str>) -> Option<Box<I>> {
        if let Ok(instance) = self.get(lookup) {
            return Some(instance);
        }
        default.and_then(|slug| self.get(Lookup::slug(slug)).ok())
    }

    /// Strict slug accessor
    pub fn get_implementation_class(&self, slug: &str) -> Result<Arc<Implementation<I>>> {
        self.catalog
            .read()
            .entries
            .get(slug)
            .map(|e| Arc::clone(&e.implementation))
            .ok_or_else(|| self.not_found(slug))
    }

    /// Strict slug accessor for the stored metadata
    pub fn get_implementation_meta(&self, slug: &str) -> Result<CatalogEntry<I>> {
        self.catalog
            .read()
            .entries
            .get(slug)
            .cloned()
            .ok_or_else(|| self.not_found(slug))
    }

    fn resolve_name(&self, name: &str) -> Result<Arc<Implementation<I>>> {
        if !is_qualified_name(name) {
            return Err(StratagemError::InvalidName {
                name: name.to_string(),
            });
        }

        self.catalog
            .read()
            .names
            .get(name)
            .cloned()
            .ok_or_else(|| StratagemError::UnresolvedName {
                registry: self.name.clone(),
                name: name.to_string(),
            })
    }

    fn not_found(&self, slug: &str) -> StratagemError {
        StratagemError::ImplementationNotFound {
            registry: self.name.clone(),
            slug: slug.to_string(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cached views
    // ═══════════════════════════════════════════════════════════════════════

    /// `(slug, label)` pairs by priority, ties in declaration order
    pub fn get_choices(&self) -> Vec<Choice> {
        let catalog = self.catalog.read();
        let key = self.cache_key(CHOICES_VIEW);

        if let Some(hit) = self.cache_lookup::<Vec<Choice>>(&key) {
            return hit.as_ref().clone();
        }

        let choices: Vec<Choice> = catalog
            .in_priority_order()
            .into_iter()
            .map(|e| (e.slug().to_string(), e.implementation.label()))
            .collect();

        self.cache_store(&key, Arc::new(choices.clone()));
        self.cache_store(&self.cache_key(LAST_UPDATED_VIEW), Arc::new(Utc::now()));
        debug!(registry = %self.name, "Choices cache populated");

        choices
    }

    /// `(slug, implementation)` pairs in declaration order
    pub fn get_items(&self) -> Vec<(String, Arc<Implementation<I>>)> {
        let catalog = self.catalog.read();
        let key = self.cache_key(ITEMS_VIEW);

        if let Some(hit) = self.cache_lookup::<Vec<(String, Arc<Implementation<I>>)>>(&key) {
            return hit.as_ref().clone();
        }

        let items: Vec<(String, Arc<Implementation<I>>)> = catalog
            .in_declaration_order()
            .into_iter()
            .map(|e| (e.slug().to_string(), Arc::clone(&e.implementation)))
            .collect();

        self.cache_store(&key, Arc::new(items.clone()));
        debug!(registry = %self.name, "Items cache populated");

        items
    }

    /// Evict this registry's cached views
    pub fn clear_cache(&self) {
        self.invalidate();
    }

    fn invalidate(&self) {
        let keys: Vec<String> = self.views.iter().map(|view| self.cache_key(view)).collect();
        if let Err(err) = self.cache.delete_many(&keys) {
            warn!(registry = %self.name, error = %err, "Cache invalidation failed");
        }
        debug!(registry = %self.name, "Cache cleared");
    }

    pub(crate) fn cache_key(&self, view: &str) -> String {
        cache_key(&self.name, self.id, view)
    }

    /// Typed read; backend failures count as misses
    pub(crate) fn cache_lookup<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        match self.cache.get(key) {
            Ok(Some(value)) => value.downcast::<T>().ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(registry = %self.name, key = %key, error = %err, "Cache read failed");
                None
            }
        }
    }

    pub(crate) fn cache_store(&self, key: &str, value: CacheValue) {
        if let Err(err) = self.cache.set(key, value, self.cache_ttl()) {
            warn!(registry = %self.name, key = %key, error = %err, "Cache write failed");
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Context filtering
    // ═══════════════════════════════════════════════════════════════════════

    /// Implementations available in `context`, in declaration order
    pub fn get_available_implementations(&self, context: &Context) -> Vec<(String, Arc<Implementation<I>>)> {
        self.catalog
            .read()
            .in_declaration_order()
            .into_iter()
            .filter(|e| e.implementation.is_available(context))
            .map(|e| (e.slug().to_string(), Arc::clone(&e.implementation)))
            .collect()
    }

    /// Choices available in `context`, by priority
    pub fn get_choices_for_context(&self, context: &Context) -> Vec<Choice> {
        self.catalog
            .read()
            .in_priority_order()
            .into_iter()
            .filter(|e| e.implementation.is_available(context))
            .map(|e| (e.slug().to_string(), e.implementation.label()))
            .collect()
    }

    /// The selected implementation if available in `context`
    ///
    /// Otherwise falls back to `fallback` (errors propagate), then to the
    /// first available implementation in declaration order.
    pub fn get_for_context(&self, context: &Context, lookup: Lookup<'_>, fallback: Option<&str>) -> Result<Box<I>> {
        if lookup.is_set() {
            if let Ok(implementation) = self.get_class(lookup) {
                if implementation.is_available(context) {
                    return Ok(implementation.instantiate());
                }
                warn!(
                    registry = %self.name,
                    implementation = %lookup,
                    "Implementation not available in current context"
                );
            }
        }

        if let Some(fallback) = fallback {
            return self.get(Lookup::slug(fallback));
        }

        self.get_available_implementations(context)
            .into_iter()
            .next()
            .map(|(_, implementation)| implementation.instantiate())
            .ok_or_else(|| StratagemError::NoAvailableImplementation {
                registry: self.name.clone(),
            })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether a candidate belongs to this registry; never fails
    pub fn is_valid(&self, candidate: Candidate<'_, I>) -> bool {
        let catalog = self.catalog.read();

        match candidate {
            Candidate::Id(value) => {
                if catalog.entries.contains_key(value) {
                    return true;
                }
                if !is_qualified_name(value) {
                    debug!(registry = %self.name, value = %value, "Validation check failed: not a type name");
                    return false;
                }
                match catalog.names.get(value) {
                    Some(implementation) => match self.interface {
                        Some(interface) => implementation.declares(interface),
                        None => catalog.is_registered_type(implementation.concrete_type_id()),
                    },
                    None => {
                        debug!(registry = %self.name, value = %value, "Validation check failed: unknown type");
                        false
                    }
                }
            }
            Candidate::Class(implementation) => {
                let declares = self.interface.map_or(true, |i| implementation.declares(i));
                declares && catalog.is_registered_type(implementation.concrete_type_id())
            }
            Candidate::Instance(instance) => {
                let type_id = Any::type_id(instance);
                if let Some(interface) = self.interface {
                    if catalog.known_type(type_id).is_some_and(|imp| imp.declares(interface)) {
                        return true;
                    }
                }
                catalog.is_registered_type(type_id)
            }
        }
    }

    /// Fail with every invalid value listed
    pub fn validate_all<'v>(&self, values: impl IntoIterator<Item = &'v str>) -> Result<()> {
        let invalid: Vec<String> = values
            .into_iter()
            .filter(|v| !self.is_valid(Candidate::Id(v)))
            .map(String::from)
            .collect();

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(StratagemError::InvalidEntries { entries: invalid })
        }
    }

    /// Same as [`is_valid`](Self::is_valid)
    pub fn contains(&self, candidate: Candidate<'_, I>) -> bool {
        self.is_valid(candidate)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════════════

    pub fn len(&self) -> usize {
        self.catalog.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.read().entries.is_empty()
    }

    /// Registered slugs in declaration order
    pub fn slugs(&self) -> Vec<String> {
        self.catalog
            .read()
            .in_declaration_order()
            .into_iter()
            .map(|e| e.slug().to_string())
            .collect()
    }

    /// Registered implementations in declaration order
    pub fn iter(&self) -> std::vec::IntoIter<Arc<Implementation<I>>> {
        self.catalog
            .read()
            .in_declaration_order()
            .into_iter()
            .map(|e| Arc::clone(&e.implementation))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Count and last time the choices were computed; never discovers
    pub fn check_health(&self) -> RegistryHealth {
        let last_updated = self
            .cache_lookup::<DateTime<Utc>>(&self.cache_key(LAST_UPDATED_VIEW))
            .map(|ts| *ts);

        RegistryHealth {
            count: self.len(),
            last_updated,
        }
    }
}

impl<I: ?Sized + 'static> fmt::Debug for Registry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("source", &self.discovery_source())
            .field("len", &self.len())
            .finish()
    }
}

/// Builder for [`Registry`]
pub struct RegistryBuilder<I: ?Sized + 'static> {
    name: String,
    interface: Option<&'static str>,
    source: Option<DiscoverySource<I>>,
    plugins: Vec<Plugin<I>>,
    config: StratagemConfig,
    hooks: Arc<dyn RegistryHooks<I>>,
    cache: Option<Arc<dyn CacheBackend>>,
    signals: Option<Arc<SignalHub>>,
    extra_views: Vec<&'static str>,
}

impl<I: ?Sized + 'static> RegistryBuilder<I> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: None,
            source: None,
            plugins: Vec::new(),
            config: StratagemConfig::default(),
            hooks: Arc::new(DefaultHooks),
            cache: None,
            signals: None,
            extra_views: Vec::new(),
        }
    }

    /// Require every implementation to declare `interface`
    pub fn with_interface(mut self, interface: &'static str) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Bind a named declaration slice; discovery registers from it
    pub fn discover_from(mut self, source: impl Into<String>, declarations: &'static [Declaration<I>]) -> Self {
        self.source = Some(DiscoverySource {
            name: source.into(),
            declarations,
        });
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin<I>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_config(mut self, config: StratagemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hooks(mut self, hooks: impl RegistryHooks<I> + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_signals(mut self, signals: Arc<SignalHub>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Extra cached view cleared on every write
    pub(crate) fn with_view(mut self, view: &'static str) -> Self {
        self.extra_views.push(view);
        self
    }

    pub fn build(self) -> Registry<I> {
        let cache = self.cache.unwrap_or_else(|| {
            let config = MemoryCacheConfig::default()
                .with_ttl(self.config.cache_ttl())
                .with_max_entries(self.config.max_cache_entries);
            Arc::new(MemoryCache::with_config(config))
        });

        let mut views = vec![CHOICES_VIEW, ITEMS_VIEW];
        views.extend(self.extra_views);

        Registry {
            id: RegistryId::next(),
            name: self.name,
            interface: self.interface,
            source: self.source,
            plugins: RwLock::new(self.plugins),
            config: self.config,
            hooks: self.hooks,
            cache,
            signals: self.signals.unwrap_or_default(),
            views,
            catalog: RwLock::new(Catalog::new()),
        }
    }
}
