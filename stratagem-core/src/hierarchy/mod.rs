//! Hierarchical registries
//!
//! A [`HierarchicalRegistry`] is a [`Registry`] whose implementations are only
//! valid under certain selections in a parent registry:
//!
//! ```text
//!   Providers (parent)            Models (child)
//!   ┌──────────────┐              ┌──────────────────────────────┐
//!   │ openai       │◄─────────────│ gpt4      parent_slug=openai │
//!   │ anthropic    │◄──────┬──────│ claude    parent_slug=anthr..│
//!   │ local        │       └──────│ shared    (any parent)       │
//!   └──────────────┘              └──────────────────────────────┘
//!
//!   get_children_for_parent("openai") → [gpt4, shared]
//!   get_hierarchy_map()               → openai → [gpt4, shared], ...
//! ```
//!
//! Two filters apply. The registry-wide `allowed_parent_slugs` decides which
//! parent selections have children at all; each implementation's own
//! [`ParentConstraint`](crate::implementation::ParentConstraint) decides which
//! of those it belongs to.

mod relationship;

pub use relationship::RelationshipIndex;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::context::Context;
use crate::discovery::Plugin;
use crate::error::Result;
use crate::implementation::{Declaration, Implementation};
use crate::registry::{
    CatalogEntry, Choice, Registry, RegistryBuilder, RegistryHandle, RegistryHealth, RegistryHooks, RegistryInfo,
};
use crate::signals::RegistryId;

/// Cache view: parent slug → child slugs
pub const HIERARCHY_MAP_VIEW: &str = "hierarchy_map";

/// Parent slugs in the parent's declaration order, each with its child slugs
pub type HierarchyMap = Vec<(String, Vec<String>)>;

/// Registry constrained by selections in a parent registry
pub struct HierarchicalRegistry<I: ?Sized + 'static> {
    registry: Registry<I>,
    parent: RwLock<Option<Arc<dyn RegistryHandle>>>,
    allowed_parent_slugs: Option<Vec<String>>,
}

impl<I: ?Sized + 'static> HierarchicalRegistry<I> {
    /// The plain registry underneath
    pub fn registry(&self) -> &Registry<I> {
        &self.registry
    }

    pub fn parent(&self) -> Option<Arc<dyn RegistryHandle>> {
        self.parent.read().clone()
    }

    /// Replace the parent; the hierarchy map is rebuilt once its cache expires
    pub fn set_parent(&self, parent: Option<Arc<dyn RegistryHandle>>) {
        *self.parent.write() = parent;
    }

    pub fn allowed_parent_slugs(&self) -> Option<&[String]> {
        self.allowed_parent_slugs.as_deref()
    }

    /// Whether the registry-wide filter lets `parent_slug` have children
    ///
    /// An unset or empty list allows every parent.
    pub fn allows_parent(&self, parent_slug: &str) -> bool {
        match &self.allowed_parent_slugs {
            Some(allowed) if !allowed.is_empty() => allowed.iter().any(|s| s == parent_slug),
            _ => true,
        }
    }

    /// Implementations valid under `parent_slug`, in declaration order
    ///
    /// With a context, unavailable implementations are left out too.
    pub fn get_children_for_parent(
        &self,
        parent_slug: &str,
        context: Option<&Context>,
    ) -> Vec<(String, Arc<Implementation<I>>)> {
        if !self.allows_parent(parent_slug) {
            return Vec::new();
        }

        let catalog = self.registry.read_catalog();
        let children = children_of(catalog.in_declaration_order(), parent_slug, context)
            .map(|e| (e.slug().to_string(), Arc::clone(&e.implementation)))
            .collect();
        children
    }

    /// `(slug, label)` pairs valid under `parent_slug`, by priority
    pub fn get_choices_for_parent(&self, parent_slug: &str, context: Option<&Context>) -> Vec<Choice> {
        if !self.allows_parent(parent_slug) {
            return Vec::new();
        }

        let catalog = self.registry.read_catalog();
        let choices = children_of(catalog.in_priority_order(), parent_slug, context)
            .map(|e| (e.slug().to_string(), e.implementation.label()))
            .collect();
        choices
    }

    /// Whether `child_slug` may be selected together with `parent_slug`
    pub fn validate_parent_child_relationship(&self, parent_slug: &str, child_slug: &str) -> bool {
        if !self.allows_parent(parent_slug) {
            return false;
        }

        self.registry
            .read_catalog()
            .entries
            .get(child_slug)
            .is_some_and(|e| e.implementation.is_valid_for_parent(parent_slug))
    }

    /// Child slugs for every allowed slug of the parent registry
    ///
    /// Parent slugs outside `allowed_parent_slugs` are left out. Empty without
    /// a parent. Cached; every write to this registry clears it.
    pub fn get_hierarchy_map(&self) -> HierarchyMap {
        let catalog = self.registry.read_catalog();
        let key = self.registry.cache_key(HIERARCHY_MAP_VIEW);

        if let Some(hit) = self.registry.cache_lookup::<HierarchyMap>(&key) {
            return hit.as_ref().clone();
        }

        let map: HierarchyMap = match self.parent() {
            Some(parent) => parent
                .slugs()
                .into_iter()
                .filter(|parent_slug| self.allows_parent(parent_slug))
                .map(|parent_slug| {
                    let children = children_of(catalog.in_declaration_order(), &parent_slug, None)
                        .map(|e| e.slug().to_string())
                        .collect();
                    (parent_slug, children)
                })
                .collect(),
            None => Vec::new(),
        };

        self.registry.cache_store(&key, Arc::new(map.clone()));
        debug!(registry = %self.registry.name(), "Hierarchy map cache populated");

        map
    }

    pub(crate) fn describe_hierarchical(&self) -> RegistryInfo {
        let mut info = self.registry.describe_plain();
        info.hierarchical = true;
        info.parent = self.parent().map(|p| p.name().to_string());
        info.allowed_parent_slugs = self.allowed_parent_slugs.clone().unwrap_or_default();
        info
    }
}

fn children_of<'c, I: ?Sized + 'c>(
    entries: Vec<&'c CatalogEntry<I>>,
    parent_slug: &'c str,
    context: Option<&'c Context>,
) -> impl Iterator<Item = &'c CatalogEntry<I>> + 'c {
    entries.into_iter().filter(move |e| {
        context.map_or(true, |c| e.implementation.is_available(c))
            && e.implementation.is_valid_for_parent(parent_slug)
    })
}

impl<I: ?Sized + 'static> Deref for HierarchicalRegistry<I> {
    type Target = Registry<I>;

    fn deref(&self) -> &Registry<I> {
        &self.registry
    }
}

impl<I: ?Sized + 'static> fmt::Debug for HierarchicalRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchicalRegistry")
            .field("registry", &self.registry)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .field("allowed_parent_slugs", &self.allowed_parent_slugs)
            .finish()
    }
}

impl<I: ?Sized + 'static> RegistryHandle for HierarchicalRegistry<I> {
    fn id(&self) -> RegistryId {
        self.registry.id()
    }

    fn name(&self) -> &str {
        self.registry.name()
    }

    fn discovery_source(&self) -> Option<&str> {
        self.registry.discovery_source()
    }

    fn slugs(&self) -> Vec<String> {
        self.registry.slugs()
    }

    fn len(&self) -> usize {
        self.registry.len()
    }

    fn contains_slug(&self, slug: &str) -> bool {
        RegistryHandle::contains_slug(&self.registry, slug)
    }

    fn clear_cache(&self) {
        self.registry.clear_cache()
    }

    fn reload(&self) -> Result<usize> {
        self.registry.reload()
    }

    fn check_health(&self) -> RegistryHealth {
        self.registry.check_health()
    }

    fn describe(&self) -> RegistryInfo {
        self.describe_hierarchical()
    }

    fn is_hierarchical(&self) -> bool {
        true
    }

    fn parent(&self) -> Option<Arc<dyn RegistryHandle>> {
        HierarchicalRegistry::parent(self)
    }

    fn set_parent(&self, parent: Option<Arc<dyn RegistryHandle>>) -> Result<()> {
        HierarchicalRegistry::set_parent(self, parent);
        Ok(())
    }
}

/// Builder for [`HierarchicalRegistry`], obtained from
/// [`RegistryBuilder::hierarchical`]
pub struct HierarchicalBuilder<I: ?Sized + 'static> {
    inner: RegistryBuilder<I>,
    parent: Option<Arc<dyn RegistryHandle>>,
    allowed_parent_slugs: Option<Vec<String>>,
}

impl<I: ?Sized + 'static> HierarchicalBuilder<I> {
    /// See [`RegistryBuilder::with_interface`]
    pub fn with_interface(mut self, interface: &'static str) -> Self {
        self.inner = self.inner.with_interface(interface);
        self
    }

    /// See [`RegistryBuilder::discover_from`]
    pub fn discover_from(mut self, source: impl Into<String>, declarations: &'static [Declaration<I>]) -> Self {
        self.inner = self.inner.discover_from(source, declarations);
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin<I>) -> Self {
        self.inner = self.inner.with_plugin(plugin);
        self
    }

    pub fn with_hooks(mut self, hooks: impl RegistryHooks<I> + 'static) -> Self {
        self.inner = self.inner.with_hooks(hooks);
        self
    }

    pub fn with_parent(mut self, parent: Arc<dyn RegistryHandle>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Only these parent selections have children
    pub fn with_allowed_parent_slugs<S: Into<String>>(mut self, slugs: impl IntoIterator<Item = S>) -> Self {
        self.allowed_parent_slugs = Some(slugs.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> HierarchicalRegistry<I> {
        HierarchicalRegistry {
            registry: self.inner.with_view(HIERARCHY_MAP_VIEW).build(),
            parent: RwLock::new(self.parent),
            allowed_parent_slugs: self.allowed_parent_slugs,
        }
    }
}

impl<I: ?Sized + 'static> RegistryBuilder<I> {
    /// Continue as a hierarchical registry
    pub fn hierarchical(self) -> HierarchicalBuilder<I> {
        HierarchicalBuilder {
            inner: self,
            parent: None,
            allowed_parent_slugs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use serde_json::json;

    struct OpenAi;
    struct Anthropic;
    struct Local;
    struct Gpt4;
    struct Claude;
    struct Shared;
    struct Duo;

    type ModelImpl = Implementation<str>;

    fn providers() -> Arc<Registry<str>> {
        let registry = Registry::<str>::builder("Providers").build();
        registry
            .register(ModelImpl::new::<OpenAi>("openai", || "openai".into()))
            .unwrap();
        registry
            .register(ModelImpl::new::<Anthropic>("anthropic", || "anthropic".into()))
            .unwrap();
        registry
            .register(ModelImpl::new::<Local>("local", || "local".into()))
            .unwrap();
        Arc::new(registry)
    }

    fn models(parent: Arc<Registry<str>>) -> HierarchicalRegistry<str> {
        let models = Registry::<str>::builder("Models")
            .hierarchical()
            .with_parent(parent)
            .build();
        models
            .register(ModelImpl::new::<Gpt4>("gpt4", || "gpt4".into()).parent_slug("openai"))
            .unwrap();
        models
            .register(
                ModelImpl::new::<Claude>("claude", || "claude".into())
                    .parent_slug("anthropic")
                    .with_priority(-1),
            )
            .unwrap();
        models
            .register(ModelImpl::new::<Shared>("shared", || "shared".into()).with_priority(-5))
            .unwrap();
        models
            .register(ModelImpl::new::<Duo>("duo", || "duo".into()).parent_slugs(["openai", "anthropic"]))
            .unwrap();
        models
    }

    fn slugs(children: Vec<(String, Arc<ModelImpl>)>) -> Vec<String> {
        children.into_iter().map(|(slug, _)| slug).collect()
    }

    #[test]
    fn test_children_for_parent() {
        let models = models(providers());

        assert_eq!(
            slugs(models.get_children_for_parent("openai", None)),
            vec!["gpt4", "shared", "duo"]
        );
        assert_eq!(
            slugs(models.get_children_for_parent("anthropic", None)),
            vec!["claude", "shared", "duo"]
        );
        assert_eq!(slugs(models.get_children_for_parent("local", None)), vec!["shared"]);
    }

    #[test]
    fn test_choices_for_parent_by_priority() {
        let models = models(providers());
        let choices: Vec<String> = models
            .get_choices_for_parent("anthropic", None)
            .into_iter()
            .map(|(slug, _)| slug)
            .collect();
        assert_eq!(choices, vec!["shared", "claude", "duo"]);
    }

    #[test]
    fn test_allowed_parent_slugs() {
        let models = Registry::<str>::builder("Models")
            .hierarchical()
            .with_allowed_parent_slugs(["openai"])
            .build();
        models
            .register(ModelImpl::new::<Shared>("shared", || "shared".into()))
            .unwrap();

        assert_eq!(slugs(models.get_children_for_parent("openai", None)), vec!["shared"]);
        assert!(models.get_children_for_parent("anthropic", None).is_empty());
        assert!(models.get_choices_for_parent("anthropic", None).is_empty());
        assert!(!models.validate_parent_child_relationship("anthropic", "shared"));
        assert!(models.validate_parent_child_relationship("openai", "shared"));
    }

    #[test]
    fn test_context_filters_children() {
        let models = Registry::<str>::builder("Models").hierarchical().build();
        models
            .register(
                ModelImpl::new::<Gpt4>("gpt4", || "gpt4".into())
                    .parent_slug("openai")
                    .with_condition(Condition::feature_flag("gpt4")),
            )
            .unwrap();

        let off = Context::new();
        let on = Context::from(json!({"feature_flags": {"gpt4": true}}));

        assert!(models.get_children_for_parent("openai", Some(&off)).is_empty());
        assert_eq!(slugs(models.get_children_for_parent("openai", Some(&on))), vec!["gpt4"]);
        assert_eq!(slugs(models.get_children_for_parent("openai", None)), vec!["gpt4"]);
    }

    #[test]
    fn test_validate_parent_child_relationship() {
        let models = models(providers());

        assert!(models.validate_parent_child_relationship("openai", "gpt4"));
        assert!(!models.validate_parent_child_relationship("anthropic", "gpt4"));
        assert!(models.validate_parent_child_relationship("local", "shared"));
        assert!(!models.validate_parent_child_relationship("openai", "missing"));
    }

    #[test]
    fn test_hierarchy_map() {
        let models = models(providers());

        let map = models.get_hierarchy_map();
        assert_eq!(
            map,
            vec![
                ("openai".to_string(), vec!["gpt4".to_string(), "shared".to_string(), "duo".to_string()]),
                (
                    "anthropic".to_string(),
                    vec!["claude".to_string(), "shared".to_string(), "duo".to_string()]
                ),
                ("local".to_string(), vec!["shared".to_string()]),
            ]
        );

        models.unregister("shared").unwrap();
        let map = models.get_hierarchy_map();
        assert_eq!(map[2], ("local".to_string(), Vec::new()));
    }

    #[test]
    fn test_hierarchy_map_skips_disallowed_parents() {
        let models = Registry::<str>::builder("Models")
            .hierarchical()
            .with_parent(providers())
            .with_allowed_parent_slugs(["openai", "local"])
            .build();
        models
            .register(ModelImpl::new::<Gpt4>("gpt4", || "gpt4".into()).parent_slug("openai"))
            .unwrap();
        models
            .register(ModelImpl::new::<Shared>("shared", || "shared".into()))
            .unwrap();

        let parents: Vec<String> = models.get_hierarchy_map().into_iter().map(|(slug, _)| slug).collect();
        assert_eq!(parents, vec!["openai", "local"]);
        assert_eq!(models.get_hierarchy_map()[1].1, vec!["shared".to_string()]);
    }

    #[test]
    fn test_hierarchy_map_without_parent() {
        let models = Registry::<str>::builder("Models").hierarchical().build();
        models
            .register(ModelImpl::new::<Shared>("shared", || "shared".into()))
            .unwrap();
        assert!(models.get_hierarchy_map().is_empty());
    }

    #[test]
    fn test_set_parent() {
        let models = Registry::<str>::builder("Models").hierarchical().build();
        assert!(models.parent().is_none());

        let parent: Arc<dyn RegistryHandle> = providers();
        let parent_id = parent.id();
        models.set_parent(Some(parent));
        assert_eq!(models.parent().map(|p| p.id()), Some(parent_id));

        let handle: &dyn RegistryHandle = &models;
        assert!(handle.is_hierarchical());
        handle.set_parent(None).unwrap();
        assert!(models.parent().is_none());
    }

    #[test]
    fn test_describe_includes_hierarchy() {
        let models = Registry::<str>::builder("Models")
            .hierarchical()
            .with_parent(providers())
            .with_allowed_parent_slugs(["openai", "anthropic"])
            .build();

        let info = RegistryHandle::describe(&models);
        assert!(info.hierarchical);
        assert_eq!(info.parent.as_deref(), Some("Providers"));
        assert_eq!(info.allowed_parent_slugs, vec!["openai".to_string(), "anthropic".to_string()]);
    }

    #[test]
    fn test_deref_to_registry() {
        let models = models(providers());
        assert_eq!(models.len(), 4);
        assert_eq!(models.registry().name(), "Models");
        assert!(models.get(crate::registry::Lookup::slug("gpt4")).is_ok());
    }
}
