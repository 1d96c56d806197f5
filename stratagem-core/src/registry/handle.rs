//! Type-erased registry access
//!
//! [`RegistryHandle`] is what the relationship index and the application
//! context hold, so registries of different capabilities can live side by
//! side.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, StratagemError};
use crate::signals::RegistryId;

use super::{CatalogEntry, Registry};

/// Basic health metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryHealth {
    /// Registered implementations
    pub count: usize,
    /// When the choices were last computed, if they are still cached
    pub last_updated: Option<DateTime<Utc>>,
}

/// Serializable description of one registered implementation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplementationInfo {
    pub slug: String,
    pub type_name: String,
    pub label: String,
    pub description: String,
    pub icon: String,
    pub priority: i32,
    pub conditional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parent_slugs: Vec<String>,
}

impl ImplementationInfo {
    pub(crate) fn from_entry<I: ?Sized>(entry: &CatalogEntry<I>) -> Self {
        let implementation = &entry.implementation;
        let condition = implementation.condition();

        Self {
            slug: entry.slug().to_string(),
            type_name: implementation.type_name().to_string(),
            label: implementation.label(),
            description: entry.description.clone(),
            icon: entry.icon.clone(),
            priority: entry.priority,
            conditional: condition.is_some(),
            condition_kind: condition.map(|c| c.kind()),
            condition: condition.map(|c| c.explain()),
            parent_slugs: implementation
                .parent_constraint()
                .slugs()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Serializable description of one registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    pub hierarchical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_parent_slugs: Vec<String>,
    pub children: Vec<String>,
    pub implementations: Vec<ImplementationInfo>,
}

/// Capability-independent view of a registry
pub trait RegistryHandle: Send + Sync {
    fn id(&self) -> RegistryId;

    fn name(&self) -> &str;

    /// Declaration source name; `None` marks an abstract registry
    fn discovery_source(&self) -> Option<&str>;

    /// Registered slugs in declaration order
    fn slugs(&self) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_slug(&self, slug: &str) -> bool;

    fn clear_cache(&self);

    /// Clear and rediscover; returns the resulting count
    fn reload(&self) -> Result<usize>;

    fn check_health(&self) -> RegistryHealth;

    /// Description without children (the relationship index fills those in)
    fn describe(&self) -> RegistryInfo;

    fn is_hierarchical(&self) -> bool {
        false
    }

    fn parent(&self) -> Option<Arc<dyn RegistryHandle>> {
        None
    }

    /// Point a hierarchical registry at its parent
    fn set_parent(&self, _parent: Option<Arc<dyn RegistryHandle>>) -> Result<()> {
        Err(StratagemError::NotHierarchical {
            registry: self.name().to_string(),
        })
    }
}

impl<I: ?Sized + 'static> Registry<I> {
    pub(crate) fn describe_plain(&self) -> RegistryInfo {
        let implementations = self
            .read_catalog()
            .in_declaration_order()
            .into_iter()
            .map(ImplementationInfo::from_entry)
            .collect();

        RegistryInfo {
            name: self.name().to_string(),
            source: self.discovery_source().map(String::from),
            interface: self.interface().map(String::from),
            hierarchical: false,
            parent: None,
            allowed_parent_slugs: Vec::new(),
            children: Vec::new(),
            implementations,
        }
    }
}

impl<I: ?Sized + 'static> RegistryHandle for Registry<I> {
    fn id(&self) -> RegistryId {
        Registry::id(self)
    }

    fn name(&self) -> &str {
        Registry::name(self)
    }

    fn discovery_source(&self) -> Option<&str> {
        Registry::discovery_source(self)
    }

    fn slugs(&self) -> Vec<String> {
        Registry::slugs(self)
    }

    fn len(&self) -> usize {
        Registry::len(self)
    }

    fn contains_slug(&self, slug: &str) -> bool {
        self.read_catalog().entries.contains_key(slug)
    }

    fn clear_cache(&self) {
        Registry::clear_cache(self)
    }

    fn reload(&self) -> Result<usize> {
        Registry::reload(self)
    }

    fn check_health(&self) -> RegistryHealth {
        Registry::check_health(self)
    }

    fn describe(&self) -> RegistryInfo {
        self.describe_plain()
    }
}
