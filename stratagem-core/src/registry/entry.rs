//! Catalog entries

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::implementation::Implementation;

/// Metadata stored for one registered implementation
pub struct CatalogEntry<I: ?Sized> {
    /// The registered implementation
    pub implementation: Arc<Implementation<I>>,
    pub description: String,
    pub icon: String,
    /// Ordering key for choices (lower first)
    pub priority: i32,
    /// Free-form metadata added by [`RegistryHooks::build_metadata`](super::RegistryHooks::build_metadata)
    pub extra: Map<String, Value>,
    pub(crate) sequence: u64,
}

impl<I: ?Sized> CatalogEntry<I> {
    /// Default entry: metadata copied from the implementation
    pub fn from_implementation(implementation: Arc<Implementation<I>>) -> Self {
        Self {
            description: implementation.description().to_string(),
            icon: implementation.icon().to_string(),
            priority: implementation.priority(),
            extra: Map::new(),
            sequence: 0,
            implementation,
        }
    }

    /// Add one free-form metadata field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn slug(&self) -> &str {
        self.implementation.slug()
    }

    /// Position in declaration order
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<I: ?Sized> Clone for CatalogEntry<I> {
    fn clone(&self) -> Self {
        Self {
            implementation: Arc::clone(&self.implementation),
            description: self.description.clone(),
            icon: self.icon.clone(),
            priority: self.priority,
            extra: self.extra.clone(),
            sequence: self.sequence,
        }
    }
}

impl<I: ?Sized> fmt::Debug for CatalogEntry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("slug", &self.slug())
            .field("type_name", &self.implementation.type_name())
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .field("extra", &self.extra)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Plain;

    #[test]
    fn test_entry_copies_metadata() {
        let imp = Implementation::<str>::new::<Plain>("plain", || "plain".into())
            .with_description("A plain one")
            .with_icon("star")
            .with_priority(3);

        let entry = CatalogEntry::from_implementation(Arc::new(imp)).with_extra("version", json!("1.2"));

        assert_eq!(entry.slug(), "plain");
        assert_eq!(entry.description, "A plain one");
        assert_eq!(entry.icon, "star");
        assert_eq!(entry.priority, 3);
        assert_eq!(entry.extra["version"], "1.2");
        assert_eq!(entry.sequence(), 0);
    }
}
