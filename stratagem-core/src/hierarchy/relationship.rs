//! Parent → child registry graph

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{Result, StratagemError};
use crate::registry::RegistryHandle;
use crate::signals::RegistryId;

type Children = Vec<Arc<dyn RegistryHandle>>;

/// Tracks which registries are children of which
///
/// Children are kept in registration order without duplicates. The graph is
/// acyclic: a relationship that would close a loop is rejected.
#[derive(Default)]
pub struct RelationshipIndex {
    relationships: RwLock<HashMap<RegistryId, Children>>,
}

impl RelationshipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `child` under `parent` and point the child at its parent
    ///
    /// Idempotent. A child that already had another parent is moved.
    pub fn register_child(&self, parent: &Arc<dyn RegistryHandle>, child: &Arc<dyn RegistryHandle>) -> Result<()> {
        if !child.is_hierarchical() {
            return Err(StratagemError::NotHierarchical {
                registry: child.name().to_string(),
            });
        }

        let mut relationships = self.relationships.write();

        let closes_loop = parent.id() == child.id()
            || descendants_of(&relationships, child.id())
                .iter()
                .any(|d| d.id() == parent.id())
            || ancestors_of(parent).iter().any(|a| a.id() == child.id());
        if closes_loop {
            return Err(StratagemError::RelationshipCycle {
                parent: parent.name().to_string(),
                child: child.name().to_string(),
            });
        }

        for (parent_id, children) in relationships.iter_mut() {
            if *parent_id != parent.id() {
                children.retain(|c| c.id() != child.id());
            }
        }
        relationships.retain(|_, children| !children.is_empty());

        let children = relationships.entry(parent.id()).or_default();
        if !children.iter().any(|c| c.id() == child.id()) {
            children.push(Arc::clone(child));
        }
        drop(relationships);

        child.set_parent(Some(Arc::clone(parent)))?;
        info!(parent = %parent.name(), child = %child.name(), "Registered hierarchical relationship");

        Ok(())
    }

    /// Direct children of `parent`
    pub fn get_children_registries(&self, parent: &dyn RegistryHandle) -> Vec<Arc<dyn RegistryHandle>> {
        self.relationships
            .read()
            .get(&parent.id())
            .cloned()
            .unwrap_or_default()
    }

    /// Children, grandchildren and so on, depth first
    pub fn get_all_descendants(&self, parent: &dyn RegistryHandle) -> Vec<Arc<dyn RegistryHandle>> {
        descendants_of(&self.relationships.read(), parent.id())
    }

    /// Forget every relationship; parent pointers are left as they are
    pub fn clear_relationships(&self) {
        self.relationships.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.read().is_empty()
    }
}

impl fmt::Debug for RelationshipIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relationships = self.relationships.read();
        let mut map = f.debug_map();
        for (parent, children) in relationships.iter() {
            let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
            map.entry(parent, &names);
        }
        map.finish()
    }
}

fn descendants_of(relationships: &HashMap<RegistryId, Children>, root: RegistryId) -> Vec<Arc<dyn RegistryHandle>> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(root);
    walk(relationships, root, &mut visited, &mut out);
    out
}

fn walk(
    relationships: &HashMap<RegistryId, Children>,
    node: RegistryId,
    visited: &mut HashSet<RegistryId>,
    out: &mut Vec<Arc<dyn RegistryHandle>>,
) {
    let Some(children) = relationships.get(&node) else {
        return;
    };
    for child in children {
        if visited.insert(child.id()) {
            out.push(Arc::clone(child));
            walk(relationships, child.id(), visited, out);
        }
    }
}

fn ancestors_of(registry: &Arc<dyn RegistryHandle>) -> Vec<Arc<dyn RegistryHandle>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(registry.id());

    let mut current = registry.parent();
    while let Some(parent) = current {
        if !seen.insert(parent.id()) {
            break;
        }
        current = parent.parent();
        out.push(parent);
    }
    out
}
