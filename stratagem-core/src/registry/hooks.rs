//! Registry extension points
//!
//! Every registry owns one [`RegistryHooks`] object. The trait's default
//! methods are the stock behavior, so an override only replaces what it names.
//!
//! ```text
//! register(imp)
//!   ├─ validate_implementation   (reject → nothing changes)
//!   ├─ build_metadata            (→ CatalogEntry)
//!   ├─ store + invalidate caches (under the catalog write lock)
//!   ├─ on_register
//!   └─ Registered signal
//! ```
//!
//! Overriding `validate_implementation` without calling [`validate_default`]
//! drops the stock slug and interface checks.

use std::sync::Arc;

use crate::error::{Result, StratagemError};
use crate::implementation::Implementation;

use super::entry::CatalogEntry;

/// Identity of the registry a hook is running for
#[derive(Debug, Clone, Copy)]
pub struct HookScope<'a> {
    /// Registry name
    pub registry: &'a str,
    /// Interface the registry requires, if any
    pub interface: Option<&'a str>,
}

/// Registry lifecycle hooks
pub trait RegistryHooks<I: ?Sized>: Send + Sync {
    /// Reject an implementation before anything is stored
    fn validate_implementation(&self, scope: &HookScope<'_>, implementation: &Implementation<I>) -> Result<()> {
        validate_default(scope, implementation)
    }

    /// Build the catalog entry stored for an implementation
    fn build_metadata(&self, _scope: &HookScope<'_>, implementation: &Arc<Implementation<I>>) -> CatalogEntry<I> {
        CatalogEntry::from_implementation(Arc::clone(implementation))
    }

    /// Called after the entry is stored and caches are cleared, before the signal
    fn on_register(&self, _scope: &HookScope<'_>, _slug: &str, _entry: &CatalogEntry<I>) {}

    /// Called after the entry is removed and caches are cleared, before the signal
    fn on_unregister(&self, _scope: &HookScope<'_>, _slug: &str, _entry: &CatalogEntry<I>) {}
}

/// Stock behavior for every hook
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl<I: ?Sized> RegistryHooks<I> for DefaultHooks {}

/// Stock validation: non-empty slug, and the required interface if one is set
pub fn validate_default<I: ?Sized>(scope: &HookScope<'_>, implementation: &Implementation<I>) -> Result<()> {
    if implementation.slug().is_empty() {
        tracing::error!(
            registry = scope.registry,
            type_name = implementation.type_name(),
            "Cannot register implementation without slug"
        );
        return Err(StratagemError::MissingSlug {
            type_name: implementation.type_name().to_string(),
        });
    }

    if let Some(interface) = scope.interface {
        if !implementation.declares(interface) {
            return Err(StratagemError::InterfaceMismatch {
                type_name: implementation.type_name().to_string(),
                interface: interface.to_string(),
            });
        }
    }

    Ok(())
}
