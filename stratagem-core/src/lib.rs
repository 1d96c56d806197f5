//! # Stratagem Core - implementation registries
//!
//! Stratagem lets independently written implementations of a capability
//! register into a central catalog and be picked at runtime:
//!
//! - **Registry**: the catalog for one capability, looked up by slug or by
//!   path-qualified type name, with cached choice lists
//! - **Conditions**: composable predicates over a request [`Context`]
//!   (feature flags, permissions, time windows, environment) that decide
//!   which implementations are available
//! - **Hierarchies**: registries whose implementations are only valid under
//!   certain selections in a parent registry
//! - **Discovery**: static declaration slices and plugins registered in one
//!   pass
//!
//! ```text
//!   declarations ──discover()──► Registry ──► get / get_choices / is_valid
//!                                   │
//!                    Context ──► Condition ──► get_for_context
//!                                   │
//!                     parent ──► HierarchicalRegistry ──► get_children_for_parent
//! ```
//!
//! ## Example
//!
//! ```rust
//! use stratagem_core::{Condition, Context, Implementation, Lookup, Registry};
//! use serde_json::json;
//!
//! trait Notifier: Send + Sync {
//!     fn send(&self, message: &str) -> String;
//! }
//!
//! struct Email;
//! struct Sms;
//!
//! impl Notifier for Email {
//!     fn send(&self, message: &str) -> String {
//!         format!("email: {}", message)
//!     }
//! }
//!
//! impl Notifier for Sms {
//!     fn send(&self, message: &str) -> String {
//!         format!("sms: {}", message)
//!     }
//! }
//!
//! type NotifierImpl = Implementation<dyn Notifier>;
//!
//! let registry = Registry::<dyn Notifier>::builder("Notifiers").build();
//! registry.register(NotifierImpl::new::<Email>("email", || Box::new(Email))).unwrap();
//! registry
//!     .register(
//!         NotifierImpl::new::<Sms>("sms", || Box::new(Sms))
//!             .with_label("SMS")
//!             .with_condition(Condition::feature_flag("sms")),
//!     )
//!     .unwrap();
//!
//! // Every registered implementation is a choice
//! assert_eq!(registry.get_choices().len(), 2);
//!
//! // Only available ones are offered in a context
//! let context = Context::from(json!({"feature_flags": {"sms": false}}));
//! let notifier = registry
//!     .get_for_context(&context, Lookup::slug("sms"), None)
//!     .unwrap();
//! assert_eq!(notifier.send("hi"), "email: hi");
//! ```

pub mod app;
pub mod cache;
pub mod condition;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod hierarchy;
pub mod implementation;
pub mod registry;
pub mod signals;

// Re-export main types
pub use app::{AppContext, Diagnostic, Severity};
pub use cache::{CacheBackend, CacheStats, MemoryCache, MemoryCacheConfig, NullCache};
pub use condition::{Condition, Predicate};
pub use config::StratagemConfig;
pub use context::{Context, User};
pub use discovery::{DiscoverySource, Plugin};
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, Result, StratagemError};
pub use hierarchy::{HierarchicalBuilder, HierarchicalRegistry, HierarchyMap, RelationshipIndex};
pub use implementation::{Declaration, Implementation, ParentConstraint};
pub use registry::{
    Candidate, CatalogEntry, Choice, DefaultHooks, HookScope, ImplementationInfo, Lookup, Registry,
    RegistryBuilder, RegistryHandle, RegistryHealth, RegistryHooks, RegistryInfo,
};
pub use signals::{RegistryEvent, RegistryId, SignalHub};

/// Crate version, as reported in diagnostics
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
