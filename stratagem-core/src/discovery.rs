//! Auto-registration
//!
//! Implementations are declared once, in a static slice bound to a registry,
//! and registered when the registry runs discovery:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. Registry declares: #[linkme::distributed_slice]           │
//! │                       static NOTIFIERS: [Declaration<..>]    │
//! │ 2. Each impl adds:    #[linkme::distributed_slice(NOTIFIERS)]│
//! │                       static EMAIL: Declaration<..> = email; │
//! │ 3. Registry binds:    .discover_from("notifiers", &NOTIFIERS)│
//! │ 4. discover():        every declaration → register()         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A plain `static` array works the same way when link-time collection is
//! not wanted. Declarations with an empty slug are abstract: their type name
//! is recorded for resolve-by-name and they are not registered.
//!
//! [`Plugin`]s carry extra declarations from outside the crate that owns the
//! registry. They are filtered by the `enabled_plugins` / `disabled_plugins`
//! configuration, and a plugin declaration that fails to register is logged
//! and skipped.

use std::fmt;

use tracing::{debug, error, info};

use crate::error::Result;
use crate::implementation::Declaration;
use crate::registry::Registry;
use crate::signals::RegistryEvent;

/// Named static declaration list bound to one registry
pub struct DiscoverySource<I: ?Sized + 'static> {
    pub name: String,
    pub declarations: &'static [Declaration<I>],
}

impl<I: ?Sized + 'static> fmt::Debug for DiscoverySource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverySource")
            .field("name", &self.name)
            .field("declarations", &self.declarations.len())
            .finish()
    }
}

/// Externally supplied set of declarations
pub struct Plugin<I: ?Sized> {
    pub name: String,
    pub version: String,
    pub implementations: Vec<Declaration<I>>,
}

impl<I: ?Sized> Plugin<I> {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            implementations: Vec::new(),
        }
    }

    pub fn with_implementation(mut self, declaration: Declaration<I>) -> Self {
        self.implementations.push(declaration);
        self
    }
}

impl<I: ?Sized> Clone for Plugin<I> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version.clone(),
            implementations: self.implementations.clone(),
        }
    }
}

impl<I: ?Sized> fmt::Debug for Plugin<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("implementations", &self.implementations.len())
            .finish()
    }
}

impl<I: ?Sized + 'static> Registry<I> {
    /// Register every declaration, then every enabled plugin
    ///
    /// Returns how many implementations were registered. Errors from the
    /// static declarations propagate; plugin failures are logged.
    pub fn discover(&self) -> Result<usize> {
        let declarations = self.declarations();
        if self.discovery_source().is_none() {
            debug!(registry = %self.name(), "No discovery source defined; skipping declarations");
        }

        let mut registered = 0;
        for declare in declarations {
            let implementation = declare();
            if implementation.slug().is_empty() {
                info!(
                    registry = %self.name(),
                    type_name = implementation.type_name(),
                    "Skipping abstract implementation without slug"
                );
                self.declare(implementation);
                continue;
            }
            self.register(implementation)?;
            registered += 1;
        }

        Ok(registered + self.load_plugins())
    }

    fn load_plugins(&self) -> usize {
        let mut loaded = 0;

        for plugin in self.plugins() {
            if !self.config().is_plugin_enabled(&plugin.name) {
                debug!(registry = %self.name(), plugin = %plugin.name, "Plugin disabled by configuration");
                continue;
            }

            info!(
                registry = %self.name(),
                plugin = %plugin.name,
                version = %plugin.version,
                "Discovered plugin"
            );

            for declare in &plugin.implementations {
                let implementation = declare();
                let type_name = implementation.type_name();

                match self.register(implementation) {
                    Ok(()) => {
                        info!(plugin = %plugin.name, type_name, "Loaded implementation from plugin");
                        loaded += 1;
                    }
                    Err(err) => {
                        error!(
                            plugin = %plugin.name,
                            type_name,
                            error = %err,
                            "Failed to load implementation from plugin"
                        );
                    }
                }
            }
        }

        loaded
    }

    /// Clear the catalog and caches, rediscover, and announce the reload
    ///
    /// No per-entry signals are sent for the cleared entries.
    pub fn reload(&self) -> Result<usize> {
        self.reset();
        self.discover()?;

        let count = self.len();
        self.signals().send(&RegistryEvent::Reloaded {
            registry_id: self.id(),
            registry: self.name().to_string(),
            count,
        });
        info!(registry = %self.name(), count, "Registry reloaded");

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StratagemConfig;
    use crate::implementation::Implementation;
    use crate::registry::Lookup;

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }

    struct BaseShape;
    struct Triangle;
    struct Square;
    struct Hexagon;

    impl Shape for BaseShape {
        fn sides(&self) -> u32 {
            0
        }
    }

    impl Shape for Triangle {
        fn sides(&self) -> u32 {
            3
        }
    }

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    impl Shape for Hexagon {
        fn sides(&self) -> u32 {
            6
        }
    }

    type ShapeImpl = Implementation<dyn Shape>;

    fn base() -> ShapeImpl {
        ShapeImpl::new::<BaseShape>("", || Box::new(BaseShape))
    }

    fn triangle() -> ShapeImpl {
        ShapeImpl::new::<Triangle>("triangle", || Box::new(Triangle))
    }

    fn square() -> ShapeImpl {
        ShapeImpl::new::<Square>("square", || Box::new(Square))
    }

    fn hexagon() -> ShapeImpl {
        ShapeImpl::new::<Hexagon>("hexagon", || Box::new(Hexagon))
    }

    fn broken() -> ShapeImpl {
        ShapeImpl::new::<Hexagon>("", || Box::new(Hexagon))
    }

    static SHAPES: [Declaration<dyn Shape>; 3] = [base, triangle, square];

    fn shapes() -> Registry<dyn Shape> {
        Registry::builder("Shapes").discover_from("shapes", &SHAPES).build()
    }

    #[test]
    fn test_discover_skips_abstract() {
        let registry = shapes();
        assert_eq!(registry.discover().unwrap(), 2);
        assert_eq!(registry.slugs(), vec!["triangle".to_string(), "square".to_string()]);

        // The abstract base is still resolvable by name
        let base = registry
            .get(Lookup::name(std::any::type_name::<BaseShape>()))
            .unwrap();
        assert_eq!(base.sides(), 0);
    }

    #[test]
    fn test_without_source_discovers_nothing() {
        let registry = Registry::<dyn Shape>::builder("Loose").build();
        assert_eq!(registry.discover().unwrap(), 0);
        assert!(registry.discovery_source().is_none());
    }

    #[test]
    fn test_plugins_load_and_skip_failures() {
        let registry = shapes();
        registry.add_plugin(
            Plugin::new("extra-shapes", "1.0.0")
                .with_implementation(hexagon)
                .with_implementation(broken),
        );

        assert_eq!(registry.discover().unwrap(), 3);
        assert!(registry.get(Lookup::slug("hexagon")).is_ok());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_disabled_plugin_is_ignored() {
        let registry = Registry::<dyn Shape>::builder("Shapes")
            .discover_from("shapes", &SHAPES)
            .with_config(StratagemConfig::default().with_disabled_plugins(["extra-shapes"]))
            .with_plugin(Plugin::new("extra-shapes", "1.0.0").with_implementation(hexagon))
            .build();

        registry.discover().unwrap();
        assert!(registry.get(Lookup::slug("hexagon")).is_err());
    }

    #[test]
    fn test_enabled_list_restricts_plugins() {
        let registry = Registry::<dyn Shape>::builder("Shapes")
            .with_config(StratagemConfig::default().with_enabled_plugins(["wanted"]))
            .with_plugin(Plugin::new("wanted", "0.1.0").with_implementation(hexagon))
            .with_plugin(Plugin::new("unwanted", "0.1.0").with_implementation(triangle))
            .build();

        registry.discover().unwrap();
        assert_eq!(registry.slugs(), vec!["hexagon".to_string()]);
    }

    #[test]
    fn test_reload_emits_single_event() {
        let registry = shapes();
        registry.discover().unwrap();
        registry.unregister("triangle").unwrap();
        registry.register(hexagon()).unwrap();

        let rx = registry.signals().subscribe();
        let count = registry.reload().unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.slugs(), vec!["triangle".to_string(), "square".to_string()]);

        // Registered events from rediscovery, then one Reloaded
        let events: Vec<RegistryEvent> = rx.try_iter().collect();
        let reloads: Vec<&RegistryEvent> = events
            .iter()
            .filter(|e| matches!(e, RegistryEvent::Reloaded { .. }))
            .collect();
        assert_eq!(reloads.len(), 1);
        assert!(matches!(events.last(), Some(RegistryEvent::Reloaded { count: 2, .. })));
        assert!(!events.iter().any(|e| matches!(e, RegistryEvent::Unregistered { .. })));
    }
}
