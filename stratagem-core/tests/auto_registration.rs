//! Auto-registration through link-time declaration slices.
//!
//! Each notifier below adds itself to `NOTIFIERS` next to its own type; the
//! registry only knows the slice.

use std::any::type_name;

use linkme::distributed_slice;
use stratagem_core::{Declaration, Implementation, Lookup, Plugin, Registry, RegistryEvent, StratagemConfig};

trait Notifier: Send + Sync {
    fn send(&self, message: &str) -> String;
}

type NotifierImpl = Implementation<dyn Notifier>;

#[distributed_slice]
static NOTIFIERS: [Declaration<dyn Notifier>] = [..];

// ═══════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════

struct BaseNotifier;

impl Notifier for BaseNotifier {
    fn send(&self, _message: &str) -> String {
        String::new()
    }
}

#[distributed_slice(NOTIFIERS)]
static BASE: Declaration<dyn Notifier> = || NotifierImpl::new::<BaseNotifier>("", || Box::new(BaseNotifier));

struct Email;

impl Notifier for Email {
    fn send(&self, message: &str) -> String {
        format!("email: {}", message)
    }
}

#[distributed_slice(NOTIFIERS)]
static EMAIL: Declaration<dyn Notifier> = || {
    NotifierImpl::new::<Email>("email", || Box::new(Email))
        .implements("Notifier")
        .with_priority(10)
};

#[allow(clippy::upper_case_acronyms)]
struct SMS;

impl Notifier for SMS {
    fn send(&self, message: &str) -> String {
        format!("sms: {}", message)
    }
}

#[distributed_slice(NOTIFIERS)]
static SMS_NOTIFIER: Declaration<dyn Notifier> = || {
    NotifierImpl::new::<SMS>("sms", || Box::new(SMS))
        .implements("Notifier")
        .with_priority(20)
};

struct Pager;

impl Notifier for Pager {
    fn send(&self, message: &str) -> String {
        format!("pager: {}", message)
    }
}

fn pager() -> NotifierImpl {
    NotifierImpl::new::<Pager>("pager", || Box::new(Pager)).implements("Notifier")
}

fn notifiers() -> Registry<dyn Notifier> {
    Registry::builder("Notifiers")
        .with_interface("Notifier")
        .discover_from("notifiers", &NOTIFIERS)
        .build()
}

fn slugs_sorted(registry: &Registry<dyn Notifier>) -> Vec<String> {
    let mut slugs = registry.slugs();
    slugs.sort();
    slugs
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_discovery_registers_every_declaration() {
    let registry = notifiers();
    assert_eq!(registry.discover().unwrap(), 2);

    // Link order is unspecified, so compare as a set
    assert_eq!(slugs_sorted(&registry), vec!["email".to_string(), "sms".to_string()]);
    assert_eq!(registry.get(Lookup::slug("sms")).unwrap().send("hi"), "sms: hi");

    // Choices are ordered by priority regardless of link order
    assert_eq!(
        registry.get_choices(),
        vec![
            ("email".to_string(), "Email".to_string()),
            ("sms".to_string(), "SMS".to_string()),
        ]
    );
}

#[test]
fn test_abstract_declaration_resolves_by_name_only() {
    let registry = notifiers();
    registry.discover().unwrap();

    assert!(registry.get(Lookup::slug("")).is_err());
    let base = registry.get(Lookup::name(type_name::<BaseNotifier>())).unwrap();
    assert_eq!(base.send("hi"), "");
}

#[test]
fn test_discover_is_repeatable() {
    let registry = notifiers();
    registry.discover().unwrap();
    registry.discover().unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_reload_restores_declared_state() {
    let registry = notifiers();
    registry.discover().unwrap();
    registry.unregister("email").unwrap();
    registry.register(pager()).unwrap();

    let rx = registry.signals().subscribe();
    assert_eq!(registry.reload().unwrap(), 2);
    assert_eq!(slugs_sorted(&registry), vec!["email".to_string(), "sms".to_string()]);

    let reloads = rx
        .try_iter()
        .filter(|e| matches!(e, RegistryEvent::Reloaded { .. }))
        .count();
    assert_eq!(reloads, 1);
}

#[test]
fn test_plugins_extend_discovery() {
    let registry = Registry::<dyn Notifier>::builder("Notifiers")
        .with_interface("Notifier")
        .discover_from("notifiers", &NOTIFIERS)
        .with_plugin(Plugin::new("paging", "2.1.0").with_implementation(pager))
        .build();

    assert_eq!(registry.discover().unwrap(), 3);
    assert_eq!(registry.get(Lookup::slug("pager")).unwrap().send("up"), "pager: up");
}

#[test]
fn test_plugins_respect_configuration() {
    let config = StratagemConfig::from_json_str(r#"{"disabled_plugins": ["paging"]}"#).unwrap();
    let registry = Registry::<dyn Notifier>::builder("Notifiers")
        .discover_from("notifiers", &NOTIFIERS)
        .with_config(config)
        .with_plugin(Plugin::new("paging", "2.1.0").with_implementation(pager))
        .build();

    assert_eq!(registry.discover().unwrap(), 2);
    assert!(registry.get(Lookup::slug("pager")).err().unwrap().is_not_found());
}
