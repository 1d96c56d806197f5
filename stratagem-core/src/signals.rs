//! Change notifications
//!
//! Registries publish a [`RegistryEvent`] after every successful write. Two
//! ways to listen:
//!
//! - [`SignalHub::connect`] - a callback run synchronously on the writing
//!   thread, after the registry lock is released
//! - [`SignalHub::subscribe`] - an unbounded channel; dropped receivers are
//!   pruned on the next send

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

/// Process-unique registry identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegistryId(u64);

impl RegistryId {
    /// Allocate the next id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RegistryId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A change to a registry's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// An implementation was stored (new or overwritten)
    Registered {
        registry_id: RegistryId,
        registry: String,
        slug: String,
        type_name: &'static str,
    },
    /// An implementation was removed
    Unregistered {
        registry_id: RegistryId,
        registry: String,
        slug: String,
    },
    /// The catalog was cleared and rediscovered
    Reloaded {
        registry_id: RegistryId,
        registry: String,
        count: usize,
    },
}

impl RegistryEvent {
    /// Id of the registry that changed
    pub fn registry_id(&self) -> RegistryId {
        match self {
            RegistryEvent::Registered { registry_id, .. }
            | RegistryEvent::Unregistered { registry_id, .. }
            | RegistryEvent::Reloaded { registry_id, .. } => *registry_id,
        }
    }

    /// Name of the registry that changed
    pub fn registry(&self) -> &str {
        match self {
            RegistryEvent::Registered { registry, .. }
            | RegistryEvent::Unregistered { registry, .. }
            | RegistryEvent::Reloaded { registry, .. } => registry,
        }
    }
}

/// Callback connected to a hub
pub type SignalHandler = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Fan-out point for registry events
#[derive(Default)]
pub struct SignalHub {
    handlers: RwLock<Vec<SignalHandler>>,
    subscribers: Mutex<Vec<Sender<RegistryEvent>>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` for every future event
    pub fn connect<F>(&self, handler: F)
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push(Arc::new(handler));
    }

    /// Receive every future event on a channel
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to all handlers and subscribers
    pub fn send(&self, event: &RegistryEvent) {
        // Snapshot so handlers may connect further handlers
        let handlers: Vec<SignalHandler> = self.handlers.read().clone();
        for handler in &handlers {
            handler(event);
        }

        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHub")
            .field("handlers", &self.handler_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn registered(slug: &str) -> RegistryEvent {
        RegistryEvent::Registered {
            registry_id: RegistryId(42),
            registry: "Notifiers".to_string(),
            slug: slug.to_string(),
            type_name: "app::Email",
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = RegistryId::next();
        let b = RegistryId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_connect_runs_handlers() {
        let hub = SignalHub::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        hub.connect(move |event| {
            assert_eq!(event.registry(), "Notifiers");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hub.send(&registered("email"));
        hub.send(&registered("sms"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribe_receives_events() {
        let hub = SignalHub::new();
        let rx = hub.subscribe();

        hub.send(&registered("email"));

        let event = rx.try_recv().unwrap();
        assert_eq!(event, registered("email"));
        assert_eq!(event.registry_id(), RegistryId(42));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let hub = SignalHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.subscriber_count(), 2);

        hub.send(&registered("email"));
        assert_eq!(hub.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(registered("email")).unwrap();
        assert_eq!(json["event"], "registered");
        assert_eq!(json["slug"], "email");
        assert_eq!(json["registry_id"], 42);
    }
}
