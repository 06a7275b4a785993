//! Session-change listener registry shared by provider implementations.
//!
//! Each subscriber gets its own unbounded channel. Once the provider has
//! finished restoring state, new subscribers immediately receive the current
//! session, which mirrors how auth backends fire a listener on registration.

use crate::Session;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::trace;

/// Value delivered to listeners: the session after the change, if any.
pub type SessionChange = Option<Session>;

struct Registry {
    next_id: u64,
    senders: BTreeMap<u64, mpsc::UnboundedSender<SessionChange>>,
    /// False until the provider has restored its persisted state.
    ready: bool,
    current: SessionChange,
}

/// Listener registry. Cheap to clone; clones share the same listeners.
#[derive(Clone)]
pub struct SessionListeners {
    inner: Arc<Mutex<Registry>>,
}

impl SessionListeners {
    /// Registry for a provider whose state is known up front.
    pub fn new(current: SessionChange) -> Self {
        Self::build(true, current)
    }

    /// Registry for a provider still restoring state; nothing is delivered
    /// until the first [`notify`](Self::notify).
    pub fn pending() -> Self {
        Self::build(false, None)
    }

    fn build(ready: bool, current: SessionChange) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                senders: BTreeMap::new(),
                ready,
                current,
            })),
        }
    }

    /// Register a listener.
    pub fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.inner.lock();

        let id = registry.next_id;
        registry.next_id += 1;

        if registry.ready {
            let _ = tx.send(registry.current.clone());
        }
        registry.senders.insert(id, tx);
        trace!(listener_id = id, "session listener added");

        SessionSubscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.inner),
            closed: false,
        }
    }

    /// Record a session change and deliver it to every listener.
    pub fn notify(&self, session: SessionChange) {
        let mut registry = self.inner.lock();
        registry.ready = true;
        registry.current = session;

        let current = registry.current.clone();
        registry
            .senders
            .retain(|_, tx| tx.send(current.clone()).is_ok());
    }

    /// Whether the provider has restored its state.
    pub fn is_ready(&self) -> bool {
        self.inner.lock().ready
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().senders.len()
    }
}

/// Handle for one registered listener.
///
/// Dropping the handle unregisters it too; [`close`](Self::close) makes the
/// removal explicit at the call site.
pub struct SessionSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<SessionChange>,
    registry: Weak<Mutex<Registry>>,
    closed: bool,
}

impl SessionSubscription {
    /// Wait for the next session change.
    ///
    /// Returns `None` once the registry is gone or the handle was closed.
    pub async fn recv(&mut self) -> Option<SessionChange> {
        if self.closed {
            return None;
        }
        self.receiver.recv().await
    }

    /// Unregister the listener. Pending deliveries are discarded.
    pub fn close(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.receiver.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().senders.remove(&self.id);
            trace!(listener_id = self.id, "session listener removed");
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_registry_delivers_current_on_subscribe() {
        let listeners = SessionListeners::new(Some(Session::anonymous("uid-1")));
        let mut sub = listeners.subscribe();

        let first = sub.recv().await.unwrap();
        assert_eq!(first.unwrap().id, "uid-1");
    }

    #[tokio::test]
    async fn test_pending_registry_waits_for_notify() {
        let listeners = SessionListeners::pending();
        let mut sub = listeners.subscribe();

        assert!(sub.receiver.try_recv().is_err());

        listeners.notify(None);
        assert_eq!(sub.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_notify_reaches_every_listener() {
        let listeners = SessionListeners::new(None);
        let mut a = listeners.subscribe();
        let mut b = listeners.subscribe();
        assert_eq!(a.recv().await, Some(None));
        assert_eq!(b.recv().await, Some(None));

        listeners.notify(Some(Session::anonymous("uid-2")));
        assert_eq!(a.recv().await.unwrap().unwrap().id, "uid-2");
        assert_eq!(b.recv().await.unwrap().unwrap().id, "uid-2");
    }

    #[test]
    fn test_close_and_drop_unregister() {
        let listeners = SessionListeners::new(None);
        let a = listeners.subscribe();
        let b = listeners.subscribe();
        assert_eq!(listeners.listener_count(), 2);
        assert_ne!(a.id, b.id);

        a.close();
        assert_eq!(listeners.listener_count(), 1);

        drop(b);
        assert_eq!(listeners.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let listeners = SessionListeners::new(None);
        let sub = listeners.subscribe();
        drop(listeners);
        sub.close();
    }
}
