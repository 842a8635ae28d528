
use std::sync::{Arc, RwLock, Weak};

type Listener<E> = Box<dyn FnMut(&E) + Send + Sync>;

struct HubInner<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Publish/subscribe hub with revocable subscriptions.
///
/// Listeners run synchronously on `emit` and must not subscribe to or
/// revoke from the hub they are registered on.
pub struct EventHub<E>(Arc<RwLock<HubInner<E>>>);

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        EventHub(self.0.clone())
    }
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        EventHub(Arc::new(RwLock::new(HubInner {
            next_id: 0,
            listeners: Vec::new(),
        })))
    }

    pub fn subscribe(&self, listener: Listener<E>) -> Subscription<E> {
        let mut inner = self.0.write().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        Subscription {
            hub: Arc::downgrade(&self.0),
            id,
        }
    }

    pub fn emit(&self, event: &E) {
        let mut inner = self.0.write().unwrap();
        for (_, listener) in inner.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.read().unwrap().listeners.len()
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a single registered listener. Dropping it removes the
/// listener from the hub, exactly once.
pub struct Subscription<E> {
    hub: Weak<RwLock<HubInner<E>>>,
    id: u64,
}

impl<E> Subscription<E> {
    pub fn revoke(self) {}
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.write().unwrap().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
