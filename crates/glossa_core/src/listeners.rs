//! Listener registry
//!
//! Keeps state-change listeners addressable by a stable id so they can be
//! removed while other listeners are being notified.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, Weak};

new_key_type! {
    /// Unique identifier for a registered listener
    pub struct ListenerId;
}

/// Registered listeners, stored as shared callbacks
pub struct ListenerRegistry<F: ?Sized> {
    listeners: SlotMap<ListenerId, Arc<F>>,
}

impl<F: ?Sized> ListenerRegistry<F> {
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
        }
    }

    /// Register a listener and return its id
    pub fn register(&mut self, listener: Arc<F>) -> ListenerId {
        self.listeners.insert(listener)
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Clone out the current listeners so they can be called without holding
    /// the registry lock.
    pub fn snapshot(&self) -> SmallVec<[Arc<F>; 4]> {
        self.listeners.values().cloned().collect()
    }
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that owns a listener registry
pub(crate) trait ListenerHost: Send + Sync {
    fn remove_listener(&self, id: ListenerId);
}

/// Handle to a registered listener.
///
/// The listener is removed when the handle is dropped. A subscription that
/// outlives its store is inert.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: ListenerId,
    host: Weak<dyn ListenerHost>,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, host: Weak<dyn ListenerHost>) -> Self {
        Self { id, host }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(host) = self.host.upgrade() {
            host.remove_listener(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &(self.host.strong_count() > 0))
            .finish()
    }
}
