//! Event channel - synchronous publish/subscribe for graph notifications
//! and connector directives.
//!
//! Delivery is immediate: `publish` runs every handler before it returns.
//! A [`Subscription`] handle owns the registration; dropping it removes the
//! handler, so a torn-down connector can never be called back.

use crate::systems::NodeData;
use hecs::Entity;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Notifications published when the node graph gains an edge
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// Carries the parent's data after the child was appended
    ChildAdded(NodeData),
    /// Carries the child's data after the parent was appended
    ParentAdded(NodeData),
}

/// Which connectors a hide directive applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideTarget {
    /// Every connector that has not committed yet
    All,
    Connector(Entity),
}

impl HideTarget {
    pub fn matches(&self, connector: Entity) -> bool {
        match self {
            HideTarget::All => true,
            HideTarget::Connector(e) => *e == connector,
        }
    }
}

/// External instructions delivered to live connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Hide(HideTarget),
    Validity(bool),
}

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Handler<E>)>,
}

/// Single-threaded event bus
pub struct EventBus<E> {
    listeners: Rc<RefCell<Listeners<E>>>,
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a handler. It stays registered until the handle is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            let handler: Handler<E> = Rc::new(RefCell::new(handler));
            listeners.entries.push((id, handler));
            id
        };

        let weak: Weak<RefCell<Listeners<E>>> = Rc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.borrow_mut().entries.retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    /// Deliver `event` to every handler registered at the time of the call.
    /// Returns how many handlers ran.
    pub fn publish(&self, event: &E) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while we deliver
        let handlers: Vec<(u64, Handler<E>)> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(id, h)| (*id, Rc::clone(h)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            // Unsubscribed by an earlier handler during this publish
            if !self.listeners.borrow().entries.iter().any(|(i, _)| *i == id) {
                continue;
            }
            match handler.try_borrow_mut() {
                Ok(mut h) => {
                    (&mut *h)(event);
                    delivered += 1;
                }
                Err(_) => log::warn!("skipping re-entrant event handler"),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by [`EventBus::subscribe`]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe now instead of at drop.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
