//! Identifier-keyed publish/subscribe dispatch for decoded packets.
//!
//! [`Emitter`] delivers each event to the listeners registered under the
//! event's identifier, synchronously and in registration order. Listeners may
//! publish, subscribe, or unsubscribe from inside a delivery; the listener
//! list is snapshotted before any listener runs, so such changes take effect
//! from the next publish. A single-use listener is unregistered as it is
//! called, so one that an earlier failure kept from running stays registered.
//!
//! A listener returning an error stops delivery of that event and the error
//! propagates to the publisher. Listeners are not isolated from each other.

use std::{cell::RefCell, collections::HashMap, error::Error, rc::Rc};

use thiserror::Error;

use crate::packet::Packet;

/// Boxed error returned by a failing listener.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Callback registered with an [`Emitter`].
///
/// Registrations are compared by pointer, so keep a clone of the `Rc` to
/// unsubscribe later.
pub type Listener<E> = Rc<dyn Fn(&E) -> Result<(), BoxError>>;

/// Wrap a closure as a [`Listener`].
pub fn listener<E, F>(callback: F) -> Listener<E>
where
    F: Fn(&E) -> Result<(), BoxError> + 'static,
{
    Rc::new(callback)
}

/// Events that name the key they are published under.
pub trait Identified {
    /// Routing key, or `None` when the event cannot be delivered.
    fn identifier(&self) -> Option<&str>;
}

impl Identified for Packet {
    fn identifier(&self) -> Option<&str> { Packet::identifier(self) }
}

/// A listener failed while handling an event.
#[derive(Debug, Error)]
#[error("listener for `{key}` failed: {source}")]
pub struct ListenerError {
    key: String,
    #[source]
    source: BoxError,
}

impl ListenerError {
    /// Key of the event being delivered when the listener failed.
    #[must_use]
    pub fn key(&self) -> &str { &self.key }
}

struct Subscription<E> {
    listener: Listener<E>,
    once: bool,
}

/// Synchronous, reentrant event router keyed by identifier.
pub struct Emitter<E> {
    listeners: RefCell<HashMap<String, Vec<Subscription<E>>>>,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
        }
    }
}

impl<E> std::fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.borrow();
        let mut keys: Vec<&str> = listeners.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Emitter").field("keys", &keys).finish()
    }
}

impl<E> Emitter<E> {
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl<E: Identified> Emitter<E> {
    /// Register `listener` under `key`.
    ///
    /// Registering the same listener twice under one key has no effect.
    pub fn subscribe(&self, key: impl Into<String>, listener: Listener<E>) {
        self.insert(key.into(), listener, false);
    }

    /// Register `listener` under `key` for a single delivery.
    pub fn subscribe_once(&self, key: impl Into<String>, listener: Listener<E>) {
        self.insert(key.into(), listener, true);
    }

    /// Remove `listener` from `key`, returning whether it was registered.
    pub fn unsubscribe(&self, key: &str, listener: &Listener<E>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(subscriptions) = listeners.get_mut(key) else {
            return false;
        };
        let before = subscriptions.len();
        subscriptions.retain(|subscription| !Rc::ptr_eq(&subscription.listener, listener));
        let removed = subscriptions.len() != before;
        if subscriptions.is_empty() {
            listeners.remove(key);
        }
        removed
    }

    /// Number of listeners registered under `key`.
    #[must_use]
    pub fn listener_count(&self, key: &str) -> usize {
        self.listeners.borrow().get(key).map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener registered under its identifier.
    ///
    /// Does nothing when the event has no identifier or nobody listens.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] from the first listener that fails;
    /// listeners after it do not see the event.
    pub fn publish(&self, event: &E) -> Result<(), ListenerError> {
        let Some(key) = event.identifier() else {
            return Ok(());
        };
        for (listener, once) in self.snapshot(key) {
            if once {
                self.remove_once(key, &listener);
            }
            listener(event).map_err(|source| ListenerError {
                key: key.to_owned(),
                source,
            })?;
        }
        Ok(())
    }

    fn insert(&self, key: String, listener: Listener<E>, once: bool) {
        let mut listeners = self.listeners.borrow_mut();
        let subscriptions = listeners.entry(key).or_default();
        if subscriptions
            .iter()
            .any(|subscription| Rc::ptr_eq(&subscription.listener, &listener))
        {
            return;
        }
        subscriptions.push(Subscription { listener, once });
    }

    fn snapshot(&self, key: &str) -> Vec<(Listener<E>, bool)> {
        self.listeners
            .borrow()
            .get(key)
            .map(|subscriptions| {
                subscriptions
                    .iter()
                    .map(|subscription| (Rc::clone(&subscription.listener), subscription.once))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop a single-use registration just before it is delivered to.
    fn remove_once(&self, key: &str, listener: &Listener<E>) {
        let mut listeners = self.listeners.borrow_mut();
        let Some(subscriptions) = listeners.get_mut(key) else {
            return;
        };
        subscriptions.retain(|subscription| {
            !(subscription.once && Rc::ptr_eq(&subscription.listener, listener))
        });
        if subscriptions.is_empty() {
            listeners.remove(key);
        }
    }
}
