//! Single-threaded event feeds with scoped subscriptions.
//!
//! Everything in a cell view runs on one thread, so listeners are plain
//! `Rc<dyn Fn>` closures. A [`Subscription`] unregisters its listener when it
//! is disposed or dropped; a [`DisposableStore`] keeps a group of them alive
//! until teardown.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Emitter
// ─────────────────────────────────────────────────────────────────────────────

/// A typed event feed.
///
/// Cloning an emitter yields another handle to the same listener list.
pub struct Emitter<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener. It stays registered while the returned
    /// subscription is alive.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Deliver `value` to every listener registered at the time of the call.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being notified.
    pub fn fire(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscription
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a registered listener. Dropping it unregisters the listener.
#[must_use = "dropping a subscription immediately unregisters its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Unregister the listener now.
    pub fn dispose(mut self) {
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

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Disposable Store
// ─────────────────────────────────────────────────────────────────────────────

/// A group of subscriptions released together.
#[derive(Debug, Default)]
pub struct DisposableStore {
    subscriptions: Vec<Subscription>,
}

impl DisposableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Release every held subscription.
    pub fn dispose(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_fire_reaches_listener() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = emitter.subscribe(move |v| seen_clone.set(*v));

        emitter.fire(&7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let emitter: Emitter<()> = Emitter::new();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let sub = emitter.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        emitter.fire(&());
        drop(sub);
        emitter.fire(&());

        assert_eq!(count.get(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let emitter: Emitter<()> = Emitter::new();
        let sub = emitter.subscribe(|_| {});
        assert_eq!(emitter.listener_count(), 1);
        sub.dispose();
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_store_releases_all() {
        let emitter: Emitter<()> = Emitter::new();
        let mut store = DisposableStore::new();
        store.add(emitter.subscribe(|_| {}));
        store.add(emitter.subscribe(|_| {}));
        assert_eq!(store.len(), 2);
        assert_eq!(emitter.listener_count(), 2);

        store.dispose();
        assert!(store.is_empty());
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_emitter() {
        let emitter: Emitter<()> = Emitter::new();
        let sub = emitter.subscribe(|_| {});
        drop(emitter);
        // Unregistering against a dropped registry is a no-op.
        drop(sub);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_fire() {
        let emitter: Emitter<()> = Emitter::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_clone = Rc::clone(&slot);
        let sub = emitter.subscribe(move |_| {
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        emitter.fire(&());
        assert_eq!(emitter.listener_count(), 0);
    }
}
