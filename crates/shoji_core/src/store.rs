//! Shoji Store - Zustand-inspired per-widget state container
//!
//! Every widget root owns exactly one [`Store`]. Child parts never own it; they
//! hold a non-owning reference to the root and read or patch the store through
//! it. Listeners are notified synchronously inside the `set`/`update` call that
//! changed the state, so a listener always observes the state after the
//! mutating call returned its write but before the outer event handler ends.
//!
//! # Selector subscriptions
//!
//! [`Store::subscribe_with_selector`] projects the state onto a slice and only
//! invokes the listener when that slice differs (by `PartialEq`) from the slice
//! it was last notified with. Unrelated field updates never reach the listener.
//!
//! # Example
//!
//! ```
//! use shoji_core::store::Store;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Clone, Default, PartialEq)]
//! struct DialogState {
//!     open: bool,
//!     modal: bool,
//! }
//!
//! let store = Store::new(DialogState::default());
//! let opened = Rc::new(Cell::new(0));
//!
//! let counter = opened.clone();
//! let _sub = store.subscribe_with_selector(
//!     |s: &DialogState| s.open,
//!     move |open, _previous| {
//!         if *open {
//!             counter.set(counter.get() + 1);
//!         }
//!     },
//! );
//!
//! store.update(|s| s.modal = true); // open unchanged, listener skipped
//! store.update(|s| s.open = true);
//! assert_eq!(opened.get(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Listener<T> = Rc<dyn Fn(&T)>;

/// Ordered listener table. Ids are never reused so a stale
/// [`Subscription`] can't remove somebody else's listener.
struct Subscribers<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

impl<T> Subscribers<T> {
    fn insert(&mut self, listener: Listener<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// A single-threaded state container with selector-gated subscriptions
pub struct Store<T> {
    state: RefCell<T>,
    subscribers: Rc<RefCell<Subscribers<T>>>,
}

impl<T: Clone + PartialEq + 'static> Store<T> {
    /// Create a store holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            state: RefCell::new(initial),
            subscribers: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Snapshot of the current state
    pub fn get(&self) -> T {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it
    ///
    /// The closure must not write to this store.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Replace the whole state
    pub fn set(&self, state: T) -> bool {
        self.update(move |current| *current = state)
    }

    /// Patch the state in place
    ///
    /// Fields the closure does not touch keep their value. Returns `true` when
    /// the state changed and listeners were notified.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.update_with(|state| {
            f(state);
        })
        .1
    }

    /// Patch the state and return a value computed by the patch
    pub fn update_with<F, R>(&self, f: F) -> (R, bool)
    where
        F: FnOnce(&mut T) -> R,
    {
        // Patch a copy so the closure may read this store freely.
        let mut next = self.state.borrow().clone();
        let result = f(&mut next);

        let changed = {
            let mut state = self.state.borrow_mut();
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        };

        if changed {
            self.notify(&next);
        }
        (result, changed)
    }

    /// Subscribe to every change of the whole state
    ///
    /// The listener receives `(new, previous)`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T, &T) + 'static,
    {
        self.subscribe_with_selector(|state: &T| state.clone(), listener)
    }

    /// Subscribe to a projected slice of the state
    ///
    /// The listener receives `(new_slice, previous_slice)` and only runs when the
    /// slice differs from the one it was last notified with.
    pub fn subscribe_with_selector<S, Sel, F>(&self, selector: Sel, listener: F) -> Subscription
    where
        S: Clone + PartialEq + 'static,
        Sel: Fn(&T) -> S + 'static,
        F: Fn(&S, &S) + 'static,
    {
        let last_seen = RefCell::new(selector(&self.state.borrow()));

        let wrapped: Listener<T> = Rc::new(move |state: &T| {
            let next = selector(state);
            let previous = {
                let mut last = last_seen.borrow_mut();
                if *last == next {
                    return;
                }
                std::mem::replace(&mut *last, next.clone())
            };
            listener(&next, &previous);
        });

        let id = self.subscribers.borrow_mut().insert(wrapped);
        let subscribers = Rc::downgrade(&self.subscribers);

        Subscription::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.borrow_mut().remove(id);
            }
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    fn notify(&self, snapshot: &T) {
        let listeners: Vec<(u64, Listener<T>)> = self.subscribers.borrow().entries.clone();
        tracing::trace!(listeners = listeners.len(), "store changed");

        for (id, listener) in listeners {
            // An earlier listener may have torn this one down.
            if !self.subscribers.borrow().contains(id) {
                continue;
            }
            listener(snapshot);
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.borrow())
            .field("subscribers", &self.subscribers.borrow().entries.len())
            .finish()
    }
}

/// Handle for a store listener
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) removes the
/// listener. Unsubscribing after the store is gone is a no-op.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap an arbitrary teardown closure
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Remove the listener now
    pub fn unsubscribe(mut self) {
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
