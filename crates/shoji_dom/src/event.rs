//! Events and listener dispatch
//!
//! Listeners are single-threaded `Rc<dyn Fn>` callbacks keyed by node and
//! event type. Dispatch walks the bubble path from the target to the body,
//! honoring `stop_propagation` and `stop_immediate_propagation`. Listeners
//! removed by an earlier listener in the same dispatch do not run.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::document::Document;
use crate::node::NodeId;

/// Common event type names
pub mod event_types {
    pub const CLICK: &str = "click";
    pub const KEYDOWN: &str = "keydown";
    pub const CLOSE: &str = "close";
    pub const CANCEL: &str = "cancel";
    pub const TRANSITIONRUN: &str = "transitionrun";
    pub const TRANSITIONEND: &str = "transitionend";
}

/// Keyboard key of a `keydown` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Char(char),
}

impl Key {
    /// DOM `KeyboardEvent.key` name
    pub fn name(&self) -> String {
        match self {
            Key::Escape => "Escape".into(),
            Key::Enter => "Enter".into(),
            Key::Space => " ".into(),
            Key::Tab => "Tab".into(),
            Key::ArrowLeft => "ArrowLeft".into(),
            Key::ArrowRight => "ArrowRight".into(),
            Key::ArrowUp => "ArrowUp".into(),
            Key::ArrowDown => "ArrowDown".into(),
            Key::Home => "Home".into(),
            Key::End => "End".into(),
            Key::Char(c) => c.to_string(),
        }
    }
}

/// A dispatched event
///
/// Flags use interior mutability so listeners can cancel or stop an event
/// through a shared reference.
#[derive(Clone)]
pub struct Event {
    kind: String,
    bubbles: bool,
    key: Option<Key>,
    client_x: f32,
    client_y: f32,
    detail: Option<Rc<dyn Any>>,
    pub(crate) target: Cell<Option<NodeId>>,
    pub(crate) current_target: Cell<Option<NodeId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
}

impl Event {
    /// Non-bubbling event
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bubbles: false,
            key: None,
            client_x: 0.0,
            client_y: 0.0,
            detail: None,
            target: Cell::new(None),
            current_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
        }
    }

    pub fn bubbling(kind: impl Into<String>) -> Self {
        Self {
            bubbles: true,
            ..Self::new(kind)
        }
    }

    pub fn click(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            ..Self::bubbling(event_types::CLICK)
        }
    }

    pub fn keydown(key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::bubbling(event_types::KEYDOWN)
        }
    }

    /// Non-bubbling event carrying a typed payload
    pub fn custom<T: Any>(kind: impl Into<String>, detail: T) -> Self {
        Self {
            detail: Some(Rc::new(detail)),
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn key(&self) -> Option<Key> {
        self.key
    }

    pub fn client_x(&self) -> f32 {
        self.client_x
    }

    pub fn client_y(&self) -> f32 {
        self.client_y
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Payload of a custom event, if it is a `T`
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_ref()?.downcast_ref::<T>()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("bubbles", &self.bubbles)
            .field("key", &self.key)
            .field("target", &self.target.get())
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}

/// Event listener callback
pub type EventListener = Rc<dyn Fn(&Document, &Event)>;

/// Handle returned by [`Document::add_event_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct ListenerEntry {
    pub id: ListenerId,
    pub kind: String,
    pub callback: EventListener,
}

impl Document {
    /// Register a listener for `kind` events reaching `node`
    pub fn add_event_listener<F>(&self, node: NodeId, kind: &str, listener: F) -> ListenerId
    where
        F: Fn(&Document, &Event) + 'static,
    {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .entry(node)
            .or_default()
            .push(ListenerEntry {
                id,
                kind: kind.to_string(),
                callback: Rc::new(listener),
            });
        id
    }

    /// Remove a listener; unknown ids are ignored
    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(&node) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&node);
        }
        removed
    }

    /// Number of listeners attached to `node` for `kind`
    pub fn listener_count(&self, node: NodeId, kind: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(&node)
            .map(|entries| entries.iter().filter(|entry| entry.kind == kind).count())
            .unwrap_or(0)
    }

    fn has_listener(&self, node: NodeId, id: ListenerId) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(&node)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }

    /// Dispatch `event` at `target` and return it with its final flags
    pub fn dispatch_event(&self, target: NodeId, event: Event) -> Event {
        event.target.set(Some(target));
        let path = if event.bubbles {
            self.ancestors_inclusive(target)
        } else {
            vec![target]
        };

        tracing::trace!(kind = %event.kind, ?target, "dispatch");

        for node in path {
            event.current_target.set(Some(node));

            let listeners: SmallVec<[(ListenerId, EventListener); 4]> = self
                .inner
                .listeners
                .borrow()
                .get(&node)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|entry| entry.kind == event.kind)
                        .map(|entry| (entry.id, entry.callback.clone()))
                        .collect()
                })
                .unwrap_or_default();

            for (id, callback) in listeners {
                if event.immediate_propagation_stopped() {
                    break;
                }
                if !self.has_listener(node, id) {
                    continue;
                }
                callback(self, &event);
            }

            if event.propagation_stopped() {
                break;
            }
        }

        event.current_target.set(None);
        event
    }

    /// Activate `node` as a primary click at the origin
    ///
    /// Returns false when the click was swallowed by a disabled button.
    pub fn click(&self, node: NodeId) -> bool {
        self.click_at(node, 0.0, 0.0)
    }

    /// Click `node` at viewport coordinates
    pub fn click_at(&self, node: NodeId, client_x: f32, client_y: f32) -> bool {
        let swallowed = self
            .ancestors_inclusive(node)
            .into_iter()
            .any(|id| self.is_disabled_control(id));
        if swallowed {
            tracing::trace!(?node, "click on disabled control ignored");
            return false;
        }
        self.dispatch_event(node, Event::click(client_x, client_y));
        true
    }

    /// Press `key` with `target` focused
    ///
    /// An Escape that no listener cancelled becomes a close request for the
    /// nearest open dialog.
    pub fn key_down(&self, target: NodeId, key: Key) -> Event {
        let event = self.dispatch_event(target, Event::keydown(key));
        if key == Key::Escape && !event.default_prevented() {
            self.close_request(target);
        }
        event
    }
}
