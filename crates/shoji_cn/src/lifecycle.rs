//! Shared part plumbing
//!
//! Every part resolves its collaborators when it connects, keeps the
//! resulting subscriptions and listeners in a [`Bindings`] and drops all of
//! them when it disconnects, so nothing fires against a detached node.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use shoji_core::Subscription;
use shoji_dom::{Document, ElementError, Event, ListenerId, NodeId};

/// Subscriptions and DOM listeners owned by a connected part
#[derive(Default)]
pub(crate) struct Bindings {
    subscriptions: RefCell<Vec<Subscription>>,
    listeners: RefCell<Vec<(NodeId, ListenerId)>>,
}

impl Bindings {
    pub fn hold(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Add a listener that is removed on [`Bindings::release`]
    pub fn listen<F>(&self, doc: &Document, node: NodeId, kind: &str, listener: F) -> ListenerId
    where
        F: Fn(&Document, &Event) + 'static,
    {
        let id = doc.add_event_listener(node, kind, listener);
        self.listeners.borrow_mut().push((node, id));
        id
    }

    pub fn release(&self, doc: &Document) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);

        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for (node, id) in listeners {
            doc.remove_event_listener(node, id);
        }
    }
}

/// Nearest ancestor `tag` element together with its upgraded instance
pub(crate) fn find_ancestor<T: Any>(
    doc: &Document,
    node: NodeId,
    part: &'static str,
    ancestor: &'static str,
) -> Result<(NodeId, Rc<T>), ElementError> {
    let missing = || ElementError::MissingAncestor { part, ancestor };
    let found = doc.parent(node).and_then(|parent| doc.closest(parent, ancestor));
    let found = found.ok_or_else(missing)?;
    let instance = doc.instance::<T>(found).ok_or_else(missing)?;
    Ok((found, instance))
}

/// Reveal markup hidden until upgrade
pub(crate) fn remove_cloak(doc: &Document, node: NodeId) {
    doc.remove_attribute(node, "cloak");
}

/// `"true"` / `"false"` for ARIA boolean attributes
pub(crate) fn aria_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
