//! Custom element definitions
//!
//! Tags are registered once per process in a global registry. When an
//! element with a registered tag is connected to a [`Document`], the document
//! constructs an instance through the definition, keeps it alive for the
//! lifetime of the node and drives its lifecycle callbacks.

use std::any::Any;
use std::rc::Rc;
use std::sync::{LazyLock, RwLock};

use rustc_hash::FxHashMap;

use crate::document::Document;
use crate::error::ElementError;
use crate::node::NodeId;

/// Upcast support for [`Document::instance`]
pub trait AsAnyRc {
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAnyRc for T {
    fn as_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Lifecycle of a custom element instance
pub trait CustomElement: AsAnyRc {
    /// Called every time the node is inserted under the body
    ///
    /// Returning an error leaves the element inert; the document logs it and
    /// records a [`Diagnostic`](crate::Diagnostic).
    fn connected(self: Rc<Self>, document: &Document, node: NodeId) -> Result<(), ElementError>;

    /// Called every time the node is removed from the body
    fn disconnected(&self, _document: &Document, _node: NodeId) {}

    /// Called when an observed attribute is written, connected or not
    fn attribute_changed(
        &self,
        _document: &Document,
        _node: NodeId,
        _name: &str,
        _old: Option<&str>,
        _new: Option<&str>,
    ) {
    }
}

/// Registration record for a custom element tag
#[derive(Debug, Clone, Copy)]
pub struct ElementDefinition {
    pub tag: &'static str,
    pub observed_attributes: &'static [&'static str],
    pub construct: fn() -> Rc<dyn CustomElement>,
}

static REGISTRY: LazyLock<RwLock<FxHashMap<&'static str, ElementDefinition>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Register a tag; returns false if it was already defined
///
/// Redefinition keeps the first definition.
pub fn define(definition: ElementDefinition) -> bool {
    let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    if registry.contains_key(definition.tag) {
        tracing::warn!(tag = definition.tag, "custom element already defined");
        return false;
    }
    tracing::debug!(tag = definition.tag, "custom element defined");
    registry.insert(definition.tag, definition);
    true
}

pub fn lookup(tag: &str) -> Option<ElementDefinition> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(tag)
        .copied()
}

pub fn is_defined(tag: &str) -> bool {
    lookup(tag).is_some()
}
