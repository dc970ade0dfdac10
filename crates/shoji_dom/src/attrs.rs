//! Declarative attribute projection
//!
//! Widgets describe the attributes a node should carry as an [`Attrs`] set:
//! each entry either sets a value or removes the attribute. Applying a set
//! only writes what differs, so re-applying the same set is a no-op and does
//! not trigger attribute callbacks.

use smallvec::SmallVec;

use crate::document::Document;
use crate::node::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    entries: SmallVec<[(&'static str, Option<String>); 8]>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`
    pub fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.entries.push((name, Some(value.into())));
        self
    }

    /// Remove `name`
    pub fn remove(mut self, name: &'static str) -> Self {
        self.entries.push((name, None));
        self
    }

    /// Set when `Some`, remove when `None`
    pub fn opt<V: Into<String>>(mut self, name: &'static str, value: Option<V>) -> Self {
        self.entries.push((name, value.map(Into::into)));
        self
    }

    /// Boolean attribute: present as `""` or absent
    pub fn flag(mut self, name: &'static str, present: bool) -> Self {
        self.entries.push((name, present.then(String::new)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the set to `node`; a missing node is ignored
    pub fn apply(&self, doc: &Document, node: Option<NodeId>) {
        let Some(node) = node else {
            return;
        };
        for (name, value) in &self.entries {
            match value {
                Some(value) => {
                    if doc.get_attribute(node, name).as_deref() != Some(value.as_str()) {
                        doc.set_attribute(node, name, value.as_str());
                    }
                }
                None => doc.remove_attribute(node, name),
            }
        }
    }

    /// Write the set to every present node
    pub fn apply_all(&self, doc: &Document, nodes: &[Option<NodeId>]) {
        for node in nodes {
            self.apply(doc, *node);
        }
    }
}
