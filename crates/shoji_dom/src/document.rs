//! Live document tree
//!
//! A [`Document`] owns every node in a slotmap and hands out [`NodeId`]
//! handles. It is cheap to clone: clones share the same tree. Closures that
//! outlive a call should capture a [`WeakDocument`] instead, otherwise the
//! listener table keeps the document alive forever.
//!
//! Custom element callbacks run synchronously from the mutating call:
//! inserting a subtree into the body connects its elements in tree order,
//! removing it disconnects them in tree order, and writing an observed
//! attribute notifies the element instance.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use rustc_hash::FxHashMap;
use shoji_animation::{transition_duration, FrameScheduler, ManualFrames};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::element::{self, AsAnyRc, CustomElement, ElementDefinition};
use crate::error::{DomError, ElementError, Result};
use crate::event::ListenerEntry;
use crate::node::{NodeData, NodeId, Rect};

/// Structural problem reported by a custom element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub node: NodeId,
    pub tag: String,
    pub error: ElementError,
}

pub(crate) struct DocumentInner {
    pub(crate) nodes: RefCell<SlotMap<NodeId, NodeData>>,
    pub(crate) body: NodeId,
    pub(crate) listeners: RefCell<FxHashMap<NodeId, SmallVec<[ListenerEntry; 2]>>>,
    pub(crate) next_listener: Cell<u64>,
    pub(crate) instances: RefCell<FxHashMap<NodeId, Rc<dyn CustomElement>>>,
    pub(crate) focused: Cell<Option<NodeId>>,
    pub(crate) frames: Rc<dyn FrameScheduler>,
    manual_frames: Option<Rc<ManualFrames>>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

/// Shared handle to a document tree
#[derive(Clone)]
pub struct Document {
    pub(crate) inner: Rc<DocumentInner>,
}

/// Non-owning handle to a [`Document`]
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document driven by a [`ManualFrames`] queue
    pub fn new() -> Self {
        let frames = Rc::new(ManualFrames::new());
        Self::build(frames.clone(), Some(frames))
    }

    /// Create an empty document with a host-provided frame source
    pub fn with_frames(frames: Rc<dyn FrameScheduler>) -> Self {
        Self::build(frames, None)
    }

    fn build(frames: Rc<dyn FrameScheduler>, manual_frames: Option<Rc<ManualFrames>>) -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData::element("body"));
        Self {
            inner: Rc::new(DocumentInner {
                nodes: RefCell::new(nodes),
                body,
                listeners: RefCell::new(FxHashMap::default()),
                next_listener: Cell::new(0),
                instances: RefCell::new(FxHashMap::default()),
                focused: Cell::new(None),
                frames,
                manual_frames,
                diagnostics: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    // =========================================================================
    // Frames
    // =========================================================================

    pub fn frames(&self) -> Rc<dyn FrameScheduler> {
        self.inner.frames.clone()
    }

    /// Advance the built-in frame queue by one frame
    ///
    /// Returns the number of callbacks that ran. Documents created with
    /// [`Document::with_frames`] are driven by their host and always return 0.
    pub fn run_animation_frame(&self) -> usize {
        match &self.inner.manual_frames {
            Some(frames) => frames.tick(),
            None => 0,
        }
    }

    /// Run frames until nothing is pending (bounded)
    pub fn run_animation_frames(&self, max_frames: usize) -> usize {
        match &self.inner.manual_frames {
            Some(frames) => frames.run_until_idle(max_frames),
            None => 0,
        }
    }

    // =========================================================================
    // Tree
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner
            .nodes
            .borrow_mut()
            .insert(NodeData::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&self, content: impl Into<String>) -> NodeId {
        self.inner
            .nodes
            .borrow_mut()
            .insert(NodeData::text(content.into()))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.inner.nodes.borrow().contains_key(node)
    }

    /// Lowercase tag name; `#text` for text nodes
    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.nodes.borrow().get(node).map(|data| data.tag.clone())
    }

    pub fn has_tag(&self, node: NodeId, tag: &str) -> bool {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .is_some_and(|data| data.tag == tag)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.nodes.borrow().get(node).and_then(|data| data.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    /// Node followed by its ancestors, nearest first
    pub fn ancestors_inclusive(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.inner.nodes.borrow();
        let mut chain = Vec::new();
        let mut current = nodes.contains_key(node).then_some(node);
        while let Some(id) = current {
            chain.push(id);
            current = nodes.get(id).and_then(|data| data.parent);
        }
        chain
    }

    /// Descendants in tree order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = self.subtree(node);
        if !out.is_empty() {
            out.remove(0);
        }
        out
    }

    /// `node` and its descendants in tree order
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.inner.nodes.borrow();
        let mut out = Vec::new();
        if !nodes.contains_key(node) {
            return out;
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(data) = nodes.get(id) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).contains(&ancestor)
    }

    /// Whether the node is attached under the body
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.ancestors_inclusive(node).last() == Some(&self.inner.body)
    }

    /// Nearest inclusive ancestor with the given tag
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let nodes = self.inner.nodes.borrow();
        let mut current = nodes.contains_key(node).then_some(node);
        while let Some(id) = current {
            let data = nodes.get(id)?;
            if data.tag == tag {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    /// Append `child` as the last child of `parent`
    ///
    /// A child that already has a parent is moved. When `parent` is
    /// connected, custom elements in the inserted subtree are connected in
    /// tree order before this returns.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        {
            let nodes = self.inner.nodes.borrow();
            let parent_data = nodes.get(parent).ok_or(DomError::UnknownNode)?;
            if !nodes.contains_key(child) {
                return Err(DomError::UnknownNode);
            }
            if parent_data.is_text() {
                return Err(DomError::HierarchyRequest);
            }
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        if self.parent(child).is_some() {
            self.remove(child);
        }

        {
            let mut nodes = self.inner.nodes.borrow_mut();
            if let Some(data) = nodes.get_mut(parent) {
                data.children.push(child);
            }
            if let Some(data) = nodes.get_mut(child) {
                data.parent = Some(parent);
            }
        }

        if self.is_connected(parent) {
            self.connect_subtree(child);
        }
        Ok(())
    }

    /// Detach `node` from its parent
    ///
    /// Custom elements in the detached subtree are disconnected in tree order.
    pub fn remove(&self, node: NodeId) {
        let was_connected = self.is_connected(node);
        let Some(parent) = self.parent(node) else {
            return;
        };

        {
            let mut nodes = self.inner.nodes.borrow_mut();
            if let Some(data) = nodes.get_mut(parent) {
                data.children.retain(|child| *child != node);
            }
            if let Some(data) = nodes.get_mut(node) {
                data.parent = None;
            }
        }

        if let Some(focused) = self.inner.focused.get() {
            if self.is_inclusive_ancestor(node, focused) {
                self.inner.focused.set(None);
            }
        }

        if was_connected {
            for id in self.subtree(node) {
                if let Some(instance) = self.instance_dyn(id) {
                    tracing::trace!(tag = ?self.tag(id), "disconnect");
                    instance.disconnected(self, id);
                }
            }
        }
    }

    fn connect_subtree(&self, root: NodeId) {
        for id in self.subtree(root) {
            // An earlier callback may have moved this node out again
            if !self.is_connected(id) {
                continue;
            }
            let Some(tag) = self.tag(id) else {
                continue;
            };
            let Some(definition) = element::lookup(&tag) else {
                continue;
            };

            let instance = self.upgrade(id, &definition);
            tracing::trace!(%tag, "connect");
            if let Err(error) = instance.connected(self, id) {
                self.report(id, error);
            }
        }
    }

    fn upgrade(&self, node: NodeId, definition: &ElementDefinition) -> Rc<dyn CustomElement> {
        if let Some(existing) = self.instance_dyn(node) {
            return existing;
        }
        let instance = (definition.construct)();
        self.inner
            .instances
            .borrow_mut()
            .insert(node, instance.clone());
        instance
    }

    pub(crate) fn instance_dyn(&self, node: NodeId) -> Option<Rc<dyn CustomElement>> {
        self.inner.instances.borrow().get(&node).cloned()
    }

    /// The custom element instance attached to `node`, if it is a `T`
    pub fn instance<T: Any>(&self, node: NodeId) -> Option<Rc<T>> {
        let instance = self.instance_dyn(node)?;
        AsAnyRc::as_any_rc(instance).downcast::<T>().ok()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .and_then(|data| data.attrs.get(name).cloned())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .is_some_and(|data| data.attrs.contains_key(name))
    }

    /// Attribute names in insertion order
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .map(|data| data.attrs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let old = {
            let mut nodes = self.inner.nodes.borrow_mut();
            let Some(data) = nodes.get_mut(node) else {
                return;
            };
            if data.is_text() {
                return;
            }
            data.attrs.insert(name.to_string(), value.clone())
        };
        self.attribute_changed(node, name, old.as_deref(), Some(&value));
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        let old = {
            let mut nodes = self.inner.nodes.borrow_mut();
            let Some(data) = nodes.get_mut(node) else {
                return;
            };
            data.attrs.shift_remove(name)
        };
        if old.is_some() {
            self.attribute_changed(node, name, old.as_deref(), None);
        }
    }

    /// Add or remove a boolean attribute
    pub fn toggle_attribute(&self, node: NodeId, name: &str, present: bool) {
        if present {
            if !self.has_attribute(node, name) {
                self.set_attribute(node, name, "");
            }
        } else {
            self.remove_attribute(node, name);
        }
    }

    fn attribute_changed(&self, node: NodeId, name: &str, old: Option<&str>, new: Option<&str>) {
        let Some(instance) = self.instance_dyn(node) else {
            return;
        };
        let Some(definition) = self.tag(node).and_then(|tag| element::lookup(&tag)) else {
            return;
        };
        if definition.observed_attributes.contains(&name) {
            instance.attribute_changed(self, node, name, old, new);
        }
    }

    // =========================================================================
    // Inline style and metrics
    // =========================================================================

    pub fn style_property(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .and_then(|data| data.style.get(property).cloned())
    }

    pub fn set_style_property(&self, node: NodeId, property: &str, value: impl Into<String>) {
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(node) {
            data.style.insert(property.to_string(), value.into());
        }
    }

    pub fn remove_style_property(&self, node: NodeId, property: &str) {
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(node) {
            data.style.shift_remove(property);
        }
    }

    /// Effective `transition-duration` of the node
    ///
    /// Only inline style is consulted; hosts that resolve stylesheets write
    /// the computed value inline.
    pub fn computed_transition_duration(&self, node: NodeId) -> Duration {
        self.style_property(node, "transition-duration")
            .map(|value| transition_duration(&value))
            .unwrap_or(Duration::ZERO)
    }

    pub fn scroll_height(&self, node: NodeId) -> f32 {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .map(|data| data.scroll_height)
            .unwrap_or(0.0)
    }

    pub fn set_scroll_height(&self, node: NodeId, height: f32) {
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(node) {
            data.scroll_height = height;
        }
    }

    pub fn bounding_client_rect(&self, node: NodeId) -> Rect {
        self.inner
            .nodes
            .borrow()
            .get(node)
            .map(|data| data.bounding_rect)
            .unwrap_or_default()
    }

    pub fn set_bounding_client_rect(&self, node: NodeId, rect: Rect) {
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(node) {
            data.bounding_rect = rect;
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        let ids = self.subtree(node);
        let nodes = self.inner.nodes.borrow();
        ids.iter()
            .filter_map(|id| nodes.get(*id).and_then(|data| data.text.as_deref()))
            .collect()
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Move focus to `node`
    ///
    /// Detached nodes and disabled buttons cannot take focus.
    pub fn focus(&self, node: NodeId) -> bool {
        if !self.is_connected(node) || self.is_disabled_control(node) {
            return false;
        }
        self.inner.focused.set(Some(node));
        true
    }

    pub fn blur(&self) {
        self.inner.focused.set(None);
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.inner.focused.get()
    }

    pub(crate) fn is_disabled_control(&self, node: NodeId) -> bool {
        self.has_tag(node, "button") && self.has_attribute(node, "disabled")
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Log and record a structural error raised by a custom element
    pub fn report(&self, node: NodeId, error: ElementError) {
        let tag = self.tag(node).unwrap_or_default();
        tracing::error!(%tag, %error, "custom element failed to attach");
        self.inner
            .diagnostics
            .borrow_mut()
            .push(Diagnostic { node, tag, error });
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.borrow().clone()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.inner.diagnostics.borrow_mut())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.inner.nodes.borrow().len())
            .field("instances", &self.inner.instances.borrow().len())
            .field("focused", &self.inner.focused.get())
            .finish()
    }
}
