//! Accordion component for expandable content sections
//!
//! A set of vertically stacked collapsible sections. Supports single-open
//! (only one section open at a time) or multi-open modes.
//!
//! # Markup
//!
//! ```html
//! <ui-accordion mode="single" value="item-1" collapsible>
//!   <ui-accordion-item value="item-1">
//!     <ui-accordion-header>
//!       <ui-accordion-trigger><button>Is it accessible?</button></ui-accordion-trigger>
//!     </ui-accordion-header>
//!     <ui-accordion-content>Yes.</ui-accordion-content>
//!   </ui-accordion-item>
//! </ui-accordion>
//! ```
//!
//! The root owns a [`Store`] with the aggregate selection; every item owns a
//! small store with its own open/disabled flags. Triggers, headers and content
//! subscribe to their item and project `data-state`, `aria-*` and `hidden`.
//!
//! # Content transitions
//!
//! When the content has a non-zero `transition-duration`, opening and closing
//! are staged across animation frames:
//!
//! - open: `data-starting-style` and `--accordion-content-height` are written
//!   together, then the marker is cleared two frames later so CSS animates
//!   from the starting style to the measured height
//! - close: the height is pinned first, then `data-ending-style` is written
//!   two frames later; `transitionend` clears both and hides the content
//!
//! A state change that arrives while a transition runs retargets it instead
//! of starting over.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use shoji_animation::after_frames;
use shoji_core::Store;
use shoji_dom::{
    event_types, Attrs, CustomElement, Document, ElementDefinition, ElementError, Event,
    ListenerId, NodeId, Selector,
};

use crate::ids::{non_empty, random_id};
use crate::lifecycle::{aria_bool, find_ancestor, remove_cloak, Bindings};
use crate::ON_VALUE_CHANGE;

pub const ACCORDION: &str = "ui-accordion";
pub const ACCORDION_ITEM: &str = "ui-accordion-item";
pub const ACCORDION_HEADER: &str = "ui-accordion-header";
pub const ACCORDION_TRIGGER: &str = "ui-accordion-trigger";
pub const ACCORDION_CONTENT: &str = "ui-accordion-content";

const HEIGHT_PROPERTY: &str = "--accordion-content-height";
const STARTING_STYLE: &str = "data-starting-style";
const ENDING_STYLE: &str = "data-ending-style";

/// Accordion mode - single or multi open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccordionMode {
    /// Only one section can be open at a time
    Single,
    /// Multiple sections can be open simultaneously (default)
    #[default]
    Multiple,
}

impl AccordionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Self::Single),
            "multiple" => Some(Self::Multiple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

/// Aggregate selection of an accordion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccordionValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AccordionValue {
    /// Parse a `value` attribute for `mode`
    ///
    /// Multiple mode splits on commas and trims each key. Empty input, or an
    /// empty list, is no selection.
    pub fn parse(mode: AccordionMode, raw: Option<&str>) -> Option<Self> {
        let raw = raw.filter(|raw| !raw.is_empty())?;
        match mode {
            AccordionMode::Single => Some(Self::Single(raw.to_string())),
            AccordionMode::Multiple => {
                let keys: Vec<String> = raw
                    .split(',')
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
                    .collect();
                (!keys.is_empty()).then_some(Self::Multiple(keys))
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::Single(value) => value == key,
            Self::Multiple(values) => values.iter().any(|value| value == key),
        }
    }

    /// Attribute form: the key, or keys joined by commas
    pub fn to_attribute(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multiple(values) => values.join(","),
        }
    }
}

/// Detail of the accordion's `onValueChange` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccordionValueChange {
    pub value: Option<AccordionValue>,
}

/// Registered item, compared by identity
#[derive(Clone)]
pub struct ItemRef(pub Rc<AccordionItem>);

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ItemRef").field(&self.0.state()).finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccordionState {
    pub value: Option<AccordionValue>,
    pub mode: AccordionMode,
    pub collapsible: bool,
    pub disabled: bool,
    /// Registered items in registration order
    pub items: Vec<ItemRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemState {
    pub value: Option<String>,
    pub is_open: bool,
    pub disabled: bool,
}

impl ItemState {
    fn data_state(&self) -> &'static str {
        if self.is_open {
            "open"
        } else {
            "closed"
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// `<ui-accordion>`
#[derive(Default)]
pub struct Accordion {
    store: Store<AccordionState>,
    node: Cell<Option<NodeId>>,
    ready: Cell<bool>,
    /// Set while items follow an authored `value`
    syncing: Cell<bool>,
    /// Last value reported through `onValueChange`
    emitted: RefCell<Option<AccordionValue>>,
    bindings: Bindings,
}

impl Accordion {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: ACCORDION,
        observed_attributes: &["disabled", "value", "mode", "collapsible"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn store(&self) -> &Store<AccordionState> {
        &self.store
    }

    pub fn value(&self) -> Option<AccordionValue> {
        self.store.with(|state| state.value.clone())
    }

    pub fn mode(&self) -> AccordionMode {
        self.store.with(|state| state.mode)
    }

    fn aggregate_value(&self) -> Option<AccordionValue> {
        let (mode, items) = self
            .store
            .with(|state| (state.mode, state.items.clone()));

        match mode {
            AccordionMode::Single => items
                .iter()
                .map(|item| item.0.state())
                .find(|state| state.is_open)
                .and_then(|state| state.value)
                .map(AccordionValue::Single),
            AccordionMode::Multiple => {
                let keys: Vec<String> = items
                    .iter()
                    .map(|item| item.0.state())
                    .filter(|state| state.is_open)
                    .filter_map(|state| state.value)
                    .collect();
                (!keys.is_empty()).then_some(AccordionValue::Multiple(keys))
            }
        }
    }

    /// Recompute the aggregate from the items and reflect it onto `value`
    fn update_toggled_items(&self, doc: &Document) {
        if self.syncing.get() {
            return;
        }
        let value = self.aggregate_value();
        tracing::debug!(?value, "accordion value");

        self.store.update(|state| state.value = value.clone());
        Attrs::new()
            .opt("value", value.map(|value| value.to_attribute()))
            .apply(doc, self.node.get());
    }

    /// Apply an authored `value` and settle the items before reporting
    fn sync_value(&self, doc: &Document, raw: Option<&str>) {
        let outermost = !self.syncing.replace(true);
        self.store
            .update(|state| state.value = AccordionValue::parse(state.mode, raw));
        if !outermost {
            return;
        }
        self.syncing.set(false);

        self.update_toggled_items(doc);
        if let Some(node) = self.node.get() {
            self.emit_value_change(doc, node);
        }
    }

    fn emit_value_change(&self, doc: &Document, node: NodeId) {
        if self.syncing.get() {
            return;
        }
        let value = self.value();
        if *self.emitted.borrow() == value {
            return;
        }
        *self.emitted.borrow_mut() = value.clone();
        doc.dispatch_event(node, Event::custom(ON_VALUE_CHANGE, AccordionValueChange { value }));
    }

    fn register(&self, item: &Rc<AccordionItem>) {
        let item = ItemRef(item.clone());
        self.store.update(|state| {
            if !state.items.contains(&item) {
                state.items.push(item);
            }
        });
    }

    fn unregister(&self, item: &AccordionItem) {
        self.store.update(|state| {
            state
                .items
                .retain(|entry| !std::ptr::eq(Rc::as_ptr(&entry.0), item))
        });
    }
}

fn read_mode(doc: &Document, node: NodeId) -> Option<AccordionMode> {
    let raw = doc.get_attribute(node, "mode")?;
    let mode = AccordionMode::parse(&raw);
    if mode.is_none() {
        tracing::warn!(mode = %raw, "unknown accordion mode, using default");
    }
    mode
}

impl CustomElement for Accordion {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        self.node.set(Some(node));

        let mode = read_mode(doc, node).unwrap_or_default();
        let value = AccordionValue::parse(mode, doc.get_attribute(node, "value").as_deref());
        *self.emitted.borrow_mut() = value.clone();
        self.syncing.set(false);
        self.store.set(AccordionState {
            value,
            mode,
            collapsible: doc.has_attribute(node, "collapsible"),
            disabled: doc.has_attribute(node, "disabled"),
            items: Vec::new(),
        });

        let weak_self = Rc::downgrade(&self);
        let weak_doc = doc.downgrade();
        self.bindings.hold(self.store.subscribe_with_selector(
            |state: &AccordionState| state.value.clone(),
            move |_, _| {
                let (Some(root), Some(doc)) = (weak_self.upgrade(), weak_doc.upgrade()) else {
                    return;
                };
                root.emit_value_change(&doc, node);
            },
        ));

        remove_cloak(doc, node);
        self.ready.set(true);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.ready.set(false);
        self.bindings.release(doc);
        self.store.update(|state| state.items.clear());
    }

    fn attribute_changed(
        &self,
        doc: &Document,
        _node: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        // Connected reads the initial attributes
        if !self.ready.get() || old == new {
            return;
        }

        match name {
            "disabled" => {
                self.store.update(|state| state.disabled = new.is_some());
            }
            "value" => self.sync_value(doc, new),
            "mode" => match new.and_then(AccordionMode::parse) {
                Some(mode) => {
                    self.store.update(|state| state.mode = mode);
                }
                None => tracing::warn!(mode = ?new, "ignoring unknown accordion mode"),
            },
            "collapsible" => {
                self.store.update(|state| state.collapsible = new.is_some());
            }
            _ => {}
        }
    }
}

// ============================================================================
// Item
// ============================================================================

/// `<ui-accordion-item>`
#[derive(Default)]
pub struct AccordionItem {
    store: Store<ItemState>,
    root: RefCell<Weak<Accordion>>,
    node: Cell<Option<NodeId>>,
    ready: Cell<bool>,
    bindings: Bindings,
}

impl AccordionItem {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: ACCORDION_ITEM,
        observed_attributes: &["disabled"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn store(&self) -> &Store<ItemState> {
        &self.store
    }

    pub fn state(&self) -> ItemState {
        self.store.get()
    }

    pub fn is_open(&self) -> bool {
        self.store.with(|state| state.is_open)
    }

    fn root(&self) -> Option<Rc<Accordion>> {
        self.root.borrow().upgrade()
    }

    /// Open or close the item
    ///
    /// `None` flips the current state. Closing is rejected in single mode
    /// unless the root is collapsible. Opening in single mode closes every
    /// other item before the root value is recomputed.
    pub fn toggle(&self, doc: &Document, set_open: Option<bool>) {
        let Some(root) = self.root() else {
            return;
        };
        let (collapsible, mode, items) = root
            .store
            .with(|state| (state.collapsible, state.mode, state.items.clone()));
        let set_open = set_open.unwrap_or(!self.is_open());

        if !collapsible && !set_open && mode == AccordionMode::Single {
            tracing::debug!(value = ?self.store.with(|s| s.value.clone()), "close rejected");
            return;
        }

        self.store.update(|state| state.is_open = set_open);

        if mode == AccordionMode::Single && set_open {
            for item in items
                .iter()
                .filter(|item| !std::ptr::eq(Rc::as_ptr(&item.0), self) && item.0.is_open())
            {
                item.0.store.update(|state| state.is_open = false);
            }
        }

        root.update_toggled_items(doc);
    }

    pub fn open(&self, doc: &Document) {
        self.toggle(doc, Some(true));
    }

    pub fn close(&self, doc: &Document) {
        self.toggle(doc, Some(false));
    }

    fn project(doc: &Document, node: NodeId, state: &ItemState) {
        Attrs::new()
            .set("data-state", state.data_state())
            .flag("data-disabled", state.disabled)
            .apply(doc, Some(node));
    }

    fn on_root_change(
        &self,
        doc: &Document,
        node: NodeId,
        (disabled, value): &(bool, Option<AccordionValue>),
        (old_disabled, old_value): &(bool, Option<AccordionValue>),
    ) {
        if disabled != old_disabled {
            let own = doc.has_attribute(node, "disabled");
            self.store.update(|state| state.disabled = *disabled || own);
        }

        if value != old_value {
            let ItemState { value: key, is_open, .. } = self.state();
            let Some(key) = key else {
                return;
            };
            let set_open = value.as_ref().is_some_and(|value| value.contains(&key));
            if set_open != is_open {
                self.toggle(doc, Some(set_open));
            }
        }
    }
}

impl CustomElement for AccordionItem {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Accordion>(doc, node, ACCORDION_ITEM, ACCORDION)?;
        *self.root.borrow_mut() = Rc::downgrade(&root);
        self.node.set(Some(node));

        let root_state = root.store.get();
        let value = non_empty(doc.get_attribute(node, "value"));
        // Root disabled wins
        let disabled = root_state.disabled
            || doc.has_attribute(node, "disabled")
            || self.store.with(|state| state.disabled);
        let is_open = match (&root_state.value, &value) {
            (Some(selection), Some(key)) => selection.contains(key),
            _ => false,
        };

        self.store.set(ItemState {
            value,
            is_open,
            disabled,
        });
        Self::project(doc, node, &self.state());

        let weak_doc = doc.downgrade();
        self.bindings.hold(self.store.subscribe_with_selector(
            |state: &ItemState| state.clone(),
            move |state, _| {
                if let Some(doc) = weak_doc.upgrade() {
                    Self::project(&doc, node, state);
                }
            },
        ));

        let weak_doc = doc.downgrade();
        let weak_self = Rc::downgrade(&self);
        self.bindings.hold(root.store.subscribe_with_selector(
            |state: &AccordionState| (state.disabled, state.value.clone()),
            move |next, previous| {
                let (Some(doc), Some(item)) = (weak_doc.upgrade(), weak_self.upgrade()) else {
                    return;
                };
                item.on_root_change(&doc, node, next, previous);
            },
        ));

        root.register(&self);

        remove_cloak(doc, node);
        self.ready.set(true);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.ready.set(false);
        self.bindings.release(doc);
        if let Some(root) = self.root() {
            root.unregister(self);
        }
    }

    fn attribute_changed(
        &self,
        _doc: &Document,
        _node: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        if !self.ready.get() || name != "disabled" || old == new {
            return;
        }
        // Local disabling only applies while the whole accordion is disabled
        let root_disabled = self
            .root()
            .is_some_and(|root| root.store.with(|state| state.disabled));
        if root_disabled {
            self.store.update(|state| state.disabled = new.is_some());
        }
    }
}

// ============================================================================
// Header
// ============================================================================

/// `<ui-accordion-header>`
#[derive(Default)]
pub struct AccordionHeader {
    bindings: Bindings,
}

impl AccordionHeader {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: ACCORDION_HEADER,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };
}

impl CustomElement for AccordionHeader {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, item) =
            find_ancestor::<AccordionItem>(doc, node, ACCORDION_HEADER, ACCORDION_ITEM)?;

        if doc.get_attribute(node, "role").is_none() {
            doc.set_attribute(node, "role", "heading");
        }
        if doc.get_attribute(node, "role").as_deref() == Some("heading") {
            let level = doc
                .get_attribute(node, "level")
                .or_else(|| doc.get_attribute(node, "aria-level"))
                .unwrap_or_else(|| "3".to_string());
            doc.set_attribute(node, "aria-level", level);
        }

        AccordionItem::project(doc, node, &item.state());
        let weak_doc = doc.downgrade();
        self.bindings.hold(item.store.subscribe(move |state, _| {
            if let Some(doc) = weak_doc.upgrade() {
                AccordionItem::project(&doc, node, state);
            }
        }));

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }
}

// ============================================================================
// Trigger
// ============================================================================

/// `<ui-accordion-trigger>` wrapping the native `<button>`
#[derive(Default)]
pub struct AccordionTrigger {
    button: Cell<Option<NodeId>>,
    bindings: Bindings,
}

impl AccordionTrigger {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: ACCORDION_TRIGGER,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn button(&self) -> Option<NodeId> {
        self.button.get()
    }

    fn project(
        doc: &Document,
        node: NodeId,
        button: Option<NodeId>,
        state: &ItemState,
        trigger_id: &str,
        content_id: &str,
    ) {
        Attrs::new()
            .set("data-state", state.data_state())
            .flag("data-disabled", state.disabled)
            .apply(doc, Some(node));
        Attrs::new()
            .set("data-state", state.data_state())
            .flag("data-disabled", state.disabled)
            .flag("disabled", state.disabled)
            .set("aria-expanded", aria_bool(state.is_open))
            .set("aria-controls", content_id)
            .set("type", "button")
            .set("id", trigger_id)
            .apply(doc, button);
    }
}

impl CustomElement for AccordionTrigger {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (item_node, item) =
            find_ancestor::<AccordionItem>(doc, node, ACCORDION_TRIGGER, ACCORDION_ITEM)?;

        let button = doc.query_scoped_first(node, &selector("button")?, ACCORDION);
        let content = doc.query_scoped_first(item_node, &selector(ACCORDION_CONTENT)?, ACCORDION);
        self.button.set(button);

        let trigger_id = non_empty(button.and_then(|button| doc.get_attribute(button, "id")))
            .unwrap_or_else(|| random_id("accordion-trigger"));
        let content_id = non_empty(content.and_then(|content| doc.get_attribute(content, "id")))
            .unwrap_or_else(|| random_id("accordion-content"));

        Self::project(doc, node, button, &item.state(), &trigger_id, &content_id);

        let weak_doc = doc.downgrade();
        self.bindings.hold(item.store.subscribe(move |state, _| {
            if let Some(doc) = weak_doc.upgrade() {
                Self::project(&doc, node, button, state, &trigger_id, &content_id);
            }
        }));

        if let Some(button) = button {
            let weak_item = Rc::downgrade(&item);
            self.bindings
                .listen(doc, button, event_types::CLICK, move |doc, _| {
                    if let Some(item) = weak_item.upgrade() {
                        item.toggle(doc, None);
                    }
                });
        }

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }
}

// ============================================================================
// Content
// ============================================================================

/// `<ui-accordion-content>`, the collapsible region
#[derive(Default)]
pub struct AccordionContent {
    item: RefCell<Weak<AccordionItem>>,
    node: Cell<Option<NodeId>>,
    trigger_id: RefCell<Option<String>>,
    content_id: RefCell<String>,
    transitioning: Cell<bool>,
    run_listener: Cell<Option<ListenerId>>,
    end_listener: Cell<Option<ListenerId>>,
    /// Bumped on every connect and disconnect; stale frame callbacks compare against it
    generation: Cell<u64>,
    bindings: Bindings,
}

impl AccordionContent {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: ACCORDION_CONTENT,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    /// Whether a CSS transition is currently running
    pub fn is_transitioning(&self) -> bool {
        self.transitioning.get()
    }

    fn project(&self, doc: &Document, is_open: bool, disabled: bool) {
        Attrs::new()
            .set("data-state", if is_open { "open" } else { "closed" })
            .flag("data-disabled", disabled)
            .opt("hidden", (!is_open).then_some("until-found"))
            .set("role", "region")
            .opt("aria-labelledby", self.trigger_id.borrow().clone())
            .set("id", self.content_id.borrow().clone())
            .apply(doc, self.node.get());
    }

    fn set_height(&self, doc: &Document, node: NodeId, value: String) {
        doc.set_style_property(node, HEIGHT_PROPERTY, value);
    }

    fn measured_height(doc: &Document, node: NodeId) -> String {
        format!("{}px", doc.scroll_height(node))
    }

    fn watch_transition(self: &Rc<Self>, doc: &Document, node: NodeId) {
        if self.run_listener.get().is_none() {
            let weak_self = Rc::downgrade(self);
            let id = doc.add_event_listener(node, event_types::TRANSITIONRUN, move |doc, _| {
                if let Some(content) = weak_self.upgrade() {
                    content.on_transition_run(doc, node);
                }
            });
            self.run_listener.set(Some(id));
        }
        if self.end_listener.get().is_none() {
            let weak_self = Rc::downgrade(self);
            let id = doc.add_event_listener(node, event_types::TRANSITIONEND, move |doc, _| {
                if let Some(content) = weak_self.upgrade() {
                    content.on_transition_end(doc, node);
                }
            });
            self.end_listener.set(Some(id));
        }
    }

    fn unwatch_transition(&self, doc: &Document, node: NodeId) {
        if let Some(id) = self.run_listener.take() {
            doc.remove_event_listener(node, id);
        }
        if let Some(id) = self.end_listener.take() {
            doc.remove_event_listener(node, id);
        }
    }

    fn on_transition_run(&self, doc: &Document, node: NodeId) {
        if let Some(id) = self.run_listener.take() {
            doc.remove_event_listener(node, id);
        }
        tracing::trace!("accordion transition running");
        self.transitioning.set(true);
    }

    fn on_transition_end(&self, doc: &Document, node: NodeId) {
        if let Some(id) = self.end_listener.take() {
            doc.remove_event_listener(node, id);
        }
        tracing::trace!("accordion transition ended");
        self.transitioning.set(false);

        doc.remove_attribute(node, ENDING_STYLE);
        doc.remove_style_property(node, HEIGHT_PROPERTY);

        // The item may have been reopened while closing
        if let Some(item) = self.item.borrow().upgrade() {
            let state = item.state();
            if !state.is_open {
                self.project(doc, false, state.disabled);
            }
        }
    }

    /// Run `apply` two frames from now unless this content was torn down
    fn after_double_frame(self: &Rc<Self>, doc: &Document, apply: fn(&Document, NodeId)) {
        let Some(node) = self.node.get() else {
            return;
        };
        let generation = self.generation.get();
        let weak_self = Rc::downgrade(self);
        let weak_doc = doc.downgrade();

        after_frames(
            doc.frames(),
            2,
            Box::new(move || {
                let (Some(content), Some(doc)) = (weak_self.upgrade(), weak_doc.upgrade()) else {
                    return;
                };
                if content.generation.get() != generation {
                    return;
                }
                apply(&doc, node);
            }),
        );
    }

    fn on_item_change(self: &Rc<Self>, doc: &Document, state: &(bool, bool), previous: &(bool, bool)) {
        let Some(node) = self.node.get() else {
            return;
        };
        let (is_open, disabled) = *state;

        if is_open == previous.0 {
            Attrs::new()
                .flag("data-disabled", disabled)
                .apply(doc, Some(node));
            return;
        }

        // Frames scheduled for the previous direction must not land
        self.generation.set(self.generation.get() + 1);

        let duration = doc.computed_transition_duration(node);
        if duration.is_zero() {
            doc.remove_attribute(node, STARTING_STYLE);
            doc.remove_attribute(node, ENDING_STYLE);
            self.project(doc, is_open, disabled);
            return;
        }

        tracing::debug!(is_open, ?duration, transitioning = self.transitioning.get(), "accordion content transition");

        if self.transitioning.get() {
            doc.remove_attribute(node, STARTING_STYLE);
            doc.remove_attribute(node, ENDING_STYLE);
            if is_open {
                self.project(doc, true, disabled);
                self.set_height(doc, node, Self::measured_height(doc, node));
            } else {
                self.set_height(doc, node, "0px".to_string());
            }
            return;
        }

        doc.remove_style_property(node, HEIGHT_PROPERTY);
        if is_open {
            self.project(doc, true, disabled);
            doc.set_attribute(node, STARTING_STYLE, "");
            doc.remove_attribute(node, ENDING_STYLE);
            self.set_height(doc, node, Self::measured_height(doc, node));
            self.watch_transition(doc, node);
            self.after_double_frame(doc, |doc, node| doc.remove_attribute(node, STARTING_STYLE));
        } else {
            doc.remove_attribute(node, STARTING_STYLE);
            self.set_height(doc, node, Self::measured_height(doc, node));
            self.watch_transition(doc, node);
            self.after_double_frame(doc, |doc, node| doc.set_attribute(node, ENDING_STYLE, ""));
        }
    }
}

impl CustomElement for AccordionContent {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (item_node, item) =
            find_ancestor::<AccordionItem>(doc, node, ACCORDION_CONTENT, ACCORDION_ITEM)?;
        *self.item.borrow_mut() = Rc::downgrade(&item);
        self.node.set(Some(node));
        self.generation.set(self.generation.get() + 1);
        self.transitioning.set(false);

        let button = doc.query_scoped_first(
            item_node,
            &selector(&format!("{ACCORDION_TRIGGER} button"))?,
            ACCORDION,
        );
        let trigger_id = non_empty(button.and_then(|button| doc.get_attribute(button, "id")));
        let content_id = non_empty(doc.get_attribute(node, "id"))
            .or_else(|| non_empty(button.and_then(|button| doc.get_attribute(button, "aria-controls"))))
            .unwrap_or_else(|| random_id("accordion-content"));
        *self.trigger_id.borrow_mut() = trigger_id;
        *self.content_id.borrow_mut() = content_id;

        let state = item.state();
        self.project(doc, state.is_open, state.disabled);

        let weak_doc = doc.downgrade();
        let weak_self = Rc::downgrade(&self);
        self.bindings.hold(item.store.subscribe_with_selector(
            |state: &ItemState| (state.is_open, state.disabled),
            move |next, previous| {
                let (Some(doc), Some(content)) = (weak_doc.upgrade(), weak_self.upgrade()) else {
                    return;
                };
                content.on_item_change(&doc, next, previous);
            },
        ));

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, node: NodeId) {
        self.generation.set(self.generation.get() + 1);
        self.bindings.release(doc);
        self.unwatch_transition(doc, node);
        self.transitioning.set(false);
    }
}

fn selector(text: &str) -> Result<Selector, ElementError> {
    Ok(Selector::parse(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accordion, AccordionFixture};
    use std::cell::RefCell;

    fn expanded(fx: &AccordionFixture, index: usize) -> Option<String> {
        fx.doc.get_attribute(fx.buttons[index], "aria-expanded")
    }

    fn record_values(fx: &AccordionFixture) -> Rc<RefCell<Vec<Option<AccordionValue>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        fx.doc
            .add_event_listener(fx.root, ON_VALUE_CHANGE, move |_, event| {
                let detail = event.detail::<AccordionValueChange>().unwrap();
                log_clone.borrow_mut().push(detail.value.clone());
            });
        log
    }

    #[test]
    fn test_mode_and_value_parsing() {
        assert_eq!(AccordionMode::parse("single"), Some(AccordionMode::Single));
        assert_eq!(AccordionMode::parse("both"), None);
        assert_eq!(AccordionMode::default(), AccordionMode::Multiple);

        assert_eq!(
            AccordionValue::parse(AccordionMode::Multiple, Some("a, b,")),
            Some(AccordionValue::Multiple(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            AccordionValue::parse(AccordionMode::Single, Some("a,b")),
            Some(AccordionValue::Single("a,b".into()))
        );
        assert_eq!(AccordionValue::parse(AccordionMode::Multiple, Some(" , ")), None);
        assert_eq!(AccordionValue::parse(AccordionMode::Single, Some("")), None);
    }

    #[test]
    fn test_single_mode_initial_projection() {
        let fx = accordion(&[("mode", "single"), ("value", "item1")], &["item1", "item2"]);
        let doc = &fx.doc;

        assert_eq!(expanded(&fx, 0).as_deref(), Some("true"));
        assert_eq!(expanded(&fx, 1).as_deref(), Some("false"));
        assert_eq!(doc.get_attribute(fx.items[0], "data-state").as_deref(), Some("open"));
        assert_eq!(doc.get_attribute(fx.items[1], "data-state").as_deref(), Some("closed"));
        assert_eq!(doc.get_attribute(fx.buttons[0], "type").as_deref(), Some("button"));

        // Trigger and content reference each other
        let content_id = doc.get_attribute(fx.contents[0], "id").unwrap();
        let button_id = doc.get_attribute(fx.buttons[0], "id").unwrap();
        assert_eq!(doc.get_attribute(fx.buttons[0], "aria-controls"), Some(content_id));
        assert_eq!(doc.get_attribute(fx.contents[0], "aria-labelledby"), Some(button_id));
        assert_eq!(doc.get_attribute(fx.contents[0], "role").as_deref(), Some("region"));
        assert_eq!(doc.get_attribute(fx.contents[0], "hidden"), None);
        assert_eq!(
            doc.get_attribute(fx.contents[1], "hidden").as_deref(),
            Some("until-found")
        );
    }

    #[test]
    fn test_single_mode_click_switches_item() {
        let fx = accordion(&[("mode", "single"), ("value", "item1")], &["item1", "item2"]);
        let values = record_values(&fx);

        fx.doc.click(fx.buttons[1]);

        assert_eq!(expanded(&fx, 0).as_deref(), Some("false"));
        assert_eq!(expanded(&fx, 1).as_deref(), Some("true"));
        assert_eq!(fx.doc.get_attribute(fx.root, "value").as_deref(), Some("item2"));
        assert_eq!(
            *values.borrow(),
            vec![Some(AccordionValue::Single("item2".into()))]
        );
    }

    #[test]
    fn test_single_mode_keeps_one_open_unless_collapsible() {
        let fx = accordion(&[("mode", "single")], &["item1", "item2", "item3"]);
        let doc = &fx.doc;

        doc.click(fx.buttons[2]);
        for index in [2, 2, 0, 0, 1, 1, 1] {
            doc.click(fx.buttons[index]);
            let open = fx
                .item_instances()
                .iter()
                .filter(|item| item.is_open())
                .count();
            assert_eq!(open, 1, "after clicking {index}");
        }

        doc.set_attribute(fx.root, "collapsible", "");
        doc.click(fx.buttons[1]);
        assert!(fx.item_instances().iter().all(|item| !item.is_open()));
        assert_eq!(doc.get_attribute(fx.root, "value"), None);
    }

    #[test]
    fn test_multiple_mode_opens_independently() {
        let fx = accordion(&[], &["a", "b", "c"]);
        let doc = &fx.doc;

        doc.click(fx.buttons[0]);
        doc.click(fx.buttons[1]);

        let items = fx.item_instances();
        assert!(items[0].is_open() && items[1].is_open() && !items[2].is_open());
        assert_eq!(
            fx.root_instance().value(),
            Some(AccordionValue::Multiple(vec!["a".into(), "b".into()]))
        );
        assert_eq!(doc.get_attribute(fx.root, "value").as_deref(), Some("a,b"));

        doc.click(fx.buttons[0]);
        doc.click(fx.buttons[1]);
        assert_eq!(fx.root_instance().value(), None);
        assert_eq!(doc.get_attribute(fx.root, "value"), None);
    }

    #[test]
    fn test_root_value_attribute_drives_items() {
        let fx = accordion(&[("mode", "single"), ("collapsible", "")], &["item1", "item2"]);
        let doc = &fx.doc;
        let items = fx.item_instances();

        doc.set_attribute(fx.root, "value", "item2");
        assert!(items[1].is_open());

        items[1].toggle(doc, None);
        assert!(!items[1].is_open());
        assert_eq!(doc.get_attribute(fx.root, "value"), None);

        items[1].toggle(doc, None);
        assert_eq!(doc.get_attribute(fx.root, "value").as_deref(), Some("item2"));
        assert_eq!(
            fx.root_instance().value(),
            Some(AccordionValue::Single("item2".into()))
        );
    }

    #[test]
    fn test_multiple_value_attribute_opens_all_listed() {
        let fx = accordion(&[], &["a", "b", "c"]);
        let doc = &fx.doc;

        doc.set_attribute(fx.root, "value", "a, c");
        let items = fx.item_instances();
        assert!(items[0].is_open() && !items[1].is_open() && items[2].is_open());
        assert_eq!(doc.get_attribute(fx.root, "value").as_deref(), Some("a,c"));
    }

    #[test]
    fn test_value_attribute_reports_settled_value_once() {
        let fx = accordion(&[], &["a", "b", "c"]);
        let doc = &fx.doc;
        let values = record_values(&fx);

        doc.set_attribute(fx.root, "value", "a, c");
        assert_eq!(
            *values.borrow(),
            vec![Some(AccordionValue::Multiple(vec!["a".into(), "c".into()]))]
        );

        // Unknown keys settle to the items that exist
        doc.set_attribute(fx.root, "value", "b, missing");
        assert_eq!(
            values.borrow().last(),
            Some(&Some(AccordionValue::Multiple(vec!["b".into()])))
        );
        assert_eq!(values.borrow().len(), 2);
        assert_eq!(doc.get_attribute(fx.root, "value").as_deref(), Some("b"));

        let items = fx.item_instances();
        assert!(!items[0].is_open() && items[1].is_open() && !items[2].is_open());
    }

    #[test]
    fn test_root_disabled_cascades() {
        let fx = accordion(&[], &["a", "b"]);
        let doc = &fx.doc;

        doc.set_attribute(fx.root, "disabled", "");
        for index in 0..2 {
            assert_eq!(doc.get_attribute(fx.buttons[index], "disabled").as_deref(), Some(""));
            assert_eq!(doc.get_attribute(fx.items[index], "data-disabled").as_deref(), Some(""));
        }
        assert!(!doc.click(fx.buttons[0]));
        assert!(!fx.item_instances()[0].is_open());

        doc.remove_attribute(fx.root, "disabled");
        assert_eq!(doc.get_attribute(fx.buttons[0], "disabled"), None);
    }

    #[test]
    fn test_local_disable_only_while_root_disabled() {
        let fx = accordion(&[], &["a", "b"]);
        let doc = &fx.doc;
        let items = fx.item_instances();

        doc.set_attribute(fx.items[0], "disabled", "");
        assert!(!items[0].state().disabled);

        doc.set_attribute(fx.root, "disabled", "");
        doc.remove_attribute(fx.items[1], "disabled");
        doc.set_attribute(fx.items[1], "disabled", "");
        doc.remove_attribute(fx.root, "disabled");

        // a keeps its own attribute, b was re-evaluated against it
        assert!(items[0].state().disabled);
        assert!(items[1].state().disabled);
    }

    #[test]
    fn test_header_level_and_role() {
        let fx = accordion(&[], &["a"]);
        let doc = &fx.doc;
        assert_eq!(doc.get_attribute(fx.headers[0], "role").as_deref(), Some("heading"));
        assert_eq!(doc.get_attribute(fx.headers[0], "aria-level").as_deref(), Some("3"));

        doc.click(fx.buttons[0]);
        assert_eq!(doc.get_attribute(fx.headers[0], "data-state").as_deref(), Some("open"));
    }

    #[test]
    fn test_item_outside_root_is_reported() {
        let fx = accordion(&[], &[]);
        let doc = &fx.doc;
        let stray = doc.create_element(ACCORDION_ITEM);
        doc.set_attribute(stray, "cloak", "");
        doc.append_child(doc.body(), stray).unwrap();

        let diagnostics = doc.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error,
            ElementError::MissingAncestor {
                part: ACCORDION_ITEM,
                ancestor: ACCORDION,
            }
        );
        // Inert parts keep their cloak
        assert!(doc.has_attribute(stray, "cloak"));
    }

    #[test]
    fn test_detached_item_unregisters() {
        let fx = accordion(&[("mode", "single")], &["a", "b"]);
        let doc = &fx.doc;

        doc.remove(fx.items[0]);
        assert_eq!(fx.root_instance().store().with(|s| s.items.len()), 1);

        doc.click(fx.buttons[1]);
        assert_eq!(doc.get_attribute(fx.root, "value").as_deref(), Some("b"));
        // No projection reaches the detached item
        assert_eq!(doc.get_attribute(fx.buttons[0], "aria-expanded").as_deref(), Some("false"));
    }

    #[test]
    fn test_open_transition_sequence() {
        let fx = accordion(&[], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        doc.set_style_property(content, "transition-duration", "200ms");
        doc.set_scroll_height(content, 120.0);

        doc.click(fx.buttons[0]);
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("open"));
        assert_eq!(doc.get_attribute(content, "hidden"), None);
        assert!(doc.has_attribute(content, STARTING_STYLE));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY).as_deref(), Some("120px"));

        doc.run_animation_frame();
        assert!(doc.has_attribute(content, STARTING_STYLE));
        doc.run_animation_frame();
        assert!(!doc.has_attribute(content, STARTING_STYLE));

        doc.dispatch_event(content, Event::new(event_types::TRANSITIONRUN));
        doc.dispatch_event(content, Event::new(event_types::TRANSITIONEND));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY), None);
        assert_eq!(doc.listener_count(content, event_types::TRANSITIONEND), 0);
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("open"));
    }

    #[test]
    fn test_close_transition_sequence() {
        let fx = accordion(&[("value", "a")], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        doc.set_style_property(content, "transition-duration", "0.2s");
        doc.set_scroll_height(content, 80.0);

        doc.click(fx.buttons[0]);
        // Still visible while the height animates down
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("open"));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY).as_deref(), Some("80px"));
        assert!(!doc.has_attribute(content, ENDING_STYLE));

        doc.run_animation_frames(4);
        assert!(doc.has_attribute(content, ENDING_STYLE));

        doc.dispatch_event(content, Event::new(event_types::TRANSITIONRUN));
        doc.dispatch_event(content, Event::new(event_types::TRANSITIONEND));
        assert!(!doc.has_attribute(content, ENDING_STYLE));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY), None);
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("closed"));
        assert_eq!(doc.get_attribute(content, "hidden").as_deref(), Some("until-found"));
    }

    #[test]
    fn test_reopen_during_close_retargets() {
        let fx = accordion(&[("value", "a")], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        let item = fx.item_instances().remove(0);
        let content_part = doc.instance::<AccordionContent>(content).unwrap();
        doc.set_style_property(content, "transition-duration", "200ms");
        doc.set_scroll_height(content, 64.0);

        item.close(doc);
        doc.run_animation_frames(4);
        doc.dispatch_event(content, Event::new(event_types::TRANSITIONRUN));
        assert!(content_part.is_transitioning());

        item.open(doc);
        assert!(!doc.has_attribute(content, ENDING_STYLE));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY).as_deref(), Some("64px"));

        doc.dispatch_event(content, Event::new(event_types::TRANSITIONEND));
        assert!(!content_part.is_transitioning());
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("open"));
        assert_eq!(doc.get_attribute(content, "hidden"), None);
    }

    #[test]
    fn test_reopen_before_frames_drops_pending_close() {
        let fx = accordion(&[("value", "a")], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        let item = fx.item_instances().remove(0);
        doc.set_style_property(content, "transition-duration", "200ms");
        doc.set_scroll_height(content, 64.0);

        item.close(doc);
        item.open(doc);
        doc.run_animation_frames(4);

        assert!(item.is_open());
        assert!(!doc.has_attribute(content, ENDING_STYLE));
        assert!(!doc.has_attribute(content, STARTING_STYLE));
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("open"));
        assert_eq!(doc.get_attribute(content, "hidden"), None);
    }

    #[test]
    fn test_close_during_open_collapses_to_zero() {
        let fx = accordion(&[], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        let item = fx.item_instances().remove(0);
        doc.set_style_property(content, "transition-duration", "200ms");
        doc.set_scroll_height(content, 64.0);

        item.open(doc);
        doc.dispatch_event(content, Event::new(event_types::TRANSITIONRUN));
        item.close(doc);
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY).as_deref(), Some("0px"));
        doc.run_animation_frames(4);
        assert!(!doc.has_attribute(content, STARTING_STYLE));

        doc.dispatch_event(content, Event::new(event_types::TRANSITIONEND));
        assert_eq!(doc.get_attribute(content, "data-state").as_deref(), Some("closed"));
    }

    #[test]
    fn test_frames_after_teardown_are_ignored() {
        let fx = accordion(&[], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        doc.set_style_property(content, "transition-duration", "200ms");

        doc.click(fx.buttons[0]);
        doc.remove(fx.items[0]);
        doc.run_animation_frames(4);

        // The starting marker stays; nothing ran against the detached node
        assert!(doc.has_attribute(content, STARTING_STYLE));
        assert_eq!(doc.listener_count(content, event_types::TRANSITIONEND), 0);
    }

    #[test]
    fn test_disabled_change_does_not_restart_animation() {
        let fx = accordion(&[("value", "a")], &["a"]);
        let doc = &fx.doc;
        let content = fx.contents[0];
        doc.set_style_property(content, "transition-duration", "200ms");

        doc.set_attribute(fx.root, "disabled", "");
        assert_eq!(doc.get_attribute(content, "data-disabled").as_deref(), Some(""));
        assert_eq!(doc.style_property(content, HEIGHT_PROPERTY), None);
        assert!(!doc.has_attribute(content, STARTING_STYLE));
    }
}
