//! Tabs component with roving tabindex keyboard navigation
//!
//! ```html
//! <ui-tabs value="account" activation-mode="automatic">
//!   <ui-tabs-list loop>
//!     <ui-tabs-trigger value="account"><button>Account</button></ui-tabs-trigger>
//!     <ui-tabs-trigger value="billing" disabled><button>Billing</button></ui-tabs-trigger>
//!   </ui-tabs-list>
//!   <ui-tabs-panel value="account">...</ui-tabs-panel>
//!   <ui-tabs-panel value="billing">...</ui-tabs-panel>
//! </ui-tabs>
//! ```
//!
//! Triggers and panels pair up by `value` and may connect in either order.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use shoji_core::Store;
use shoji_dom::{
    event_types, Attrs, CustomElement, Document, ElementDefinition, ElementError, Event, Key,
    NodeId, Selector,
};

use crate::ids::{non_empty, random_id};
use crate::lifecycle::{aria_bool, find_ancestor, remove_cloak, Bindings};
use crate::ON_VALUE_CHANGE;

pub const TABS: &str = "ui-tabs";
pub const TABS_LIST: &str = "ui-tabs-list";
pub const TABS_TRIGGER: &str = "ui-tabs-trigger";
pub const TABS_PANEL: &str = "ui-tabs-panel";

const SELECTED_TRIGGER: &str = r#"ui-tabs-trigger button[aria-selected="true"]"#;

/// Whether moving focus also selects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivationMode {
    /// Arrow keys select the focused tab
    #[default]
    Automatic,
    /// Arrow keys only move focus; Enter, Space or a click selects
    Manual,
}

impl ActivationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(Self::Automatic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
        }
    }

    /// Attribute value with fallback to [`ActivationMode::Automatic`]
    fn from_attribute(value: Option<&str>) -> Self {
        match value {
            None => Self::default(),
            Some(raw) => Self::parse(raw).unwrap_or_else(|| {
                tracing::warn!(mode = %raw, "unknown activation mode, using automatic");
                Self::default()
            }),
        }
    }
}

/// Ids of a trigger/panel pair; blank until that side connects
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TabDescriptor {
    pub value: String,
    pub tab_id: String,
    pub panel_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TabsState {
    pub value: String,
    pub activation_mode: ActivationMode,
    pub tabs: Vec<TabDescriptor>,
}

impl TabsState {
    pub fn tab(&self, value: &str) -> Option<&TabDescriptor> {
        self.tabs.iter().find(|tab| tab.value == value)
    }

    /// Merge one side of a pair into the descriptor for `value`
    ///
    /// Only the provided ids are written, so trigger and panel can register
    /// in any order and repeat registration is harmless.
    pub fn register(&mut self, value: &str, tab_id: Option<&str>, panel_id: Option<&str>) {
        let index = match self.tabs.iter().position(|tab| tab.value == value) {
            Some(index) => index,
            None => {
                self.tabs.push(TabDescriptor {
                    value: value.to_string(),
                    ..TabDescriptor::default()
                });
                self.tabs.len() - 1
            }
        };
        let tab = &mut self.tabs[index];
        if let Some(id) = tab_id {
            tab.tab_id = id.to_string();
        }
        if let Some(id) = panel_id {
            tab.panel_id = id.to_string();
        }
    }
}

/// Detail of the tabs' `onValueChange` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabsValueChange {
    pub value: String,
}

fn data_state(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

fn selector(text: &str) -> Result<Selector, ElementError> {
    Ok(Selector::parse(text)?)
}

// ============================================================================
// Root
// ============================================================================

/// `<ui-tabs>`
#[derive(Default)]
pub struct Tabs {
    store: Store<TabsState>,
    ready: Cell<bool>,
    bindings: Bindings,
}

impl Tabs {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: TABS,
        observed_attributes: &["value", "activation-mode"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn store(&self) -> &Store<TabsState> {
        &self.store
    }

    pub fn value(&self) -> String {
        self.store.with(|state| state.value.clone())
    }

    pub fn activation_mode(&self) -> ActivationMode {
        self.store.with(|state| state.activation_mode)
    }

    /// Make `value` the active tab
    pub fn select(&self, value: &str) {
        tracing::debug!(value, "tab selected");
        self.store.update(|state| state.value = value.to_string());
    }

    fn default_value(doc: &Document, node: NodeId) -> Result<String, ElementError> {
        if let Some(value) = doc.get_attribute(node, "value") {
            return Ok(value);
        }
        let selected = doc
            .query_scoped_first(node, &selector(SELECTED_TRIGGER)?, TABS)
            .and_then(|button| doc.closest(button, TABS_TRIGGER))
            .and_then(|trigger| doc.get_attribute(trigger, "value"));
        Ok(selected.unwrap_or_default())
    }
}

impl CustomElement for Tabs {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let value = Self::default_value(doc, node)?;
        let activation_mode =
            ActivationMode::from_attribute(doc.get_attribute(node, "activation-mode").as_deref());
        self.store.update(|state| {
            state.value = value;
            state.activation_mode = activation_mode;
        });

        let weak_doc = doc.downgrade();
        self.bindings.hold(self.store.subscribe_with_selector(
            |state: &TabsState| state.value.clone(),
            move |value, _| {
                let Some(doc) = weak_doc.upgrade() else {
                    return;
                };
                doc.dispatch_event(
                    node,
                    Event::custom(
                        ON_VALUE_CHANGE,
                        TabsValueChange {
                            value: value.clone(),
                        },
                    ),
                );
            },
        ));

        remove_cloak(doc, node);
        self.ready.set(true);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.ready.set(false);
        self.bindings.release(doc);
    }

    fn attribute_changed(
        &self,
        _doc: &Document,
        _node: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        if !self.ready.get() || old == new {
            return;
        }
        match name {
            "value" => self.select(new.unwrap_or_default()),
            "activation-mode" => {
                let mode = ActivationMode::from_attribute(new);
                self.store.update(|state| state.activation_mode = mode);
            }
            _ => {}
        }
    }
}

// ============================================================================
// List
// ============================================================================

/// `<ui-tabs-list>`, owner of arrow-key navigation
#[derive(Default)]
pub struct TabsList {
    root: RefCell<Weak<Tabs>>,
    node: Cell<Option<NodeId>>,
    looping: Cell<bool>,
    bindings: Bindings,
}

impl TabsList {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: TABS_LIST,
        observed_attributes: &["loop"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn is_looping(&self) -> bool {
        self.looping.get()
    }

    /// Triggers that take part in keyboard navigation, in tree order
    fn enabled_triggers(doc: &Document, node: NodeId) -> Vec<NodeId> {
        let Ok(triggers) = selector(TABS_TRIGGER) else {
            return Vec::new();
        };
        doc.query_scoped(node, &triggers, TABS)
            .into_iter()
            .filter(|trigger| !doc.has_attribute(*trigger, "disabled"))
            .collect()
    }

    /// Value navigation starts from
    fn base_value(doc: &Document, root: &Tabs, triggers: &[NodeId]) -> String {
        if root.activation_mode() == ActivationMode::Manual {
            let focused = doc
                .active_element()
                .and_then(|focused| doc.closest(focused, TABS_TRIGGER))
                .filter(|trigger| triggers.contains(trigger));
            if let Some(value) = focused.and_then(|trigger| doc.get_attribute(trigger, "value")) {
                return value;
            }
        }
        root.value()
    }

    fn target_for(&self, doc: &Document, key: Key, triggers: &[NodeId], base: &str) -> Option<NodeId> {
        let len = triggers.len() as i64;
        if len == 0 {
            return None;
        }
        let current = triggers
            .iter()
            .position(|trigger| doc.get_attribute(*trigger, "value").unwrap_or_default() == base)
            .map(|index| index as i64)
            .unwrap_or(-1);

        let step = |index: i64| -> Option<NodeId> {
            let index = if self.looping.get() {
                index.rem_euclid(len)
            } else if (0..len).contains(&index) {
                index
            } else {
                return None;
            };
            triggers.get(index as usize).copied()
        };

        match key {
            Key::ArrowLeft | Key::ArrowUp => step(current - 1),
            Key::ArrowRight | Key::ArrowDown => step(current + 1),
            Key::Home => triggers.first().copied(),
            Key::End => triggers.last().copied(),
            _ => None,
        }
    }

    fn on_keydown(&self, doc: &Document, event: &Event) {
        let (Some(root), Some(node), Some(key)) =
            (self.root.borrow().upgrade(), self.node.get(), event.key())
        else {
            return;
        };

        let triggers = Self::enabled_triggers(doc, node);
        let base = Self::base_value(doc, &root, &triggers);
        let Some(target) = self.target_for(doc, key, &triggers, &base) else {
            return;
        };

        event.stop_propagation();
        event.prevent_default();

        if let Some(button) = selector("button")
            .ok()
            .and_then(|buttons| doc.query_scoped_first(target, &buttons, TABS))
        {
            doc.focus(button);
        }
        if root.activation_mode() == ActivationMode::Automatic {
            root.select(&doc.get_attribute(target, "value").unwrap_or_default());
        }
    }
}

impl CustomElement for TabsList {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Tabs>(doc, node, TABS_LIST, TABS)?;
        *self.root.borrow_mut() = Rc::downgrade(&root);
        self.node.set(Some(node));
        self.looping.set(doc.has_attribute(node, "loop"));

        Attrs::new().set("role", "tablist").apply(doc, Some(node));

        let weak_self = Rc::downgrade(&self);
        self.bindings
            .listen(doc, node, event_types::KEYDOWN, move |doc, event| {
                if let Some(list) = weak_self.upgrade() {
                    list.on_keydown(doc, event);
                }
            });

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }

    fn attribute_changed(
        &self,
        _doc: &Document,
        _node: NodeId,
        name: &str,
        _old: Option<&str>,
        new: Option<&str>,
    ) {
        if name == "loop" {
            self.looping.set(new.is_some());
        }
    }
}

// ============================================================================
// Trigger
// ============================================================================

/// `<ui-tabs-trigger value="...">`
#[derive(Default)]
pub struct TabsTrigger {
    root: RefCell<Weak<Tabs>>,
    node: Cell<Option<NodeId>>,
    button: Cell<Option<NodeId>>,
    value: RefCell<String>,
    disabled: Cell<bool>,
    bindings: Bindings,
}

impl TabsTrigger {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: TABS_TRIGGER,
        observed_attributes: &["disabled"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn button(&self) -> Option<NodeId> {
        self.button.get()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    fn activate(&self) {
        if self.disabled.get() {
            return;
        }
        if let Some(root) = self.root.borrow().upgrade() {
            root.select(&self.value.borrow());
        }
    }

    fn project(&self, doc: &Document, active: bool, tab: Option<&TabDescriptor>) {
        let disabled = self.disabled.get();
        let tab_id = tab.and_then(|tab| non_empty(Some(tab.tab_id.clone())));
        let panel_id = tab.and_then(|tab| non_empty(Some(tab.panel_id.clone())));

        Attrs::new()
            .set("data-state", data_state(active))
            .flag("data-disabled", disabled)
            .apply(doc, self.node.get());
        Attrs::new()
            .set("data-state", data_state(active))
            .flag("data-disabled", disabled)
            .set("aria-selected", aria_bool(active))
            .flag("disabled", disabled)
            .set("role", "tab")
            .opt("aria-controls", panel_id)
            .opt("id", tab_id)
            .set("tabindex", if active { "0" } else { "-1" })
            .apply(doc, self.button.get());
    }

    fn refresh(&self, doc: &Document) {
        let Some(root) = self.root.borrow().upgrade() else {
            return;
        };
        let value = self.value();
        let (active, tab) =
            root.store.with(|state| (state.value == value, state.tab(&value).cloned()));
        self.project(doc, active, tab.as_ref());
    }
}

impl CustomElement for TabsTrigger {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Tabs>(doc, node, TABS_TRIGGER, TABS)?;
        *self.root.borrow_mut() = Rc::downgrade(&root);
        self.node.set(Some(node));

        let button = doc.query_scoped_first(node, &selector("button")?, TABS);
        self.button.set(button);
        let value = doc.get_attribute(node, "value").unwrap_or_default();
        *self.value.borrow_mut() = value.clone();
        self.disabled.set(doc.has_attribute(node, "disabled"));

        let tab_id = non_empty(button.and_then(|button| doc.get_attribute(button, "id")))
            .unwrap_or_else(|| random_id("tabs-trigger"));
        root.store
            .update(|state| state.register(&value, Some(tab_id.as_str()), None));
        self.refresh(doc);

        let weak_doc = doc.downgrade();
        let weak_self = Rc::downgrade(&self);
        let own = value.clone();
        self.bindings.hold(root.store.subscribe_with_selector(
            move |state: &TabsState| (state.value == own, state.tab(&own).cloned()),
            move |(active, tab), _| {
                let (Some(doc), Some(trigger)) = (weak_doc.upgrade(), weak_self.upgrade()) else {
                    return;
                };
                trigger.project(&doc, *active, tab.as_ref());
            },
        ));

        if let Some(button) = button {
            let weak_self = Rc::downgrade(&self);
            self.bindings
                .listen(doc, button, event_types::CLICK, move |_, _| {
                    if let Some(trigger) = weak_self.upgrade() {
                        trigger.activate();
                    }
                });

            let weak_self = Rc::downgrade(&self);
            self.bindings
                .listen(doc, button, event_types::KEYDOWN, move |_, event| {
                    if !matches!(event.key(), Some(Key::Enter | Key::Space)) {
                        return;
                    }
                    if let Some(trigger) = weak_self.upgrade() {
                        event.prevent_default();
                        trigger.activate();
                    }
                });
        }

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }

    fn attribute_changed(
        &self,
        doc: &Document,
        _node: NodeId,
        name: &str,
        _old: Option<&str>,
        new: Option<&str>,
    ) {
        if name == "disabled" {
            self.disabled.set(new.is_some());
            self.refresh(doc);
        }
    }
}

// ============================================================================
// Panel
// ============================================================================

/// `<ui-tabs-panel value="...">`
#[derive(Default)]
pub struct TabsPanel {
    bindings: Bindings,
}

impl TabsPanel {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: TABS_PANEL,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    fn project(doc: &Document, node: NodeId, active: bool, tab: Option<&TabDescriptor>) {
        let labelled_by = tab.and_then(|tab| non_empty(Some(tab.tab_id.clone())));
        Attrs::new()
            .set("data-state", data_state(active))
            .opt("aria-labelledby", labelled_by)
            .apply(doc, Some(node));
    }
}

impl CustomElement for TabsPanel {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Tabs>(doc, node, TABS_PANEL, TABS)?;

        let value = doc.get_attribute(node, "value").unwrap_or_default();
        let panel_id =
            non_empty(doc.get_attribute(node, "id")).unwrap_or_else(|| random_id("tabs-panel"));

        Attrs::new()
            .set("role", "tabpanel")
            .set("tabindex", "0")
            .set("id", panel_id.as_str())
            .apply(doc, Some(node));

        root.store
            .update(|state| state.register(&value, None, Some(panel_id.as_str())));
        let (active, tab) =
            root.store.with(|state| (state.value == value, state.tab(&value).cloned()));
        Self::project(doc, node, active, tab.as_ref());

        let weak_doc = doc.downgrade();
        self.bindings.hold(root.store.subscribe_with_selector(
            move |state: &TabsState| (state.value == value, state.tab(&value).cloned()),
            move |(active, tab), _| {
                if let Some(doc) = weak_doc.upgrade() {
                    Self::project(&doc, node, *active, tab.as_ref());
                }
            },
        ));

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tabs, TabsFixture, TabsOptions};

    fn three_tabs(options: TabsOptions) -> TabsFixture {
        tabs(TabsOptions {
            triggers: vec![("tab1", false), ("tab2", true), ("tab3", false)],
            ..options
        })
    }

    fn attr(fx: &TabsFixture, node: NodeId, name: &str) -> Option<String> {
        fx.doc.get_attribute(node, name)
    }

    #[test]
    fn test_register_fills_blanks_in_either_order() {
        let mut state = TabsState::default();
        state.register("a", Some("tab-a"), None);
        state.register("a", None, Some("panel-a"));
        state.register("b", None, Some("panel-b"));
        state.register("b", Some("tab-b"), None);
        state.register("b", Some("tab-b"), None);

        assert_eq!(state.tabs.len(), 2);
        assert_eq!(
            state.tab("a"),
            Some(&TabDescriptor {
                value: "a".into(),
                tab_id: "tab-a".into(),
                panel_id: "panel-a".into(),
            })
        );
        assert_eq!(state.tab("b").map(|tab| tab.tab_id.as_str()), Some("tab-b"));
    }

    #[test]
    fn test_activation_mode_fallback() {
        assert_eq!(ActivationMode::from_attribute(Some("manual")), ActivationMode::Manual);
        assert_eq!(ActivationMode::from_attribute(Some("Manual")), ActivationMode::Automatic);
        assert_eq!(ActivationMode::from_attribute(Some("")), ActivationMode::Automatic);
        assert_eq!(ActivationMode::from_attribute(None), ActivationMode::Automatic);
    }

    #[test]
    fn test_initial_projection_panels_first() {
        let fx = tabs(TabsOptions {
            value: Some("tab1"),
            panels_first: true,
            ..TabsOptions::default()
        });
        assert_pair_wiring(&fx);
    }

    #[test]
    fn test_initial_projection_triggers_first() {
        let fx = tabs(TabsOptions {
            value: Some("tab1"),
            panels_first: false,
            ..TabsOptions::default()
        });
        assert_pair_wiring(&fx);
    }

    fn assert_pair_wiring(fx: &TabsFixture) {
        assert_eq!(attr(fx, fx.list, "role").as_deref(), Some("tablist"));
        for (index, (&button, &panel)) in fx.buttons.iter().zip(&fx.panels).enumerate() {
            let button_id = attr(fx, button, "id").unwrap();
            let panel_id = attr(fx, panel, "id").unwrap();
            assert!(button_id.starts_with("tabs-trigger-"));
            assert!(panel_id.starts_with("tabs-panel-"));
            assert_eq!(attr(fx, button, "aria-controls"), Some(panel_id));
            assert_eq!(attr(fx, panel, "aria-labelledby"), Some(button_id));
            assert_eq!(attr(fx, button, "role").as_deref(), Some("tab"));
            assert_eq!(attr(fx, panel, "role").as_deref(), Some("tabpanel"));
            assert_eq!(attr(fx, panel, "tabindex").as_deref(), Some("0"));

            let active = index == 0;
            assert_eq!(attr(fx, button, "aria-selected").as_deref(), Some(aria_bool(active)));
            assert_eq!(
                attr(fx, button, "tabindex").as_deref(),
                Some(if active { "0" } else { "-1" })
            );
            assert_eq!(attr(fx, panel, "data-state").as_deref(), Some(data_state(active)));
        }
    }

    #[test]
    fn test_default_value_from_selected_button() {
        let fx = tabs(TabsOptions {
            preselected: Some("tab2"),
            ..TabsOptions::default()
        });
        assert_eq!(fx.root_instance().value(), "tab2");
        assert_eq!(attr(&fx, fx.panels[1], "data-state").as_deref(), Some("active"));
    }

    #[test]
    fn test_click_selects_and_emits() {
        let fx = tabs(TabsOptions {
            value: Some("tab1"),
            ..TabsOptions::default()
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        fx.doc.add_event_listener(fx.root, ON_VALUE_CHANGE, move |_, event| {
            log.borrow_mut()
                .push(event.detail::<TabsValueChange>().unwrap().value.clone());
        });

        fx.doc.click(fx.buttons[2]);
        assert_eq!(fx.root_instance().value(), "tab3");
        assert_eq!(attr(&fx, fx.triggers[2], "data-state").as_deref(), Some("active"));
        assert_eq!(attr(&fx, fx.triggers[0], "data-state").as_deref(), Some("inactive"));
        assert_eq!(attr(&fx, fx.panels[2], "data-state").as_deref(), Some("active"));
        assert_eq!(*seen.borrow(), vec!["tab3".to_string()]);
    }

    #[test]
    fn test_arrow_right_skips_disabled() {
        let fx = three_tabs(TabsOptions {
            value: Some("tab1"),
            ..TabsOptions::default()
        });
        assert_eq!(attr(&fx, fx.buttons[1], "disabled").as_deref(), Some(""));
        assert_eq!(attr(&fx, fx.triggers[1], "data-disabled").as_deref(), Some(""));

        let event = fx.doc.key_down(fx.buttons[0], Key::ArrowRight);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(fx.doc.active_element(), Some(fx.buttons[2]));
        assert_eq!(fx.root_instance().value(), "tab3");
    }

    #[test]
    fn test_arrow_right_wraps_with_loop() {
        let fx = three_tabs(TabsOptions {
            value: Some("tab3"),
            looping: true,
            ..TabsOptions::default()
        });
        fx.doc.key_down(fx.buttons[2], Key::ArrowRight);
        assert_eq!(fx.doc.active_element(), Some(fx.buttons[0]));
        assert_eq!(fx.root_instance().value(), "tab1");

        fx.doc.key_down(fx.buttons[0], Key::ArrowLeft);
        assert_eq!(fx.root_instance().value(), "tab3");
    }

    #[test]
    fn test_boundary_without_loop_is_dropped() {
        let fx = three_tabs(TabsOptions {
            value: Some("tab3"),
            ..TabsOptions::default()
        });
        let event = fx.doc.key_down(fx.buttons[2], Key::ArrowDown);
        assert!(!event.default_prevented());
        assert_eq!(fx.doc.active_element(), None);
        assert_eq!(fx.root_instance().value(), "tab3");

        fx.doc.click(fx.buttons[0]);
        let event = fx.doc.key_down(fx.buttons[0], Key::ArrowUp);
        assert!(!event.default_prevented());
        assert_eq!(fx.root_instance().value(), "tab1");
    }

    #[test]
    fn test_home_and_end() {
        let fx = tabs(TabsOptions {
            value: Some("tab2"),
            ..TabsOptions::default()
        });
        fx.doc.key_down(fx.buttons[1], Key::End);
        assert_eq!(fx.root_instance().value(), "tab3");
        fx.doc.key_down(fx.buttons[2], Key::Home);
        assert_eq!(fx.root_instance().value(), "tab1");
        assert_eq!(fx.doc.active_element(), Some(fx.buttons[0]));
    }

    #[test]
    fn test_manual_mode_moves_focus_only() {
        let fx = tabs(TabsOptions {
            value: Some("tab1"),
            activation_mode: Some("manual"),
            ..TabsOptions::default()
        });
        fx.doc.focus(fx.buttons[0]);

        fx.doc.key_down(fx.buttons[0], Key::ArrowRight);
        assert_eq!(fx.doc.active_element(), Some(fx.buttons[1]));
        fx.doc.key_down(fx.buttons[1], Key::ArrowRight);
        assert_eq!(fx.doc.active_element(), Some(fx.buttons[2]));
        assert_eq!(fx.root_instance().value(), "tab1");

        let event = fx.doc.key_down(fx.buttons[2], Key::Enter);
        assert!(event.default_prevented());
        assert_eq!(fx.root_instance().value(), "tab3");
    }

    #[test]
    fn test_attribute_changes() {
        let fx = tabs(TabsOptions {
            value: Some("tab1"),
            ..TabsOptions::default()
        });

        fx.doc.set_attribute(fx.root, "value", "tab2");
        assert_eq!(attr(&fx, fx.buttons[1], "aria-selected").as_deref(), Some("true"));

        fx.doc.set_attribute(fx.root, "activation-mode", "manual");
        assert_eq!(fx.root_instance().activation_mode(), ActivationMode::Manual);

        fx.doc.set_attribute(fx.triggers[0], "disabled", "");
        assert_eq!(attr(&fx, fx.buttons[0], "disabled").as_deref(), Some(""));
        assert!(!fx.doc.click(fx.buttons[0]));
        assert_eq!(fx.root_instance().value(), "tab2");

        fx.doc.remove_attribute(fx.triggers[0], "disabled");
        assert_eq!(attr(&fx, fx.buttons[0], "disabled"), None);
        assert_eq!(attr(&fx, fx.triggers[0], "data-disabled"), None);
    }

    #[test]
    fn test_trigger_outside_tabs_is_reported() {
        let fx = tabs(TabsOptions::default());
        let stray = fx.doc.create_element(TABS_TRIGGER);
        fx.doc.append_child(fx.doc.body(), stray).unwrap();

        let diagnostics = fx.doc.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error,
            ElementError::MissingAncestor {
                part: TABS_TRIGGER,
                ancestor: TABS,
            }
        );
    }

    #[test]
    fn test_disconnect_releases_listeners() {
        let fx = tabs(TabsOptions::default());
        fx.doc.remove(fx.root);
        assert_eq!(fx.doc.listener_count(fx.list, event_types::KEYDOWN), 0);
        assert_eq!(fx.doc.listener_count(fx.buttons[0], event_types::CLICK), 0);
        assert_eq!(fx.root_instance().store().subscriber_count(), 0);
    }
}
