//! Markup fixtures for widget tests
//!
//! Trees are built detached and mounted in one append, the way a page parser
//! hands over a finished subtree, so parts always connect with their children
//! already present.

use std::rc::Rc;

use shoji_dom::{Document, NodeId};
use tracing_subscriber::EnvFilter;

use crate::components::accordion::{
    Accordion, AccordionItem, ACCORDION, ACCORDION_CONTENT, ACCORDION_HEADER, ACCORDION_ITEM,
    ACCORDION_TRIGGER,
};
use crate::components::dialog::{
    Dialog, DIALOG, DIALOG_CLOSE, DIALOG_CONTENT, DIALOG_DESCRIPTION, DIALOG_OUTSIDE_TRIGGER,
    DIALOG_TITLE, DIALOG_TRIGGER,
};
use crate::components::tabs::{Tabs, TABS, TABS_LIST, TABS_PANEL, TABS_TRIGGER};
use crate::define_elements;

/// Route `tracing` output through the test harness (`RUST_LOG=shoji_cn=trace`)
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> Document {
    init_tracing();
    define_elements();
    Document::new()
}

/// Detached element with attributes
fn element(doc: &Document, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let node = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attribute(node, name, *value);
    }
    node
}

fn append(doc: &Document, parent: NodeId, child: NodeId) -> NodeId {
    doc.append_child(parent, child).unwrap();
    child
}

fn text(doc: &Document, parent: NodeId, content: &str) {
    let node = doc.create_text(content);
    append(doc, parent, node);
}

fn mount(doc: &Document, root: NodeId) {
    doc.append_child(doc.body(), root).unwrap();
}

// ============================================================================
// Accordion
// ============================================================================

pub(crate) struct AccordionFixture {
    pub doc: Document,
    pub root: NodeId,
    pub items: Vec<NodeId>,
    pub headers: Vec<NodeId>,
    pub buttons: Vec<NodeId>,
    pub contents: Vec<NodeId>,
}

impl AccordionFixture {
    pub fn root_instance(&self) -> Rc<Accordion> {
        self.doc.instance::<Accordion>(self.root).unwrap()
    }

    pub fn item_instances(&self) -> Vec<Rc<AccordionItem>> {
        self.items
            .iter()
            .map(|item| self.doc.instance::<AccordionItem>(*item).unwrap())
            .collect()
    }
}

/// `ui-accordion` with one item per value
pub(crate) fn accordion(root_attrs: &[(&str, &str)], values: &[&str]) -> AccordionFixture {
    let doc = setup();
    let root = element(&doc, ACCORDION, root_attrs);

    let mut fx = AccordionFixture {
        doc: doc.clone(),
        root,
        items: Vec::new(),
        headers: Vec::new(),
        buttons: Vec::new(),
        contents: Vec::new(),
    };

    for &value in values {
        let item = append(&doc, root, element(&doc, ACCORDION_ITEM, &[("value", value)]));
        let header = append(&doc, item, element(&doc, ACCORDION_HEADER, &[]));
        let trigger = append(&doc, header, element(&doc, ACCORDION_TRIGGER, &[]));
        let button = append(&doc, trigger, element(&doc, "button", &[]));
        text(&doc, button, value);
        let content = append(&doc, item, element(&doc, ACCORDION_CONTENT, &[]));
        text(&doc, content, &format!("Content for {value}"));

        fx.items.push(item);
        fx.headers.push(header);
        fx.buttons.push(button);
        fx.contents.push(content);
    }

    mount(&doc, root);
    fx
}

// ============================================================================
// Dialog
// ============================================================================

pub(crate) struct DialogOptions {
    pub open: bool,
    pub modal: bool,
    pub closedby: Option<&'static str>,
    pub surface_id: Option<&'static str>,
    pub title_id: Option<&'static str>,
    /// `data-target` of an outside trigger mounted after the dialog
    pub outside_trigger: Option<&'static str>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            open: false,
            modal: true,
            closedby: None,
            surface_id: None,
            title_id: None,
            outside_trigger: None,
        }
    }
}

pub(crate) struct DialogFixture {
    pub doc: Document,
    pub root: NodeId,
    pub trigger: NodeId,
    pub trigger_button: NodeId,
    pub content: NodeId,
    pub surface: NodeId,
    pub title: NodeId,
    pub description: NodeId,
    pub close_button: NodeId,
    /// Outside trigger element and its button
    pub outside: Option<(NodeId, NodeId)>,
}

impl DialogFixture {
    pub fn root_instance(&self) -> Rc<Dialog> {
        self.doc.instance::<Dialog>(self.root).unwrap()
    }
}

/// `ui-dialog#test-dialog` with trigger, content, title, description and close
pub(crate) fn dialog(options: DialogOptions) -> DialogFixture {
    let doc = setup();

    let root = element(&doc, DIALOG, &[("id", "test-dialog")]);
    if let Some(closedby) = options.closedby {
        doc.set_attribute(root, "closedby", closedby);
    }
    if !options.modal {
        doc.set_attribute(root, "modal", "false");
    }
    if options.open {
        doc.set_attribute(root, "open", "");
    }

    let trigger = append(&doc, root, element(&doc, DIALOG_TRIGGER, &[]));
    let trigger_button = append(&doc, trigger, element(&doc, "button", &[]));
    text(&doc, trigger_button, "Open");

    let content = append(&doc, root, element(&doc, DIALOG_CONTENT, &[]));
    let surface = append(&doc, content, element(&doc, "dialog", &[]));
    if let Some(id) = options.surface_id {
        doc.set_attribute(surface, "id", id);
    }

    let title = append(&doc, surface, element(&doc, DIALOG_TITLE, &[]));
    if let Some(id) = options.title_id {
        doc.set_attribute(title, "id", id);
    }
    text(&doc, title, "Dialog Title");
    let description = append(&doc, surface, element(&doc, DIALOG_DESCRIPTION, &[]));
    text(&doc, description, "Dialog description");

    let close = append(&doc, surface, element(&doc, DIALOG_CLOSE, &[]));
    let close_button = append(&doc, close, element(&doc, "button", &[]));
    text(&doc, close_button, "Close");

    mount(&doc, root);

    let outside = options.outside_trigger.map(|target| {
        let outside = element(&doc, DIALOG_OUTSIDE_TRIGGER, &[("data-target", target)]);
        let button = append(&doc, outside, element(&doc, "button", &[]));
        text(&doc, button, "Open from outside");
        mount(&doc, outside);
        (outside, button)
    });

    DialogFixture {
        doc,
        root,
        trigger,
        trigger_button,
        content,
        surface,
        title,
        description,
        close_button,
        outside,
    }
}

// ============================================================================
// Tabs
// ============================================================================

pub(crate) struct TabsOptions {
    pub value: Option<&'static str>,
    pub activation_mode: Option<&'static str>,
    pub looping: bool,
    /// `(value, disabled)` per trigger
    pub triggers: Vec<(&'static str, bool)>,
    /// Mount panels before the list so panels connect first
    pub panels_first: bool,
    /// Trigger whose button is authored with `aria-selected="true"`
    pub preselected: Option<&'static str>,
}

impl Default for TabsOptions {
    fn default() -> Self {
        Self {
            value: None,
            activation_mode: None,
            looping: false,
            triggers: vec![("tab1", false), ("tab2", false), ("tab3", false)],
            panels_first: true,
            preselected: None,
        }
    }
}

pub(crate) struct TabsFixture {
    pub doc: Document,
    pub root: NodeId,
    pub list: NodeId,
    pub triggers: Vec<NodeId>,
    pub buttons: Vec<NodeId>,
    pub panels: Vec<NodeId>,
}

impl TabsFixture {
    pub fn root_instance(&self) -> Rc<Tabs> {
        self.doc.instance::<Tabs>(self.root).unwrap()
    }
}

pub(crate) fn tabs(options: TabsOptions) -> TabsFixture {
    let doc = setup();

    let root = element(&doc, TABS, &[]);
    if let Some(value) = options.value {
        doc.set_attribute(root, "value", value);
    }
    if let Some(mode) = options.activation_mode {
        doc.set_attribute(root, "activation-mode", mode);
    }

    let list = element(&doc, TABS_LIST, &[]);
    if options.looping {
        doc.set_attribute(list, "loop", "");
    }

    let mut triggers = Vec::new();
    let mut buttons = Vec::new();
    let mut panels = Vec::new();
    for &(value, disabled) in &options.triggers {
        let trigger = append(&doc, list, element(&doc, TABS_TRIGGER, &[("value", value)]));
        if disabled {
            doc.set_attribute(trigger, "disabled", "");
        }
        let button = append(&doc, trigger, element(&doc, "button", &[]));
        if options.preselected == Some(value) {
            doc.set_attribute(button, "aria-selected", "true");
        }
        text(&doc, button, value);

        let panel = element(&doc, TABS_PANEL, &[("value", value)]);
        text(&doc, panel, &format!("Content for {value}"));

        triggers.push(trigger);
        buttons.push(button);
        panels.push(panel);
    }

    if !options.panels_first {
        append(&doc, root, list);
    }
    for panel in &panels {
        append(&doc, root, *panel);
    }
    if options.panels_first {
        append(&doc, root, list);
    }

    mount(&doc, root);

    TabsFixture {
        doc,
        root,
        list,
        triggers,
        buttons,
        panels,
    }
}
