//! Dialog component for modal and non-modal overlays
//!
//! Wraps a native `<dialog>` and wires up its ARIA relationships.
//!
//! # Markup
//!
//! ```html
//! <ui-dialog id="settings" closedby="any">
//!   <ui-dialog-trigger><button>Open</button></ui-dialog-trigger>
//!   <ui-dialog-content>
//!     <dialog>
//!       <ui-dialog-title>Settings</ui-dialog-title>
//!       <ui-dialog-description>Edit your preferences.</ui-dialog-description>
//!       <ui-dialog-close><button>Close</button></ui-dialog-close>
//!     </dialog>
//!   </ui-dialog-content>
//! </ui-dialog>
//!
//! <ui-dialog-outside-trigger data-target="#settings">
//!   <button>Settings</button>
//! </ui-dialog-outside-trigger>
//! ```
//!
//! `modal="false"` switches to non-modal presentation; any other value (or
//! none) is modal. `closedby` is one of `any`, `closerequest` or `none`;
//! anything else leaves the platform default.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use shoji_core::Store;
use shoji_dom::{
    event_types, Attrs, CustomElement, Document, ElementDefinition, ElementError, Event, Key,
    ListenerId, NodeId, Selector,
};

use crate::ids::{non_empty, random_id};
use crate::lifecycle::{aria_bool, find_ancestor, remove_cloak, Bindings};
use crate::ON_OPEN_CHANGE;

pub const DIALOG: &str = "ui-dialog";
pub const DIALOG_TRIGGER: &str = "ui-dialog-trigger";
pub const DIALOG_OUTSIDE_TRIGGER: &str = "ui-dialog-outside-trigger";
pub const DIALOG_CLOSE: &str = "ui-dialog-close";
pub const DIALOG_CONTENT: &str = "ui-dialog-content";
pub const DIALOG_TITLE: &str = "ui-dialog-title";
pub const DIALOG_DESCRIPTION: &str = "ui-dialog-description";

/// Close reason recorded by the close part
pub const CLOSE_TRIGGER_REASON: &str = "close-trigger";
/// Close reason recorded by light dismiss
pub const DISMISS_REASON: &str = "dismiss";

/// Which user actions may close the dialog
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClosedBy {
    /// Close requests and clicks outside the dialog
    Any,
    /// Close requests only (Escape)
    CloseRequest,
    /// Only explicit close calls
    None,
    /// Platform default
    #[default]
    Auto,
}

impl ClosedBy {
    /// Unknown or missing values fall back to [`ClosedBy::Auto`]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("any") => Self::Any,
            Some("closerequest") => Self::CloseRequest,
            Some("none") => Self::None,
            _ => Self::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::CloseRequest => "closerequest",
            Self::None => "none",
            Self::Auto => "auto",
        }
    }
}

/// Detail of the dialog's `onOpenChange` event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenChange {
    pub open: bool,
    /// The `ui-dialog` element
    pub target: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogState {
    pub open: bool,
    pub modal: bool,
    pub closedby: ClosedBy,
    pub dialog_id: String,
    pub title_id: String,
    pub description_id: String,
}

impl DialogState {
    fn generated() -> Self {
        Self {
            open: false,
            modal: true,
            closedby: ClosedBy::Auto,
            dialog_id: random_id("dialog"),
            title_id: random_id("dialog-title"),
            description_id: random_id("dialog-description"),
        }
    }

    fn data_state(&self) -> &'static str {
        data_state(self.open)
    }
}

fn data_state(open: bool) -> &'static str {
    if open {
        "open"
    } else {
        "closed"
    }
}

fn parse_modal(value: Option<&str>) -> bool {
    value != Some("false")
}

fn selector(text: &str) -> Result<Selector, ElementError> {
    Ok(Selector::parse(text)?)
}

// ============================================================================
// Root
// ============================================================================

/// `<ui-dialog>`
pub struct Dialog {
    store: Store<DialogState>,
    surface: Cell<Option<NodeId>>,
    ready: Cell<bool>,
    bindings: Bindings,
}

impl Default for Dialog {
    fn default() -> Self {
        Self {
            store: Store::new(DialogState::generated()),
            surface: Cell::new(None),
            ready: Cell::new(false),
            bindings: Bindings::default(),
        }
    }
}

impl Dialog {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG,
        observed_attributes: &["open", "modal", "closedby"],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    pub fn store(&self) -> &Store<DialogState> {
        &self.store
    }

    pub fn state(&self) -> DialogState {
        self.store.get()
    }

    pub fn is_open(&self) -> bool {
        self.store.with(|state| state.open)
    }

    /// The native `<dialog>` this root controls
    pub fn surface(&self) -> Option<NodeId> {
        self.surface.get()
    }

    /// Present the dialog modally
    pub fn show_modal(&self, doc: &Document) {
        if let Some(surface) = self.surface.get() {
            if let Err(error) = doc.show_modal(surface) {
                tracing::warn!(%error, "showModal failed");
            }
        }
        tracing::debug!("dialog opened (modal)");
        self.store.update(|state| state.open = true);
    }

    /// Present the dialog without blocking the page
    pub fn show(&self, doc: &Document) {
        if let Some(surface) = self.surface.get() {
            if let Err(error) = doc.show(surface) {
                tracing::warn!(%error, "show failed");
            }
        }
        tracing::debug!("dialog opened");
        self.store.update(|state| state.open = true);
    }

    /// Open with the presentation selected by `modal`
    pub fn open(&self, doc: &Document) {
        if self.store.with(|state| state.modal) {
            self.show_modal(doc);
        } else {
            self.show(doc);
        }
    }

    /// Close the dialog, recording `reason` as the native return value
    pub fn close(&self, doc: &Document, reason: Option<&str>) {
        if let Some(surface) = self.surface.get() {
            if let Err(error) = doc.close_dialog(surface, reason) {
                tracing::warn!(%error, "close failed");
            }
        }
        tracing::debug!(?reason, "dialog closed");
        self.store.update(|state| state.open = false);
    }

    /// Keep the store in sync with a close the platform performed
    fn closed_natively(&self) {
        self.store.update(|state| state.open = false);
    }
}

impl CustomElement for Dialog {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let title = doc.query_scoped_first(node, &selector(DIALOG_TITLE)?, DIALOG);
        let description = doc.query_scoped_first(node, &selector(DIALOG_DESCRIPTION)?, DIALOG);
        let surface = doc.query_scoped_first(node, &selector("dialog")?, DIALOG);
        self.surface.set(surface);

        let id_of =
            |node: Option<NodeId>| non_empty(node.and_then(|node| doc.get_attribute(node, "id")));
        let open = doc.has_attribute(node, "open");
        let modal = parse_modal(doc.get_attribute(node, "modal").as_deref());
        let closedby = ClosedBy::parse(doc.get_attribute(node, "closedby").as_deref());
        let dialog_id = id_of(surface);
        let title_id = id_of(title);
        let description_id = id_of(description);

        self.store.update(|state| {
            state.open = open;
            state.modal = modal;
            state.closedby = closedby;
            if let Some(id) = dialog_id {
                state.dialog_id = id;
            }
            if let Some(id) = title_id {
                state.title_id = id;
            }
            if let Some(id) = description_id {
                state.description_id = id;
            }
        });

        Attrs::new()
            .set("data-state", data_state(open))
            .apply(doc, Some(node));

        let weak_doc = doc.downgrade();
        self.bindings.hold(self.store.subscribe_with_selector(
            |state: &DialogState| state.open,
            move |open, _| {
                let Some(doc) = weak_doc.upgrade() else {
                    return;
                };
                Attrs::new()
                    .set("data-state", data_state(*open))
                    .apply(&doc, Some(node));
                doc.dispatch_event(
                    node,
                    Event::custom(
                        ON_OPEN_CHANGE,
                        OpenChange {
                            open: *open,
                            target: node,
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
        doc: &Document,
        _node: NodeId,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        if !self.ready.get() || old == new {
            return;
        }

        match name {
            "open" => match new {
                Some(_) => self.open(doc),
                None => self.close(doc, None),
            },
            "modal" => {
                self.store.update(|state| state.modal = parse_modal(new));
            }
            "closedby" => {
                self.store.update(|state| state.closedby = ClosedBy::parse(new));
            }
            _ => {}
        }
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// Wire a trigger element and its button to `root`
fn bind_trigger(
    doc: &Document,
    node: NodeId,
    button: Option<NodeId>,
    root: &Rc<Dialog>,
    bindings: &Bindings,
) {
    let project = move |doc: &Document, state: &(bool, String)| {
        let (open, dialog_id) = state;
        Attrs::new()
            .set("data-state", data_state(*open))
            .apply(doc, Some(node));
        Attrs::new()
            .set("type", "button")
            .set("aria-haspopup", "dialog")
            .set("aria-expanded", aria_bool(*open))
            .set("aria-controls", dialog_id.as_str())
            .set("data-state", data_state(*open))
            .apply(doc, button);
    };

    project(
        doc,
        &root.store.with(|state| (state.open, state.dialog_id.clone())),
    );

    let weak_doc = doc.downgrade();
    bindings.hold(root.store.subscribe_with_selector(
        |state: &DialogState| (state.open, state.dialog_id.clone()),
        move |state, _| {
            if let Some(doc) = weak_doc.upgrade() {
                project(&doc, state);
            }
        },
    ));

    if let Some(button) = button {
        let weak_root = Rc::downgrade(root);
        bindings.listen(doc, button, event_types::CLICK, move |doc, _| {
            if let Some(root) = weak_root.upgrade() {
                root.open(doc);
            }
        });
    }
}

/// `<ui-dialog-trigger>` inside the dialog root
#[derive(Default)]
pub struct DialogTrigger {
    bindings: Bindings,
}

impl DialogTrigger {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_TRIGGER,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };
}

impl CustomElement for DialogTrigger {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Dialog>(doc, node, DIALOG_TRIGGER, DIALOG)?;
        let button = doc.query_scoped_first(node, &selector("button")?, DIALOG);

        bind_trigger(doc, node, button, &root, &self.bindings);

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }
}

/// `<ui-dialog-outside-trigger data-target="...">` placed anywhere in the document
#[derive(Default)]
pub struct DialogOutsideTrigger {
    root: RefCell<Weak<Dialog>>,
    bindings: Bindings,
}

impl DialogOutsideTrigger {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_OUTSIDE_TRIGGER,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    /// The dialog root resolved at connect time
    pub fn target(&self) -> Option<Rc<Dialog>> {
        self.root.borrow().upgrade()
    }

    fn resolve(doc: &Document, node: NodeId) -> Result<Rc<Dialog>, ElementError> {
        let target = doc.get_attribute(node, "data-target").unwrap_or_default();
        if target.trim().is_empty() {
            return Err(ElementError::TargetNotFound(target));
        }

        let found = doc
            .query_document(&target)?
            .ok_or_else(|| ElementError::TargetNotFound(target.clone()))?;
        let tag = doc.tag(found).unwrap_or_default();
        if tag != DIALOG {
            return Err(ElementError::TargetMismatch {
                selector: target,
                found: tag,
                expected: DIALOG,
            });
        }

        // The root must already be connected
        doc.instance::<Dialog>(found)
            .ok_or(ElementError::TargetNotFound(target))
    }
}

impl CustomElement for DialogOutsideTrigger {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let root = Self::resolve(doc, node)?;
        *self.root.borrow_mut() = Rc::downgrade(&root);

        let button = doc.query_selector(node, &selector("button")?);
        bind_trigger(doc, node, button, &root, &self.bindings);

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.bindings.release(doc);
    }
}

/// `<ui-dialog-close>`
#[derive(Default)]
pub struct DialogClose {
    bindings: Bindings,
}

impl DialogClose {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_CLOSE,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };
}

impl CustomElement for DialogClose {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Dialog>(doc, node, DIALOG_CLOSE, DIALOG)?;
        let button = doc.query_scoped_first(node, &selector("button")?, DIALOG);

        Attrs::new().set("type", "button").apply(doc, button);
        if let Some(button) = button {
            let weak_root = Rc::downgrade(&root);
            self.bindings
                .listen(doc, button, event_types::CLICK, move |doc, _| {
                    if let Some(root) = weak_root.upgrade() {
                        root.close(doc, Some(CLOSE_TRIGGER_REASON));
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

/// `<ui-dialog-content>` hosting the native `<dialog>`
#[derive(Default)]
pub struct DialogContent {
    root: RefCell<Weak<Dialog>>,
    surface: Cell<Option<NodeId>>,
    escape_listener: Cell<Option<ListenerId>>,
    dismiss_listener: Cell<Option<ListenerId>>,
    bindings: Bindings,
}

impl DialogContent {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_CONTENT,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self::default()) },
    };

    fn root(&self) -> Option<Rc<Dialog>> {
        self.root.borrow().upgrade()
    }

    /// Attach or detach the Escape and light-dismiss handlers
    fn set_active(self: &Rc<Self>, doc: &Document, active: bool) {
        let Some(surface) = self.surface.get() else {
            return;
        };

        if !active {
            self.deactivate(doc);
            return;
        }

        if self.escape_listener.get().is_none() {
            let weak_self = Rc::downgrade(self);
            let id = doc.add_event_listener(surface, event_types::KEYDOWN, move |_, event| {
                if let Some(content) = weak_self.upgrade() {
                    content.suppress_escape(event);
                }
            });
            self.escape_listener.set(Some(id));
        }
        if self.dismiss_listener.get().is_none() {
            let weak_self = Rc::downgrade(self);
            let id = doc.add_event_listener(surface, event_types::CLICK, move |doc, event| {
                if let Some(content) = weak_self.upgrade() {
                    content.light_dismiss(doc, event);
                }
            });
            self.dismiss_listener.set(Some(id));
        }
    }

    fn deactivate(&self, doc: &Document) {
        let Some(surface) = self.surface.get() else {
            return;
        };
        if let Some(id) = self.escape_listener.take() {
            doc.remove_event_listener(surface, id);
        }
        if let Some(id) = self.dismiss_listener.take() {
            doc.remove_event_listener(surface, id);
        }
    }

    /// `closedby="none"`: keep Escape from reaching the platform close request
    fn suppress_escape(&self, event: &Event) {
        let Some(root) = self.root() else {
            return;
        };
        let (open, closedby) = root.store.with(|state| (state.open, state.closedby));
        if open && closedby == ClosedBy::None && event.key() == Some(Key::Escape) {
            tracing::trace!("escape suppressed");
            event.stop_immediate_propagation();
            event.prevent_default();
        }
    }

    /// `closedby="any"`: close on a click on the backdrop
    fn light_dismiss(&self, doc: &Document, event: &Event) {
        let Some(root) = self.root() else {
            return;
        };
        let (open, closedby) = root.store.with(|state| (state.open, state.closedby));
        if !open || closedby != ClosedBy::Any {
            return;
        }

        // Clicks on inner content target a descendant
        let Some(target) = event.target() else {
            return;
        };
        if Some(target) != self.surface.get() {
            return;
        }

        let rect = doc.bounding_client_rect(target);
        if !rect.contains(event.client_x(), event.client_y()) {
            root.close(doc, Some(DISMISS_REASON));
        }
    }

    fn project_surface(doc: &Document, surface: NodeId, state: &DialogState) {
        let closedby = match state.closedby {
            ClosedBy::Auto => None,
            other => Some(other.as_str()),
        };
        Attrs::new()
            .set("id", state.dialog_id.as_str())
            .set("aria-labelledby", state.title_id.as_str())
            .set("aria-describedby", state.description_id.as_str())
            .opt("closedby", closedby)
            .apply(doc, Some(surface));
    }
}

impl CustomElement for DialogContent {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (root_node, root) = find_ancestor::<Dialog>(doc, node, DIALOG_CONTENT, DIALOG)?;
        *self.root.borrow_mut() = Rc::downgrade(&root);

        let surface = doc
            .query_scoped_first(root_node, &selector("dialog")?, DIALOG)
            .ok_or(ElementError::MissingControl {
                part: DIALOG_CONTENT,
                control: "dialog",
            })?;
        self.surface.set(Some(surface));

        let state = root.state();
        Attrs::new()
            .set("data-state", state.data_state())
            .apply(doc, Some(node));
        Self::project_surface(doc, surface, &state);
        Attrs::new()
            .set("data-state", state.data_state())
            .apply(doc, Some(surface));

        // Platform-initiated closes (Escape, form submission) must reach the store
        let weak_root = Rc::downgrade(&root);
        self.bindings
            .listen(doc, surface, event_types::CLOSE, move |_, _| {
                if let Some(root) = weak_root.upgrade() {
                    root.closed_natively();
                }
            });

        if state.open {
            let presented = if state.modal {
                doc.show_modal(surface)
            } else {
                doc.show(surface)
            };
            if let Err(error) = presented {
                tracing::warn!(%error, "could not present initially open dialog");
            }
            self.set_active(doc, true);
        }

        let weak_doc = doc.downgrade();
        let weak_self = Rc::downgrade(&self);
        self.bindings.hold(root.store.subscribe_with_selector(
            |state: &DialogState| state.open,
            move |open, _| {
                let (Some(doc), Some(content)) = (weak_doc.upgrade(), weak_self.upgrade()) else {
                    return;
                };
                content.set_active(&doc, *open);
                Attrs::new()
                    .set("data-state", data_state(*open))
                    .apply_all(&doc, &[Some(node), Some(surface)]);
            },
        ));

        let weak_doc = doc.downgrade();
        let weak_self = Rc::downgrade(&self);
        self.bindings.hold(root.store.subscribe_with_selector(
            |state: &DialogState| {
                (
                    state.dialog_id.clone(),
                    state.title_id.clone(),
                    state.description_id.clone(),
                    state.closedby,
                )
            },
            move |_, _| {
                let (Some(doc), Some(root)) = (
                    weak_doc.upgrade(),
                    weak_self.upgrade().and_then(|content| content.root()),
                ) else {
                    return;
                };
                Self::project_surface(&doc, surface, &root.state());
            },
        ));

        remove_cloak(doc, node);
        Ok(())
    }

    fn disconnected(&self, doc: &Document, _node: NodeId) {
        self.deactivate(doc);
        self.bindings.release(doc);
    }
}

// ============================================================================
// Title / Description
// ============================================================================

/// Which labelling id a part reports
#[derive(Clone, Copy)]
enum Label {
    Title,
    Description,
}

impl Label {
    fn tag(self) -> &'static str {
        match self {
            Self::Title => DIALOG_TITLE,
            Self::Description => DIALOG_DESCRIPTION,
        }
    }

    fn slot(self, state: &mut DialogState) -> &mut String {
        match self {
            Self::Title => &mut state.title_id,
            Self::Description => &mut state.description_id,
        }
    }

    /// Adopt the element's own id or expose the root's, then report it back
    fn connect(self, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        let (_, root) = find_ancestor::<Dialog>(doc, node, self.tag(), DIALOG)?;

        let mut current = root.state();
        let id = non_empty(doc.get_attribute(node, "id"))
            .unwrap_or_else(|| self.slot(&mut current).clone());
        Attrs::new().set("id", id.as_str()).apply(doc, Some(node));
        root.store.update(|state| *self.slot(state) = id);

        remove_cloak(doc, node);
        Ok(())
    }
}

/// `<ui-dialog-title>`
#[derive(Default)]
pub struct DialogTitle;

impl DialogTitle {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_TITLE,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self) },
    };
}

impl CustomElement for DialogTitle {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        Label::Title.connect(doc, node)
    }
}

/// `<ui-dialog-description>`
#[derive(Default)]
pub struct DialogDescription;

impl DialogDescription {
    pub const DEFINITION: ElementDefinition = ElementDefinition {
        tag: DIALOG_DESCRIPTION,
        observed_attributes: &[],
        construct: || -> Rc<dyn CustomElement> { Rc::new(Self) },
    };
}

impl CustomElement for DialogDescription {
    fn connected(self: Rc<Self>, doc: &Document, node: NodeId) -> Result<(), ElementError> {
        Label::Description.connect(doc, node)
    }
}
