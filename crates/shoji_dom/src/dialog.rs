//! Native `<dialog>` behaviour
//!
//! Models the parts of the platform dialog the widgets rely on: `showModal`,
//! `show`, `close(returnValue)`, the `open` attribute, the `close` event and
//! the Escape close request. The close request honors the `closedby`
//! attribute: `any` and `closerequest` close on Escape, `none` never does and
//! anything else closes only modal dialogs.

use crate::document::Document;
use crate::error::{DomError, Result};
use crate::event::{event_types, Event};
use crate::node::NodeId;

pub const DIALOG_TAG: &str = "dialog";

impl Document {
    fn ensure_dialog(&self, node: NodeId) -> Result<()> {
        match self.tag(node) {
            Some(tag) if tag == DIALOG_TAG => Ok(()),
            Some(tag) => Err(DomError::NotADialog(tag)),
            None => Err(DomError::UnknownNode),
        }
    }

    /// Present the dialog modally; no-op when already open
    pub fn show_modal(&self, dialog: NodeId) -> Result<()> {
        self.open_dialog(dialog, true)
    }

    /// Present the dialog non-modally; no-op when already open
    pub fn show(&self, dialog: NodeId) -> Result<()> {
        self.open_dialog(dialog, false)
    }

    fn open_dialog(&self, dialog: NodeId, modal: bool) -> Result<()> {
        self.ensure_dialog(dialog)?;
        if self.is_dialog_open(dialog) {
            return Ok(());
        }
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(dialog) {
            data.dialog.modal = modal;
        }
        tracing::debug!(?dialog, modal, "dialog shown");
        self.set_attribute(dialog, "open", "");
        Ok(())
    }

    /// Close the dialog and fire `close`
    ///
    /// Closing an already closed dialog does nothing and fires nothing.
    pub fn close_dialog(&self, dialog: NodeId, return_value: Option<&str>) -> Result<()> {
        self.ensure_dialog(dialog)?;
        if !self.is_dialog_open(dialog) {
            return Ok(());
        }
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(dialog) {
            data.dialog.modal = false;
            if let Some(value) = return_value {
                data.dialog.return_value = value.to_string();
            }
        }
        tracing::debug!(?dialog, ?return_value, "dialog closed");
        self.remove_attribute(dialog, "open");
        self.dispatch_event(dialog, Event::new(event_types::CLOSE));
        Ok(())
    }

    pub fn is_dialog_open(&self, dialog: NodeId) -> bool {
        self.has_tag(dialog, DIALOG_TAG) && self.has_attribute(dialog, "open")
    }

    pub fn is_dialog_modal(&self, dialog: NodeId) -> bool {
        self.is_dialog_open(dialog)
            && self
                .inner
                .nodes
                .borrow()
                .get(dialog)
                .is_some_and(|data| data.dialog.modal)
    }

    pub fn dialog_return_value(&self, dialog: NodeId) -> Option<String> {
        if !self.has_tag(dialog, DIALOG_TAG) {
            return None;
        }
        self.inner
            .nodes
            .borrow()
            .get(dialog)
            .map(|data| data.dialog.return_value.clone())
    }

    /// Escape handling for the open dialog containing `target`
    pub(crate) fn close_request(&self, target: NodeId) {
        let Some(dialog) = self
            .ancestors_inclusive(target)
            .into_iter()
            .find(|id| self.is_dialog_open(*id))
        else {
            return;
        };

        let closes = match self.get_attribute(dialog, "closedby").as_deref() {
            Some("any") | Some("closerequest") => true,
            Some("none") => false,
            _ => self.is_dialog_modal(dialog),
        };
        if !closes {
            tracing::trace!(?dialog, "close request ignored");
            return;
        }

        let cancel = self.dispatch_event(dialog, Event::new(event_types::CANCEL));
        if cancel.default_prevented() {
            return;
        }
        // The dialog was checked above, so this cannot fail
        let _ = self.close_dialog(dialog, None);
    }
}
