//! # Shoji Component Library (shoji_cn)
//!
//! Accessible accordion, dialog and tabs widgets as custom elements on top of
//! `shoji_dom`.
//!
//! ## Philosophy
//!
//! Markup is authored by the page; the widgets only add behaviour:
//!
//! - **Store**: each root owns a `shoji_core::Store` with its widget state
//! - **Parts**: children discover their root by walking up the tree
//! - **Projection**: ARIA and `data-*` attributes are derived from the store
//!
//! ## Example
//!
//! ```ignore
//! use shoji_cn::prelude::*;
//!
//! define_elements();
//!
//! let doc = Document::new();
//! let tabs = doc.create_element("ui-tabs");
//! doc.set_attribute(tabs, "value", "account");
//! // ... build list, triggers and panels ...
//! doc.append_child(doc.body(), tabs)?;
//!
//! doc.add_event_listener(tabs, ON_VALUE_CHANGE, |_, event| {
//!     let change = event.detail::<TabsValueChange>();
//! });
//! ```
//!
//! ## Components
//!
//! - **Accordion** - `ui-accordion`, `ui-accordion-item`, `ui-accordion-header`,
//!   `ui-accordion-trigger`, `ui-accordion-content`
//! - **Dialog** - `ui-dialog`, `ui-dialog-trigger`, `ui-dialog-outside-trigger`,
//!   `ui-dialog-close`, `ui-dialog-content`, `ui-dialog-title`,
//!   `ui-dialog-description`
//! - **Tabs** - `ui-tabs`, `ui-tabs-list`, `ui-tabs-trigger`, `ui-tabs-panel`

use std::sync::Once;

pub mod components;

mod ids;
mod lifecycle;

#[cfg(test)]
mod testing;

pub use components::*;

/// Emitted by accordion and tabs roots when their value changes
pub const ON_VALUE_CHANGE: &str = "onValueChange";

/// Emitted by dialog roots when they open or close
pub const ON_OPEN_CHANGE: &str = "onOpenChange";

static DEFINE: Once = Once::new();

/// Register every `ui-*` element with the global registry
///
/// Safe to call repeatedly; only the first call registers.
pub fn define_elements() {
    DEFINE.call_once(|| {
        for definition in components::definitions() {
            shoji_dom::element::define(definition);
        }
        tracing::debug!("shoji elements defined");
    });
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::components::accordion::{
        Accordion, AccordionItem, AccordionMode, AccordionValue, AccordionValueChange,
    };
    pub use crate::components::dialog::{ClosedBy, Dialog, OpenChange};
    pub use crate::components::tabs::{ActivationMode, Tabs, TabsValueChange};
    pub use crate::{define_elements, ON_OPEN_CHANGE, ON_VALUE_CHANGE};
    pub use shoji_dom::{Document, Event, Key, NodeId};
}
