//! Shoji DOM
//!
//! A small live document model for driving the widgets outside a browser:
//!
//! - **Tree**: elements, text, attributes, inline style and host-provided
//!   metrics ([`Document`])
//! - **Custom elements**: a global tag registry and synchronous
//!   connected / disconnected / attribute-changed callbacks ([`element`])
//! - **Events**: bubbling dispatch with cancellation and propagation control,
//!   plus click, keyboard and focus helpers ([`Event`])
//! - **Selectors**: the querying subset widgets need ([`Selector`])
//! - **Native dialog**: modal presentation, `close` events, Escape handling
//! - **Projection**: idempotent attribute writes ([`Attrs`])
//!
//! # Example
//!
//! ```ignore
//! use shoji_dom::{Document, Key};
//!
//! let doc = Document::new();
//! let dialog = doc.create_element("dialog");
//! doc.append_child(doc.body(), dialog)?;
//! doc.show_modal(dialog)?;
//! doc.key_down(dialog, Key::Escape);
//! assert!(!doc.is_dialog_open(dialog));
//! ```

pub mod attrs;
pub mod dialog;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod node;
pub mod selector;

pub use attrs::Attrs;
pub use document::{Diagnostic, Document, WeakDocument};
pub use element::{CustomElement, ElementDefinition};
pub use error::{DomError, ElementError, Result};
pub use event::{event_types, Event, EventListener, Key, ListenerId};
pub use node::{NodeId, Rect};
pub use selector::Selector;
