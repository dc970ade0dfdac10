//! Shoji Core
//!
//! Foundational state primitive for the Shoji widget library: a per-widget
//! [`Store`] with selector-gated subscriptions.
//!
//! Widgets never share a store. The root element of a widget owns its store
//! and its child parts reach it through a non-owning back-reference resolved
//! at attach time.

pub mod store;

pub use store::{Store, Subscription};
