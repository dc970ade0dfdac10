//! Error types for shoji_dom

use thiserror::Error;

/// Errors returned by document operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node id does not belong to this document
    #[error("node does not exist in this document")]
    UnknownNode,

    /// Insertion would create a cycle or give a text node children
    #[error("the node cannot be inserted at this position")]
    HierarchyRequest,

    /// A dialog operation was invoked on another element type
    #[error("<{0}> is not a dialog element")]
    NotADialog(String),

    /// Selector text could not be parsed
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

/// Structural misuse detected while a custom element attaches
///
/// These are never fatal: the document logs them, records a
/// [`Diagnostic`](crate::Diagnostic) and leaves the element inert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    /// A part was placed outside its required ancestor
    #[error("<{part}> must be a descendant of <{ancestor}>")]
    MissingAncestor {
        part: &'static str,
        ancestor: &'static str,
    },

    /// A part is missing the native control it decorates
    #[error("<{part}> requires a <{control}> element")]
    MissingControl {
        part: &'static str,
        control: &'static str,
    },

    /// A target selector matched nothing
    #[error("no element matches target selector `{0}`")]
    TargetNotFound(String),

    /// A target selector matched the wrong element type
    #[error("target `{selector}` is <{found}>, expected <{expected}>")]
    TargetMismatch {
        selector: String,
        found: String,
        expected: &'static str,
    },

    /// Underlying document error
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Result type for shoji_dom operations
pub type Result<T> = std::result::Result<T, DomError>;
