//! Errors raised by the document model.

use crate::document::NodeId;

/// Errors from building, querying or mutating a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The selector does not parse, or needs element state the arena
    /// cannot match (`:checked`, pseudo-elements).
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    /// The id does not refer to a node of this document.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The operation needs an element but the node is text or the root.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
}

impl DomError {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result alias for document operations.
pub type Result<T> = std::result::Result<T, DomError>;
