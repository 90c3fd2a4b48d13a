//! Error type shared by every layout operation.

use thiserror::Error;

use crate::node::NodeId;

/// Result alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Failures raised by the node model, the serializer and the manipulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// An operation was given a node or argument of the wrong kind.
    #[error("invalid type: {message}")]
    InvalidType { message: String },

    /// A referenced node does not sit where the operation expects it.
    #[error("inconsistency: {message}")]
    Inconsistency { message: String },

    /// A decoration is already present (or absent) when toggled.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// A node handle does not resolve in the tree.
    #[error("node {node} does not exist")]
    NodeDoesNotExist { node: NodeId },

    /// The text form could not be read back into a tree.
    #[error("parse error: {message}")]
    Parse { message: String },
}

impl LayoutError {
    #[must_use]
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::InvalidType {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
