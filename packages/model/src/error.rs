//! Error types for the document model

use crate::key::NodeKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeKey),

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeKey, parent: NodeKey },

    #[error("The root node cannot be moved, replaced or removed")]
    RootImmutable,

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<String> for TreeError {
    fn from(s: String) -> Self {
        TreeError::InvariantViolation(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JsonError {
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    #[error("Snapshot has no root record")]
    MissingRoot,

    #[error("Invalid {node_type} record: {reason}")]
    InvalidNode { node_type: String, reason: String },

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        JsonError::Malformed(e.to_string())
    }
}
