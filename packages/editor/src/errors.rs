//! Error types for the editor

use quire_html::ExportError;
use quire_model::{JsonError, NodeKey, TreeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Snapshot error: {0}")]
    Json(#[from] JsonError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("A transaction is already being committed")]
    TransactionInProgress,

    #[error("Node {0} is not part of the current state")]
    StaleNode(NodeKey),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl From<String> for EditorError {
    fn from(s: String) -> Self {
        EditorError::Rejected(s)
    }
}
