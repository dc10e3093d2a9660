use quire_model::{NodeKey, TreeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Node not found during export: {0}")]
    MissingNode(NodeKey),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
