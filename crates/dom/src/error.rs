//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. Missing menu structure is never an error;
//! these cover broken input and misuse of the arena.

use thiserror::Error;

use crate::types::NodeId;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("CDP protocol error: {0}")]
    CdpError(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Cannot insert node {node} before its own descendant {reference}")]
    HierarchyRequest { node: NodeId, reference: NodeId },

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
