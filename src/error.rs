use crate::node::NodeType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetatreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Expected a mapping or sequence, got {0}")]
    TypeKind(NodeType),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("No node matched the query")]
    NoMatch,

    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    #[error("Operation '{op}' not supported on {found} node")]
    WrongNodeKind { op: &'static str, found: NodeType },
}
