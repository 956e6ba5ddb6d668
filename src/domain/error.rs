//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeId;

/// AST errors represent misuse of the tree-building API or a broken tree.
///
/// None of these are recoverable user errors: the parser or optimizer calling
/// into the tree has a bug, or a resource limit was not enforced upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("expected {expected}, found {found} at {node}")]
    WrongKind {
        node: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("node already has a parent: {0}")]
    AlreadyAttached(NodeId),

    #[error("sequence index {index} exceeds the 16-bit limit")]
    SeqIndexOverflow { index: usize },

    #[error("sequence {node} is full: {len} terms (limit {limit})")]
    SequenceFull {
        node: NodeId,
        len: usize,
        limit: usize,
    },

    #[error("node limit reached: {limit}")]
    NodeLimit { limit: usize },

    #[error("group {0} is not the last term of its sequence")]
    NotLastTerm(NodeId),

    #[error("unrolling {node} needs {copies} copies (limit {limit})")]
    UnrollLimit {
        node: NodeId,
        copies: usize,
        limit: usize,
    },

    #[error("structure violation at {node}: {reason}")]
    StructureViolation { node: NodeId, reason: String },
}

impl AstError {
    pub(crate) fn violation(node: NodeId, reason: impl Into<String>) -> Self {
        Self::StructureViolation {
            node,
            reason: reason.into(),
        }
    }
}

/// Result type for AST operations.
pub type AstResult<T> = Result<T, AstError>;
