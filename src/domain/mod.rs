//! Domain layer: the regex AST and its invariants
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod error;
pub mod node;
mod unroll;

pub use arena::{AstLimits, RegexAst, MAX_SEQUENCE_LEN};
pub use error::{AstError, AstResult};
pub use node::{
    AstNode, BackReference, CharacterClass, Group, LoopBounds, NodeId, NodeKind,
    PositionAssertionKind, Sequence, SubtreeRoot, SubtreeRootKind, Term, TermCategory, TermKind,
};
