//! Arena-backed abstract syntax tree for a regular-expression compiler.
//!
//! The tree sits between the pattern parser and automaton construction. The
//! parser builds it through [`RegexAst`]'s factory and wiring methods, the
//! optimizer tombstones unmatchable branches with [`RegexAst::mark_as_dead`]
//! and unrolls quantifiers, and the automaton builder receives a
//! [`FrozenAst`] that can no longer be mutated.
//!
//! The shape always alternates group → sequence → term:
//!
//! ```
//! use rxtree::{CharacterClass, RegexAst, SubtreeRootKind};
//!
//! let mut ast = RegexAst::new();
//! let root = ast.new_subtree_root(SubtreeRootKind::Root)?;
//! let group = ast.new_group()?;
//! let seq = ast.new_sequence()?;
//! let a = ast.new_character_class(CharacterClass::single('a'))?;
//! ast.set_root_group(root, group)?;
//! ast.add_alternative(group, seq)?;
//! ast.append_term(seq, a)?;
//!
//! assert_eq!(ast.subtree_root_parent(a), Some(root));
//! let frozen = ast.freeze()?;
//! assert_eq!(frozen.iter_live().count(), 4);
//! # Ok::<(), rxtree::AstError>(())
//! ```

pub mod config;
pub mod domain;
pub mod tree_traits;
pub mod util;
pub mod view;

pub use config::{AstSettings, SettingsError};
pub use domain::*;
pub use tree_traits::AstTreeConvert;
pub use view::FrozenAst;
