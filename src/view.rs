//! Read-only view handed to the automaton builder once parsing and
//! optimization are done.

use tracing::instrument;

use crate::domain::{AstNode, AstResult, NodeId, RegexAst};

/// A finished AST. Holds the tree context by value and only exposes reads,
/// so no stage can mutate the tree after it has been frozen.
#[derive(Debug)]
pub struct FrozenAst {
    ast: RegexAst,
}

impl RegexAst {
    /// Declare the tree finished. Verifies it first when the limits ask for it.
    #[instrument(level = "debug", skip(self))]
    pub fn freeze(self) -> AstResult<FrozenAst> {
        if self.limits().verify_on_freeze {
            self.verify()?;
        }
        Ok(FrozenAst { ast: self })
    }
}

impl FrozenAst {
    pub fn root(&self) -> Option<NodeId> {
        self.ast.root()
    }

    pub fn initial_states(&self) -> &[NodeId] {
        self.ast.initial_states()
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&AstNode> {
        self.ast.get(node)
    }

    pub fn node(&self, node: NodeId) -> AstResult<&AstNode> {
        self.ast.node(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.ast.parent(node)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.ast.children(node)
    }

    pub fn is_dead(&self, node: NodeId) -> bool {
        self.ast.is_dead(node)
    }

    pub fn seq_index(&self, term: NodeId) -> AstResult<usize> {
        self.ast.seq_index(term)
    }

    pub fn subtree_root_parent(&self, term: NodeId) -> Option<NodeId> {
        self.ast.subtree_root_parent(term)
    }

    pub fn subtree_parent(&self, node: NodeId) -> Option<NodeId> {
        self.ast.subtree_parent(node)
    }

    pub fn is_in_look_behind(&self, node: NodeId) -> bool {
        self.ast.is_in_look_behind(node)
    }

    pub fn is_in_look_ahead(&self, node: NodeId) -> bool {
        self.ast.is_in_look_ahead(node)
    }

    pub fn is_in_look_around(&self, node: NodeId) -> bool {
        self.ast.is_in_look_around(node)
    }

    /// Borrow the underlying tree context; only `&self` methods are reachable.
    pub fn as_ast(&self) -> &RegexAst {
        &self.ast
    }

    /// Pre-order over live nodes from the root; dead subtrees are skipped whole.
    pub fn iter_live(&self) -> LiveIter<'_> {
        LiveIter::new(&self.ast, self.root())
    }

    pub fn iter_live_from(&self, node: NodeId) -> LiveIter<'_> {
        LiveIter::new(&self.ast, Some(node))
    }

    /// Post-order over live nodes from the root, children before parents.
    pub fn iter_live_postorder(&self) -> LivePostOrderIter<'_> {
        LivePostOrderIter::new(&self.ast, self.root())
    }
}

pub struct LiveIter<'a> {
    ast: &'a RegexAst,
    stack: Vec<NodeId>,
}

impl<'a> LiveIter<'a> {
    fn new(ast: &'a RegexAst, start: Option<NodeId>) -> Self {
        Self {
            ast,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for LiveIter<'a> {
    type Item = (NodeId, &'a AstNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            let Some(node) = self.ast.get(current) else {
                continue;
            };
            if node.is_dead() {
                continue;
            }
            // Push children in reverse order for left-to-right traversal
            self.stack.extend(node.children().iter().rev());
            return Some((current, node));
        }
        None
    }
}

pub struct LivePostOrderIter<'a> {
    ast: &'a RegexAst,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> LivePostOrderIter<'a> {
    fn new(ast: &'a RegexAst, start: Option<NodeId>) -> Self {
        Self {
            ast,
            stack: start.map(|node| (node, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for LivePostOrderIter<'a> {
    type Item = (NodeId, &'a AstNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            let Some(node) = self.ast.get(current) else {
                continue;
            };
            if node.is_dead() {
                continue;
            }
            if visited {
                return Some((current, node));
            }
            self.stack.push((current, true));
            for &child in node.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
