/*
Rendering of the AST as an indented tree for debugging and test diagnostics.
Dead nodes are kept in the output and flagged, they are tombstones not deletions.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::{AstNode, NodeId, NodeKind, RegexAst, SubtreeRootKind, TermKind};
use crate::view::FrozenAst;

pub trait AstTreeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// One-line label of a node, e.g. `group(1){2,4} #3`.
pub fn describe(node: &AstNode) -> String {
    let label = match node.kind() {
        NodeKind::Sequence(_) => "seq".to_string(),
        NodeKind::Term(term) => match term.kind() {
            TermKind::PositionAssertion(kind) => kind.to_string(),
            TermKind::CharacterClass(cc) => cc.to_string(),
            TermKind::BackReference(br) => format!("\\{}", br.group_number),
            TermKind::Group(group) => {
                let mut label = match group.capture_group() {
                    Some(n) => format!("group({})", n),
                    None => "group".to_string(),
                };
                if let Some(bounds) = group.loop_bounds() {
                    label.push_str(&bounds.to_string());
                }
                label
            }
            TermKind::SubtreeRoot(root) => match root.kind() {
                SubtreeRootKind::LookAhead { negated: false } => "(?=)".to_string(),
                SubtreeRootKind::LookAhead { negated: true } => "(?!)".to_string(),
                SubtreeRootKind::LookBehind { negated: false } => "(?<=)".to_string(),
                SubtreeRootKind::LookBehind { negated: true } => "(?<!)".to_string(),
                SubtreeRootKind::Root => "root".to_string(),
            },
        },
    };
    if node.is_dead() {
        format!("{} #{} dead", label, node.id())
    } else {
        format!("{} #{}", label, node.id())
    }
}

fn build_tree(ast: &RegexAst, node_idx: NodeId) -> Tree<String> {
    let label = ast
        .get(node_idx)
        .map(describe)
        .unwrap_or_else(|| format!("<missing {}>", node_idx));
    let leaves: Vec<_> = ast
        .children(node_idx)
        .iter()
        .map(|&child| build_tree(ast, child))
        .collect();
    Tree::new(label).with_leaves(leaves)
}

impl RegexAst {
    /// Render the subtree below `node`.
    pub fn to_tree_string_from(&self, node: NodeId) -> Tree<String> {
        build_tree(self, node)
    }
}

impl AstTreeConvert for RegexAst {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        match self.root() {
            Some(root) => build_tree(self, root),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

impl AstTreeConvert for FrozenAst {
    fn to_tree_string(&self) -> Tree<String> {
        self.as_ast().to_tree_string()
    }
}
