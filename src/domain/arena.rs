//! Arena-backed tree context owning every node of one regex AST.

use generational_arena::Arena;
use tracing::{debug, instrument, trace};

use crate::domain::error::{AstError, AstResult};
use crate::domain::node::{
    AstNode, BackReference, CharacterClass, Group, LoopBounds, NodeId, NodeKind,
    PositionAssertionKind, Sequence, SubtreeRoot, SubtreeRootKind, Term, TermKind,
};

/// Sequence positions are stored in 16 bits.
pub const MAX_SEQUENCE_LEN: usize = u16::MAX as usize + 1;

/// Resource limits enforced by the tree context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstLimits {
    /// Maximum number of nodes the arena may hold
    pub max_nodes: usize,
    /// Maximum number of terms in one sequence, at most [`MAX_SEQUENCE_LEN`]
    pub max_sequence_len: usize,
    /// Maximum number of copies one quantifier unrolling may produce
    pub max_unroll: usize,
    /// Run [`RegexAst::verify`] when freezing
    pub verify_on_freeze: bool,
}

impl Default for AstLimits {
    fn default() -> Self {
        Self {
            max_nodes: 1 << 20,
            max_sequence_len: MAX_SEQUENCE_LEN,
            max_unroll: 20,
            verify_on_freeze: cfg!(debug_assertions),
        }
    }
}

/// Tree context: sole owner of node storage and issuer of node identities.
///
/// Ownership flows downward (context → group → sequence → term); parents are
/// plain arena handles so upward navigation creates no reference cycles.
/// Nodes are never removed: dead nodes stay in place as tombstones.
#[derive(Debug)]
pub struct RegexAst {
    /// Arena storage for all nodes
    arena: Arena<AstNode>,
    /// The whole-pattern root, None until created
    root: Option<NodeId>,
    /// Detached sequences synthesized for automaton initial states
    initial_states: Vec<NodeId>,
    next_id: u32,
    limits: AstLimits,
}

impl Default for RegexAst {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexAst {
    pub fn new() -> Self {
        Self::with_limits(AstLimits::default())
    }

    pub fn with_limits(limits: AstLimits) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            initial_states: Vec::new(),
            next_id: 0,
            limits,
        }
    }

    pub fn limits(&self) -> &AstLimits {
        &self.limits
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn initial_states(&self) -> &[NodeId] {
        &self.initial_states
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&AstNode> {
        self.arena.get(node.0)
    }

    pub fn node(&self, node: NodeId) -> AstResult<&AstNode> {
        self.arena.get(node.0).ok_or(AstError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeId) -> AstResult<&mut AstNode> {
        self.arena.get_mut(node.0).ok_or(AstError::UnknownNode(node))
    }

    /// All nodes in arena slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &AstNode)> {
        self.arena.iter().map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(AstNode::parent)
    }

    pub fn is_dead(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(AstNode::is_dead)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(AstNode::children).unwrap_or(&[])
    }

    // ------------------------------------------------------------
    // Node factory
    // ------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind) -> AstResult<NodeId> {
        if self.arena.len() >= self.limits.max_nodes {
            return Err(AstError::NodeLimit {
                limit: self.limits.max_nodes,
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        let node = NodeId(self.arena.insert(AstNode::new(id, kind)));
        trace!(%node, id, "allocated");
        Ok(node)
    }

    fn alloc_term(&mut self, kind: TermKind) -> AstResult<NodeId> {
        self.alloc(NodeKind::Term(Term::new(kind)))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_sequence(&mut self) -> AstResult<NodeId> {
        self.alloc(NodeKind::Sequence(Sequence::default()))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_group(&mut self) -> AstResult<NodeId> {
        self.alloc_term(TermKind::Group(Group::default()))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_capture_group(&mut self, group_number: u32) -> AstResult<NodeId> {
        self.alloc_term(TermKind::Group(Group {
            capture_group: Some(group_number),
            ..Group::default()
        }))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_character_class(&mut self, class: CharacterClass) -> AstResult<NodeId> {
        self.alloc_term(TermKind::CharacterClass(class))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_position_assertion(&mut self, kind: PositionAssertionKind) -> AstResult<NodeId> {
        self.alloc_term(TermKind::PositionAssertion(kind))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_back_reference(&mut self, group_number: u32) -> AstResult<NodeId> {
        self.alloc_term(TermKind::BackReference(BackReference { group_number }))
    }

    /// Create a subtree root. The first [`SubtreeRootKind::Root`] becomes the
    /// designated root of this tree.
    #[instrument(level = "trace", skip(self))]
    pub fn new_subtree_root(&mut self, kind: SubtreeRootKind) -> AstResult<NodeId> {
        let node = self.alloc_term(TermKind::SubtreeRoot(SubtreeRoot { kind, group: None }))?;
        if kind == SubtreeRootKind::Root && self.root.is_none() {
            self.root = Some(node);
        }
        Ok(node)
    }

    // ------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------

    fn wrong_kind(node: NodeId, expected: &'static str, found: &AstNode) -> AstError {
        AstError::WrongKind {
            node,
            expected,
            found: found.kind_name(),
        }
    }

    /// The child must be unattached and must not be an ancestor of `parent`.
    fn check_attachable(&self, parent: NodeId, child: NodeId) -> AstResult<()> {
        if self.node(child)?.parent.is_some() {
            return Err(AstError::AlreadyAttached(child));
        }
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(AstError::violation(child, "attaching would create a cycle"));
            }
            current = self.parent(node);
        }
        Ok(())
    }

    /// Append `term` to `seq`, setting its sequence index and parent.
    #[instrument(level = "trace", skip(self))]
    pub fn append_term(&mut self, seq: NodeId, term: NodeId) -> AstResult<()> {
        let seq_node = self.node(seq)?;
        let len = seq_node
            .as_sequence()
            .ok_or_else(|| Self::wrong_kind(seq, "sequence", seq_node))?
            .len();
        let term_node = self.node(term)?;
        if !term_node.is_term() {
            return Err(Self::wrong_kind(term, "term", term_node));
        }
        if len >= self.limits.max_sequence_len {
            return Err(AstError::SequenceFull {
                node: seq,
                len,
                limit: self.limits.max_sequence_len,
            });
        }
        let seq_index = u16::try_from(len).map_err(|_| AstError::SeqIndexOverflow { index: len })?;
        self.check_attachable(seq, term)?;

        let term_node = self.node_mut(term)?;
        term_node.parent = Some(seq);
        if let Some(t) = term_node.as_term_mut() {
            t.seq_index = seq_index;
        }
        if let NodeKind::Sequence(s) = &mut self.node_mut(seq)?.kind {
            s.terms.push(term);
        }
        Ok(())
    }

    /// Append `seq` as the lowest-priority alternative of `group`.
    #[instrument(level = "trace", skip(self))]
    pub fn add_alternative(&mut self, group: NodeId, seq: NodeId) -> AstResult<()> {
        let group_node = self.node(group)?;
        if group_node.as_group().is_none() {
            return Err(Self::wrong_kind(group, "group", group_node));
        }
        let seq_node = self.node(seq)?;
        if !seq_node.is_sequence() {
            return Err(Self::wrong_kind(seq, "sequence", seq_node));
        }
        self.check_attachable(group, seq)?;

        self.node_mut(seq)?.parent = Some(group);
        if let Some(g) = self.node_mut(group)?.as_group_mut() {
            g.alternatives.push(seq);
        }
        Ok(())
    }

    /// Wire the single group beneath a subtree root.
    #[instrument(level = "trace", skip(self))]
    pub fn set_root_group(&mut self, root: NodeId, group: NodeId) -> AstResult<()> {
        let root_node = self.node(root)?;
        let current = root_node
            .as_subtree_root()
            .ok_or_else(|| Self::wrong_kind(root, "subtree root", root_node))?
            .group;
        if let Some(existing) = current {
            return Err(AstError::violation(
                root,
                format!("subtree root already owns group {}", existing),
            ));
        }
        let group_node = self.node(group)?;
        if group_node.as_group().is_none() {
            return Err(Self::wrong_kind(group, "group", group_node));
        }
        self.check_attachable(root, group)?;

        self.node_mut(group)?.parent = Some(root);
        if let NodeKind::Term(Term {
            kind: TermKind::SubtreeRoot(r),
            ..
        }) = &mut self.node_mut(root)?.kind
        {
            r.group = Some(group);
        }
        Ok(())
    }

    /// Set or clear the repetition bounds of a group.
    #[instrument(level = "trace", skip(self))]
    pub fn set_loop(&mut self, group: NodeId, bounds: Option<LoopBounds>) -> AstResult<()> {
        let node = self.node_mut(group)?;
        let found = node.kind_name();
        let g = node.as_group_mut().ok_or(AstError::WrongKind {
            node: group,
            expected: "group",
            found,
        })?;
        g.loop_bounds = bounds;
        Ok(())
    }

    /// Detach `term` from the end of `seq`. Earlier terms keep their indices.
    pub(crate) fn pop_last_term(&mut self, seq: NodeId, term: NodeId) -> AstResult<()> {
        match &mut self.node_mut(seq)?.kind {
            NodeKind::Sequence(s) if s.terms.last() == Some(&term) => {
                s.terms.pop();
            }
            _ => return Err(AstError::NotLastTerm(term)),
        }
        self.node_mut(term)?.parent = None;
        Ok(())
    }

    // ------------------------------------------------------------
    // Term positions
    // ------------------------------------------------------------

    pub fn seq_index(&self, term: NodeId) -> AstResult<usize> {
        let node = self.node(term)?;
        node.as_term()
            .map(Term::seq_index)
            .ok_or_else(|| Self::wrong_kind(term, "term", node))
    }

    /// Plain mutator; callers guarantee the index is within the owning sequence.
    pub fn set_seq_index(&mut self, term: NodeId, index: usize) -> AstResult<()> {
        let narrowed = u16::try_from(index).map_err(|_| AstError::SeqIndexOverflow { index })?;
        let node = self.node_mut(term)?;
        let found = node.kind_name();
        let t = node.as_term_mut().ok_or(AstError::WrongKind {
            node: term,
            expected: "term",
            found,
        })?;
        t.seq_index = narrowed;
        Ok(())
    }

    // ------------------------------------------------------------
    // Subtree roots
    // ------------------------------------------------------------

    /// Nearest enclosing subtree root of a term, or of a sequence via its
    /// group.
    ///
    /// Walks two levels at a time (term → sequence → group) because the tree
    /// strictly alternates. Returns None when the chain ends without reaching
    /// a subtree root, which only happens for detached nodes such as the
    /// synthetic initial states.
    #[instrument(level = "trace", skip(self))]
    pub fn subtree_root_parent(&self, node: NodeId) -> Option<NodeId> {
        let entry = self.get(node)?;
        if entry.is_sequence() {
            // sequences hang below a group, which is a term
            return entry.parent.and_then(|group| self.walk_to_subtree_root(group));
        }
        self.walk_to_subtree_root(node)
    }

    fn walk_to_subtree_root(&self, term: NodeId) -> Option<NodeId> {
        let mut current = term;
        while let Some(parent) = self.parent(current) {
            if self.get(parent).is_some_and(AstNode::is_subtree_root) {
                return Some(parent);
            }
            debug_assert!(
                self.get(parent).is_some_and(AstNode::is_sequence),
                "a term's parent is a sequence or a subtree root"
            );
            match self.parent(parent) {
                Some(group) => current = group,
                None => break,
            }
        }
        None
    }

    /// Nearest enclosing subtree root of any node.
    pub fn subtree_parent(&self, node: NodeId) -> Option<NodeId> {
        self.subtree_root_parent(node)
    }

    fn is_within(&self, node: NodeId, pred: impl Fn(SubtreeRootKind) -> bool) -> bool {
        let mut current = self.subtree_parent(node);
        while let Some(root) = current {
            if let Some(r) = self.get(root).and_then(AstNode::as_subtree_root) {
                if pred(r.kind) {
                    return true;
                }
            }
            current = self.subtree_parent(root);
        }
        false
    }

    pub fn is_in_look_behind(&self, node: NodeId) -> bool {
        self.is_within(node, |kind| matches!(kind, SubtreeRootKind::LookBehind { .. }))
    }

    pub fn is_in_look_ahead(&self, node: NodeId) -> bool {
        self.is_within(node, |kind| matches!(kind, SubtreeRootKind::LookAhead { .. }))
    }

    pub fn is_in_look_around(&self, node: NodeId) -> bool {
        self.is_within(node, |kind| kind.is_look_around())
    }

    // ------------------------------------------------------------
    // Liveness
    // ------------------------------------------------------------

    /// Mark `node` as dead, i.e. unmatchable.
    ///
    /// Everything below `node` is tombstoned as well, and the flag propagates
    /// to the ancestors until the first one that is already dead. Returns the
    /// number of nodes whose flag changed.
    #[instrument(level = "trace", skip(self))]
    pub fn mark_as_dead(&mut self, node: NodeId) -> usize {
        let mut marked = self.tombstone_subtree(node);
        let mut current = self.parent(node);
        while let Some(parent) = current {
            let Some(entry) = self.arena.get_mut(parent.0) else {
                break;
            };
            if entry.dead {
                break;
            }
            entry.dead = true;
            marked += 1;
            current = entry.parent;
        }
        debug!(%node, marked, "marked dead");
        marked
    }

    pub(crate) fn tombstone_subtree(&mut self, node: NodeId) -> usize {
        let mut marked = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(entry) = self.arena.get_mut(current.0) else {
                continue;
            };
            if !entry.dead {
                entry.dead = true;
                marked += 1;
            }
            stack.extend_from_slice(entry.children());
        }
        marked
    }

    // ------------------------------------------------------------
    // Copying
    // ------------------------------------------------------------

    /// Deep copy of `node` with fresh identities.
    ///
    /// The copy is detached (`parent() == None`) and alive, even if the source
    /// was dead; children keep their order and sequence indices.
    #[instrument(level = "trace", skip(self))]
    pub fn copy(&mut self, node: NodeId) -> AstResult<NodeId> {
        self.node(node)?;
        self.reserve(self.subtree_len(node))?;
        let first = self.next_id;
        let copy = match self.copy_subtree(node) {
            Ok(copy) => copy,
            Err(err) => {
                self.discard_since(first);
                return Err(err);
            }
        };
        debug!(source = %node, %copy, "copied subtree");
        Ok(copy)
    }

    /// Number of nodes in the subtree below `node`, dead ones included.
    pub(crate) fn subtree_len(&self, node: NodeId) -> usize {
        let mut len = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.get(current) {
                len += 1;
                stack.extend_from_slice(entry.children());
            }
        }
        len
    }

    /// Fails with `NodeLimit` unless `count` more nodes fit.
    pub(crate) fn reserve(&self, count: usize) -> AstResult<()> {
        if self.arena.len().saturating_add(count) > self.limits.max_nodes {
            return Err(AstError::NodeLimit {
                limit: self.limits.max_nodes,
            });
        }
        Ok(())
    }

    /// Tombstone every node allocated at or after serial id `first`.
    ///
    /// Used to abandon a half-built detached structure after a failed edit.
    pub(crate) fn discard_since(&mut self, first: u32) {
        let mut discarded = 0;
        for (_, entry) in self.arena.iter_mut() {
            if entry.id >= first && !entry.dead {
                entry.dead = true;
                discarded += 1;
            }
        }
        if discarded > 0 {
            debug!(first, discarded, "discarded partial nodes");
        }
    }

    pub(crate) fn next_serial(&self) -> u32 {
        self.next_id
    }

    fn copy_subtree(&mut self, node: NodeId) -> AstResult<NodeId> {
        let source = self.node(node)?;
        let mut kind = source.kind.clone();
        let children = source.children().to_vec();

        let mut copies = Vec::with_capacity(children.len());
        for child in children {
            copies.push(self.copy_subtree(child)?);
        }
        kind.replace_children(copies.clone());

        let copy = self.alloc(kind)?;
        for child in copies {
            self.node_mut(child)?.parent = Some(copy);
        }
        Ok(copy)
    }

    /// Synthesize `count` detached sequences, each holding one `^` assertion,
    /// as anchors for automaton initial states. Returns the assertion terms.
    ///
    /// These are designated roots: their terms have no enclosing subtree root.
    #[instrument(level = "debug", skip(self))]
    pub fn create_initial_states(&mut self, count: usize) -> AstResult<Vec<NodeId>> {
        let mut terms = Vec::with_capacity(count);
        for _ in 0..count {
            let seq = self.new_sequence()?;
            let caret = self.new_position_assertion(PositionAssertionKind::Caret)?;
            self.append_term(seq, caret)?;
            self.initial_states.push(seq);
            terms.push(caret);
        }
        Ok(terms)
    }

    // ------------------------------------------------------------
    // Structural checks
    // ------------------------------------------------------------

    fn is_designated_root(&self, node: NodeId, entry: &AstNode) -> bool {
        matches!(
            entry.as_subtree_root().map(SubtreeRoot::kind),
            Some(SubtreeRootKind::Root)
        ) || self.initial_states.contains(&node)
            || entry.dead
    }

    /// Check every structural invariant, reporting the first violation.
    ///
    /// Detached nodes must be designated roots (whole-pattern roots, initial
    /// states) or dead tombstones.
    #[instrument(level = "debug", skip(self))]
    pub fn verify(&self) -> AstResult<()> {
        for (node, entry) in self.nodes() {
            self.verify_parent(node, entry)?;
            self.verify_children(node, entry)?;
            self.verify_acyclic(node)?;
        }
        Ok(())
    }

    fn verify_parent(&self, node: NodeId, entry: &AstNode) -> AstResult<()> {
        let Some(parent) = entry.parent else {
            if self.is_designated_root(node, entry) {
                return Ok(());
            }
            return Err(AstError::violation(node, "detached node is not a designated root"));
        };
        let parent_entry = self
            .get(parent)
            .ok_or_else(|| AstError::violation(node, format!("parent {} does not exist", parent)))?;
        if !parent_entry.children().contains(&node) {
            return Err(AstError::violation(node, "parent does not list node as child"));
        }
        let alternates = match &entry.kind {
            NodeKind::Sequence(_) => parent_entry.as_group().is_some(),
            NodeKind::Term(Term {
                kind: TermKind::Group(_),
                ..
            }) => parent_entry.is_sequence() || parent_entry.is_subtree_root(),
            NodeKind::Term(_) => parent_entry.is_sequence(),
        };
        if !alternates {
            return Err(AstError::violation(
                node,
                format!("{} below {}", entry.kind_name(), parent_entry.kind_name()),
            ));
        }
        if entry.dead && !parent_entry.dead {
            return Err(AstError::violation(node, "dead node below live parent"));
        }
        Ok(())
    }

    fn verify_children(&self, node: NodeId, entry: &AstNode) -> AstResult<()> {
        for (position, &child) in entry.children().iter().enumerate() {
            let child_entry = self
                .get(child)
                .ok_or_else(|| AstError::violation(node, format!("child {} does not exist", child)))?;
            if child_entry.parent != Some(node) {
                return Err(AstError::violation(child, "child does not point back to parent"));
            }
            if let (Some(_), Some(term)) = (entry.as_sequence(), child_entry.as_term()) {
                if term.seq_index() != position {
                    return Err(AstError::violation(
                        child,
                        format!("seq index {} at position {}", term.seq_index(), position),
                    ));
                }
            }
        }
        Ok(())
    }

    fn verify_acyclic(&self, node: NodeId) -> AstResult<()> {
        let mut steps = 0;
        let mut current = self.parent(node);
        while let Some(parent) = current {
            steps += 1;
            if steps > self.arena.len() {
                return Err(AstError::violation(node, "parent chain contains a cycle"));
            }
            current = self.parent(parent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_respects_node_limit() {
        let mut ast = RegexAst::with_limits(AstLimits {
            max_nodes: 2,
            ..AstLimits::default()
        });
        ast.new_sequence().unwrap();
        ast.new_group().unwrap();
        assert_eq!(ast.new_group(), Err(AstError::NodeLimit { limit: 2 }));
    }

    #[test]
    fn test_serial_ids_follow_creation_order() {
        let mut ast = RegexAst::new();
        let a = ast.new_sequence().unwrap();
        let b = ast.new_group().unwrap();
        assert_eq!(ast.node(a).unwrap().id(), 0);
        assert_eq!(ast.node(b).unwrap().id(), 1);
    }

    #[test]
    fn test_append_rejects_cycle() {
        let mut ast = RegexAst::new();
        let group = ast.new_group().unwrap();
        let seq = ast.new_sequence().unwrap();
        ast.add_alternative(group, seq).unwrap();
        let err = ast.append_term(seq, group).unwrap_err();
        assert!(matches!(err, AstError::StructureViolation { .. }));
    }

    #[test]
    fn test_set_seq_index_overflow() {
        let mut ast = RegexAst::new();
        let term = ast.new_back_reference(1).unwrap();
        ast.set_seq_index(term, 65535).unwrap();
        assert_eq!(ast.seq_index(term).unwrap(), 65535);
        assert_eq!(
            ast.set_seq_index(term, 65536),
            Err(AstError::SeqIndexOverflow { index: 65536 })
        );
    }

    #[test]
    fn test_sequence_length_limit() {
        let mut ast = RegexAst::with_limits(AstLimits {
            max_sequence_len: 1,
            ..AstLimits::default()
        });
        let seq = ast.new_sequence().unwrap();
        let a = ast.new_character_class(CharacterClass::single('a')).unwrap();
        let b = ast.new_character_class(CharacterClass::single('b')).unwrap();
        ast.append_term(seq, a).unwrap();
        assert!(matches!(
            ast.append_term(seq, b),
            Err(AstError::SequenceFull { len: 1, limit: 1, .. })
        ));
    }

    #[test]
    fn test_verify_detects_broken_seq_index() {
        let mut ast = RegexAst::new();
        let root = ast.new_subtree_root(SubtreeRootKind::Root).unwrap();
        let group = ast.new_group().unwrap();
        let seq = ast.new_sequence().unwrap();
        let a = ast.new_character_class(CharacterClass::single('a')).unwrap();
        ast.set_root_group(root, group).unwrap();
        ast.add_alternative(group, seq).unwrap();
        ast.append_term(seq, a).unwrap();
        assert!(ast.verify().is_ok());

        ast.set_seq_index(a, 3).unwrap();
        assert!(matches!(
            ast.verify(),
            Err(AstError::StructureViolation { node, .. }) if node == a
        ));
    }

    #[test]
    fn test_verify_rejects_unwired_node() {
        let mut ast = RegexAst::new();
        let stray = ast.new_group().unwrap();
        assert!(matches!(
            ast.verify(),
            Err(AstError::StructureViolation { node, .. }) if node == stray
        ));
    }

    #[test]
    fn test_discard_since_tombstones_later_nodes() {
        let mut ast = RegexAst::new();
        let root = ast.new_subtree_root(SubtreeRootKind::Root).unwrap();
        let first = ast.next_serial();
        let partial = ast.new_sequence().unwrap();
        let t = ast.new_back_reference(1).unwrap();
        ast.append_term(partial, t).unwrap();
        assert!(ast.verify().is_err());

        ast.discard_since(first);

        assert!(!ast.is_dead(root));
        assert!(ast.is_dead(partial) && ast.is_dead(t));
        assert!(ast.verify().is_ok());
    }

    #[test]
    fn test_reserve_counts_existing_nodes() {
        let mut ast = RegexAst::with_limits(AstLimits {
            max_nodes: 3,
            ..AstLimits::default()
        });
        let group = ast.new_group().unwrap();
        assert_eq!(ast.subtree_len(group), 1);
        assert!(ast.reserve(2).is_ok());
        assert_eq!(ast.reserve(3), Err(AstError::NodeLimit { limit: 3 }));
    }
}
