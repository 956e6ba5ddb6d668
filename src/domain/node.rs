//! Node taxonomy of the regex AST.
//!
//! Every element of the tree is an [`AstNode`]: identity, parent link and
//! liveness shared by all variants, plus a [`NodeKind`] payload. The payload is
//! either a [`Sequence`] or a [`Term`]; terms split into assertions and atoms.
//! The set of variants is closed so consumers can match exhaustively.

use std::fmt;

use generational_arena::Index;
use itertools::Itertools;

/// Stable handle of a node inside its [`RegexAst`](crate::domain::RegexAst).
///
/// Handles are only meaningful for the tree context that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// A node stored in the tree context's arena.
#[derive(Debug, Clone)]
pub struct AstNode {
    /// Serial number in creation order, unique per tree context
    pub(crate) id: u32,
    /// Owning node, None for designated roots and not-yet-wired nodes
    pub(crate) parent: Option<NodeId>,
    /// Tombstone flag, never reset once set
    pub(crate) dead: bool,
    pub(crate) kind: NodeKind,
}

impl AstNode {
    pub(crate) fn new(id: u32, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            dead: false,
            kind,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_term(&self) -> bool {
        matches!(self.kind, NodeKind::Term(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    pub fn as_term(&self) -> Option<&Term> {
        match &self.kind {
            NodeKind::Term(term) => Some(term),
            NodeKind::Sequence(_) => None,
        }
    }

    pub(crate) fn as_term_mut(&mut self) -> Option<&mut Term> {
        match &mut self.kind {
            NodeKind::Term(term) => Some(term),
            NodeKind::Sequence(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            NodeKind::Sequence(seq) => Some(seq),
            NodeKind::Term(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self.as_term().map(Term::kind) {
            Some(TermKind::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self.as_term_mut().map(|t| &mut t.kind) {
            Some(TermKind::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn as_subtree_root(&self) -> Option<&SubtreeRoot> {
        match self.as_term().map(Term::kind) {
            Some(TermKind::SubtreeRoot(root)) => Some(root),
            _ => None,
        }
    }

    pub fn is_subtree_root(&self) -> bool {
        self.as_subtree_root().is_some()
    }

    /// Direct children in match order. Leaves return an empty slice.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Sequence(seq) => &seq.terms,
            NodeKind::Term(term) => match &term.kind {
                TermKind::Group(group) => &group.alternatives,
                TermKind::SubtreeRoot(root) => root.group.as_slice(),
                TermKind::PositionAssertion(_)
                | TermKind::CharacterClass(_)
                | TermKind::BackReference(_) => &[],
            },
        }
    }

    /// Short variant name used in error messages and rendering.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Term(term) => term.kind.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Sequence(Sequence),
    Term(Term),
}

impl NodeKind {
    /// Swap the child list for `children`, used when deep-copying.
    pub(crate) fn replace_children(&mut self, children: Vec<NodeId>) {
        match self {
            NodeKind::Sequence(seq) => seq.terms = children,
            NodeKind::Term(term) => match &mut term.kind {
                TermKind::Group(group) => group.alternatives = children,
                TermKind::SubtreeRoot(root) => root.group = children.first().copied(),
                TermKind::PositionAssertion(_)
                | TermKind::CharacterClass(_)
                | TermKind::BackReference(_) => {}
            },
        }
    }
}

/// Ordered list of terms; one alternative of a [`Group`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub(crate) terms: Vec<NodeId>,
}

impl Sequence {
    pub fn terms(&self) -> &[NodeId] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A node that may appear as a direct child of a [`Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub(crate) seq_index: u16,
    pub(crate) kind: TermKind,
}

impl Term {
    pub(crate) fn new(kind: TermKind) -> Self {
        Self { seq_index: 0, kind }
    }

    pub fn seq_index(&self) -> usize {
        usize::from(self.seq_index)
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    pub fn category(&self) -> TermCategory {
        self.kind.category()
    }
}

/// Assertions match a position, atoms consume input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermCategory {
    Assertion,
    Atom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermKind {
    PositionAssertion(PositionAssertionKind),
    SubtreeRoot(SubtreeRoot),
    CharacterClass(CharacterClass),
    BackReference(BackReference),
    Group(Group),
}

impl TermKind {
    pub fn category(&self) -> TermCategory {
        match self {
            TermKind::PositionAssertion(_) | TermKind::SubtreeRoot(_) => TermCategory::Assertion,
            TermKind::CharacterClass(_) | TermKind::BackReference(_) | TermKind::Group(_) => {
                TermCategory::Atom
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TermKind::PositionAssertion(_) => "position assertion",
            TermKind::SubtreeRoot(root) => root.kind.name(),
            TermKind::CharacterClass(_) => "character class",
            TermKind::BackReference(_) => "back reference",
            TermKind::Group(_) => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionAssertionKind {
    /// `^`
    Caret,
    /// `$`
    Dollar,
}

impl fmt::Display for PositionAssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionAssertionKind::Caret => write!(f, "^"),
            PositionAssertionKind::Dollar => write!(f, "$"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackReference {
    pub group_number: u32,
}

/// Set of code points as sorted, non-overlapping, non-adjacent inclusive ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterClass {
    ranges: Vec<(char, char)>,
}

impl CharacterClass {
    /// Build a class from arbitrary ranges; reversed ranges are swapped and
    /// overlapping or adjacent ranges merged.
    pub fn new(ranges: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut ranges: Vec<(char, char)> = ranges
            .into_iter()
            .map(|(lo, hi)| if lo <= hi { (lo, hi) } else { (hi, lo) })
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(char, char)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if u32::from(lo) <= u32::from(last.1).saturating_add(1) => {
                    if hi > last.1 {
                        last.1 = hi;
                    }
                }
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    pub fn single(c: char) -> Self {
        Self {
            ranges: vec![(c, c)],
        }
    }

    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_single_char(&self) -> bool {
        matches!(self.ranges.as_slice(), [(lo, hi)] if lo == hi)
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [(lo, hi)] = self.ranges.as_slice() {
            if lo == hi {
                return write!(f, "{}", lo.escape_debug());
            }
        }
        let body = self
            .ranges
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.escape_debug().to_string()
                } else {
                    format!("{}-{}", lo.escape_debug(), hi.escape_debug())
                }
            })
            .join("");
        write!(f, "[{}]", body)
    }
}

/// Repetition bounds carried by a looping [`Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopBounds {
    pub min: u32,
    /// None means unbounded
    pub max: Option<u32>,
    pub greedy: bool,
}

impl LoopBounds {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self {
            min,
            max,
            greedy: true,
        }
    }

    pub fn lazy(self) -> Self {
        Self {
            greedy: false,
            ..self
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

impl fmt::Display for LoopBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, None) => write!(f, "*")?,
            (1, None) => write!(f, "+")?,
            (0, Some(1)) => write!(f, "?")?,
            (min, None) => write!(f, "{{{},}}", min)?,
            (min, Some(max)) if min == max => write!(f, "{{{}}}", min)?,
            (min, Some(max)) => write!(f, "{{{},{}}}", min, max)?,
        }
        if !self.greedy {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Alternatives in priority order, optionally a loop and/or a capture group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub(crate) alternatives: Vec<NodeId>,
    pub(crate) loop_bounds: Option<LoopBounds>,
    pub(crate) capture_group: Option<u32>,
}

impl Group {
    pub fn alternatives(&self) -> &[NodeId] {
        &self.alternatives
    }

    pub fn is_loop(&self) -> bool {
        self.loop_bounds.is_some()
    }

    pub fn loop_bounds(&self) -> Option<LoopBounds> {
        self.loop_bounds
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_group.is_some()
    }

    pub fn capture_group(&self) -> Option<u32> {
        self.capture_group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeRootKind {
    LookAhead { negated: bool },
    LookBehind { negated: bool },
    /// The whole pattern
    Root,
}

impl SubtreeRootKind {
    pub fn is_look_around(&self) -> bool {
        !matches!(self, SubtreeRootKind::Root)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubtreeRootKind::LookAhead { .. } => "look-ahead",
            SubtreeRootKind::LookBehind { .. } => "look-behind",
            SubtreeRootKind::Root => "root",
        }
    }
}

/// Boundary node owning exactly one [`Group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeRoot {
    pub(crate) kind: SubtreeRootKind,
    pub(crate) group: Option<NodeId>,
}

impl SubtreeRoot {
    pub fn kind(&self) -> SubtreeRootKind {
        self.kind
    }

    pub fn group(&self) -> Option<NodeId> {
        self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_character_class_merges_overlapping_and_adjacent_ranges() {
        let cc = CharacterClass::new([('d', 'f'), ('a', 'c'), ('x', 'z'), ('y', 'w')]);
        assert_eq!(cc.ranges(), &[('a', 'f'), ('w', 'z')]);
        assert!(cc.contains('e'));
        assert!(cc.contains('w'));
        assert!(!cc.contains('g'));
        assert_eq!(cc.to_string(), "[a-fw-z]");
    }

    #[test]
    fn test_character_class_single_char() {
        let cc = CharacterClass::single('q');
        assert!(cc.is_single_char());
        assert_eq!(cc.to_string(), "q");
        assert!(!CharacterClass::new([('a', 'b')]).is_single_char());
    }

    #[rstest]
    #[case(LoopBounds::new(0, None), "*")]
    #[case(LoopBounds::new(1, None), "+")]
    #[case(LoopBounds::new(0, Some(1)), "?")]
    #[case(LoopBounds::new(3, Some(3)), "{3}")]
    #[case(LoopBounds::new(2, Some(4)), "{2,4}")]
    #[case(LoopBounds::new(2, None).lazy(), "{2,}?")]
    fn test_loop_bounds_display(#[case] bounds: LoopBounds, #[case] expected: &str) {
        assert_eq!(bounds.to_string(), expected);
    }

    #[test]
    fn test_term_categories() {
        let caret = TermKind::PositionAssertion(PositionAssertionKind::Caret);
        let look = TermKind::SubtreeRoot(SubtreeRoot {
            kind: SubtreeRootKind::LookAhead { negated: false },
            group: None,
        });
        let group = TermKind::Group(Group::default());
        let backref = TermKind::BackReference(BackReference { group_number: 1 });
        assert_eq!(caret.category(), TermCategory::Assertion);
        assert_eq!(look.category(), TermCategory::Assertion);
        assert_eq!(group.category(), TermCategory::Atom);
        assert_eq!(backref.category(), TermCategory::Atom);
    }
}
