//! Quantifier unrolling: expand a bounded loop group into plain copies.
//!
//! `x{2,4}` becomes `xx(?:x(?:x)?)?` and `x{2,}` becomes `xxx*`. The parser
//! unrolls right after reading a quantifier, while the quantified group is
//! still the last term of its sequence, so no sibling index ever changes.

use tracing::{debug, instrument};

use crate::domain::arena::RegexAst;
use crate::domain::error::{AstError, AstResult};
use crate::domain::node::{LoopBounds, NodeId};

impl RegexAst {
    /// Replace the loop `group` by its expansion and return the new terms.
    ///
    /// Groups without bounds, and `{0,}` loops, are left untouched and
    /// returned as the sole term. Otherwise the original group is popped from
    /// its sequence, detached and tombstoned.
    ///
    /// Node and sequence capacity are checked before anything is allocated.
    /// On error the tree is left as it was; nodes allocated on the way are
    /// detached tombstones.
    #[instrument(level = "debug", skip(self))]
    pub fn unroll_quantifier(&mut self, group: NodeId) -> AstResult<Vec<NodeId>> {
        let node = self.node(group)?;
        let bounds = match node.as_group() {
            Some(g) => g.loop_bounds(),
            None => {
                return Err(AstError::WrongKind {
                    node: group,
                    expected: "group",
                    found: node.kind_name(),
                })
            }
        };
        let Some(bounds) = bounds else {
            return Ok(vec![group]);
        };
        if bounds.min == 0 && bounds.is_unbounded() {
            return Ok(vec![group]);
        }

        let seq = node.parent().ok_or(AstError::NotLastTerm(group))?;
        if self.children(seq).last() != Some(&group) {
            return Err(AstError::NotLastTerm(group));
        }

        let optional = bounds
            .max
            .map(|max| max.saturating_sub(bounds.min))
            .unwrap_or(1);
        let copies = bounds.min as usize + optional as usize;
        if copies > self.limits().max_unroll {
            return Err(AstError::UnrollLimit {
                node: group,
                copies,
                limit: self.limits().max_unroll,
            });
        }

        let len = self.children(seq).len();
        let terms = bounds.min as usize + usize::from(bounds.is_unbounded() || optional > 0);
        if len - 1 + terms > self.limits().max_sequence_len {
            return Err(AstError::SequenceFull {
                node: seq,
                len,
                limit: self.limits().max_sequence_len,
            });
        }
        // each optional level adds a group and its two sequences
        let size = self.subtree_len(group);
        let needed = if bounds.is_unbounded() {
            copies * size
        } else {
            copies * size + optional as usize * 3
        };
        self.reserve(needed)?;

        // the group stays attached until the whole expansion exists
        let first = self.next_serial();
        let expansion = match self.build_expansion(group, bounds, optional) {
            Ok(expansion) => expansion,
            Err(err) => {
                self.discard_since(first);
                return Err(err);
            }
        };

        self.pop_last_term(seq, group)?;
        for &term in &expansion {
            self.append_term(seq, term)?;
        }
        self.tombstone_subtree(group);
        debug!(%group, %bounds, terms = expansion.len(), "unrolled quantifier");
        Ok(expansion)
    }

    /// Detached terms replacing `group`: `min` plain copies, then either a
    /// `{0,}` tail or the optional chain.
    fn build_expansion(
        &mut self,
        group: NodeId,
        bounds: LoopBounds,
        optional: u32,
    ) -> AstResult<Vec<NodeId>> {
        let mut expansion = Vec::with_capacity(bounds.min as usize + 1);
        for _ in 0..bounds.min {
            expansion.push(self.plain_copy(group)?);
        }
        if bounds.is_unbounded() {
            let tail = self.copy(group)?;
            self.set_loop(tail, Some(LoopBounds { min: 0, ..bounds }))?;
            expansion.push(tail);
        } else if optional > 0 {
            expansion.push(self.optional_chain(group, optional, bounds.greedy)?);
        }
        Ok(expansion)
    }

    /// Copy of `group` without loop bounds.
    fn plain_copy(&mut self, group: NodeId) -> AstResult<NodeId> {
        let copy = self.copy(group)?;
        self.set_loop(copy, None)?;
        Ok(copy)
    }

    /// Nested optional groups, innermost built first: `(?:x(?:x)?)?`.
    fn optional_chain(&mut self, group: NodeId, levels: u32, greedy: bool) -> AstResult<NodeId> {
        let mut inner: Option<NodeId> = None;
        for _ in 0..levels {
            let body = self.new_sequence()?;
            let term = self.plain_copy(group)?;
            self.append_term(body, term)?;
            if let Some(nested) = inner {
                self.append_term(body, nested)?;
            }
            let empty = self.new_sequence()?;

            let optional = self.new_group()?;
            let (first, second) = if greedy { (body, empty) } else { (empty, body) };
            self.add_alternative(optional, first)?;
            self.add_alternative(optional, second)?;
            inner = Some(optional);
        }
        inner.ok_or_else(|| AstError::violation(group, "empty optional chain"))
    }
}
