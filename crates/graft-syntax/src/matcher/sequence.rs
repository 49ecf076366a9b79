//! Sibling-sequence matching with variadic captures.
//!
//! When a pattern's child list contains a variadic slot, children can no
//! longer be compared pairwise: the slot may absorb any number of target
//! siblings, and the right split is only known once the rest of the
//! sequence has been tried. The matcher recurses over (source index,
//! pattern index) pairs, snapshotting capture storage before each trial so
//! failed splits roll back cleanly.
//!
//! With a single variadic slot the split is forced: every later pattern
//! child consumes exactly one target sibling, so the slot's length is
//! determined by arithmetic and no search happens. Patterns with several
//! variadic slots search candidate counts from the shortest run upward,
//! so the first split whose remainder aligns is the one reported.

use crate::capture::Capture;
use crate::matcher::ARGUMENT_LIST_KINDS;
use crate::matcher::comparator::{constraint_holds, kind_hint_matches, nodes_match};
use crate::matcher::context::MatchContext;
use crate::matcher::storage::{BoundValue, CaptureStorage};

pub(crate) struct SequenceMatcher<'a, 'p, 'q, 't> {
    ctx: &'a MatchContext<'p>,
    parent: tree_sitter::Node<'t>,
    source: &'a [tree_sitter::Node<'t>],
    pattern: &'a [tree_sitter::Node<'q>],
}

impl<'a, 'p, 'q, 't> SequenceMatcher<'a, 'p, 'q, 't> {
    pub(crate) const fn new(
        ctx: &'a MatchContext<'p>,
        parent: tree_sitter::Node<'t>,
        source: &'a [tree_sitter::Node<'t>],
        pattern: &'a [tree_sitter::Node<'q>],
    ) -> Self {
        Self {
            ctx,
            parent,
            source,
            pattern,
        }
    }

    /// Matches `pattern[pi..]` against `source[si..]`.
    pub(crate) fn matches(
        &self,
        si: usize,
        pi: usize,
        storage: &mut CaptureStorage<'t>,
    ) -> bool {
        let Some(&pattern_node) = self.pattern.get(pi) else {
            return si == self.source.len();
        };

        if self.ctx.is_variadic(&pattern_node) {
            return self
                .ctx
                .capture_for(&pattern_node)
                .is_some_and(|capture| self.matches_variadic(capture, si, pi, storage));
        }

        if let Some(&source_node) = self.source.get(si) {
            let snapshot = storage.save();
            if nodes_match(self.ctx, pattern_node, source_node, storage)
                && self.matches(si + 1, pi + 1, storage)
            {
                return true;
            }
            storage.restore(snapshot);
        }

        // A separator in front of a slot that may bind nothing is itself
        // optional: `foo($X, $$REST)` must still match `foo(1)`.
        if self.separator_before_optional_slot(pi) {
            return self.matches(si, pi + 1, storage);
        }

        false
    }

    fn matches_variadic(
        &self,
        capture: &Capture,
        si: usize,
        pi: usize,
        storage: &mut CaptureStorage<'t>,
    ) -> bool {
        let raw_remaining = self.source.len().saturating_sub(si);
        let later_variadic = self
            .pattern
            .get(pi + 1..)
            .is_some_and(|rest| rest.iter().any(|node| self.ctx.is_variadic(node)));

        if later_variadic {
            // Several variadic slots: counts are tried from the shortest
            // run upward, so the first count whose remainder aligns is the
            // binding reported.
            for k in 0..=raw_remaining {
                if self.try_run(capture, si, pi, k, storage) {
                    return true;
                }
            }
        } else {
            // Forced split: each later pattern child consumes one sibling.
            let fixed_after = self.pattern.len().saturating_sub(pi + 1);
            if let Some(k) = raw_remaining.checked_sub(fixed_after) {
                if self.try_run(capture, si, pi, k, storage) {
                    return true;
                }
            }
        }

        // An empty run makes the separator after the slot optional too:
        // `foo($$REST, 999)` must still match `foo(999)`.
        let min_zero = capture.arity().is_some_and(|arity| arity.min == 0);
        if min_zero && self.separator_at(pi + 1) {
            let snapshot = storage.save();
            let run = storage.empty_run_at(self.insertion_point(si));
            if constraint_holds(capture, run.nodes(), self.parent, storage)
                && storage.bind(capture, BoundValue::Nodes(run))
                && self.matches(si, pi + 2, storage)
            {
                return true;
            }
            storage.restore(snapshot);
        }

        false
    }

    /// Tries binding `k` raw siblings starting at `si` to the slot, then
    /// matching the rest of the sequence.
    fn try_run(
        &self,
        capture: &Capture,
        si: usize,
        pi: usize,
        k: usize,
        storage: &mut CaptureStorage<'t>,
    ) -> bool {
        let Some(raw) = self.source.get(si..si + k) else {
            return false;
        };
        let Some(elements) = self.run_elements(raw, storage) else {
            return false;
        };
        if k > 0 && elements.is_empty() {
            return false;
        }

        let Some(arity) = capture.arity() else {
            return false;
        };
        if !arity.accepts(elements.len()) {
            return false;
        }
        if !elements
            .iter()
            .all(|&node| kind_hint_matches(capture, node))
        {
            return false;
        }

        let snapshot = storage.save();
        let run = if elements.is_empty() {
            storage.empty_run_at(self.insertion_point(si))
        } else {
            storage.run_of(&elements)
        };
        if constraint_holds(capture, run.nodes(), self.parent, storage)
            && storage.bind(capture, BoundValue::Nodes(run))
            && self.matches(si + k, pi + 1, storage)
        {
            return true;
        }

        storage.restore(snapshot);
        false
    }

    /// Extracts the element nodes of a raw run, or `None` when the run
    /// straddles tokens a slot must not absorb (list delimiters, or any
    /// unnamed token outside an argument list).
    fn run_elements(
        &self,
        raw: &[tree_sitter::Node<'t>],
        storage: &CaptureStorage<'t>,
    ) -> Option<Vec<tree_sitter::Node<'t>>> {
        let in_argument_list = ARGUMENT_LIST_KINDS.contains(&self.parent.kind());
        let mut elements = Vec::with_capacity(raw.len());
        for &node in raw {
            if node.is_named() {
                elements.push(node);
                continue;
            }
            let separator =
                in_argument_list && matches!(storage.node_text(&node), "," | ";");
            if !separator {
                return None;
            }
        }
        Some(elements)
    }

    fn separator_at(&self, pi: usize) -> bool {
        self.pattern.get(pi).is_some_and(|node| {
            !node.is_named() && matches!(self.ctx.pattern_text(node), "," | ";")
        })
    }

    fn separator_before_optional_slot(&self, pi: usize) -> bool {
        self.separator_at(pi)
            && self.pattern.get(pi + 1).is_some_and(|next| {
                self.ctx
                    .capture_for(next)
                    .and_then(Capture::arity)
                    .is_some_and(|arity| arity.min == 0)
            })
    }

    /// Byte position an empty run occupies.
    fn insertion_point(&self, si: usize) -> usize {
        self.source
            .get(si)
            .map_or_else(|| self.parent.end_byte(), tree_sitter::Node::start_byte)
    }
}
