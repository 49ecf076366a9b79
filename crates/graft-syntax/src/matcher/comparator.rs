//! Structural node comparison.
//!
//! Two nodes match when their kinds agree and their children match
//! pairwise; leaves compare by source text, so identifiers and literals
//! must be identical unless a capture absorbs them. Marker nodes in the
//! pattern short-circuit the walk and bind the target node instead.

use crate::capture::{Capture, ConstraintContext};
use crate::matcher::context::MatchContext;
use crate::matcher::sequence::SequenceMatcher;
use crate::matcher::storage::{BoundNode, BoundValue, CaptureStorage};

/// Compares a pattern node against a target node, binding captures as it
/// descends. Returns false without rolling back partial bindings; callers
/// that retry alternatives snapshot the storage first.
pub(crate) fn nodes_match<'t>(
    ctx: &MatchContext<'_>,
    pattern: tree_sitter::Node<'_>,
    target: tree_sitter::Node<'t>,
    storage: &mut CaptureStorage<'t>,
) -> bool {
    if let Some(capture) = ctx.capture_for(&pattern) {
        return bind_capture(capture, target, storage);
    }

    if pattern.kind() != target.kind() {
        return false;
    }

    if pattern.child_count() == 0 {
        return ctx.pattern_text(&pattern) == storage.node_text(&target);
    }

    match_children(ctx, pattern, target, storage)
}

/// Binds a single target node to a capture slot.
///
/// A variadic capture sitting in a scalar position binds a one-element run,
/// provided its arity admits a single node.
fn bind_capture<'t>(
    capture: &Capture,
    target: tree_sitter::Node<'t>,
    storage: &mut CaptureStorage<'t>,
) -> bool {
    if capture.kind_hint().is_some_and(|hint| target.kind() != hint) {
        return false;
    }

    if let Some(arity) = capture.arity() {
        if !arity.accepts(1) {
            return false;
        }
        let run = storage.run_of(&[target]);
        let anchor = target.parent().unwrap_or(target);
        if !constraint_holds(capture, run.nodes(), anchor, storage) {
            return false;
        }
        return storage.bind(capture, BoundValue::Nodes(run));
    }

    let bound = storage.bound(target);
    let candidate = [bound.clone()];
    if !constraint_holds(capture, &candidate, target, storage) {
        return false;
    }

    storage.bind(capture, BoundValue::Node(bound))
}

/// Checks a capture's kind requirement against one element of a variadic
/// run.
///
/// A statement wrapper whose sole named child has the required kind is
/// accepted too, so a hint of `call_expression` still admits a run of
/// calls in statement position.
pub(crate) fn kind_hint_matches(capture: &Capture, target: tree_sitter::Node<'_>) -> bool {
    let Some(hint) = capture.kind_hint() else {
        return true;
    };
    if target.kind() == hint {
        return true;
    }

    target.named_child_count() == 1
        && target
            .named_child(0)
            .is_some_and(|child| child.kind() == hint)
}

/// Evaluates a capture's constraint predicate over candidate nodes.
pub(crate) fn constraint_holds<'t>(
    capture: &Capture,
    nodes: &[BoundNode<'t>],
    anchor: tree_sitter::Node<'t>,
    storage: &CaptureStorage<'t>,
) -> bool {
    capture.constraint().is_none_or(|predicate| {
        predicate(&ConstraintContext {
            nodes,
            anchor,
            storage,
        })
    })
}

type FieldChild<'t> = (tree_sitter::Node<'t>, Option<&'static str>);

fn children_with_fields<'t>(node: &tree_sitter::Node<'t>) -> Vec<FieldChild<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.node(), cursor.field_name()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn match_children<'t>(
    ctx: &MatchContext<'_>,
    pattern: tree_sitter::Node<'_>,
    target: tree_sitter::Node<'t>,
    storage: &mut CaptureStorage<'t>,
) -> bool {
    let pattern_children = children_with_fields(&pattern);
    let mut target_children = children_with_fields(&target);
    if ctx.lenient() {
        strip_extra_annotations(storage.source(), &pattern_children, &mut target_children);
    }

    let pattern_nodes: Vec<_> = pattern_children.into_iter().map(|(node, _)| node).collect();
    let target_nodes: Vec<_> = target_children.into_iter().map(|(node, _)| node).collect();

    if pattern_nodes.iter().any(|node| ctx.is_variadic(node)) {
        return SequenceMatcher::new(ctx, target, &target_nodes, &pattern_nodes)
            .matches(0, 0, storage);
    }

    pattern_nodes.len() == target_nodes.len()
        && pattern_nodes
            .iter()
            .zip(&target_nodes)
            .all(|(&p, &t)| nodes_match(ctx, p, t, storage))
}

/// Removes optional type annotations from the target's children when the
/// pattern carries none, together with the `:` or `->` punctuation that
/// introduces them.
fn strip_extra_annotations<'t>(
    source: &str,
    pattern_children: &[FieldChild<'_>],
    target_children: &mut Vec<FieldChild<'t>>,
) {
    for field in ["type", "return_type"] {
        let pattern_has = pattern_children
            .iter()
            .any(|(_, name)| *name == Some(field));
        if pattern_has {
            continue;
        }

        let mut i = 0;
        while i < target_children.len() {
            let is_annotation = target_children
                .get(i)
                .is_some_and(|(_, name)| *name == Some(field));
            if !is_annotation {
                i += 1;
                continue;
            }

            target_children.remove(i);
            if i > 0 {
                let prev_is_intro = target_children.get(i - 1).is_some_and(|(node, _)| {
                    !node.is_named()
                        && matches!(
                            source.get(node.byte_range()).unwrap_or_default(),
                            ":" | "->"
                        )
                });
                if prev_is_intro {
                    target_children.remove(i - 1);
                    i -= 1;
                }
            }
        }
    }
}
