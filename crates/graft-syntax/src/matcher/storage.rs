//! Capture storage: the bindings accumulated while a match is attempted.
//!
//! Storage supports cheap snapshot and restore so the sequence matcher can
//! try a candidate binding, recurse, and roll back on failure. A snapshot
//! clones only the binding map, never any source text.

use std::collections::HashMap;
use std::ops::Range;

use crate::capture::Capture;
use crate::trivia;

/// A single target node bound to a capture, with its surrounding trivia.
#[derive(Debug, Clone)]
pub struct BoundNode<'t> {
    node: tree_sitter::Node<'t>,
    text: &'t str,
    leading: &'t str,
    trailing: Option<&'t str>,
}

impl<'t> BoundNode<'t> {
    /// Returns the bound syntax node.
    #[must_use]
    pub const fn node(&self) -> tree_sitter::Node<'t> {
        self.node
    }

    /// Returns the node's source text.
    #[must_use]
    pub const fn text(&self) -> &'t str {
        self.text
    }

    /// Returns the trivia preceding the node (whitespace and comments).
    #[must_use]
    pub const fn leading(&self) -> &'t str {
        self.leading
    }

    /// Returns the separator token following the node, if any.
    #[must_use]
    pub const fn trailing(&self) -> Option<&'t str> {
        self.trailing
    }

    /// Returns the node's byte range in the target source.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }
}

/// A run of sibling nodes bound to a variadic capture.
///
/// The run may be empty, in which case `byte_range` is the zero-width
/// position the run would occupy.
#[derive(Debug, Clone)]
pub struct BoundNodes<'t> {
    nodes: Vec<BoundNode<'t>>,
    text: &'t str,
    byte_range: Range<usize>,
}

impl<'t> BoundNodes<'t> {
    /// Returns the bound nodes in source order.
    #[must_use]
    pub fn nodes(&self) -> &[BoundNode<'t>] {
        &self.nodes
    }

    /// Returns the number of nodes in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the run bound no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the source text spanning the whole run, separators included.
    #[must_use]
    pub const fn text(&self) -> &'t str {
        self.text
    }

    /// Returns the byte range the run covers in the target source.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }
}

/// A value bound to a capture name.
#[derive(Debug, Clone)]
pub enum BoundValue<'t> {
    /// A single node from the target tree.
    Node(BoundNode<'t>),
    /// A run of sibling nodes absorbed by a variadic capture.
    Nodes(BoundNodes<'t>),
    /// Synthetic text with no backing node.
    Text(String),
}

impl BoundValue<'_> {
    /// Returns the source text of the bound value.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Node(node) => node.text(),
            Self::Nodes(run) => run.text(),
            Self::Text(text) => text,
        }
    }

    /// Returns whether a rebind under the same name agrees with this value.
    ///
    /// Two bindings agree when they are the same shape and carry
    /// structurally equal nodes (same kind, same text).
    fn consistent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => {
                a.node().kind() == b.node().kind() && a.text() == b.text()
            }
            (Self::Nodes(a), Self::Nodes(b)) => {
                a.len() == b.len()
                    && a.nodes().iter().zip(b.nodes()).all(|(x, y)| {
                        x.node().kind() == y.node().kind() && x.text() == y.text()
                    })
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

/// Saved binding state; see [`CaptureStorage::save`].
pub(crate) struct Snapshot<'t>(HashMap<String, BoundValue<'t>>);

/// Mutable binding state for one match attempt.
#[derive(Debug)]
pub(crate) struct CaptureStorage<'t> {
    source: &'t str,
    slots: HashMap<String, BoundValue<'t>>,
}

impl<'t> CaptureStorage<'t> {
    pub(crate) fn new(source: &'t str) -> Self {
        Self {
            source,
            slots: HashMap::new(),
        }
    }

    pub(crate) const fn source(&self) -> &'t str {
        self.source
    }

    /// Returns the source text of a target node.
    pub(crate) fn node_text(&self, node: &tree_sitter::Node<'t>) -> &'t str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// Wraps a target node with its trivia.
    pub(crate) fn bound(&self, node: tree_sitter::Node<'t>) -> BoundNode<'t> {
        BoundNode {
            node,
            text: self.node_text(&node),
            leading: trivia::leading_text(self.source, &node),
            trailing: trivia::trailing_separator(self.source, &node),
        }
    }

    /// Wraps a non-empty run of sibling nodes.
    pub(crate) fn run_of(&self, nodes: &[tree_sitter::Node<'t>]) -> BoundNodes<'t> {
        let bound: Vec<_> = nodes.iter().map(|&node| self.bound(node)).collect();
        let range = match (nodes.first(), nodes.last()) {
            (Some(first), Some(last)) => first.start_byte()..last.end_byte(),
            _ => 0..0,
        };

        BoundNodes {
            nodes: bound,
            text: self.source.get(range.clone()).unwrap_or_default(),
            byte_range: range,
        }
    }

    /// Wraps an empty run at the position it would occupy.
    pub(crate) const fn empty_run_at(&self, at: usize) -> BoundNodes<'t> {
        BoundNodes {
            nodes: Vec::new(),
            text: "",
            byte_range: at..at,
        }
    }

    /// Records `value` under the capture's name.
    ///
    /// Non-capturing slots succeed without recording anything. A rebind of
    /// an already-bound name succeeds only when the new value is
    /// structurally equal to the existing one, which is what makes a
    /// repeated capture name an equality constraint.
    pub(crate) fn bind(&mut self, capture: &Capture, value: BoundValue<'t>) -> bool {
        if !capture.is_capturing() {
            return true;
        }

        if let Some(existing) = self.slots.get(capture.name()) {
            return existing.consistent(&value);
        }

        self.slots.insert(capture.name().to_owned(), value);
        true
    }

    pub(crate) fn get(&self, name: &str) -> Option<&BoundValue<'t>> {
        self.slots.get(name)
    }

    /// Returns the source text bound under `name`, if any.
    pub(crate) fn bound_text(&self, name: &str) -> Option<String> {
        self.slots.get(name).map(|value| value.text().to_owned())
    }

    /// Captures the current binding state.
    pub(crate) fn save(&self) -> Snapshot<'t> {
        Snapshot(self.slots.clone())
    }

    /// Rolls bindings back to a previously saved state.
    pub(crate) fn restore(&mut self, snapshot: Snapshot<'t>) {
        self.slots = snapshot.0;
    }

    /// Consumes the storage, yielding the final bindings of a match.
    pub(crate) fn into_bindings(self) -> super::Bindings<'t> {
        super::Bindings::from_parts(self.source, self.slots)
    }
}
