//! Structural matching of compiled patterns against target trees.
//!
//! Matching never errors: a pattern either fits a node or it does not.
//! The result of a successful match is a [`MatchResult`] carrying the
//! matched node and the [`Bindings`] its captures produced.

mod comparator;
mod context;
mod sequence;
mod storage;

use std::collections::HashMap;
use std::ops::Range;

use crate::capture::Capture;
use crate::compile::Compiled;
use crate::error::GraftError;
use crate::parser::{SourceTree, point_to_one_based};

pub use storage::{BoundNode, BoundNodes, BoundValue};

pub(crate) use context::MatchContext;
pub(crate) use storage::CaptureStorage;

/// Node kinds whose children are an argument-style list: unnamed separator
/// tokens between elements belong to the list, not the elements, so a
/// variadic slot binds only the named children it covers and expansion
/// joins elements with commas.
pub(crate) const ARGUMENT_LIST_KINDS: &[&str] = &[
    "arguments",
    "argument_list",
    "parameters",
    "formal_parameters",
    "tuple_expression",
    "array",
    "array_expression",
];

/// The capture bindings of a completed match.
///
/// Bindings can also be built by hand to drive template expansion without a
/// match, using [`Bindings::new`] and [`Bindings::insert_text`].
#[derive(Debug)]
pub struct Bindings<'t> {
    source: &'t str,
    slots: HashMap<String, BoundValue<'t>>,
}

impl<'t> Bindings<'t> {
    /// Creates empty bindings over `source`.
    #[must_use]
    pub fn new(source: &'t str) -> Self {
        Self {
            source,
            slots: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(source: &'t str, slots: HashMap<String, BoundValue<'t>>) -> Self {
        Self { source, slots }
    }

    pub(crate) const fn source(&self) -> &'t str {
        self.source
    }

    /// Returns the value bound under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue<'t>> {
        self.slots.get(name)
    }

    /// Returns whether `name` is bound.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Returns the bound capture names, in no particular order.
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Returns the number of bound captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no captures are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Binds synthetic text under `name`, replacing any existing binding.
    pub fn insert_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.slots.insert(name.into(), BoundValue::Text(text.into()));
    }
}

/// One successful match of a pattern in a target tree.
#[derive(Debug)]
pub struct MatchResult<'t> {
    node: tree_sitter::Node<'t>,
    source: &'t str,
    bindings: Bindings<'t>,
}

impl<'t> MatchResult<'t> {
    /// Returns the matched node.
    #[must_use]
    pub const fn node(&self) -> tree_sitter::Node<'t> {
        self.node
    }

    /// Returns the byte range the match covers.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }

    /// Returns the matched source text.
    #[must_use]
    pub fn text(&self) -> &'t str {
        self.source.get(self.node.byte_range()).unwrap_or_default()
    }

    /// Returns the one-based (line, column) where the match starts.
    #[must_use]
    pub fn start_position(&self) -> (u32, u32) {
        point_to_one_based(self.node.start_position())
    }

    /// Returns the one-based (line, column) where the match ends.
    #[must_use]
    pub fn end_position(&self) -> (u32, u32) {
        point_to_one_based(self.node.end_position())
    }

    /// Returns the value bound under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue<'t>> {
        self.bindings.get(name)
    }

    /// Returns whether `name` was bound by this match.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.bindings.has(name)
    }

    /// Returns the match's bindings.
    #[must_use]
    pub const fn bindings(&self) -> &Bindings<'t> {
        &self.bindings
    }

    /// Consumes the match, yielding its bindings.
    #[must_use]
    pub fn into_bindings(self) -> Bindings<'t> {
        self.bindings
    }
}

/// Tries a pattern against one specific node.
pub(crate) fn match_at<'t>(
    compiled: &Compiled,
    placeholders: &[Capture],
    lenient: bool,
    tree: &'t SourceTree,
    node: tree_sitter::Node<'t>,
) -> Result<Option<MatchResult<'t>>, GraftError> {
    let pattern_root = compiled.content_root()?;
    let ctx = MatchContext::new(compiled, placeholders, lenient);
    let mut storage = CaptureStorage::new(tree.source());
    if !comparator::nodes_match(&ctx, pattern_root, node, &mut storage) {
        return Ok(None);
    }

    Ok(Some(MatchResult {
        node,
        source: tree.source(),
        bindings: storage.into_bindings(),
    }))
}

/// Finds matches across a whole tree, in source order.
///
/// Matched subtrees are not descended into, so the results never overlap
/// and can be rewritten independently.
pub(crate) fn find_matches<'t>(
    compiled: &Compiled,
    placeholders: &[Capture],
    lenient: bool,
    tree: &'t SourceTree,
    first_only: bool,
) -> Result<Vec<MatchResult<'t>>, GraftError> {
    let pattern_root = compiled.content_root()?;
    let ctx = MatchContext::new(compiled, placeholders, lenient);
    let mut results = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let mut storage = CaptureStorage::new(tree.source());
        if comparator::nodes_match(&ctx, pattern_root, node, &mut storage) {
            results.push(MatchResult {
                node,
                source: tree.source(),
                bindings: storage.into_bindings(),
            });
            if first_only {
                break;
            }
            continue;
        }

        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    Ok(results)
}
