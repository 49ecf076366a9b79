//! Capture descriptors: the typed slots a pattern binds values into.
//!
//! A [`Capture`] describes one placeholder position in a pattern: whether it
//! records a binding, how many nodes it may absorb, and any predicate the
//! bound nodes must satisfy. Captures are built fluently:
//!
//! binding a single expression named `X`:
//! `capture("X")`
//!
//! matching anything without recording it:
//! `any()`
//!
//! absorbing between one and three arguments of a call:
//! `capture("ARGS").variadic(1, Some(3))`

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::matcher::{BoundNode, CaptureStorage};

/// How many sibling nodes a variadic capture may absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    /// Minimum number of nodes, inclusive.
    pub min: u32,
    /// Maximum number of nodes, inclusive; `None` means unbounded.
    pub max: Option<u32>,
}

impl Arity {
    /// Creates an arity accepting between `min` and `max` nodes.
    #[must_use]
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Returns whether `count` nodes satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        let Ok(count) = u32::try_from(count) else {
            return self.max.is_none();
        };
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Context handed to a capture constraint when a candidate run is tried.
///
/// The constraint sees the candidate nodes, their parent in the target tree,
/// and every binding established so far, so it can cross-check a candidate
/// against earlier captures.
pub struct ConstraintContext<'ctx, 'tree> {
    pub(crate) nodes: &'ctx [BoundNode<'tree>],
    pub(crate) anchor: tree_sitter::Node<'tree>,
    pub(crate) storage: &'ctx CaptureStorage<'tree>,
}

impl<'tree> ConstraintContext<'_, 'tree> {
    /// Returns the candidate nodes under consideration.
    #[must_use]
    pub fn nodes(&self) -> &[BoundNode<'tree>] {
        self.nodes
    }

    /// Returns the source text of the whole candidate run.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(BoundNode::text)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the target-tree node the candidate hangs off: the candidate
    /// itself for a scalar capture, its parent for a variadic run.
    #[must_use]
    pub const fn anchor(&self) -> tree_sitter::Node<'tree> {
        self.anchor
    }

    /// Looks up the source text of a capture bound earlier in this match.
    #[must_use]
    pub fn bound_text(&self, name: &str) -> Option<String> {
        self.storage.bound_text(name)
    }
}

/// Signature of a capture constraint predicate.
pub type ConstraintFn = dyn Fn(&ConstraintContext<'_, '_>) -> bool + Send + Sync;

static ANONYMOUS_SEQ: AtomicU32 = AtomicU32::new(0);

/// One placeholder slot in a pattern.
///
/// By default a capture binds exactly one named node and records it under its
/// name; the fluent methods relax or tighten that.
#[derive(Clone)]
pub struct Capture {
    name: String,
    capturing: bool,
    variadic: Option<Arity>,
    kind_hint: Option<String>,
    constraint: Option<Arc<ConstraintFn>>,
}

/// Creates a named capture binding a single node.
#[must_use]
pub fn capture(name: impl Into<String>) -> Capture {
    Capture {
        name: name.into(),
        capturing: true,
        variadic: None,
        kind_hint: None,
        constraint: None,
    }
}

/// Creates an anonymous wildcard that matches a single node without
/// recording a binding.
#[must_use]
pub fn any() -> Capture {
    let seq = ANONYMOUS_SEQ.fetch_add(1, Ordering::Relaxed);
    Capture {
        name: format!("_anon_{seq}"),
        capturing: false,
        variadic: None,
        kind_hint: None,
        constraint: None,
    }
}

impl Capture {
    /// Returns the capture's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether matches bind a value under this capture's name.
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Returns the arity if this capture is variadic.
    #[must_use]
    pub const fn arity(&self) -> Option<Arity> {
        self.variadic
    }

    /// Returns the required node kind, if one was set.
    #[must_use]
    pub fn kind_hint(&self) -> Option<&str> {
        self.kind_hint.as_deref()
    }

    pub(crate) fn constraint(&self) -> Option<&Arc<ConstraintFn>> {
        self.constraint.as_ref()
    }

    /// Makes the capture variadic, absorbing between `min` and `max`
    /// sibling nodes.
    #[must_use]
    pub const fn variadic(mut self, min: u32, max: Option<u32>) -> Self {
        self.variadic = Some(Arity::new(min, max));
        self
    }

    /// Makes the capture variadic with no bounds (zero or more nodes).
    #[must_use]
    pub const fn many(self) -> Self {
        self.variadic(0, None)
    }

    /// Makes the capture variadic with a lower bound only.
    #[must_use]
    pub const fn at_least(self, min: u32) -> Self {
        self.variadic(min, None)
    }

    /// Requires bound nodes to have the given Tree-sitter kind.
    #[must_use]
    pub fn of_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind_hint = Some(kind.into());
        self
    }

    /// Attaches a predicate that candidate nodes must satisfy.
    #[must_use]
    pub fn constrained<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ConstraintContext<'_, '_>) -> bool + Send + Sync + 'static,
    {
        self.constraint = Some(Arc::new(predicate));
        self
    }

    /// Creates a template reference to this capture's whole value.
    #[must_use]
    pub fn reference(&self) -> BindingRef {
        BindingRef::new(&self.name)
    }

    /// Creates a template reference to a named field of this capture's value.
    #[must_use]
    pub fn field(&self, name: impl Into<String>) -> BindingRef {
        BindingRef::new(&self.name).field(name)
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("name", &self.name)
            .field("capturing", &self.capturing)
            .field("variadic", &self.variadic)
            .field("kind_hint", &self.kind_hint)
            .field("constraint", &self.constraint.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// One step of a property path on a binding reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Field(String),
    Index(usize),
    Slice(usize, Option<usize>),
    Len,
}

/// A template-side reference to a bound capture, optionally narrowed by a
/// property path.
///
/// Paths are resolved lazily at expansion time against the actual bound
/// value; a path that does not apply raises
/// [`GraftError::UnresolvedPath`](crate::GraftError::UnresolvedPath).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRef {
    name: String,
    path: Vec<PathSegment>,
}

impl BindingRef {
    /// Creates a reference to the whole value bound under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// Returns the capture name this reference resolves against.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the reference has no property path.
    #[must_use]
    pub fn is_whole(&self) -> bool {
        self.path.is_empty()
    }

    /// Narrows the reference to a named Tree-sitter field of the bound node.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(PathSegment::Field(name.into()));
        self
    }

    /// Narrows the reference to the `index`-th element of a variadic binding.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.path.push(PathSegment::Index(index));
        self
    }

    /// Narrows the reference to a sub-range of a variadic binding.
    #[must_use]
    pub fn slice(mut self, start: usize, end: Option<usize>) -> Self {
        self.path.push(PathSegment::Slice(start, end));
        self
    }

    /// Replaces the reference with the element count of a variadic binding.
    #[must_use]
    pub fn len(mut self) -> Self {
        self.path.push(PathSegment::Len);
        self
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.path.iter()
    }
}

pub(crate) use PathSegment as RefSegment;

impl fmt::Display for BindingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name)?;
        for segment in &self.path {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Slice(start, Some(end)) => write!(f, "[{start}..{end}]")?,
                PathSegment::Slice(start, None) => write!(f, "[{start}..]")?,
                PathSegment::Len => write!(f, ".len")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Arity::new(0, None), 0, true)]
    #[case(Arity::new(0, None), 100, true)]
    #[case(Arity::new(1, Some(3)), 0, false)]
    #[case(Arity::new(1, Some(3)), 2, true)]
    #[case(Arity::new(1, Some(3)), 4, false)]
    #[case(Arity::new(2, Some(2)), 2, true)]
    fn arity_accepts_counts_within_bounds(
        #[case] arity: Arity,
        #[case] count: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(arity.accepts(count), expected);
    }

    #[test]
    fn capture_defaults_to_scalar_and_capturing() {
        let c = capture("X");
        assert_eq!(c.name(), "X");
        assert!(c.is_capturing());
        assert!(c.arity().is_none());
        assert!(c.kind_hint().is_none());
    }

    #[test]
    fn wildcards_get_distinct_names_and_do_not_capture() {
        let a = any();
        let b = any();
        assert!(!a.is_capturing());
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn fluent_methods_compose() {
        let c = capture("ARGS").variadic(1, Some(3)).of_kind("integer_literal");
        assert_eq!(c.arity(), Some(Arity::new(1, Some(3))));
        assert_eq!(c.kind_hint(), Some("integer_literal"));
    }

    #[rstest]
    #[case(BindingRef::new("V"), "$V")]
    #[case(BindingRef::new("V").field("function"), "$V.function")]
    #[case(BindingRef::new("ARGS").index(2), "$ARGS[2]")]
    #[case(BindingRef::new("ARGS").slice(1, None), "$ARGS[1..]")]
    #[case(BindingRef::new("ARGS").slice(0, Some(2)), "$ARGS[0..2]")]
    #[case(BindingRef::new("ARGS").len(), "$ARGS.len")]
    fn binding_ref_display_shows_path(#[case] reference: BindingRef, #[case] expected: &str) {
        assert_eq!(reference.to_string(), expected);
    }
}
