//! Shared read-only state for one match attempt.

use crate::capture::Capture;
use crate::compile::Compiled;

/// The compiled pattern side of a match, shared by the comparator and the
/// sequence matcher.
pub(crate) struct MatchContext<'p> {
    compiled: &'p Compiled,
    placeholders: &'p [Capture],
    lenient: bool,
}

impl<'p> MatchContext<'p> {
    pub(crate) const fn new(
        compiled: &'p Compiled,
        placeholders: &'p [Capture],
        lenient: bool,
    ) -> Self {
        Self {
            compiled,
            placeholders,
            lenient,
        }
    }

    /// Returns the capture a pattern node stands for, if it is a marker.
    pub(crate) fn capture_for(&self, node: &tree_sitter::Node<'_>) -> Option<&'p Capture> {
        let marker = self.compiled.marker_for(node)?;
        self.placeholders.get(marker.ordinal)
    }

    /// Returns whether a pattern node is a variadic capture slot.
    pub(crate) fn is_variadic(&self, node: &tree_sitter::Node<'_>) -> bool {
        self.capture_for(node).is_some_and(|c| c.arity().is_some())
    }

    /// Returns the source text of a pattern node.
    pub(crate) fn pattern_text(&self, node: &tree_sitter::Node<'_>) -> &'p str {
        self.compiled
            .source()
            .get(node.byte_range())
            .unwrap_or_default()
    }

    pub(crate) const fn lenient(&self) -> bool {
        self.lenient
    }
}
