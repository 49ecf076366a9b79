//! Template expansion: substituting bound values into a compiled template.
//!
//! Each marker node in the template tree is replaced by the text of the
//! value its reference resolves to. Replacements carry trivia: the slot's
//! own indentation wins for layout, while comments attached to the bound
//! value are preserved and re-indented, so a rewrite does not silently
//! drop a comment the user wrote on the captured code.

use std::ops::Range;

use crate::capture::{BindingRef, RefSegment};
use crate::compile::Compiled;
use crate::error::GraftError;
use crate::matcher::{ARGUMENT_LIST_KINDS, Bindings, BoundNode, BoundValue};
use crate::trivia;

/// A reference resolved against actual bindings.
enum Resolved<'t> {
    /// A single node with its target-side trivia.
    Node { text: String, leading: String },
    /// A run of nodes from a variadic binding.
    Run(Vec<BoundNode<'t>>),
    /// Plain text with no trivia of its own.
    Text(String),
}

/// Intermediate state while walking a property path.
enum Cursor<'t> {
    Node(tree_sitter::Node<'t>),
    Run(Vec<BoundNode<'t>>),
    Text(String),
}

/// Expands the compiled template against `bindings`.
pub(crate) fn expand(
    compiled: &Compiled,
    refs: &[BindingRef],
    bindings: &Bindings<'_>,
) -> Result<String, GraftError> {
    let root = compiled.content_root()?;
    let span = root.byte_range();
    let template_source = compiled.source();

    let mut replacements = Vec::new();
    for (node, ordinal) in compiled.exact_markers_in(root) {
        let reference = refs
            .get(ordinal)
            .ok_or_else(|| GraftError::internal("marker node without a reference"))?;
        let resolved = resolve(reference, bindings)?;
        replacements.push(replacement_for(template_source, &span, &node, &resolved));
    }

    let mut output = template_source
        .get(span.clone())
        .ok_or_else(|| GraftError::internal("template content span out of bounds"))?
        .to_owned();
    replacements.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (range, text) in replacements {
        let start = range.start.clamp(span.start, span.end) - span.start;
        let end = range.end.clamp(span.start, span.end) - span.start;
        output.replace_range(start..end, &text);
    }

    if compiled.wrapped() {
        Ok(output.trim().to_owned())
    } else {
        Ok(output)
    }
}

/// Resolves a binding reference, walking its property path lazily against
/// the bound value.
fn resolve<'t>(
    reference: &BindingRef,
    bindings: &Bindings<'t>,
) -> Result<Resolved<'t>, GraftError> {
    let value = bindings
        .get(reference.name())
        .ok_or_else(|| GraftError::unresolved_binding(reference.name()))?;

    let mut cursor = match value {
        BoundValue::Node(node) => {
            if reference.is_whole() {
                return Ok(Resolved::Node {
                    text: node.text().to_owned(),
                    leading: node.leading().to_owned(),
                });
            }
            Cursor::Node(node.node())
        }
        BoundValue::Nodes(run) => Cursor::Run(run.nodes().to_vec()),
        BoundValue::Text(text) => Cursor::Text(text.clone()),
    };

    for segment in reference.segments() {
        cursor = step(cursor, segment)
            .ok_or_else(|| GraftError::unresolved_path(reference.to_string()))?;
    }

    Ok(match cursor {
        Cursor::Node(node) => Resolved::Node {
            text: bindings
                .source()
                .get(node.byte_range())
                .unwrap_or_default()
                .to_owned(),
            leading: trivia::leading_text(bindings.source(), &node).to_owned(),
        },
        Cursor::Run(nodes) => Resolved::Run(nodes),
        Cursor::Text(text) => Resolved::Text(text),
    })
}

fn step<'t>(cursor: Cursor<'t>, segment: &RefSegment) -> Option<Cursor<'t>> {
    match (cursor, segment) {
        (Cursor::Node(node), RefSegment::Field(name)) => {
            node.child_by_field_name(name.as_str()).map(Cursor::Node)
        }
        (Cursor::Run(nodes), RefSegment::Index(i)) => {
            nodes.get(*i).map(|bound| Cursor::Node(bound.node()))
        }
        (Cursor::Run(nodes), RefSegment::Slice(start, end)) => {
            let until = end.unwrap_or(nodes.len());
            nodes.get(*start..until).map(|sub| Cursor::Run(sub.to_vec()))
        }
        (Cursor::Run(nodes), RefSegment::Len) => Some(Cursor::Text(nodes.len().to_string())),
        _ => None,
    }
}

/// Computes the byte range to replace and its new text for one marker.
fn replacement_for(
    template_source: &str,
    span: &Range<usize>,
    node: &tree_sitter::Node<'_>,
    resolved: &Resolved<'_>,
) -> (Range<usize>, String) {
    let mut leading_range = trivia::leading_range(node);
    leading_range.start = leading_range.start.max(span.start);
    let slot_leading = template_source
        .get(leading_range.clone())
        .unwrap_or_default();

    match resolved {
        Resolved::Text(text) => (node.byte_range(), text.clone()),
        Resolved::Node { text, leading } => {
            let merged = trivia::merge_leading(slot_leading, leading);
            (leading_range.start..node.end_byte(), format!("{merged}{text}"))
        }
        Resolved::Run(elements) => {
            let Some((first, rest)) = elements.split_first() else {
                return (
                    removal_range(template_source, node, &leading_range),
                    String::new(),
                );
            };

            let mut out = trivia::merge_leading(slot_leading, first.leading());
            out.push_str(first.text());
            let mut prev = first;
            for elem in rest {
                out.push_str(&joiner(node, slot_leading, prev, elem));
                out.push_str(elem.text());
                prev = elem;
            }
            (leading_range.start..node.end_byte(), out)
        }
    }
}

/// Text between two expanded run elements.
///
/// When the elements were adjacent in the target, the original separator
/// and layout between them is reproduced verbatim; otherwise a separator
/// appropriate to the slot's position is derived.
fn joiner(
    slot: &tree_sitter::Node<'_>,
    slot_leading: &str,
    prev: &BoundNode<'_>,
    elem: &BoundNode<'_>,
) -> String {
    if let Some(token) = prev.trailing() {
        let gap = if elem.leading().is_empty() {
            " "
        } else {
            elem.leading()
        };
        return format!("{token}{gap}");
    }
    if !elem.leading().is_empty() {
        return elem.leading().to_owned();
    }

    let in_arguments = slot
        .parent()
        .is_some_and(|parent| ARGUMENT_LIST_KINDS.contains(&parent.kind()));
    if in_arguments {
        ", ".to_owned()
    } else {
        format!("\n{}", trivia::indentation(slot_leading))
    }
}

/// Range to delete when a variadic slot expanded to nothing: the slot, its
/// leading trivia, and one adjacent separator token.
fn removal_range(
    template_source: &str,
    node: &tree_sitter::Node<'_>,
    leading_range: &Range<usize>,
) -> Range<usize> {
    let is_separator = |sibling: &tree_sitter::Node<'_>| {
        !sibling.is_named()
            && matches!(
                template_source.get(sibling.byte_range()).unwrap_or_default(),
                "," | ";"
            )
    };

    if let Some(next) = node.next_sibling().filter(|s| is_separator(s)) {
        return leading_range.start..next.end_byte();
    }
    if let Some(prev) = node.prev_sibling().filter(|s| is_separator(s)) {
        return prev.start_byte()..node.end_byte();
    }

    leading_range.start..node.end_byte()
}
