//! Trivia handling: the formatting text that lives between tokens.
//!
//! A Tree-sitter tree does not attach whitespace or comments to nodes; they
//! are simply the source text between one token's end and the next token's
//! start. This module recovers that text so captured values can carry their
//! leading comments and trailing separators through a rewrite, and so
//! template expansion can merge a slot's layout with a value's comments.

use std::ops::Range;

/// Byte range of the trivia immediately preceding `node`.
///
/// The range runs from the end of the previous sibling (or the start of the
/// parent when `node` is a first child) up to the node's own start.
#[must_use]
pub(crate) fn leading_range(node: &tree_sitter::Node<'_>) -> Range<usize> {
    let start = node.prev_sibling().map_or_else(
        || node.parent().map_or(0, |parent| parent.start_byte()),
        |prev| prev.end_byte(),
    );

    start.min(node.start_byte())..node.start_byte()
}

/// Returns the trivia text immediately preceding `node`.
#[must_use]
pub(crate) fn leading_text<'a>(source: &'a str, node: &tree_sitter::Node<'_>) -> &'a str {
    source.get(leading_range(node)).unwrap_or_default()
}

/// Returns the prefix of `trivia` up to and including the last
/// non-whitespace character.
///
/// Between two tokens the only non-whitespace content is comments, so this
/// is the comment block with any trailing layout stripped.
#[must_use]
pub(crate) fn comment_block(trivia: &str) -> &str {
    let end = trivia
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .last()
        .map(|(i, c)| i + c.len_utf8());

    end.and_then(|e| trivia.get(..e)).unwrap_or_default()
}

/// Returns the indentation of `leading`: the text after its last newline,
/// or the whole string when it spans a single line.
#[must_use]
pub(crate) fn indentation(leading: &str) -> &str {
    leading.rsplit('\n').next().unwrap_or(leading)
}

/// Merges a template slot's leading trivia with a bound value's.
///
/// The value's comments are kept; the slot's whitespace and indentation win
/// for layout. Each preserved comment line is re-indented to the slot's
/// indentation so the output reads as if the comment had been written in the
/// template.
#[must_use]
pub(crate) fn merge_leading(slot_leading: &str, value_leading: &str) -> String {
    let comments = comment_block(value_leading).trim();
    if comments.is_empty() {
        return slot_leading.to_owned();
    }

    let indent = indentation(slot_leading);
    let mut out = String::with_capacity(slot_leading.len() + comments.len() + indent.len() + 1);
    out.push_str(slot_leading);
    for line in comments.lines() {
        out.push_str(line.trim());
        out.push('\n');
        out.push_str(indent);
    }

    out
}

/// Returns the separator token (`,` or `;`) physically following `node`,
/// if any.
#[must_use]
pub(crate) fn trailing_separator<'a>(
    source: &'a str,
    node: &tree_sitter::Node<'_>,
) -> Option<&'a str> {
    let next = node.next_sibling()?;
    if next.is_named() {
        return None;
    }

    let text = source.get(next.byte_range())?;
    matches!(text, "," | ";").then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("   \n  ", "")]
    #[case("// note\n", "// note")]
    #[case("\n  // a\n  // b\n  ", "\n  // a\n  // b")]
    fn comment_block_strips_trailing_layout(#[case] trivia: &str, #[case] expected: &str) {
        assert_eq!(comment_block(trivia), expected);
    }

    #[rstest]
    #[case("\n    ", "    ")]
    #[case("  ", "  ")]
    #[case("\n\t\t", "\t\t")]
    fn indentation_takes_text_after_last_newline(#[case] leading: &str, #[case] expected: &str) {
        assert_eq!(indentation(leading), expected);
    }

    #[test]
    fn merge_keeps_slot_layout_when_value_has_no_comments() {
        assert_eq!(merge_leading("\n    ", "\n        "), "\n    ");
    }

    #[test]
    fn merge_reindents_value_comments_to_slot_indentation() {
        let merged = merge_leading("\n    ", "\n        // keep me\n        ");
        assert_eq!(merged, "\n    // keep me\n    ");
    }

    #[test]
    fn merge_preserves_multiple_comment_lines() {
        let merged = merge_leading("\n  ", "// a\n// b\n");
        assert_eq!(merged, "\n  // a\n  // b\n  ");
    }
}
