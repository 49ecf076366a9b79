//! Tree-sitter parsing wrapper.
//!
//! The engine never parses source text itself; it delegates to Tree-sitter
//! and works over the resulting [`SourceTree`]. Tree-sitter is error-tolerant,
//! so a parse may succeed while still containing ERROR nodes; callers that
//! need a clean tree check [`SourceTree::has_errors`].

use std::ops::Range;

use crate::error::GraftError;
use crate::language::Language;

/// A parsed source: syntax tree plus the text it was parsed from.
///
/// Parsing identical input yields structurally identical trees, which is what
/// makes compiled pattern/template artefacts safe to memoize.
#[derive(Debug)]
pub struct SourceTree {
    tree: tree_sitter::Tree,
    source: String,
    language: Language,
}

impl SourceTree {
    /// Returns the parsed syntax tree.
    #[must_use]
    pub const fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    /// Returns the source code that was parsed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the language of the parsed code.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Returns the root node of the syntax tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Returns whether the tree contains ERROR or missing nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        has_error_nodes(self.tree.root_node())
    }

    /// Collects every syntax error in the tree with display positions.
    #[must_use]
    pub fn errors(&self) -> Vec<ParseIssue> {
        let mut issues = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut issues);
        issues
    }
}

/// A syntax error found in a parsed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// One-based line where the error starts.
    pub line: u32,
    /// One-based column where the error starts.
    pub column: u32,
    /// Human-readable description of the error.
    pub message: String,
}

impl ParseIssue {
    fn from_node(node: tree_sitter::Node<'_>) -> Self {
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };
        let (line, column) = point_to_one_based(node.start_position());

        Self {
            byte_range: node.byte_range(),
            line,
            column,
            message,
        }
    }
}

/// Tree-sitter parser configured for a single language.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: Language,
}

impl Parser {
    /// Creates a new parser for the given language.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser cannot be initialised with
    /// the language grammar.
    pub fn new(language: Language) -> Result<Self, GraftError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(language.grammar())
            .map_err(|e| GraftError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Returns the language this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Parses source code into a [`SourceTree`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parser fails to produce a tree at all; this is
    /// rare and indicates a parser configuration problem, not a syntax error.
    pub fn parse(&mut self, source: &str) -> Result<SourceTree, GraftError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| GraftError::parse(self.language, "parsing failed"))?;

        Ok(SourceTree {
            tree,
            source: source.to_owned(),
            language: self.language,
        })
    }
}

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}

fn has_error_nodes(node: tree_sitter::Node<'_>) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if has_error_nodes(child) {
            return true;
        }
    }

    false
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, issues: &mut Vec<ParseIssue>) {
    if node.is_error() || node.is_missing() {
        issues.push(ParseIssue::from_node(node));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Language::Rust, "fn main() {}")]
    #[case(Language::Python, "def hello():\n    pass")]
    #[case(Language::TypeScript, "function hello(): string { return 'hi'; }")]
    fn parses_valid_source(#[case] language: Language, #[case] source: &str) {
        let mut parser = Parser::new(language).expect("parser init");
        let result = parser.parse(source).expect("parse");

        assert!(!result.has_errors());
        assert_eq!(result.language(), language);
    }

    #[rstest]
    #[case(Language::Rust, "fn broken() {")]
    #[case(Language::Python, "def broken(")]
    #[case(Language::TypeScript, "function broken( {")]
    fn detects_syntax_errors(#[case] language: Language, #[case] source: &str) {
        let mut parser = Parser::new(language).expect("parser init");
        let result = parser.parse(source).expect("parse");

        assert!(result.has_errors());
        assert!(!result.errors().is_empty());
    }

    #[test]
    fn issues_carry_one_based_positions() {
        let mut parser = Parser::new(Language::Rust).expect("parser init");
        let result = parser.parse("fn test() {\n    let x = \n}").expect("parse");

        let issues = result.errors();
        assert!(!issues.is_empty());
        let first = issues.first().expect("has issue");
        assert!(first.line >= 1);
        assert!(first.column >= 1);
    }
}
