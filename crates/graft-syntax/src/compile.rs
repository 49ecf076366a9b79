//! Placeholder compilation: turning fragments into a parsed, annotated tree.
//!
//! Placeholders cannot be parsed directly, so each one is replaced by a
//! reserved identifier token (`__GRAFT_M0__`, `__GRAFT_M1__`, ...) that is
//! valid in expression position in every supported grammar. The substituted
//! text is parsed, and the tree is walked to map marker nodes back to their
//! placeholder ordinal. Matching and expansion then treat marker nodes as
//! capture slots rather than literal identifiers.
//!
//! Fragments that only make sense inside a function body (`return x`, a bare
//! `{ ... }` block) do not parse at file scope, so compilation wraps them in
//! a synthetic function and records how to find the real content again.

use std::collections::HashMap;

use crate::config::MatchConfig;
use crate::error::GraftError;
use crate::fragment::Fragment;
use crate::language::Language;
use crate::parser::{Parser, SourceTree};

const MARKER_PREFIX: &str = "__GRAFT_M";
const MARKER_SUFFIX: &str = "__";
const WRAPPER_NAME: &str = "__graft_fragment__";

/// Returns the reserved identifier standing in for placeholder `ordinal`.
pub(crate) fn marker_token(ordinal: usize) -> String {
    format!("{MARKER_PREFIX}{ordinal}{MARKER_SUFFIX}")
}

/// Parses a marker token back to its ordinal, if `text` is one.
pub(crate) fn marker_ordinal(text: &str) -> Option<usize> {
    let digits = text
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Substitutes marker tokens for placeholders, yielding parseable text.
///
/// The result is canonical for the fragment list: two fragment lists with
/// the same code and the same placeholder positions produce identical text,
/// which is what the compile cache keys on.
pub(crate) fn marker_source(fragments: &[Fragment]) -> String {
    let mut text = String::new();
    let mut ordinal = 0usize;
    for fragment in fragments {
        match fragment {
            Fragment::Code(code) => text.push_str(code),
            Fragment::Placeholder(_) | Fragment::Reference(_) => {
                text.push_str(&marker_token(ordinal));
                ordinal += 1;
            }
        }
    }
    text
}

/// A marker node annotation produced by compilation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    /// Placeholder ordinal this node stands for.
    pub ordinal: usize,
    /// True when the node's text is exactly the marker token; false for
    /// enclosing statement nodes whose only content is the token.
    pub exact: bool,
}

/// A fragment compiled to a parsed tree with marker annotations.
///
/// Node annotations are keyed by [`tree_sitter::Node::id`], which is stable
/// for the lifetime of the owning tree.
#[derive(Debug)]
pub(crate) struct Compiled {
    tree: SourceTree,
    markers: HashMap<usize, Marker>,
    wrapped: bool,
    added_semicolon: bool,
    returned_expression: bool,
    prelude_statements: usize,
}

impl Compiled {
    /// Returns the parsed marker source.
    pub(crate) fn source(&self) -> &str {
        self.tree.source()
    }

    /// Returns whether a synthetic function wrapper was added.
    pub(crate) const fn wrapped(&self) -> bool {
        self.wrapped
    }

    /// Returns the marker annotation for `node`, if it has one.
    pub(crate) fn marker_for(&self, node: &tree_sitter::Node<'_>) -> Option<Marker> {
        self.markers.get(&node.id()).copied()
    }

    /// Returns the node standing for the whole fragment.
    ///
    /// For wrapped fragments this descends through the synthetic function
    /// into its body; prelude statements from the match configuration are
    /// skipped.
    pub(crate) fn content_root(&self) -> Result<tree_sitter::Node<'_>, GraftError> {
        let mut node = self.tree.root_node();
        if self.wrapped {
            node = self.descend_into_wrapper(node)?;
        }

        let children: Vec<_> = named_children(&node)
            .into_iter()
            .skip(self.prelude_statements)
            .collect();
        let root = match (children.len(), self.prelude_statements) {
            (0, _) => return Err(GraftError::EmptyPattern),
            (1, _) => children.into_iter().next().unwrap_or(node),
            (_, 0) => node,
            _ => {
                return Err(GraftError::pattern_compile(
                    self.tree.language(),
                    "context declarations require a single-rooted fragment",
                ));
            }
        };

        Ok(self.unwrap_statement(root))
    }

    fn descend_into_wrapper<'t>(
        &self,
        root: tree_sitter::Node<'t>,
    ) -> Result<tree_sitter::Node<'t>, GraftError> {
        let function = named_children(&root)
            .into_iter()
            .next()
            .ok_or(GraftError::EmptyPattern)?;
        function
            .child_by_field_name("body")
            .ok_or_else(|| GraftError::internal("synthetic wrapper has no body"))
    }

    /// Strips incidental statement wrappers the grammar forced on us.
    fn unwrap_statement<'t>(&self, node: tree_sitter::Node<'t>) -> tree_sitter::Node<'t> {
        if self.returned_expression {
            return innermost_returned_expression(node);
        }

        if node.kind() == "expression_statement" && node.named_child_count() == 1 {
            let text = self
                .tree
                .source()
                .get(node.byte_range())
                .unwrap_or_default();
            if self.added_semicolon || !text.trim_end().ends_with(';') {
                if let Some(inner) = node.named_child(0) {
                    return inner;
                }
            }
        }

        node
    }

    /// Collects exact marker nodes inside `root`, in source order.
    pub(crate) fn exact_markers_in<'t>(
        &self,
        root: tree_sitter::Node<'t>,
    ) -> Vec<(tree_sitter::Node<'t>, usize)> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(marker) = self.marker_for(&node) {
                if marker.exact {
                    found.push((node, marker.ordinal));
                    continue;
                }
            }
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
        found.sort_by_key(|(node, _)| node.start_byte());
        found
    }
}

fn named_children<'t>(node: &tree_sitter::Node<'t>) -> Vec<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Descends `return (expr);` to the parenthesised expression's content.
fn innermost_returned_expression(node: tree_sitter::Node<'_>) -> tree_sitter::Node<'_> {
    let mut current = node;
    loop {
        let descend = matches!(
            current.kind(),
            "return_statement" | "parenthesized_expression"
        ) && current.named_child_count() == 1;
        if !descend {
            return current;
        }
        let Some(inner) = current.named_child(0) else {
            return current;
        };
        current = inner;
    }
}

/// One way of arranging fragment text so it parses at file scope.
struct Candidate {
    source: String,
    wrapped: bool,
    added_semicolon: bool,
    returned_expression: bool,
}

/// Compiles fragments to a marker-annotated tree.
///
/// # Errors
///
/// Returns [`GraftError::PatternCompile`] when no arrangement of the text
/// parses cleanly or a placeholder lands somewhere the grammar cannot treat
/// as a distinct node (e.g. inside a string literal), and
/// [`GraftError::EmptyPattern`] for contentless input.
pub(crate) fn compile(
    fragments: &[Fragment],
    language: Language,
    config: &MatchConfig,
) -> Result<Compiled, GraftError> {
    let content = marker_source(fragments);
    if content.trim().is_empty() {
        return Err(GraftError::EmptyPattern);
    }

    let mut prelude = String::new();
    for line in config.prelude_lines() {
        prelude.push_str(line);
        prelude.push('\n');
    }
    let body = format!("{prelude}{content}");

    let slots = fragments
        .iter()
        .filter(|f| !matches!(f, Fragment::Code(_)))
        .count();

    let mut parser = Parser::new(language)?;
    let mut last_issue = None;
    for candidate in candidates(language, &body, &content) {
        let parsed = parser.parse(&candidate.source)?;
        if parsed.has_errors() {
            if let Some(issue) = parsed.errors().into_iter().next() {
                last_issue = Some(issue);
            }
            continue;
        }

        let markers = annotate_markers(&parsed);
        let compiled = Compiled {
            tree: parsed,
            markers,
            wrapped: candidate.wrapped,
            added_semicolon: candidate.added_semicolon,
            returned_expression: candidate.returned_expression,
            prelude_statements: config.prelude_len(),
        };
        verify_slots(&compiled, slots, language)?;
        compiled.content_root()?;
        return Ok(compiled);
    }

    let detail = last_issue.map_or_else(
        || "does not parse".to_owned(),
        |issue| format!("{} at line {}", issue.message, issue.line),
    );
    Err(GraftError::pattern_compile(language, detail))
}

/// Produces parse attempts in preference order for the language.
fn candidates(language: Language, body: &str, content: &str) -> Vec<Candidate> {
    let bare = Candidate {
        source: body.to_owned(),
        wrapped: false,
        added_semicolon: false,
        returned_expression: false,
    };

    match language {
        Language::Rust => {
            let tail = Candidate {
                source: format!("fn {WRAPPER_NAME}() {{\n{body}\n}}"),
                wrapped: true,
                added_semicolon: false,
                returned_expression: false,
            };
            let stmt = Candidate {
                source: format!("fn {WRAPPER_NAME}() {{\n{body};\n}}"),
                wrapped: true,
                added_semicolon: true,
                returned_expression: false,
            };
            if content.trim_start().starts_with('{') {
                vec![tail, stmt, bare]
            } else {
                vec![bare, tail, stmt]
            }
        }
        Language::Python => {
            let indented: String = body
                .lines()
                .map(|line| format!("    {line}\n"))
                .collect();
            let wrapped = Candidate {
                source: format!("def {WRAPPER_NAME}():\n{indented}"),
                wrapped: true,
                added_semicolon: false,
                returned_expression: false,
            };
            vec![bare, wrapped]
        }
        Language::TypeScript => {
            let object = Candidate {
                source: format!("function {WRAPPER_NAME}() {{ return ({body}); }}"),
                wrapped: true,
                added_semicolon: false,
                returned_expression: true,
            };
            let block = Candidate {
                source: format!("function {WRAPPER_NAME}() {{\n{body}\n}}"),
                wrapped: true,
                added_semicolon: false,
                returned_expression: false,
            };
            if content.trim_start().starts_with('{') && !looks_like_statement_block(content) {
                vec![object, bare, block]
            } else {
                vec![bare, block]
            }
        }
    }
}

/// Heuristic for whether a braced TypeScript fragment is a statement block
/// rather than an object literal.
fn looks_like_statement_block(content: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "let ", "const ", "var ", "return", "if ", "if(", "for ", "for(", "while ", "while(",
        "switch ", "switch(", "throw ", "function ",
    ];
    let inner = content
        .trim_start()
        .strip_prefix('{')
        .unwrap_or(content)
        .trim_start();
    KEYWORDS.iter().any(|kw| inner.starts_with(kw))
}

/// Walks the tree recording marker nodes.
///
/// A node whose text is exactly a marker token is an exact marker; a node
/// whose trimmed text (with at most one trailing statement terminator
/// stripped) is a token is recorded as an enclosing marker, so statement
/// wrappers around a placeholder are recognised during matching.
fn annotate_markers(parsed: &SourceTree) -> HashMap<usize, Marker> {
    let mut markers = HashMap::new();
    let mut stack = vec![parsed.root_node()];
    while let Some(node) = stack.pop() {
        let text = parsed.source().get(node.byte_range()).unwrap_or_default();
        let marker = marker_ordinal(text)
            .map(|ordinal| Marker {
                ordinal,
                exact: true,
            })
            .or_else(|| {
                let trimmed = text.trim();
                let stripped = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
                marker_ordinal(stripped).map(|ordinal| Marker {
                    ordinal,
                    exact: false,
                })
            });
        if let Some(found) = marker {
            markers.insert(node.id(), found);
        }

        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    markers
}

/// Checks that every placeholder ordinal surfaced as a distinct node.
fn verify_slots(compiled: &Compiled, slots: usize, language: Language) -> Result<(), GraftError> {
    let mut seen = vec![false; slots];
    for marker in compiled.markers.values() {
        if marker.exact {
            if let Some(flag) = seen.get_mut(marker.ordinal) {
                *flag = true;
            }
        }
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(GraftError::pattern_compile(
            language,
            format!("placeholder {missing} does not align with a syntax node"),
        ));
    }
    Ok(())
}
