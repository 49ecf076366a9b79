//! Tree-sitter powered structural search and replace.
//!
//! This crate matches code by shape rather than by text: a pattern is real
//! source code with capture slots in it, compiled against a language
//! grammar, and a template is source code with references back into the
//! captured bindings. Together they express refactorings that survive
//! formatting differences, preserve comments, and never tear expressions
//! apart mid-token.
//!
//! # Supported Languages
//!
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! # Pattern Shorthand
//!
//! - `$VAR` matches any single node and captures it
//! - `$_` matches any single node without capturing
//! - `$$VAR` matches zero or more sibling nodes
//!
//! The builder APIs on [`Pattern`] and [`Template`] go further: arity
//! bounds on variadic slots, node-kind requirements, constraint
//! predicates, and property paths into bound values.
//!
//! # Example: Pattern Matching
//!
//! ```
//! use graft_syntax::{Language, Parser, Pattern};
//!
//! let mut parser = Parser::new(Language::Rust)?;
//! let source = parser.parse("fn main() { foo(1); foo(2); }")?;
//!
//! let pattern = Pattern::compile("foo($X)", Language::Rust)?;
//! for found in pattern.find_all(&source)? {
//!     if let Some(x) = found.get("X") {
//!         let _ = x.text();
//!     }
//! }
//! # Ok::<(), graft_syntax::GraftError>(())
//! ```
//!
//! # Example: Rewriting
//!
//! ```
//! use graft_syntax::{Language, Pattern, Template, rewrite};
//!
//! let pattern = Pattern::compile("dbg!($EXPR)", Language::Rust)?;
//! let template = Template::compile("println!(\"{:?}\", $EXPR)", Language::Rust)?;
//!
//! let rule = rewrite(pattern, template)?;
//! let outcome = rule.apply("fn main() { dbg!(x); }")?;
//! assert_eq!(outcome.replacements, 1);
//! # Ok::<(), graft_syntax::GraftError>(())
//! ```

mod cache;
mod capture;
mod compile;
mod config;
mod error;
mod fragment;
mod language;
mod matcher;
mod parser;
mod pattern;
mod rewrite;
mod template;
mod trivia;

pub use cache::CompileCache;
pub use capture::{Arity, BindingRef, Capture, ConstraintContext, ConstraintFn, any, capture};
pub use config::MatchConfig;
pub use error::GraftError;
pub use fragment::Fragment;
pub use language::{Language, LanguageParseError};
pub use matcher::{Bindings, BoundNode, BoundNodes, BoundValue, MatchResult};
pub use parser::{ParseIssue, Parser, SourceTree};
pub use pattern::{Pattern, PatternBuilder};
pub use rewrite::{Rewrite, RewriteOutcome, rewrite};
pub use template::{Template, TemplateBuilder};

#[cfg(test)]
mod tests;
