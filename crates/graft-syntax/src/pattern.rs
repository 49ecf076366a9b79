//! Structural patterns: what to find.
//!
//! A [`Pattern`] is source text with capture slots, compiled against one
//! language's grammar. The shorthand form spells slots inline:
//!
//! ```text
//! Pattern::compile("foo($X, $$REST)", Language::Rust)
//! ```
//!
//! The builder form takes full [`Capture`] descriptors instead, which is
//! the only way to attach arity bounds, kind requirements, or constraint
//! predicates.

use std::sync::Arc;

use crate::cache::{CompileCache, CompileKey};
use crate::capture::Capture;
use crate::compile::{self, Compiled, marker_source};
use crate::config::MatchConfig;
use crate::error::GraftError;
use crate::fragment::{Fragment, fragments_from_pattern_text};
use crate::language::Language;
use crate::matcher::{self, MatchResult};
use crate::parser::SourceTree;

/// A compiled structural pattern.
#[derive(Debug)]
pub struct Pattern {
    placeholders: Vec<Capture>,
    language: Language,
    config: MatchConfig,
    compiled: Arc<Compiled>,
}

impl Pattern {
    /// Compiles shorthand pattern text.
    ///
    /// # Errors
    ///
    /// Returns an error when a placeholder is malformed or the text does
    /// not parse in the given language.
    pub fn compile(text: &str, language: Language) -> Result<Self, GraftError> {
        Self::builder(language).text(text)?.build()
    }

    /// Compiles shorthand pattern text, reusing `cache` for the parse.
    ///
    /// # Errors
    ///
    /// As for [`Pattern::compile`].
    pub fn compile_cached(
        text: &str,
        language: Language,
        cache: &CompileCache,
    ) -> Result<Self, GraftError> {
        Self::builder(language).text(text)?.build_cached(cache)
    }

    /// Starts building a pattern from typed fragments.
    #[must_use]
    pub fn builder(language: Language) -> PatternBuilder {
        PatternBuilder {
            language,
            fragments: Vec::new(),
            config: MatchConfig::default(),
        }
    }

    /// Returns the language this pattern targets.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Returns the names of the pattern's capturing slots, in slot order,
    /// without duplicates.
    #[must_use]
    pub fn capture_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for capture in &self.placeholders {
            if capture.is_capturing() && !names.contains(&capture.name()) {
                names.push(capture.name());
            }
        }
        names
    }

    /// Finds every match in `tree`, in source order.
    ///
    /// Matched subtrees are not searched again, so results never overlap.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::LanguageMismatch`] when `tree` was parsed for
    /// a different language.
    pub fn find_all<'t>(&self, tree: &'t SourceTree) -> Result<Vec<MatchResult<'t>>, GraftError> {
        self.check_language(tree)?;
        matcher::find_matches(
            &self.compiled,
            &self.placeholders,
            self.config.lenient_types,
            tree,
            false,
        )
    }

    /// Finds the first match in `tree`, if any.
    ///
    /// # Errors
    ///
    /// As for [`Pattern::find_all`].
    pub fn find_first<'t>(
        &self,
        tree: &'t SourceTree,
    ) -> Result<Option<MatchResult<'t>>, GraftError> {
        self.check_language(tree)?;
        let mut results = matcher::find_matches(
            &self.compiled,
            &self.placeholders,
            self.config.lenient_types,
            tree,
            true,
        )?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        })
    }

    /// Tries the pattern against one specific node of `tree`.
    ///
    /// # Errors
    ///
    /// As for [`Pattern::find_all`].
    pub fn match_node<'t>(
        &self,
        tree: &'t SourceTree,
        node: tree_sitter::Node<'t>,
    ) -> Result<Option<MatchResult<'t>>, GraftError> {
        self.check_language(tree)?;
        matcher::match_at(
            &self.compiled,
            &self.placeholders,
            self.config.lenient_types,
            tree,
            node,
        )
    }

    fn check_language(&self, tree: &SourceTree) -> Result<(), GraftError> {
        if tree.language() == self.language {
            Ok(())
        } else {
            Err(GraftError::language_mismatch(self.language, tree.language()))
        }
    }
}

/// Fluent construction of a [`Pattern`] from typed fragments.
#[derive(Debug)]
pub struct PatternBuilder {
    language: Language,
    fragments: Vec<Fragment>,
    config: MatchConfig,
}

impl PatternBuilder {
    /// Appends literal source text.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Code(code.into()));
        self
    }

    /// Appends a capture slot.
    #[must_use]
    pub fn placeholder(mut self, capture: Capture) -> Self {
        self.fragments.push(Fragment::Placeholder(capture));
        self
    }

    /// Appends shorthand text, expanding `$NAME` spellings into slots.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::InvalidPlaceholder`] for malformed spellings.
    pub fn text(mut self, text: &str) -> Result<Self, GraftError> {
        self.fragments.extend(fragments_from_pattern_text(text)?);
        Ok(self)
    }

    /// Sets the match configuration.
    #[must_use]
    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragments are empty, contain template
    /// references, reuse a capture name with a different shape, or do not
    /// parse in the pattern's language.
    pub fn build(self) -> Result<Pattern, GraftError> {
        let prepared = self.prepare()?;
        let compiled = Arc::new(compile::compile(
            &prepared.fragments,
            prepared.language,
            &prepared.config,
        )?);
        Ok(prepared.into_pattern(compiled))
    }

    /// Compiles the pattern, reusing `cache` for the parse.
    ///
    /// # Errors
    ///
    /// As for [`PatternBuilder::build`].
    pub fn build_cached(self, cache: &CompileCache) -> Result<Pattern, GraftError> {
        let prepared = self.prepare()?;
        let key = CompileKey {
            text: marker_source(&prepared.fragments),
            language: prepared.language,
            context: prepared.config.context.clone(),
            dependencies: prepared.config.dependencies.clone(),
        };
        let compiled = cache.get_or_compile(key, || {
            compile::compile(&prepared.fragments, prepared.language, &prepared.config)
        })?;
        Ok(prepared.into_pattern(compiled))
    }

    fn prepare(self) -> Result<Prepared, GraftError> {
        if self.fragments.is_empty() {
            return Err(GraftError::EmptyPattern);
        }

        let mut placeholders = Vec::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Code(_) => {}
                Fragment::Placeholder(capture) => placeholders.push(capture.clone()),
                Fragment::Reference(reference) => {
                    return Err(GraftError::invalid_placeholder(format!(
                        "'{reference}' is a template reference, not a pattern slot"
                    )));
                }
            }
        }

        verify_consistent_reuse(&placeholders)?;
        Ok(Prepared {
            placeholders,
            language: self.language,
            config: self.config,
            fragments: self.fragments,
        })
    }
}

/// Validated builder state, ready to compile.
struct Prepared {
    placeholders: Vec<Capture>,
    language: Language,
    config: MatchConfig,
    fragments: Vec<Fragment>,
}

impl Prepared {
    fn into_pattern(self, compiled: Arc<Compiled>) -> Pattern {
        Pattern {
            placeholders: self.placeholders,
            language: self.language,
            config: self.config,
            compiled,
        }
    }
}

/// A capture name may appear in several slots (a repeated capture), but
/// every occurrence must describe the same shape.
fn verify_consistent_reuse(placeholders: &[Capture]) -> Result<(), GraftError> {
    for (i, capture) in placeholders.iter().enumerate() {
        let clash = placeholders
            .get(..i)
            .into_iter()
            .flatten()
            .filter(|earlier| earlier.name() == capture.name())
            .any(|earlier| {
                earlier.is_capturing() != capture.is_capturing()
                    || earlier.arity() != capture.arity()
            });
        if clash {
            return Err(GraftError::invalid_placeholder(format!(
                "capture '{}' is reused with a different shape",
                capture.name()
            )));
        }
    }
    Ok(())
}
