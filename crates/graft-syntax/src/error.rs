//! Error types for pattern compilation, matching, and template expansion.
//!
//! Match *failures* are never errors: matching reports `None` or an empty
//! result set. Errors cover malformed patterns and templates (fatal at first
//! compile) and substitution problems surfaced at expansion time.

use thiserror::Error;

use crate::language::Language;

/// Errors from the structural match and template engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraftError {
    /// Failed to initialise the Tree-sitter parser for a language.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInit {
        /// The language that failed to initialise.
        language: Language,
        /// Description of the failure.
        message: String,
    },

    /// The parser failed to produce a syntax tree.
    #[error("failed to parse {language}: {message}")]
    Parse {
        /// The language that failed to parse.
        language: Language,
        /// Description of the failure.
        message: String,
    },

    /// Pattern or template text could not be compiled.
    #[error("invalid pattern for {language}: {message}")]
    PatternCompile {
        /// The language the text was compiled for.
        language: Language,
        /// Description of the compilation failure.
        message: String,
    },

    /// A placeholder is syntactically malformed.
    #[error("invalid placeholder syntax: {message}")]
    InvalidPlaceholder {
        /// Description of the placeholder error.
        message: String,
    },

    /// The compiled pattern or template contains no statements.
    #[error("pattern or template has no content")]
    EmptyPattern,

    /// A template is structurally unusable.
    #[error("invalid template: {message}")]
    InvalidTemplate {
        /// Description of the template error.
        message: String,
    },

    /// A template slot names a capture that is not bound.
    #[error("no binding for template slot '{name}'")]
    UnresolvedBinding {
        /// The capture name the slot refers to.
        name: String,
    },

    /// A property path on a binding did not resolve.
    #[error("binding reference '{reference}' did not resolve")]
    UnresolvedPath {
        /// Display form of the failing reference.
        reference: String,
    },

    /// Two artefacts that must share a language do not.
    #[error("language mismatch: expected {expected}, found {found}")]
    LanguageMismatch {
        /// The language required by the pattern or template.
        expected: Language,
        /// The language actually supplied.
        found: Language,
    },

    /// A splice coordinate is outside the target source or off a UTF-8
    /// boundary.
    #[error("invalid splice range: {message}")]
    SpliceRange {
        /// Description of the range problem.
        message: String,
    },

    /// Internal error indicating a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl GraftError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: Language, message: impl Into<String>) -> Self {
        Self::ParserInit {
            language,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(language: Language, message: impl Into<String>) -> Self {
        Self::Parse {
            language,
            message: message.into(),
        }
    }

    /// Creates a pattern compilation error.
    #[must_use]
    pub fn pattern_compile(language: Language, message: impl Into<String>) -> Self {
        Self::PatternCompile {
            language,
            message: message.into(),
        }
    }

    /// Creates an invalid placeholder error.
    #[must_use]
    pub fn invalid_placeholder(message: impl Into<String>) -> Self {
        Self::InvalidPlaceholder {
            message: message.into(),
        }
    }

    /// Creates an invalid template error.
    #[must_use]
    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            message: message.into(),
        }
    }

    /// Creates an unresolved binding error.
    #[must_use]
    pub fn unresolved_binding(name: impl Into<String>) -> Self {
        Self::UnresolvedBinding { name: name.into() }
    }

    /// Creates an unresolved path error.
    #[must_use]
    pub fn unresolved_path(reference: impl Into<String>) -> Self {
        Self::UnresolvedPath {
            reference: reference.into(),
        }
    }

    /// Creates a language mismatch error.
    #[must_use]
    pub const fn language_mismatch(expected: Language, found: Language) -> Self {
        Self::LanguageMismatch { expected, found }
    }

    /// Creates a splice range error.
    #[must_use]
    pub fn splice_range(message: impl Into<String>) -> Self {
        Self::SpliceRange {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
