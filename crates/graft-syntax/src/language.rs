//! Language identification and Tree-sitter grammar selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use thiserror::Error;

static RUST_GRAMMAR: Lazy<tree_sitter::Language> =
    Lazy::new(|| tree_sitter_rust::LANGUAGE.into());
static PYTHON_GRAMMAR: Lazy<tree_sitter::Language> =
    Lazy::new(|| tree_sitter_python::LANGUAGE.into());
static TYPESCRIPT_GRAMMAR: Lazy<tree_sitter::Language> =
    Lazy::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

/// Languages the engine can match and rewrite.
///
/// Each variant maps to the Tree-sitter grammar used to parse patterns,
/// templates, and target sources for that language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Rust source files (`.rs`).
    #[default]
    Rust,
    /// Python source files (`.py`, `.pyi`).
    Python,
    /// TypeScript source files (`.ts`, `.tsx`).
    TypeScript,
}

impl Language {
    /// Detects the language from a file extension.
    ///
    /// Returns `None` if the extension is not recognised.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let normalised = ext.to_ascii_lowercase();
        match normalised.as_str() {
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Detects the language from a file path by examining its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the Tree-sitter grammar for this language.
    #[must_use]
    pub fn grammar(self) -> &'static tree_sitter::Language {
        match self {
            Self::Rust => &RUST_GRAMMAR,
            Self::Python => &PYTHON_GRAMMAR,
            // The TSX grammar is a superset, so plain `.ts` parses too.
            Self::TypeScript => &TYPESCRIPT_GRAMMAR,
        }
    }

    /// Returns the lower-case identifier for this language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a language identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(LanguageParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("rs", Language::Rust)]
    #[case("py", Language::Python)]
    #[case("pyi", Language::Python)]
    #[case("ts", Language::TypeScript)]
    #[case("tsx", Language::TypeScript)]
    fn from_extension_recognises_supported_languages(
        #[case] ext: &str,
        #[case] expected: Language,
    ) {
        assert_eq!(Language::from_extension(ext), Some(expected));
    }

    #[rstest]
    #[case("json")]
    #[case("md")]
    fn from_extension_returns_none_for_unknown(#[case] ext: &str) {
        assert_eq!(Language::from_extension(ext), None);
    }

    #[rstest]
    #[case("src/main.rs", Language::Rust)]
    #[case("script.py", Language::Python)]
    fn from_path_extracts_extension(#[case] path_str: &str, #[case] expected: Language) {
        assert_eq!(Language::from_path(Path::new(path_str)), Some(expected));
    }

    #[rstest]
    #[case("rust", Language::Rust)]
    #[case("Python", Language::Python)]
    #[case("TYPESCRIPT", Language::TypeScript)]
    fn from_str_parses_language_names(#[case] input: &str, #[case] expected: Language) {
        assert_eq!(Language::from_str(input), Ok(expected));
    }

    #[test]
    fn from_str_returns_error_for_unknown() {
        let result: Result<Language, _> = "go".parse();
        assert!(result.is_err());
    }
}
