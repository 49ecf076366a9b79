//! Per-pattern match configuration.

/// Options that shape how a compiled pattern parses and matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchConfig {
    /// Declarations prepended to the pattern before parsing so that free
    /// names resolve, e.g. `let config = ();` for a Rust fragment that uses
    /// `config`. The declarations are not part of the pattern shape.
    pub context: Vec<String>,
    /// Import lines required for the pattern to parse, treated like
    /// [`MatchConfig::context`].
    pub dependencies: Vec<String>,
    /// When set, optional type annotations in the target are ignored if the
    /// pattern omits them: `let x = 1` then matches `let x: i32 = 1`.
    pub lenient_types: bool,
}

impl MatchConfig {
    /// Creates a configuration with defaults: no context and strict types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a context declaration.
    #[must_use]
    pub fn with_context(mut self, declaration: impl Into<String>) -> Self {
        self.context.push(declaration.into());
        self
    }

    /// Adds a dependency import line.
    #[must_use]
    pub fn with_dependency(mut self, import: impl Into<String>) -> Self {
        self.dependencies.push(import.into());
        self
    }

    /// Enables lenient matching of optional type annotations.
    #[must_use]
    pub const fn lenient_types(mut self) -> Self {
        self.lenient_types = true;
        self
    }

    /// Returns every prelude line (dependencies first, then context) to
    /// prepend before parsing.
    pub(crate) fn prelude_lines(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .chain(self.context.iter())
            .map(String::as_str)
    }

    /// Returns the number of prelude statements prepended to the pattern.
    pub(crate) fn prelude_len(&self) -> usize {
        self.dependencies.len() + self.context.len()
    }
}
