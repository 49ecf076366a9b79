//! Find-and-replace over whole sources.
//!
//! A [`Rewrite`] pairs a pattern with a template and applies every match
//! in one pass, splicing replacements from the end of the source towards
//! the start so earlier byte ranges stay valid.

use tracing::debug;

use crate::error::GraftError;
use crate::matcher::MatchResult;
use crate::parser::Parser;
use crate::pattern::Pattern;
use crate::template::Template;

type MatchFilter = dyn Fn(&MatchResult<'_>) -> bool;
type OutputFilter = dyn Fn(&str) -> bool;

/// A pattern and template pair, ready to apply to sources.
pub struct Rewrite {
    pattern: Pattern,
    template: Template,
    pre: Option<Box<MatchFilter>>,
    post: Option<Box<OutputFilter>>,
}

/// The result of applying a [`Rewrite`] to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten source; identical to the input when nothing matched.
    pub output: String,
    /// How many matches were replaced.
    pub replacements: usize,
}

/// Pairs a pattern with a template.
///
/// # Errors
///
/// Returns [`GraftError::LanguageMismatch`] when the two target different
/// languages, and [`GraftError::UnresolvedBinding`] when the template
/// refers to a capture the pattern never binds. Catching the latter here
/// means a bad pair fails at construction instead of on the first match.
pub fn rewrite(pattern: Pattern, template: Template) -> Result<Rewrite, GraftError> {
    if pattern.language() != template.language() {
        return Err(GraftError::language_mismatch(
            pattern.language(),
            template.language(),
        ));
    }

    let names = pattern.capture_names();
    for name in template.reference_names() {
        if !names.contains(&name) {
            return Err(GraftError::unresolved_binding(name));
        }
    }

    Ok(Rewrite {
        pattern,
        template,
        pre: None,
        post: None,
    })
}

impl Rewrite {
    /// Keeps only matches the predicate accepts.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MatchResult<'_>) -> bool + 'static,
    {
        self.pre = Some(Box::new(predicate));
        self
    }

    /// Keeps only replacements whose expanded text the predicate accepts.
    #[must_use]
    pub fn post_filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.post = Some(Box::new(predicate));
        self
    }

    /// Applies the rewrite to `source`, replacing every accepted match.
    ///
    /// # Errors
    ///
    /// Returns an error when `source` does not parse, or when template
    /// expansion fails for a match.
    pub fn apply(&self, source: &str) -> Result<RewriteOutcome, GraftError> {
        let mut parser = Parser::new(self.pattern.language())?;
        let tree = parser.parse(source)?;
        let matches = self.pattern.find_all(&tree)?;

        let mut output = source.to_owned();
        let mut replacements = 0usize;
        for found in matches.iter().rev() {
            if self.pre.as_ref().is_some_and(|keep| !keep(found)) {
                continue;
            }

            let expanded = self.template.expand(found.bindings())?;
            if self.post.as_ref().is_some_and(|keep| !keep(&expanded)) {
                continue;
            }

            output.replace_range(found.byte_range(), &expanded);
            replacements += 1;
        }

        debug!(
            language = %self.pattern.language(),
            matches = matches.len(),
            replacements,
            "rewrite applied"
        );
        Ok(RewriteOutcome {
            output,
            replacements,
        })
    }
}

impl std::fmt::Debug for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rewrite")
            .field("language", &self.pattern.language())
            .field("filtered", &self.pre.is_some())
            .field("post_filtered", &self.post.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use rstest::rstest;

    fn pair(pattern_text: &str, template_text: &str, language: Language) -> Rewrite {
        let pattern = Pattern::compile(pattern_text, language).expect("pattern");
        let template = Template::compile(template_text, language).expect("template");
        rewrite(pattern, template).expect("pair")
    }

    #[test]
    fn replaces_every_match() {
        let rule = pair("let $N = $V;", "const $N = $V;", Language::TypeScript);

        let outcome = rule.apply("let a = 1;\nlet b = 2;\n").expect("apply");
        assert_eq!(outcome.output, "const a = 1;\nconst b = 2;\n");
        assert_eq!(outcome.replacements, 2);
    }

    #[test]
    fn returns_input_unchanged_without_matches() {
        let rule = pair("foo($X)", "bar($X)", Language::Rust);

        let outcome = rule.apply("fn main() { baz(1); }").expect("apply");
        assert_eq!(outcome.output, "fn main() { baz(1); }");
        assert_eq!(outcome.replacements, 0);
    }

    #[test]
    fn match_filter_skips_rejected_sites() {
        let rule = pair("let $N = $V;", "const $N = $V;", Language::TypeScript).filter(|m| {
            m.get("N").is_some_and(|n| n.text() != "b")
        });

        let outcome = rule.apply("let a = 1;\nlet b = 2;\n").expect("apply");
        assert_eq!(outcome.output, "const a = 1;\nlet b = 2;\n");
        assert_eq!(outcome.replacements, 1);
    }

    #[test]
    fn output_filter_vetoes_expanded_text() {
        let rule = pair("foo($X)", "bar($X)", Language::Rust)
            .post_filter(|text| !text.contains("bar(2)"));

        let outcome = rule.apply("fn main() { foo(1); foo(2); }").expect("apply");
        assert_eq!(outcome.output, "fn main() { bar(1); foo(2); }");
        assert_eq!(outcome.replacements, 1);
    }

    #[rstest]
    #[case("foo($X)", Language::Rust, "bar($Y)", Language::Rust)]
    fn unbound_template_reference_fails_early(
        #[case] pattern_text: &str,
        #[case] pattern_language: Language,
        #[case] template_text: &str,
        #[case] template_language: Language,
    ) {
        let pattern = Pattern::compile(pattern_text, pattern_language).expect("pattern");
        let template = Template::compile(template_text, template_language).expect("template");

        assert!(matches!(
            rewrite(pattern, template),
            Err(GraftError::UnresolvedBinding { .. })
        ));
    }

    #[test]
    fn cross_language_pair_is_rejected() {
        let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");
        let template = Template::compile("bar($X)", Language::Python).expect("template");

        assert!(matches!(
            rewrite(pattern, template),
            Err(GraftError::LanguageMismatch { .. })
        ));
    }
}
