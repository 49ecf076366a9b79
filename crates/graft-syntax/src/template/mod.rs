//! Rewrite templates: what to produce.
//!
//! A [`Template`] is source text with reference slots that resolve against
//! the bindings of a match. The shorthand form reuses the `$NAME` spelling:
//!
//! ```text
//! Template::compile("bar($X, $$REST)", Language::Rust)
//! ```
//!
//! The builder form takes [`BindingRef`] values, which is the only way to
//! address parts of a binding through a property path.

mod expand;

use std::ops::Range;
use std::sync::Arc;

use crate::cache::{CompileCache, CompileKey};
use crate::capture::BindingRef;
use crate::compile::{self, Compiled, marker_source};
use crate::config::MatchConfig;
use crate::error::GraftError;
use crate::fragment::{Fragment, fragments_from_template_text};
use crate::language::Language;
use crate::matcher::Bindings;

/// A compiled rewrite template.
#[derive(Debug)]
pub struct Template {
    refs: Vec<BindingRef>,
    language: Language,
    compiled: Arc<Compiled>,
}

impl Template {
    /// Compiles shorthand template text.
    ///
    /// # Errors
    ///
    /// Returns an error when a reference is malformed or the text does not
    /// parse in the given language.
    pub fn compile(text: &str, language: Language) -> Result<Self, GraftError> {
        Self::builder(language).text(text)?.build()
    }

    /// Compiles shorthand template text, reusing `cache` for the parse.
    ///
    /// # Errors
    ///
    /// As for [`Template::compile`].
    pub fn compile_cached(
        text: &str,
        language: Language,
        cache: &CompileCache,
    ) -> Result<Self, GraftError> {
        Self::builder(language).text(text)?.build_cached(cache)
    }

    /// Starts building a template from typed fragments.
    #[must_use]
    pub fn builder(language: Language) -> TemplateBuilder {
        TemplateBuilder {
            language,
            fragments: Vec::new(),
            config: MatchConfig::default(),
        }
    }

    /// Returns the language this template produces.
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Returns the capture names this template refers to, without
    /// duplicates.
    #[must_use]
    pub fn reference_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for reference in &self.refs {
            if !names.contains(&reference.name()) {
                names.push(reference.name());
            }
        }
        names
    }

    /// Renders the template with every slot substituted from `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::UnresolvedBinding`] when a slot names a
    /// capture that is not bound, and [`GraftError::UnresolvedPath`] when
    /// a property path does not apply to the bound value.
    pub fn expand(&self, bindings: &Bindings<'_>) -> Result<String, GraftError> {
        expand::expand(&self.compiled, &self.refs, bindings)
    }

    /// Renders the template and splices it into `target` over `at`.
    ///
    /// # Errors
    ///
    /// As for [`Template::expand`], plus [`GraftError::SpliceRange`] when
    /// `at` is out of bounds or not on UTF-8 character boundaries.
    pub fn apply(
        &self,
        target: &str,
        at: Range<usize>,
        bindings: &Bindings<'_>,
    ) -> Result<String, GraftError> {
        if at.start > at.end || at.end > target.len() {
            return Err(GraftError::splice_range(format!(
                "{}..{} outside target of {} bytes",
                at.start,
                at.end,
                target.len()
            )));
        }
        if !target.is_char_boundary(at.start) || !target.is_char_boundary(at.end) {
            return Err(GraftError::splice_range(format!(
                "{}..{} is not on character boundaries",
                at.start, at.end
            )));
        }

        let expanded = self.expand(bindings)?;
        let mut output =
            String::with_capacity(target.len() - at.len() + expanded.len());
        output.push_str(target.get(..at.start).unwrap_or_default());
        output.push_str(&expanded);
        output.push_str(target.get(at.end..).unwrap_or_default());
        Ok(output)
    }
}

/// Fluent construction of a [`Template`] from typed fragments.
#[derive(Debug)]
pub struct TemplateBuilder {
    language: Language,
    fragments: Vec<Fragment>,
    config: MatchConfig,
}

impl TemplateBuilder {
    /// Appends literal source text.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Code(code.into()));
        self
    }

    /// Appends a slot referring to the whole value bound under `name`.
    #[must_use]
    pub fn slot(self, name: impl Into<String>) -> Self {
        self.reference(BindingRef::new(name))
    }

    /// Appends a slot with a full binding reference.
    #[must_use]
    pub fn reference(mut self, reference: BindingRef) -> Self {
        self.fragments.push(Fragment::Reference(reference));
        self
    }

    /// Appends shorthand text, expanding `$NAME` spellings into slots.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::InvalidPlaceholder`] for malformed spellings.
    pub fn text(mut self, text: &str) -> Result<Self, GraftError> {
        self.fragments.extend(fragments_from_template_text(text)?);
        Ok(self)
    }

    /// Sets the configuration used when parsing the template.
    #[must_use]
    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Compiles the template.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragments are empty, contain pattern
    /// placeholders, or do not parse in the template's language.
    pub fn build(self) -> Result<Template, GraftError> {
        let prepared = self.prepare()?;
        let compiled = Arc::new(compile::compile(
            &prepared.fragments,
            prepared.language,
            &prepared.config,
        )?);
        Ok(prepared.into_template(compiled))
    }

    /// Compiles the template, reusing `cache` for the parse.
    ///
    /// # Errors
    ///
    /// As for [`TemplateBuilder::build`].
    pub fn build_cached(self, cache: &CompileCache) -> Result<Template, GraftError> {
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
        Ok(prepared.into_template(compiled))
    }

    fn prepare(self) -> Result<PreparedTemplate, GraftError> {
        if self.fragments.is_empty() {
            return Err(GraftError::EmptyPattern);
        }

        let mut refs = Vec::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Code(_) => {}
                Fragment::Reference(reference) => refs.push(reference.clone()),
                Fragment::Placeholder(capture) => {
                    return Err(GraftError::invalid_template(format!(
                        "'{}' is a pattern slot, not a template reference",
                        capture.name()
                    )));
                }
            }
        }

        Ok(PreparedTemplate {
            refs,
            language: self.language,
            config: self.config,
            fragments: self.fragments,
        })
    }
}

/// Validated builder state, ready to compile.
struct PreparedTemplate {
    refs: Vec<BindingRef>,
    language: Language,
    config: MatchConfig,
    fragments: Vec<Fragment>,
}

impl PreparedTemplate {
    fn into_template(self, compiled: Arc<Compiled>) -> Template {
        Template {
            refs: self.refs,
            language: self.language,
            compiled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::capture;
    use crate::parser::{Parser, SourceTree};
    use crate::pattern::Pattern;
    use rstest::rstest;

    fn parse(source: &str) -> SourceTree {
        let mut parser = Parser::new(Language::Rust).expect("parser init");
        parser.parse(source).expect("parse")
    }

    fn bindings_for<'t>(pattern: &Pattern, tree: &'t SourceTree) -> Bindings<'t> {
        pattern
            .find_first(tree)
            .expect("find")
            .expect("match")
            .into_bindings()
    }

    #[test]
    fn expands_scalar_binding() {
        let tree = parse("fn main() { foo(42); }");
        let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");
        let template = Template::compile("bar($X)", Language::Rust).expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "bar(42)");
    }

    #[test]
    fn expands_variadic_binding_with_original_layout() {
        let tree = parse("fn main() { foo(1, 2, 3); }");
        let pattern = Pattern::compile("foo($$ARGS)", Language::Rust).expect("pattern");
        let template = Template::compile("bar($$ARGS)", Language::Rust).expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "bar(1, 2, 3)");
    }

    #[test]
    fn empty_variadic_removes_adjacent_separator() {
        let tree = parse("fn main() { foo(1); }");
        let pattern = Pattern::compile("foo($X, $$REST)", Language::Rust).expect("pattern");
        let template = Template::compile("bar($X, $$REST)", Language::Rust).expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "bar(1)");
    }

    #[test]
    fn preserves_comments_and_reindents_them() {
        let tree = parse("fn main() {\n    // keep me\n    foo(42);\n}");
        let pattern = Pattern::builder(Language::Rust)
            .placeholder(capture("S").of_kind("expression_statement"))
            .code(";")
            .build()
            .expect("pattern");
        let template =
            Template::compile("if ok {\n    $S\n}", Language::Rust).expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(
            template.expand(&bindings).expect("expand"),
            "if ok {\n    // keep me\n    foo(42);\n}"
        );
    }

    #[test]
    fn property_path_narrows_to_a_field() {
        let tree = parse("fn main() { let r = compute(items); }");
        let pattern = Pattern::compile("let $NAME = $VALUE;", Language::Rust).expect("pattern");
        let template = Template::builder(Language::Rust)
            .code("wrap(")
            .reference(BindingRef::new("VALUE").field("function"))
            .code(")")
            .build()
            .expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "wrap(compute)");
    }

    #[test]
    fn len_path_yields_element_count() {
        let tree = parse("fn main() { foo(1, 2, 3); }");
        let pattern = Pattern::compile("foo($$ARGS)", Language::Rust).expect("pattern");
        let template = Template::builder(Language::Rust)
            .code("count(")
            .reference(BindingRef::new("ARGS").len())
            .code(")")
            .build()
            .expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "count(3)");
    }

    #[test]
    fn slice_path_takes_a_sub_run() {
        let tree = parse("fn main() { foo(1, 2, 3); }");
        let pattern = Pattern::compile("foo($$ARGS)", Language::Rust).expect("pattern");
        let template = Template::builder(Language::Rust)
            .code("rest(")
            .reference(BindingRef::new("ARGS").slice(1, None))
            .code(")")
            .build()
            .expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert_eq!(template.expand(&bindings).expect("expand"), "rest(2, 3)");
    }

    #[test]
    fn missing_binding_is_an_error() {
        let tree = parse("fn main() { foo(1); }");
        let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");
        let template = Template::compile("bar($Y)", Language::Rust).expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert!(matches!(
            template.expand(&bindings),
            Err(GraftError::UnresolvedBinding { .. })
        ));
    }

    #[test]
    fn inapplicable_path_is_an_error() {
        let tree = parse("fn main() { foo(1); }");
        let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");
        let template = Template::builder(Language::Rust)
            .code("bar(")
            .reference(BindingRef::new("X").field("function"))
            .code(")")
            .build()
            .expect("template");

        let bindings = bindings_for(&pattern, &tree);
        assert!(matches!(
            template.expand(&bindings),
            Err(GraftError::UnresolvedPath { .. })
        ));
    }

    #[test]
    fn synthetic_text_bindings_expand() {
        let mut bindings = Bindings::new("");
        bindings.insert_text("X", "99");
        let template = Template::compile("bar($X)", Language::Rust).expect("template");

        assert_eq!(template.expand(&bindings).expect("expand"), "bar(99)");
    }

    #[test]
    fn apply_splices_at_byte_range() {
        let mut bindings = Bindings::new("");
        bindings.insert_text("X", "2");
        let template = Template::compile("bar($X)", Language::Rust).expect("template");

        let output = template
            .apply("let a = foo(1);", 8..14, &bindings)
            .expect("apply");
        assert_eq!(output, "let a = bar(2);");
    }

    #[rstest]
    #[case(8..99)]
    #[case(9..8)]
    fn apply_rejects_bad_ranges(#[case] at: Range<usize>) {
        let mut bindings = Bindings::new("");
        bindings.insert_text("X", "2");
        let template = Template::compile("bar($X)", Language::Rust).expect("template");

        assert!(matches!(
            template.apply("let a = foo(1);", at, &bindings),
            Err(GraftError::SpliceRange { .. })
        ));
    }

    #[test]
    fn empty_builder_is_rejected() {
        assert!(matches!(
            Template::builder(Language::Rust).build(),
            Err(GraftError::EmptyPattern)
        ));
    }
}
