//! End-to-end tests across the match and rewrite pipeline.

use crate::{
    BindingRef, CompileCache, Language, MatchConfig, Parser, Pattern, SourceTree, Template,
    capture, rewrite,
};

fn parse(language: Language, source: &str) -> SourceTree {
    let mut parser = Parser::new(language).expect("parser init");
    parser.parse(source).expect("parse")
}

// =============================================================================
// Rust
// =============================================================================

#[test]
fn strips_debug_macros() {
    let pattern = Pattern::compile("dbg!($E)", Language::Rust).expect("pattern");
    let template = Template::compile("$E", Language::Rust).expect("template");

    let outcome = rewrite(pattern, template)
        .expect("pair")
        .apply("fn main() { let y = dbg!(x + 1); }")
        .expect("apply");

    assert_eq!(outcome.output, "fn main() { let y = x + 1; }");
    assert_eq!(outcome.replacements, 1);
}

#[test]
fn wraps_statements_in_a_guard() {
    let pattern = Pattern::builder(Language::Rust)
        .placeholder(capture("S").of_kind("expression_statement"))
        .code(";")
        .build()
        .expect("pattern");
    let template = Template::compile("if enabled {\n    $S\n}", Language::Rust).expect("template");

    let outcome = rewrite(pattern, template)
        .expect("pair")
        .apply("fn main() {\n    log(event);\n}")
        .expect("apply");

    assert_eq!(
        outcome.output,
        "fn main() {\n    if enabled {\n    log(event);\n}\n}"
    );
    assert_eq!(outcome.replacements, 1);
}

#[test]
fn reorders_arguments_through_property_paths() {
    let source = "fn main() { swap(first, second); }";
    let tree = parse(Language::Rust, source);

    let pattern = Pattern::compile("swap($$ARGS)", Language::Rust).expect("pattern");
    let template = Template::builder(Language::Rust)
        .code("swap(")
        .reference(BindingRef::new("ARGS").index(1))
        .code(", ")
        .reference(BindingRef::new("ARGS").index(0))
        .code(")")
        .build()
        .expect("template");

    let found = pattern.find_first(&tree).expect("find").expect("match");
    let expanded = template.expand(found.bindings()).expect("expand");
    assert_eq!(expanded, "swap(second, first)");
}

#[test]
fn match_positions_are_one_based() {
    let tree = parse(Language::Rust, "fn main() {\n    foo(1);\n}");
    let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");

    let found = pattern.find_first(&tree).expect("find").expect("match");
    assert_eq!(found.start_position(), (2, 5));
}

#[test]
fn multibyte_text_survives_a_rewrite() {
    let pattern = Pattern::compile("foo($X)", Language::Rust).expect("pattern");
    let template = Template::compile("bar($X)", Language::Rust).expect("template");

    let outcome = rewrite(pattern, template)
        .expect("pair")
        .apply("fn main() { foo(\"héllo → wörld\"); }")
        .expect("apply");

    assert_eq!(outcome.output, "fn main() { bar(\"héllo → wörld\"); }");
}

#[test]
fn context_declarations_make_free_names_parse() {
    let tree = parse(
        Language::Rust,
        "fn main() { registry.reload(); registry.clear(); }",
    );
    let pattern = Pattern::builder(Language::Rust)
        .code("registry.")
        .placeholder(capture("METHOD"))
        .code("()")
        .config(MatchConfig::new().with_context("let registry = ();"))
        .build()
        .expect("pattern");

    let matches = pattern.find_all(&tree).expect("find");
    let methods: Vec<_> = matches
        .iter()
        .map(|m| m.get("METHOD").expect("binding").text().to_owned())
        .collect();
    assert_eq!(methods, vec!["reload", "clear"]);
}

// =============================================================================
// Python
// =============================================================================

#[test]
fn matches_python_calls() {
    let tree = parse(Language::Python, "def run():\n    print(1)\n    log(2)\n");
    let pattern = Pattern::compile("$F($A)", Language::Python).expect("pattern");

    let matches = pattern.find_all(&tree).expect("find");
    let callees: Vec<_> = matches
        .iter()
        .map(|m| m.get("F").expect("binding").text().to_owned())
        .collect();
    assert_eq!(callees, vec!["print", "log"]);
}

#[test]
fn rewrites_python_statements() {
    let pattern = Pattern::compile("print($A)", Language::Python).expect("pattern");
    let template =
        Template::compile("logging.info($A)", Language::Python).expect("template");

    let outcome = rewrite(pattern, template)
        .expect("pair")
        .apply("def run():\n    print(status)\n")
        .expect("apply");

    assert_eq!(outcome.output, "def run():\n    logging.info(status)\n");
}

#[test]
fn python_return_fragment_compiles_wrapped_or_bare() {
    let tree = parse(Language::Python, "def f():\n    return 42\n");
    let pattern = Pattern::compile("return $X", Language::Python).expect("pattern");

    let found = pattern.find_first(&tree).expect("find").expect("match");
    assert_eq!(found.get("X").expect("binding").text(), "42");
}

// =============================================================================
// TypeScript
// =============================================================================

#[test]
fn matches_typescript_object_literals() {
    let tree = parse(Language::TypeScript, "const x = { value: 42 };");
    let pattern = Pattern::compile("{ value: $V }", Language::TypeScript).expect("pattern");

    let found = pattern.find_first(&tree).expect("find").expect("match");
    assert_eq!(found.get("V").expect("binding").text(), "42");
}

#[test]
fn lenient_rewrite_ignores_type_annotations() {
    let pattern = Pattern::builder(Language::TypeScript)
        .text("let $N = $V;")
        .expect("text")
        .config(MatchConfig::new().lenient_types())
        .build()
        .expect("pattern");
    let template = Template::compile("const $N = $V;", Language::TypeScript).expect("template");

    let outcome = rewrite(pattern, template)
        .expect("pair")
        .apply("let count: number = 0;")
        .expect("apply");

    assert_eq!(outcome.output, "const count = 0;");
}

// =============================================================================
// Cache interplay
// =============================================================================

#[test]
fn cached_and_uncached_compilation_agree() {
    let cache = CompileCache::with_default_capacity();
    let tree = parse(Language::Rust, "fn main() { foo(1, 2); }");

    let plain = Pattern::compile("foo($A, $B)", Language::Rust).expect("pattern");
    let cached =
        Pattern::compile_cached("foo($A, $B)", Language::Rust, &cache).expect("pattern");

    let from_plain = plain.find_all(&tree).expect("find");
    let from_cached = cached.find_all(&tree).expect("find");
    assert_eq!(from_plain.len(), from_cached.len());

    let a = from_cached
        .first()
        .and_then(|m| m.get("A"))
        .expect("binding");
    assert_eq!(a.text(), "1");
}

#[test]
fn one_cache_serves_many_rules() {
    let cache = CompileCache::with_default_capacity();

    for _ in 0..3 {
        let pattern =
            Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("pattern");
        let template =
            Template::compile_cached("bar($X)", Language::Rust, &cache).expect("template");
        let outcome = rewrite(pattern, template)
            .expect("pair")
            .apply("fn main() { foo(7); }")
            .expect("apply");
        assert_eq!(outcome.output, "fn main() { bar(7); }");
    }

    assert_eq!(cache.len(), 2);
}
