//! Pattern and template fragments, plus the `$NAME` shorthand scanner.
//!
//! Builders assemble patterns and templates from typed fragments; the
//! shorthand scanner offers the compact string form where `$NAME` is a
//! capture, `$_` a wildcard, and `$$NAME` a variadic capture. Templates use
//! the same spellings as references back into the bindings.

use crate::capture::{BindingRef, Capture, any, capture};
use crate::error::GraftError;

/// One piece of a pattern or template under construction.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Literal source text, matched (or emitted) verbatim.
    Code(String),
    /// A capture slot; only meaningful in patterns.
    Placeholder(Capture),
    /// A reference into match bindings; only meaningful in templates.
    Reference(BindingRef),
}

/// Splits shorthand pattern text into fragments.
///
/// `$NAME` becomes a scalar capture, `$_` an anonymous wildcard, and
/// `$$NAME` an unbounded variadic capture.
///
/// # Errors
///
/// Returns [`GraftError::InvalidPlaceholder`] for malformed spellings such
/// as `$$` without a name or three or more consecutive dollar signs.
pub(crate) fn fragments_from_pattern_text(text: &str) -> Result<Vec<Fragment>, GraftError> {
    scan(text, |name, variadic| {
        if name == "_" {
            if variadic {
                return Err(GraftError::invalid_placeholder(
                    "'$$_' is not supported; name the variadic capture",
                ));
            }
            return Ok(Fragment::Placeholder(any()));
        }

        let slot = capture(name);
        Ok(Fragment::Placeholder(if variadic {
            slot.many()
        } else {
            slot
        }))
    })
}

/// Splits shorthand template text into fragments.
///
/// `$NAME` and `$$NAME` both become references to the binding of that name;
/// the distinction between scalar and variadic lives in the bound value.
///
/// # Errors
///
/// Returns [`GraftError::InvalidPlaceholder`] for `$_` (a wildcard has no
/// binding to refer to) and for malformed spellings.
pub(crate) fn fragments_from_template_text(text: &str) -> Result<Vec<Fragment>, GraftError> {
    scan(text, |name, _variadic| {
        if name == "_" {
            return Err(GraftError::invalid_placeholder(
                "'$_' cannot appear in a template; wildcards bind nothing",
            ));
        }
        Ok(Fragment::Reference(BindingRef::new(name)))
    })
}

fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Walks `text` splitting literal code from `$`-spellings, handing each
/// placeholder name (and whether it was variadic) to `make`.
fn scan<F>(text: &str, make: F) -> Result<Vec<Fragment>, GraftError>
where
    F: Fn(&str, bool) -> Result<Fragment, GraftError>,
{
    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(dollar) = rest.find('$') {
        let (before, from_dollar) = rest.split_at(dollar);
        literal.push_str(before);

        let dollars = from_dollar.chars().take_while(|&c| c == '$').count();
        let after = from_dollar.get(dollars..).unwrap_or_default();
        let name_len = after.chars().take_while(|&c| is_placeholder_char(c)).count();
        let name = after.get(..name_len).unwrap_or_default();

        match (dollars, name.is_empty()) {
            // A bare dollar sign is literal source text (e.g. shell strings).
            (1, true) => {
                literal.push('$');
                rest = after;
                continue;
            }
            (1, false) | (2, false) => {}
            _ => {
                let spelling: String = from_dollar.chars().take(dollars + name_len).collect();
                return Err(GraftError::invalid_placeholder(format!(
                    "malformed placeholder '{spelling}'"
                )));
            }
        }

        if !literal.is_empty() {
            fragments.push(Fragment::Code(std::mem::take(&mut literal)));
        }
        fragments.push(make(name, dollars == 2)?);
        rest = after.get(name_len..).unwrap_or_default();
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        fragments.push(Fragment::Code(literal));
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn placeholder_names(fragments: &[Fragment]) -> Vec<String> {
        fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Placeholder(c) => Some(c.name().to_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn scalar_placeholder_splits_surrounding_code() {
        let fragments = fragments_from_pattern_text("foo($X, 1)").expect("scan");
        assert_eq!(placeholder_names(&fragments), vec!["X"]);
        assert!(matches!(
            fragments.first(),
            Some(Fragment::Code(code)) if code == "foo("
        ));
        assert!(matches!(
            fragments.last(),
            Some(Fragment::Code(code)) if code == ", 1)"
        ));
    }

    #[test]
    fn double_dollar_makes_variadic() {
        let fragments = fragments_from_pattern_text("foo($$ARGS)").expect("scan");
        let Some(Fragment::Placeholder(slot)) = fragments.get(1) else {
            panic!("expected placeholder");
        };
        assert!(slot.arity().is_some());
    }

    #[test]
    fn underscore_is_anonymous_wildcard() {
        let fragments = fragments_from_pattern_text("foo($_)").expect("scan");
        let Some(Fragment::Placeholder(slot)) = fragments.get(1) else {
            panic!("expected placeholder");
        };
        assert!(!slot.is_capturing());
    }

    #[test]
    fn bare_dollar_stays_literal() {
        let fragments = fragments_from_pattern_text("\"$\"").expect("scan");
        assert!(matches!(
            fragments.first(),
            Some(Fragment::Code(code)) if code == "\"$\""
        ));
    }

    #[rstest]
    #[case("foo($$)")]
    #[case("foo($$$X)")]
    #[case("foo($$_)")]
    fn malformed_spellings_are_rejected(#[case] text: &str) {
        assert!(matches!(
            fragments_from_pattern_text(text),
            Err(GraftError::InvalidPlaceholder { .. })
        ));
    }

    #[test]
    fn template_placeholders_become_references() {
        let fragments = fragments_from_template_text("bar($X, $$REST)").expect("scan");
        let refs: Vec<_> = fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Reference(r) => Some(r.name().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec!["X", "REST"]);
    }

    #[test]
    fn template_rejects_wildcard() {
        assert!(matches!(
            fragments_from_template_text("bar($_)"),
            Err(GraftError::InvalidPlaceholder { .. })
        ));
    }
}
