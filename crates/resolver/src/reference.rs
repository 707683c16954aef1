//! Parsing of the `${actionId.path}` reference token.

use once_cell::sync::Lazy;
use regex::Regex;

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\{([A-Za-z0-9_\-.\[\]]+)\}$").expect("static regex is valid"));

/// A parsed reference: the action it points at, and the raw path string
/// (everything after the first `.`, or empty if the reference is bare).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The upstream action id the reference points into.
    pub action_id: String,
    /// The dotted/bracketed path within that action's result.
    pub path: String,
}

/// Parse a string value as a whole-value reference expression.
///
/// Partial interpolation is not supported (spec §4.1): `s` must be *exactly*
/// `${actionId.path}` with nothing before or after. Returns `None` if `s`
/// is not a reference at all (a plain literal string).
#[must_use]
pub fn parse_reference(s: &str) -> Option<Reference> {
    let captures = REFERENCE_RE.captures(s)?;
    let inner = &captures[1];
    let (action_id, path) = match inner.split_once('.') {
        Some((id, rest)) => (id, rest),
        None => (inner, ""),
    };
    if action_id.is_empty() {
        return None;
    }
    Some(Reference { action_id: action_id.to_string(), path: path.to_string() })
}

/// The full `"actionId.path"` key used for cycle-detection bookkeeping.
#[must_use]
pub fn reference_key(r: &Reference) -> String {
    if r.path.is_empty() {
        r.action_id.clone()
    } else {
        format!("{}.{}", r.action_id, r.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_reference_with_path() {
        let r = parse_reference("${a1.output.id}").unwrap();
        assert_eq!(r.action_id, "a1");
        assert_eq!(r.path, "output.id");
    }

    #[test]
    fn parses_a_bare_reference_with_no_path() {
        let r = parse_reference("${a1}").unwrap();
        assert_eq!(r.action_id, "a1");
        assert_eq!(r.path, "");
    }

    #[test]
    fn rejects_partial_interpolation() {
        assert!(parse_reference("prefix ${a1.output} suffix").is_none());
        assert!(parse_reference("value: ${a1.output}").is_none());
    }

    #[test]
    fn plain_literal_is_not_a_reference() {
        assert!(parse_reference("just a string").is_none());
        assert!(parse_reference("").is_none());
    }

    #[test]
    fn reference_key_includes_path() {
        let r = Reference { action_id: "a1".into(), path: "output.id".into() };
        assert_eq!(reference_key(&r), "a1.output.id");
    }
}
