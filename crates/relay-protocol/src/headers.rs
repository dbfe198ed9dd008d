//! Header normalization: raw multi-map HTTP headers -> a clean `(name,
//! first-value)` sequence, in the order the names were first seen.

use crate::HeaderPair;

/// Normalize an ordered sequence of raw `(name, value)` pairs (as they come
/// off the wire, before any multi-value collapsing) into the canonical
/// header list: one entry per distinct name, value is the first one seen.
///
/// Mirrors the source's `http.Header` collapsing behavior (spec.md §3),
/// but builds a clean `Vec` with no pre-sized holes.
pub fn normalize<'a, I>(raw: I) -> Vec<HeaderPair>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (name, value) in raw {
        if seen.insert(name.to_owned()) {
            out.push(HeaderPair {
                name: name.to_owned(),
                value: value.to_owned(),
            });
        }
    }
    out
}

/// Look up a header by case-sensitive name (the spec preserves name case
/// internally; HTTP header names from `axum`/`http` are already
/// case-normalized by the framework before this sees them).
pub fn find<'a>(headers: &'a [HeaderPair], name: &str) -> Option<&'a str> {
    headers.iter().find(|h| h.name == name).map(|h| h.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_repeated_names_to_first_value() {
        let raw = vec![("X-Foo", "1"), ("X-Foo", "2"), ("X-Bar", "a")];
        let normalized = normalize(raw);
        assert_eq!(normalized.len(), 2);
        assert_eq!(find(&normalized, "X-Foo"), Some("1"));
        assert_eq!(find(&normalized, "X-Bar"), Some("a"));
    }

    #[test]
    fn normalize_preserves_first_seen_order() {
        let raw = vec![("B", "1"), ("A", "2")];
        let normalized = normalize(raw);
        assert_eq!(normalized[0].name, "B");
        assert_eq!(normalized[1].name, "A");
    }

    #[test]
    fn normalize_of_empty_input_is_empty_with_no_holes() {
        let normalized = normalize(Vec::new());
        assert!(normalized.is_empty());
    }
}
