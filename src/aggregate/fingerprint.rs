//! Content fingerprinting for item deduplication.
//!
//! Canonicalises the fields the engine is allowed to look at (`title`,
//! `link`, `description`) so that equivalent items from different providers
//! compare as equal regardless of case or surrounding whitespace.

use crate::types::Item;

/// Field separator in the fingerprint string.
///
/// A unit separator cannot appear in trimmed display text, so `("a|b", "c")`
/// and `("a", "b|c")` style collisions are not possible.
const SEP: char = '\u{1f}';

/// Normalise an item into its deduplication fingerprint.
///
/// Each field is trimmed and lowercased, a missing description normalises the
/// same as an empty one, and the three parts are joined with [`SEP`]. Two
/// items with equal fingerprints are duplicates; callers keep the first seen.
pub fn fingerprint(item: &Item) -> String {
    let title = item.title.trim().to_lowercase();
    let link = item.link.trim().to_lowercase();
    let description = item
        .description
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    format!("{title}{SEP}{link}{SEP}{description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, link: &str, description: Option<&str>) -> Item {
        Item {
            title: title.into(),
            link: link.into(),
            description: description.map(Into::into),
        }
    }

    #[test]
    fn case_differences_collapse() {
        let a = fingerprint(&item("A", "x", None));
        let b = fingerprint(&item("a", "X", None));
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_differences_collapse() {
        let a = fingerprint(&item("  Title ", "link", Some(" desc ")));
        let b = fingerprint(&item("Title", " link ", Some("desc")));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_description_equals_empty() {
        let a = fingerprint(&item("t", "l", None));
        let b = fingerprint(&item("t", "l", Some("")));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_links_distinct_fingerprints() {
        let a = fingerprint(&item("t", "https://a.example", None));
        let b = fingerprint(&item("t", "https://b.example", None));
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_descriptions_distinct_fingerprints() {
        let a = fingerprint(&item("t", "l", Some("season one")));
        let b = fingerprint(&item("t", "l", Some("season two")));
        assert_ne!(a, b);
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = fingerprint(&item("ab", "c", None));
        let b = fingerprint(&item("a", "bc", None));
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let i = item("Stable", "https://example.com", Some("same"));
        assert_eq!(fingerprint(&i), fingerprint(&i));
    }
}
