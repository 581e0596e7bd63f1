//! Case-insensitive substring overlap between a stored tag collection and a
//! queried one.
//!
//! Two directions exist and they are not interchangeable: profile skill and
//! interest matching is symmetric (either string may contain the other),
//! while event and project tag matching only tests whether a stored tag
//! contains the queried term. `"rust"` as a query matches a stored
//! `"rustlang"` tag in both modes, but a stored `"rust"` tag matches the
//! query `"rustlang"` only in symmetric mode.

/// Direction of the substring test applied to each (stored, queried) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// `stored.contains(queried) || queried.contains(stored)`.
    Symmetric,
    /// `stored.contains(queried)` only.
    StoredContainsQuery,
}

/// True when any stored tag overlaps any queried tag under `mode`. An empty
/// query never constrains; an empty stored collection never matches a
/// non-empty query.
pub fn overlaps(stored: &[String], queried: &[String], mode: TagMatch) -> bool {
    if queried.is_empty() {
        return true;
    }
    stored.iter().any(|s| {
        let s = s.to_lowercase();
        queried.iter().any(|q| {
            let q = q.to_lowercase();
            match mode {
                TagMatch::Symmetric => s.contains(&q) || q.contains(&s),
                TagMatch::StoredContainsQuery => s.contains(&q),
            }
        })
    })
}

/// Retain the items whose stored tags overlap `queried`. Passes everything
/// through untouched when the query is empty.
pub fn filter_by_overlap<T>(
    items: Vec<T>,
    queried: &[String],
    mode: TagMatch,
    stored: impl Fn(&T) -> &[String],
) -> Vec<T> {
    if queried.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| overlaps(stored(item), queried, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_query_never_constrains() {
        assert!(overlaps(&tags(&["rust"]), &[], TagMatch::Symmetric));
        assert!(overlaps(&[], &[], TagMatch::StoredContainsQuery));
    }

    #[test]
    fn test_empty_stored_fails_nonempty_query() {
        assert!(!overlaps(&[], &tags(&["rust"]), TagMatch::Symmetric));
        assert!(!overlaps(&[], &tags(&["rust"]), TagMatch::StoredContainsQuery));
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert!(overlaps(
            &tags(&["RustLang"]),
            &tags(&["rust"]),
            TagMatch::StoredContainsQuery
        ));
        assert!(overlaps(
            &tags(&["machine learning"]),
            &tags(&["LEARNING"]),
            TagMatch::StoredContainsQuery
        ));
    }

    #[test]
    fn test_directions_differ_on_short_stored_tag() {
        // Stored "rust" vs queried "rustlang": only the symmetric mode
        // tests query-contains-stored.
        let stored = tags(&["rust"]);
        let queried = tags(&["rustlang"]);
        assert!(overlaps(&stored, &queried, TagMatch::Symmetric));
        assert!(!overlaps(&stored, &queried, TagMatch::StoredContainsQuery));
    }

    #[test]
    fn test_any_pair_suffices() {
        let stored = tags(&["go", "python"]);
        let queried = tags(&["java", "py"]);
        assert!(overlaps(&stored, &queried, TagMatch::StoredContainsQuery));
    }

    #[test]
    fn test_filter_passthrough_on_empty_query() {
        let items = vec![tags(&["a"]), vec![], tags(&["b"])];
        let kept = filter_by_overlap(items.clone(), &[], TagMatch::Symmetric, |t| t);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_filter_retains_only_overlapping() {
        let items = vec![tags(&["rust", "db"]), tags(&["frontend"]), vec![]];
        let kept = filter_by_overlap(
            items,
            &tags(&["rust"]),
            TagMatch::StoredContainsQuery,
            |t| t,
        );
        assert_eq!(kept, vec![tags(&["rust", "db"])]);
    }
}
