// src/diff.rs

//! Diff calculation between two sitemap snapshots.
//!
//! Computes the URLs that appeared since the previous snapshot so they can
//! be dispatched as update notifications.

use std::collections::HashSet;

/// Calculate the URLs present in `current` but absent from `previous`.
///
/// The result preserves `current`'s document order; no sorting is applied.
/// An empty `previous` means this is the first observation of the domain,
/// so the entire current set is reported as new.
pub fn new_urls(previous: &[String], current: &[String]) -> Vec<String> {
    let known: HashSet<&str> = previous.iter().map(|u| u.as_str()).collect();

    current
        .iter()
        .filter(|url| !known.contains(url.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_changes() {
        let prev = urls(&["https://a.com/1", "https://a.com/2"]);
        assert!(new_urls(&prev, &prev).is_empty());
    }

    #[test]
    fn test_union_minus_base_is_addition() {
        let base = urls(&["https://a.com/1", "https://a.com/2"]);
        let union = urls(&["https://a.com/1", "https://a.com/3", "https://a.com/2"]);
        assert_eq!(new_urls(&base, &union), urls(&["https://a.com/3"]));
    }

    #[test]
    fn test_first_observation_reports_everything() {
        let current = urls(&["https://a.com/1", "https://a.com/2"]);
        assert_eq!(new_urls(&[], &current), current);
    }

    #[test]
    fn test_order_follows_current_document() {
        let prev = urls(&["https://a.com/keep"]);
        let current = urls(&[
            "https://a.com/z",
            "https://a.com/keep",
            "https://a.com/a",
        ]);
        assert_eq!(
            new_urls(&prev, &current),
            urls(&["https://a.com/z", "https://a.com/a"])
        );
    }

    #[test]
    fn test_removed_urls_are_ignored() {
        let prev = urls(&["https://a.com/gone", "https://a.com/keep"]);
        let current = urls(&["https://a.com/keep"]);
        assert!(new_urls(&prev, &current).is_empty());
    }
}
