// src/summary.rs

//! Keyword aggregation over newly discovered URLs.
//!
//! Groups a batch of URLs by domain and reduces each URL to a summary
//! keyword (its last non-empty path segment). The result feeds the daily
//! digest message sent after a full scheduler pass.

use std::collections::{BTreeMap, BTreeSet};

use crate::utils::url::{domain_of, keyword_of};

/// Domain → deduplicated keyword set.
pub type DomainKeywords = BTreeMap<String, BTreeSet<String>>;

/// Group URLs by domain and extract one keyword per URL.
///
/// URLs without a usable final path segment contribute nothing. An empty
/// map means "do not send a summary".
pub fn summarize(urls: &[String]) -> DomainKeywords {
    let mut by_domain = DomainKeywords::new();

    for url in urls {
        let (Some(domain), Some(keyword)) = (domain_of(url), keyword_of(url)) else {
            continue;
        };
        by_domain.entry(domain).or_default().insert(keyword);
    }

    by_domain
}

/// Render the keyword digest message, or `None` when there is nothing to
/// report.
pub fn render_summary(keywords: &DomainKeywords) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }

    let mut message = String::from("Newly published today, by domain:\n");
    for (domain, words) in keywords {
        message.push_str(&format!("\n{domain}:\n"));
        for (i, keyword) in words.iter().enumerate() {
            message.push_str(&format!("  {}. {keyword}\n", i + 1));
        }
    }

    Some(message)
}
