// src/sitemap.rs

//! Sitemap URL set extraction.
//!
//! Parses a sitemap XML document into the ordered, deduplicated set of
//! `<loc>` URLs it declares. Both `<urlset>` and `<sitemapindex>` documents
//! are handled; namespace prefixes are tolerated by matching on local
//! element names only.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{AppError, Result};

/// Extract all location URLs from a sitemap document.
///
/// Returns the URLs in document order with duplicates collapsed to their
/// first occurrence. A well-formed document without any `<loc>` entries
/// yields an empty vec; a malformed document yields a parse error rather
/// than a partial result.
pub fn extract(document: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    let mut in_loc = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => in_loc = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => in_loc = false,
            Ok(Event::Text(t)) if in_loc => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::parse("sitemap", e))?
                    .trim()
                    .to_string();
                if !text.is_empty() && seen.insert(text.clone()) {
                    urls.push(text);
                }
            }
            Ok(Event::CData(t)) if in_loc => {
                let text = String::from_utf8_lossy(t.as_ref()).trim().to_string();
                if !text.is_empty() && seen.insert(text.clone()) {
                    urls.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(AppError::parse("sitemap", e)),
        }
    }

    Ok(urls)
}
