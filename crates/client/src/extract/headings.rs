//! Section heading collection.

use std::sync::LazyLock;

use scraper::Selector;

use super::ParsedDocument;
use super::collapse_whitespace;
use super::rules::NAV_HEADING_DENYLIST;

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3").expect("valid selector"));

/// Collect level-1/2/3 headings in document order, dropping short entries
/// and navigation furniture. Never fails; when the page has no usable
/// headings, the fallback title (if any) becomes the single entry.
pub fn collect_headings(doc: &ParsedDocument, fallback_title: Option<&str>) -> Vec<String> {
    let mut headings = Vec::new();

    for element in doc.document().select(&HEADINGS) {
        let text = collapse_whitespace(&element.text().collect::<String>());
        if text.len() <= 3 {
            continue;
        }
        let lowered = text.to_lowercase();
        if NAV_HEADING_DENYLIST.iter().any(|term| lowered.contains(term)) {
            continue;
        }
        headings.push(text);
    }

    if headings.is_empty()
        && let Some(title) = fallback_title.filter(|t| !t.is_empty())
    {
        headings.push(title.to_string());
    }

    headings
}
