//! Title resolution over ranked provenance candidates.
//!
//! Candidates are collected in descending provenance priority: structured
//! headline metadata, Open Graph, Twitter card, the first `<h1>`, the page
//! `<title>` with the site-name segment removed, and finally any `<h1>`
//! over 10 characters when nothing else was found. Among collected
//! candidates the longest one with a plausible word count wins, falling
//! back to the highest-provenance candidate.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::Value;

use super::ParsedDocument;
use super::collapse_whitespace;
use super::rules::{GENERIC_H1_TERMS, TITLE_SITE_SEPARATORS};

/// Sentinel returned when no candidate exists anywhere in the document.
pub const NO_TITLE: &str = "No title found";

static HEADLINE_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[itemprop="headline"]"#).expect("valid selector"));
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector"));
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"], meta[name="og:title"]"#).expect("valid selector"));
static TWITTER_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="twitter:title"]"#).expect("valid selector"));
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE_TAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// A candidate title with its provenance rank (lower is more trusted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCandidate {
    pub text: String,
    pub source_rank: usize,
}

/// Resolve the article title. Never fails; returns [`NO_TITLE`] when the
/// document offers no candidate at all.
///
/// A structured-data headline is authoritative: when present it is returned
/// verbatim (trimmed) without consulting the other candidates.
pub fn resolve_title(doc: &ParsedDocument) -> String {
    let candidates = collect_candidates(doc);

    if candidates.is_empty() {
        return NO_TITLE.to_string();
    }

    if candidates[0].source_rank == 0 {
        return candidates[0].text.clone();
    }

    select_best(&candidates)
}

fn collect_candidates(doc: &ParsedDocument) -> Vec<TitleCandidate> {
    let html = doc.document();
    let mut candidates = Vec::new();

    // 1. Structured-data headline: itemprop meta, else JSON-LD.
    if let Some(headline) = meta_content(html.select(&HEADLINE_META).next()).or_else(|| json_ld_headline(doc)) {
        candidates.push(TitleCandidate { text: headline, source_rank: 0 });
    }

    // 2. Open Graph title.
    if let Some(text) = meta_content(html.select(&OG_TITLE).next()) {
        candidates.push(TitleCandidate { text, source_rank: 1 });
    }

    // 3. Twitter card title.
    if let Some(text) = meta_content(html.select(&TWITTER_TITLE).next()) {
        candidates.push(TitleCandidate { text, source_rank: 2 });
    }

    // 4. First level-1 heading, unless it reads like site chrome.
    if let Some(h1) = html.select(&H1).next() {
        let text = collapse_whitespace(&h1.text().collect::<String>());
        let lowered = text.to_lowercase();
        if text.split_whitespace().count() > 1 && !GENERIC_H1_TERMS.iter().any(|term| lowered.contains(term)) {
            candidates.push(TitleCandidate { text, source_rank: 3 });
        }
    }

    // 5. Page title with the trailing site-name segment removed.
    if let Some(title_el) = html.select(&TITLE_TAG).next() {
        let raw = collapse_whitespace(&title_el.text().collect::<String>());
        if !raw.is_empty() {
            candidates.push(TitleCandidate { text: strip_site_name(&raw), source_rank: 4 });
        }
    }

    // 6. Last resort: the first h1 with some length, only when nothing else
    // was collected.
    if candidates.is_empty() {
        for h1 in html.select(&H1) {
            let text = collapse_whitespace(&h1.text().collect::<String>());
            if text.len() > 10 {
                candidates.push(TitleCandidate { text, source_rank: 5 });
                break;
            }
        }
    }

    candidates.retain(|c| !c.text.is_empty());
    candidates
}

/// Prefer the longest candidate whose word count sits strictly between 3
/// and 20; otherwise keep the highest-provenance candidate. Ties keep the
/// earlier (higher-provenance) entry.
fn select_best(candidates: &[TitleCandidate]) -> String {
    let mut best: Option<&TitleCandidate> = None;
    for candidate in candidates {
        let words = candidate.text.split_whitespace().count();
        if words > 3 && words < 20 && best.is_none_or(|b| candidate.text.len() > b.text.len()) {
            best = Some(candidate);
        }
    }

    best.unwrap_or(&candidates[0]).text.clone()
}

fn meta_content(element: Option<ElementRef>) -> Option<String> {
    let content = element?.value().attr("content")?.trim();
    if content.is_empty() { None } else { Some(content.to_string()) }
}

/// Pull a `headline` field out of JSON-LD blocks, including `@graph` nodes.
fn json_ld_headline(doc: &ParsedDocument) -> Option<String> {
    for script in doc.document().select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };

        if let Some(headline) = headline_from_value(&value) {
            return Some(headline);
        }
    }
    None
}

fn headline_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(headline) = map.get("headline").and_then(Value::as_str) {
                let trimmed = headline.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            map.get("@graph").and_then(headline_from_value)
        }
        Value::Array(items) => items.iter().find_map(headline_from_value),
        _ => None,
    }
}

/// Remove the site-name tail from a page title by splitting on the first
/// separator occurrence and keeping the left side.
fn strip_site_name(title: &str) -> String {
    for separator in TITLE_SITE_SEPARATORS {
        if let Some((left, _)) = title.split_once(separator) {
            return left.trim().to_string();
        }
    }
    title.to_string()
}
