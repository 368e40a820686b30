//! Article body location.
//!
//! Four-tier cascade, each tier used only when the previous produced
//! nothing:
//!
//! 1. Structured candidates: the `<article>` element plus matches of the
//!    common content-container selectors, ranked by cleaned text length;
//!    the winner's qualifying paragraphs joined by blank lines, falling
//!    back to the winner's full cleaned text.
//! 2. Loose paragraph scan over the whole document with a boilerplate
//!    phrase filter.
//! 3. Cleaned body text reduced to its densest contiguous run of
//!    non-blank lines.
//! 4. The "No content found" sentinel, only when there is no body at all.
//!
//! The cascade trades precision for robustness: structured selectors are
//! precise when present, while the density run approximates "the block of
//! body text" with no model and no ground truth.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::ParsedDocument;
use super::collapse_whitespace;
use super::rules::{BOILERPLATE_LINE_PREFIX, BOILERPLATE_PHRASES, CONTENT_SELECTORS, NOISE_CLASSES, NOISE_TAGS};

/// Sentinel returned when the document has no body element at all.
pub const NO_CONTENT: &str = "No content found";

/// Runs of non-blank lines longer than this replace the whole body text in
/// the density fallback.
const MIN_DENSE_RUN_LINES: usize = 5;

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").expect("valid selector"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

static CONTENT_SELECTOR_SET: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});

static BOILERPLATE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BOILERPLATE_LINE_PREFIX).expect("valid regex"));

static NEWLINE_RUNS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\t ]+").expect("valid regex"));

/// Locate the article body. Never fails; returns [`NO_CONTENT`] only when
/// the document has no `<body>`.
pub fn locate_content(doc: &ParsedDocument) -> String {
    let html = doc.document();

    // Tier 1: structured candidates ranked by cleaned text length.
    let mut candidates: Vec<ElementRef> = html.select(&ARTICLE).collect();
    for selector in CONTENT_SELECTOR_SET.iter() {
        candidates.extend(html.select(selector));
    }

    if !candidates.is_empty() {
        let winner = rank_candidates(&candidates);
        if let Some(text) = qualifying_paragraphs(winner) {
            return text;
        }
        return normalize_whitespace(&cleaned_text(winner));
    }

    // Tier 2: loose paragraph scan.
    if let Some(text) = loose_paragraphs(html) {
        return text;
    }

    // Tier 3: cleaned body reduced to its densest run.
    if let Some(body) = html.select(&BODY).next() {
        let text = normalize_whitespace(&cleaned_text(body));
        return densest_run(&text);
    }

    NO_CONTENT.to_string()
}

/// Pick the candidate with the most cleaned text; ties keep the earliest.
fn rank_candidates<'a>(candidates: &[ElementRef<'a>]) -> ElementRef<'a> {
    let mut winner = candidates[0];
    let mut best = cleaned_text_len(winner);

    for candidate in candidates.iter().skip(1) {
        let len = cleaned_text_len(*candidate);
        if len > best {
            winner = *candidate;
            best = len;
        }
    }

    winner
}

/// Paragraphs of the winner with more than 4 words and no byline/share
/// prefix, joined by blank lines. `None` when nothing survives.
fn qualifying_paragraphs(winner: ElementRef) -> Option<String> {
    let mut paragraphs = Vec::new();

    for p in winner.select(&PARAGRAPH) {
        if is_under_noise(p, winner) {
            continue;
        }
        let text = collapse_whitespace(&p.text().collect::<String>());
        if text.split_whitespace().count() <= 4 {
            continue;
        }
        if BOILERPLATE_LINE_RE.is_match(&text.to_lowercase()) {
            continue;
        }
        paragraphs.push(text);
    }

    if paragraphs.is_empty() { None } else { Some(paragraphs.join("\n\n")) }
}

/// Every paragraph in the document with more than 5 words and none of the
/// legal/subscription boilerplate phrases.
fn loose_paragraphs(html: &Html) -> Option<String> {
    let mut paragraphs = Vec::new();

    for p in html.select(&PARAGRAPH) {
        let text = collapse_whitespace(&p.text().collect::<String>());
        if text.split_whitespace().count() <= 5 {
            continue;
        }
        let lowered = text.to_lowercase();
        if BOILERPLATE_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            continue;
        }
        paragraphs.push(text);
    }

    if paragraphs.is_empty() { None } else { Some(paragraphs.join("\n\n")) }
}

/// Whether an element is furniture rather than content.
fn is_noise(el: &ElementRef) -> bool {
    let value = el.value();

    if NOISE_TAGS.contains(&value.name()) {
        return true;
    }

    if value
        .classes()
        .any(|class| NOISE_CLASSES.contains(&class.to_lowercase().as_str()))
    {
        return true;
    }

    value
        .id()
        .is_some_and(|id| NOISE_CLASSES.contains(&id.to_lowercase().as_str()))
}

/// Whether `el` sits under a noise element somewhere below `root`.
fn is_under_noise(el: ElementRef, root: ElementRef) -> bool {
    el.ancestors()
        .take_while(|ancestor| ancestor.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_noise(&ancestor))
}

/// Stripped text length of the subtree, skipping noise elements.
fn cleaned_text_len(el: ElementRef) -> usize {
    let mut total = 0;

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !is_noise(&child_el) {
                total += cleaned_text_len(child_el);
            }
        } else if let Some(text) = child.value().as_text() {
            total += text.trim().len();
        }
    }

    total
}

/// Raw text of the subtree with noise elements skipped, text nodes joined
/// by newlines. Whitespace-only nodes become blank lines, which the
/// density pass later uses as block boundaries.
fn cleaned_text(el: ElementRef) -> String {
    let mut parts = Vec::new();
    collect_text(el, &mut parts);
    parts.join("\n")
}

fn collect_text(el: ElementRef, parts: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !is_noise(&child_el) {
                collect_text(child_el, parts);
            }
        } else if let Some(text) = child.value().as_text() {
            parts.push(text.to_string());
        }
    }
}

/// Collapse 3+ consecutive newlines to one blank line and horizontal
/// whitespace runs to single spaces.
fn normalize_whitespace(text: &str) -> String {
    let collapsed = NEWLINE_RUNS_RE.replace_all(text, "\n\n");
    let collapsed = HSPACE_RE.replace_all(&collapsed, " ");
    collapsed.trim().to_string()
}

/// Keep only the longest contiguous run of non-blank lines (ties broken by
/// first occurrence) when that run is long enough to look like an article.
fn densest_run(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let mut best_start = 0;
    let mut best_len = 0;
    let mut run_start = 0;
    let mut run_len = 0;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if run_len > best_len {
                best_start = run_start;
                best_len = run_len;
            }
            run_len = 0;
        } else {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
        }
    }
    if run_len > best_len {
        best_start = run_start;
        best_len = run_len;
    }

    if best_len > MIN_DENSE_RUN_LINES {
        lines[best_start..best_start + best_len].join("\n")
    } else {
        text.to_string()
    }
}
