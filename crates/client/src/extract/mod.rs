//! Document normalization and heuristic article extraction.
//!
//! ### Normalization
//! - Decodes raw bytes to UTF-8, trusting the declared charset unless it is
//!   the commonly mis-declared ISO-8859-1/windows-1252 family, in which case
//!   a charset sniffed from the document head, or statistically detected
//!   from the bytes, is preferred when it differs.
//! - Parses with a recovery pass: a document re-wrapped in an explicit
//!   skeleton is tried when the first parse yields no body or almost no
//!   text. Normalization never fails outright.
//!
//! ### Extraction
//! - [`title::resolve_title`]: provenance-ranked title candidates.
//! - [`headings::collect_headings`]: filtered section headings in document
//!   order.
//! - [`content::locate_content`]: four-tier content cascade.

pub mod content;
pub mod headings;
pub mod rules;
pub mod title;

pub use content::{NO_CONTENT, locate_content};
pub use headings::collect_headings;
pub use title::{NO_TITLE, resolve_title};

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;
use scraper::{Html, Selector};

/// Documents whose first parse extracts less text than this are re-parsed.
const MIN_PARSED_TEXT_LEN: usize = 100;

/// Match `<meta charset="...">` in the document head.
static CHARSET_META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>;]+)"#).expect("valid regex"));

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

/// A navigable parse tree over normalized HTML, plus the encoding that was
/// used to decode it. Scoped to one extraction call.
pub struct ParsedDocument {
    html: Html,
    encoding: &'static str,
}

impl ParsedDocument {
    /// The parse tree.
    pub fn document(&self) -> &Html {
        &self.html
    }

    /// Name of the encoding the raw bytes were decoded with.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    /// Whether the document has a `<body>` element.
    pub fn has_body(&self) -> bool {
        self.html.select(&BODY_SELECTOR).next().is_some()
    }
}

/// Turn raw HTML bytes into a [`ParsedDocument`]. Never fails; worst case
/// the strict first parse is kept as-is.
pub fn normalize(bytes: &[u8], declared_charset: Option<&str>) -> ParsedDocument {
    let encoding = resolve_encoding(bytes, declared_charset);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("lossy decode from {} replaced invalid sequences", encoding.name());
    }

    let html = parse_markup(&text);

    ParsedDocument { html, encoding: encoding.name() }
}

/// Pick the encoding to decode with.
///
/// The declared charset is trusted except when absent or in the
/// ISO-8859-1/windows-1252 family, which HTTP servers routinely declare for
/// content that is actually something else. For the legacy family a charset
/// sniffed from the document head, or failing that one statistically
/// detected from the byte content, is substituted when it differs.
fn resolve_encoding(bytes: &[u8], declared_charset: Option<&str>) -> &'static Encoding {
    let declared = declared_charset.and_then(|label| Encoding::for_label(label.as_bytes()));

    if let Some(encoding) = declared {
        if encoding != WINDOWS_1252 {
            return encoding;
        }
        return sniff_meta_charset(bytes)
            .or_else(|| detect_charset(bytes))
            .filter(|&inferred| inferred != encoding)
            .unwrap_or(encoding);
    }

    sniff_meta_charset(bytes).unwrap_or(UTF_8)
}

/// Statistically detect a charset from the byte content. `None` when the
/// bytes are pure ASCII and carry no signal.
fn detect_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut detector = chardetng::EncodingDetector::new();
    if !detector.feed(bytes, true) {
        return None;
    }
    Some(detector.guess(None, true))
}

/// Sniff a charset declaration from the first 1024 bytes of markup.
fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    CHARSET_META_RE
        .captures(&head_str)
        .and_then(|c| c.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
}

/// Parse markup, re-parsing wrapped in an explicit document skeleton when
/// the first pass produced no body or almost no text, and keeping the first
/// parse as the last resort.
fn parse_markup(text: &str) -> Html {
    let primary = Html::parse_document(text);
    if has_body(&primary) && total_text_len(&primary) >= MIN_PARSED_TEXT_LEN {
        return primary;
    }

    let wrapped = format!("<html><body>{text}</body></html>");
    let relaxed = Html::parse_document(&wrapped);
    if has_body(&relaxed) && total_text_len(&relaxed) >= MIN_PARSED_TEXT_LEN {
        return relaxed;
    }

    primary
}

fn has_body(html: &Html) -> bool {
    html.select(&BODY_SELECTOR).next().is_some()
}

/// Total stripped text length across the document.
fn total_text_len(html: &Html) -> usize {
    html.root_element().text().map(|t| t.trim().len()).sum()
}

/// Collapse all whitespace runs in an element's text to single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_utf8_document() {
        let html = "<html><head><title>T</title></head><body><p>Hello, World! Caf\u{e9}</p></body></html>";
        let doc = normalize(html.as_bytes(), Some("utf-8"));
        assert_eq!(doc.encoding(), "UTF-8");
        assert!(doc.has_body());
    }

    #[test]
    fn test_normalize_trusts_declared_charset() {
        // ISO-8859-1 byte for é under a non-legacy declared charset stays
        // as declared
        let doc = normalize(b"<html><body>ok</body></html>", Some("utf-8"));
        assert_eq!(doc.encoding(), "UTF-8");
    }

    #[test]
    fn test_normalize_overrides_legacy_declared_charset() {
        // Declared ISO-8859-1 but the page itself says utf-8; the sniffed
        // charset wins.
        let html = br#"<html><head><meta charset="utf-8"></head><body>Test</body></html>"#;
        let doc = normalize(html, Some("ISO-8859-1"));
        assert_eq!(doc.encoding(), "UTF-8");
    }

    #[test]
    fn test_normalize_keeps_legacy_when_detection_agrees() {
        // \xE9 is valid windows-1252 and invalid UTF-8, so detection agrees
        // with the declared legacy charset.
        let doc = normalize(b"<html><body>Caf\xE9</body></html>", Some("ISO-8859-1"));
        assert_eq!(doc.encoding(), "windows-1252");
    }

    #[test]
    fn test_normalize_detects_misdeclared_utf8() {
        // Multibyte UTF-8 content, declared as the legacy family, with no
        // meta charset to sniff; statistical detection corrects it.
        let doc = normalize("<html><body>Caf\u{e9} \u{2014} article</body></html>".as_bytes(), Some("ISO-8859-1"));
        assert_eq!(doc.encoding(), "UTF-8");
    }

    #[test]
    fn test_normalize_ascii_keeps_declared_legacy() {
        let doc = normalize(b"<html><body>plain ascii</body></html>", Some("ISO-8859-1"));
        assert_eq!(doc.encoding(), "windows-1252");
    }

    #[test]
    fn test_normalize_defaults_to_utf8() {
        let doc = normalize(b"<html><body>Test</body></html>", None);
        assert_eq!(doc.encoding(), "UTF-8");
    }

    #[test]
    fn test_sniff_meta_charset() {
        let html = br#"<html><head><meta charset="windows-1252"></head></html>"#;
        assert_eq!(sniff_meta_charset(html).map(|e| e.name()), Some("windows-1252"));
    }

    #[test]
    fn test_sniff_meta_charset_http_equiv() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1">"#;
        // encoding_rs maps ISO-8859-1 to windows-1252 per WHATWG spec
        assert_eq!(sniff_meta_charset(html).map(|e| e.name()), Some("windows-1252"));
    }

    #[test]
    fn test_sniff_meta_charset_absent() {
        assert!(sniff_meta_charset(b"<html><body></body></html>").is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let html = b"<html><head><title>Same</title></head><body><p>Stable content here.</p></body></html>";
        let first = normalize(html, Some("utf-8"));
        let second = normalize(html, Some("utf-8"));
        assert_eq!(first.encoding(), second.encoding());
        assert_eq!(first.html.html(), second.html.html());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n c  "), "a b c");
    }
}
