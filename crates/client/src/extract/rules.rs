//! Literal selector lists, denylists, and boilerplate patterns used by the
//! heuristic cascades.
//!
//! Kept as ordered static tables so each tier of the extraction heuristics
//! can be unit-tested against fixtures without touching control flow.

/// Selectors probed (in order, short-circuiting) while waiting for a
/// rendered page's article container to appear.
pub const CONTENT_READY_SELECTORS: &[&str] = &[
    "article",
    ".article",
    ".post",
    ".content",
    ".entry-content",
    ".article-content",
    "#content",
    ".main-content",
];

/// Common content-container selectors gathered as article candidates, in
/// addition to the `<article>` element itself.
pub const CONTENT_SELECTORS: &[&str] = &[
    "#content",
    ".content",
    "#main",
    ".main",
    "#article",
    ".article",
    "#post",
    ".post",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".story-body",
    ".article-content",
    ".entry",
    ".main-content",
    ".page-content",
    ".story",
    ".blog-post",
    ".cms-content",
    ".node-content",
    ".rich-text",
    ".article__body",
    ".entry__content",
    ".post__content",
];

/// Tags whose subtrees never contribute article text.
pub const NOISE_TAGS: &[&str] =
    &["script", "style", "iframe", "noscript", "nav", "header", "footer", "aside", "button"];

/// Class/id tokens marking ad, social, comment, and other furniture
/// elements. Matched token-exact so e.g. "ad" does not catch "header".
pub const NOISE_CLASSES: &[&str] = &[
    "sidebar",
    "widget",
    "ad",
    "ads",
    "advertisement",
    "social",
    "social-share",
    "share",
    "share-buttons",
    "comments",
    "comment-section",
    "related",
    "related-posts",
    "recommended",
    "recommended-articles",
    "newsletter",
    "newsletter-signup",
    "promo",
    "menu",
    "navigation",
];

/// Substrings marking a heading as navigation furniture (case-insensitive).
pub const NAV_HEADING_DENYLIST: &[&str] = &["menu", "navigation", "search", "login", "sign in"];

/// Terms disqualifying a page's first `<h1>` as a title candidate.
pub const GENERIC_H1_TERMS: &[&str] = &["home", "menu", "navigation"];

/// Site-name separators in `<title>` text; split on the first occurrence
/// and keep the left side.
pub const TITLE_SITE_SEPARATORS: &[&str] = &[" | ", " - ", " \u{2013} "];

/// Line prefixes marking a paragraph as byline/share boilerplate
/// (matched against lowercased text).
pub const BOILERPLATE_LINE_PREFIX: &str = r"^(share|posted by|written by|author:|date:|published:)";

/// Phrases marking a loose paragraph as legal/subscription furniture
/// (case-insensitive substring match).
pub const BOILERPLATE_PHRASES: &[&str] = &[
    "cookie",
    "privacy policy",
    "terms of service",
    "copyright",
    "all rights reserved",
    "newsletter",
    "sign up",
    "subscribe",
];

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_content_selectors_parse() {
        for selector in CONTENT_SELECTORS {
            assert!(Selector::parse(selector).is_ok(), "bad selector: {selector}");
        }
    }

    #[test]
    fn test_content_ready_selectors_parse() {
        for selector in CONTENT_READY_SELECTORS {
            assert!(Selector::parse(selector).is_ok(), "bad selector: {selector}");
        }
    }

    #[test]
    fn test_boilerplate_prefix_is_valid_regex() {
        assert!(regex::Regex::new(BOILERPLATE_LINE_PREFIX).is_ok());
    }

    #[test]
    fn test_noise_classes_are_lowercase_tokens() {
        for class in NOISE_CLASSES {
            assert_eq!(*class, class.to_lowercase());
            assert!(!class.contains(' '));
        }
    }
}
