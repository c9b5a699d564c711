//! Static configuration tables for the extractor.
//!
//! Kept as data rather than inline literals so tests can inject alternate
//! denylists and the production lists stay reviewable in one place.

/// Selectors whose subtrees are treated as structural noise and excluded
/// from extraction: scripts, chrome, ads, social widgets, cookie banners.
pub const DENYLIST_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "nav",
    "header",
    "footer",
    "aside",
    ".sidebar",
    ".menu",
    ".navigation",
    ".ads",
    ".advertisement",
    ".social-share",
    ".comments",
    ".related-posts",
    ".popup",
    ".cookie-banner",
    ".cookie-consent",
    ".newsletter-signup",
    ".subscribe-box",
    "[role=\"banner\"]",
    "[role=\"navigation\"]",
    "[role=\"complementary\"]",
];

/// Candidate containers for the main readable content, tried in order.
/// The whole `<body>` is the fallback when none match.
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".post",
    "#content",
    ".entry-content",
];

/// Boilerplate sentence openers. A line starting with one of these
/// (case-insensitive) is dropped in its entirety.
pub const NOISE_PREFIXES: &[&str] = &[
    "click here to",
    "read more",
    "subscribe to",
    "follow us on",
    "advertisement",
    "accept cookies",
    "sign up for",
    "share this",
];

/// Configuration tables consumed by [`extract`](super::extract).
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub denylist: &'static [&'static str],
    pub content_selectors: &'static [&'static str],
    pub noise_prefixes: &'static [&'static str],
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            denylist: DENYLIST_SELECTORS,
            content_selectors: CONTENT_SELECTORS,
            noise_prefixes: NOISE_PREFIXES,
        }
    }
}
