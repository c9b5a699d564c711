//! Readable-text extraction from raw page HTML.
//!
//! Parses the submitted HTML into its own detached tree (the live page is
//! never touched), drops denylisted subtrees, picks the first matching main
//! content container, and normalizes the text for the summarizer.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use url::Url;

pub mod rules;

pub use rules::ExtractionRules;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no readable content found on this page")]
    NoContent,
}

/// Cleaned plain-text payload plus page metadata. Created fresh per
/// extraction call and consumed once by the summarizer.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub word_count: usize,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
}

/// Elements that imply a line break around their text content.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "main",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

static RE_HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{A0}]+").unwrap());

static RE_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").unwrap());

static RE_BANGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());

static RE_QUESTIONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?{2,}").unwrap());

/// Extracts the readable text and metadata of a page.
///
/// Fails with [`ExtractError::NoContent`] only when the chosen container
/// (or the `<body>` fallback) yields no text after cleaning.
pub fn extract(
    html: &str,
    url: &Url,
    rules: &ExtractionRules,
) -> Result<ExtractedContent, ExtractError> {
    let document = Html::parse_document(html);

    let removed = denylisted_nodes(&document, rules.denylist);
    let root =
        content_root(&document, rules.content_selectors, &removed).ok_or(ExtractError::NoContent)?;

    let text = clean_text(&collect_text(root, &removed), rules.noise_prefixes);
    if text.is_empty() {
        return Err(ExtractError::NoContent);
    }

    let word_count = text.split_whitespace().count();
    let meta = page_metadata(&document);

    Ok(ExtractedContent {
        text,
        word_count,
        title: meta.title.unwrap_or_default(),
        url: url.to_string(),
        domain: url.host_str().unwrap_or("").to_string(),
        description: meta.description,
        author: meta.author,
        published_date: meta.published_date,
    })
}

/// Ids of every element matched by a denylist selector. Their whole
/// subtrees are skipped during text collection.
fn denylisted_nodes(document: &Html, denylist: &[&str]) -> HashSet<NodeId> {
    let mut removed = HashSet::new();
    for selector in denylist {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in document.select(&sel) {
            removed.insert(el.id());
        }
    }
    removed
}

/// First content-selector match outside any denylisted subtree; `<body>`
/// when none match.
fn content_root<'a>(
    document: &'a Html,
    selectors: &[&str],
    removed: &HashSet<NodeId>,
) -> Option<ElementRef<'a>> {
    for selector in selectors {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(el) = document
            .select(&sel)
            .find(|el| !removed.contains(&el.id()) && !has_removed_ancestor(el, removed))
        {
            return Some(el);
        }
    }

    let body = Selector::parse("body").expect("static selector must parse");
    document.select(&body).next()
}

fn has_removed_ancestor(el: &ElementRef<'_>, removed: &HashSet<NodeId>) -> bool {
    el.ancestors().any(|a| removed.contains(&a.id()))
}

/// Walks the subtree in document order, concatenating text nodes and
/// inserting line breaks at block-level elements.
fn collect_text(root: ElementRef<'_>, removed: &HashSet<NodeId>) -> String {
    let mut out = String::new();

    for node in root.descendants() {
        if removed.contains(&node.id()) || node.ancestors().any(|a| removed.contains(&a.id())) {
            continue;
        }
        match node.value() {
            Node::Element(el) => {
                if BLOCK_TAGS.contains(&el.name()) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Node::Text(text) => out.push_str(text),
            _ => {}
        }
    }

    out
}

/// Whitespace, boilerplate, and punctuation normalization.
///
/// Guarantees: no consecutive blank lines, no runs of 3+ `!`/`?` or 4+ `.`,
/// no horizontal whitespace runs, no leading/trailing whitespace.
fn clean_text(raw: &str, noise_prefixes: &[&str]) -> String {
    let normalized = raw.replace("\r\n", "\n");
    let prefixes: Vec<String> = noise_prefixes.iter().map(|p| p.to_lowercase()).collect();

    let mut kept: Vec<String> = Vec::new();
    let mut prev_blank = true; // swallow leading blanks
    for line in normalized.lines() {
        let line = RE_HORIZONTAL_WS.replace_all(line, " ").trim().to_string();
        if !line.is_empty() && is_noise_line(&line, &prefixes) {
            continue;
        }
        if line.is_empty() {
            if prev_blank {
                continue;
            }
            prev_blank = true;
        } else {
            prev_blank = false;
        }
        kept.push(line);
    }

    let joined = kept.join("\n");
    let joined = RE_DOTS.replace_all(&joined, "...");
    let joined = RE_BANGS.replace_all(&joined, "!");
    let joined = RE_QUESTIONS.replace_all(&joined, "?");

    joined.trim().to_string()
}

fn is_noise_line(line: &str, lowered_prefixes: &[String]) -> bool {
    let lower = line.to_lowercase();
    lowered_prefixes.iter().any(|p| lower.starts_with(p.as_str()))
}

#[derive(Debug, Default)]
struct PageMetadata {
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    published_date: Option<String>,
}

/// Best-effort metadata from `<title>` and known `<meta>` names/properties.
/// Absence of any of these is not an error.
fn page_metadata(document: &Html) -> PageMetadata {
    let mut meta = PageMetadata::default();

    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = document.select(&sel).next() {
            let title = el.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                meta.title = Some(title);
            }
        }
    }

    if let Ok(sel) = Selector::parse("meta") {
        for el in document.select(&sel) {
            let name = el
                .value()
                .attr("name")
                .or_else(|| el.value().attr("property"))
                .unwrap_or("")
                .to_lowercase();
            let content = el.value().attr("content").unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            match name.as_str() {
                "og:title" => {
                    if meta.title.is_none() {
                        meta.title = Some(content.to_string());
                    }
                }
                "description" | "og:description" => {
                    if meta.description.is_none() {
                        meta.description = Some(content.to_string());
                    }
                }
                "author" => {
                    if meta.author.is_none() {
                        meta.author = Some(content.to_string());
                    }
                }
                "article:published_time" | "date" => {
                    if meta.published_date.is_none() {
                        meta.published_date = Some(content.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://blog.example.com/posts/async-rust").unwrap()
    }

    const ARTICLE_HTML: &str = r#"
    <html>
    <head>
        <title>Understanding Async Rust</title>
        <meta name="author" content="Jane Doe">
        <meta name="description" content="A deep dive into futures and executors.">
        <meta property="article:published_time" content="2024-03-01T09:00:00Z">
    </head>
    <body>
        <nav>Home About Contact</nav>
        <article>
            <p>Futures are lazy.....</p>
            <p>Subscribe to our newsletter for weekly posts</p>
            <p>Executors poll them until completion??</p>
        </article>
        <footer>Copyright 2024</footer>
    </body>
    </html>"#;

    #[test]
    fn test_extract_prefers_article_and_drops_chrome() {
        let content = extract(ARTICLE_HTML, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(content.text.contains("Futures are lazy"));
        assert!(!content.text.contains("Home About Contact"));
        assert!(!content.text.contains("Copyright 2024"));
    }

    #[test]
    fn test_extract_strips_noise_lines() {
        let content = extract(ARTICLE_HTML, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(!content.text.contains("Subscribe to our newsletter"));
    }

    #[test]
    fn test_extract_normalizes_punctuation() {
        let content = extract(ARTICLE_HTML, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(content.text.contains("Futures are lazy..."));
        assert!(!content.text.contains("...."));
        assert!(content.text.contains("until completion?"));
        assert!(!content.text.contains("??"));
    }

    #[test]
    fn test_extract_never_emits_consecutive_blank_lines() {
        let html = r#"
        <html><body><article>
            <p>One</p>
            <div></div>
            <div></div>
            <div></div>
            <p>Two</p>
        </article></body></html>"#;
        let content = extract(html, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(!content.text.contains("\n\n\n"));
    }

    #[test]
    fn test_extract_metadata_best_effort() {
        let content = extract(ARTICLE_HTML, &page_url(), &ExtractionRules::default()).unwrap();
        assert_eq!(content.title, "Understanding Async Rust");
        assert_eq!(content.author.as_deref(), Some("Jane Doe"));
        assert_eq!(
            content.description.as_deref(),
            Some("A deep dive into futures and executors.")
        );
        assert_eq!(
            content.published_date.as_deref(),
            Some("2024-03-01T09:00:00Z")
        );
        assert_eq!(content.domain, "blog.example.com");
    }

    #[test]
    fn test_extract_missing_metadata_is_not_an_error() {
        let html = "<html><body><main><p>Just text.</p></main></body></html>";
        let content = extract(html, &page_url(), &ExtractionRules::default()).unwrap();
        assert_eq!(content.title, "");
        assert!(content.author.is_none());
        assert!(content.description.is_none());
        assert!(content.published_date.is_none());
    }

    #[test]
    fn test_extract_falls_back_to_body_text() {
        let html = r#"
        <html><body>
            <nav>Menu</nav>
            <p>Stray paragraph outside any known container.</p>
        </body></html>"#;
        let content = extract(html, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(content
            .text
            .contains("Stray paragraph outside any known container."));
        assert!(!content.text.contains("Menu"));
    }

    #[test]
    fn test_extract_fails_when_only_denylisted_content() {
        let html = r#"
        <html><body>
            <nav>Menu</nav>
            <script>var x = 1;</script>
        </body></html>"#;
        let err = extract(html, &page_url(), &ExtractionRules::default()).unwrap_err();
        assert!(matches!(err, ExtractError::NoContent));
    }

    #[test]
    fn test_extract_fails_on_empty_body() {
        let err = extract(
            "<html><body>   </body></html>",
            &page_url(),
            &ExtractionRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::NoContent));
    }

    #[test]
    fn test_extract_word_count() {
        let html = "<html><body><main><p>one two three four</p></main></body></html>";
        let content = extract(html, &page_url(), &ExtractionRules::default()).unwrap();
        assert_eq!(content.word_count, 4);
    }

    #[test]
    fn test_extract_with_injected_denylist() {
        let rules = ExtractionRules {
            denylist: &[".custom-noise"],
            ..ExtractionRules::default()
        };
        let html = r#"
        <html><body><main>
            <p>Keep me.</p>
            <div class="custom-noise">Drop me.</div>
        </main></body></html>"#;
        let content = extract(html, &page_url(), &rules).unwrap();
        assert!(content.text.contains("Keep me."));
        assert!(!content.text.contains("Drop me."));
    }

    #[test]
    fn test_content_selector_skips_denylisted_candidates() {
        let html = r#"
        <html><body>
            <aside><div class="content">Sidebar content.</div></aside>
            <div class="content">Real content.</div>
        </body></html>"#;
        let content = extract(html, &page_url(), &ExtractionRules::default()).unwrap();
        assert!(content.text.contains("Real content."));
        assert!(!content.text.contains("Sidebar content."));
    }

    #[test]
    fn test_clean_text_collapses_whitespace_runs() {
        let cleaned = clean_text("a    b\t\tc", &[]);
        assert_eq!(cleaned, "a b c");
    }
}
