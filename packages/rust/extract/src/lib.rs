//! Article body extraction from raw HTML.
//!
//! Locates the article container (known news-site selectors first, then
//! readability-style fallbacks), walks it while skipping navigation, scripts,
//! and other chrome, and runs the text through a cleanup pipeline.
//!
//! Extraction never fails: malformed markup yields best-effort text, an empty
//! string in the worst case.

mod cleanup;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Headline and plain-text body of an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Headline, when the page exposes one.
    pub title: Option<String>,
    /// Plain-text body, one paragraph per line.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Article containers in priority order. Portal and newspaper layouts come
/// before the generic HTML5 containers.
const CONTENT_SELECTORS: &[&str] = &[
    "article#dic_area",
    "div#newsct_article",
    "div#articleBodyContents",
    "div.article_body",
    "div.article_view",
    "div#article-body",
    "div#news_body_area",
    "div.article_txt",
    "div#article_body",
    "div.article-text",
    "section.article-body",
    "#article-view-content-div",
    "div.story-body",
    "div.article__body",
    "div.entry-content",
    "article",
    "[role=\"main\"]",
    "main",
    "#content",
];

/// Elements whose whole subtree is chrome, never article text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe",
    "svg", "button", "select", "template", "figcaption",
];

/// Class/id tokens marking share bars, related-story boxes, ads, etc.
/// Matched against whole `-`/`_`-separated tokens, so `lead-paragraph`
/// or `shareholder-letter` never match.
const BOILERPLATE_MARKERS: &[&str] = &[
    "share", "sharing", "social", "sns", "related", "recommend", "comment", "comments",
    "advert", "advertisement", "ad", "ads", "banner", "promo", "newsletter", "subscribe",
    "byline", "copyright", "breadcrumb", "breadcrumbs", "sidebar", "popular", "reporter",
];

/// Elements that end a paragraph when walking text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "tr",
    "blockquote", "pre", "table", "ul", "ol", "dd", "dt",
];

static CONTENT_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static BODY_SEL: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("body").ok());

static TITLE_SELS: LazyLock<Vec<(Selector, Option<&'static str>)>> = LazyLock::new(|| {
    [
        (r#"meta[property="og:title"]"#, Some("content")),
        (r#"meta[name="twitter:title"]"#, Some("content")),
        ("h2.media_end_head_headline", None),
        ("h1", None),
        ("title", None),
    ]
    .into_iter()
    .filter_map(|(s, attr)| Selector::parse(s).ok().map(|sel| (sel, attr)))
    .collect()
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Return the plain-text body of an article, stripping boilerplate.
pub fn extract(raw_markup: &str) -> String {
    extract_article(raw_markup).text
}

/// Extract both the headline and the body of an article page.
#[instrument(skip_all, fields(markup_len = raw_markup.len()))]
pub fn extract_article(raw_markup: &str) -> ExtractedArticle {
    let doc = Html::parse_document(raw_markup);

    let title = extract_title(&doc);
    let text = cleanup::run_pipeline(&content_text(&doc));

    debug!(
        title = title.as_deref().unwrap_or(""),
        text_len = text.chars().count(),
        "extraction complete"
    );

    ExtractedArticle { title, text }
}

/// Find the first content container that yields text; fall back to `<body>`.
fn content_text(doc: &Html) -> String {
    for sel in CONTENT_SELS.iter() {
        if let Some(el) = doc.select(sel).next() {
            let text = element_text(el);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }

    if let Some(body_sel) = BODY_SEL.as_ref() {
        if let Some(body) = doc.select(body_sel).next() {
            return element_text(body);
        }
    }

    element_text(doc.root_element())
}

/// One pending step of the text walk.
enum Visit<'a> {
    Text(&'a str),
    Open(ElementRef<'a>),
    /// Paragraph break after a block element's children.
    Close,
}

/// Collect the visible text of an element, skipping chrome subtrees.
///
/// Uses an explicit stack so arbitrarily deep markup cannot exhaust the
/// thread stack.
fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut stack = Vec::new();
    push_children(el, &mut stack);

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Text(text) => out.push_str(text),
            Visit::Close => out.push('\n'),
            Visit::Open(child) => {
                if is_chrome(child) {
                    continue;
                }
                if BLOCK_TAGS.contains(&child.value().name()) {
                    out.push('\n');
                    stack.push(Visit::Close);
                }
                push_children(child, &mut stack);
            }
        }
    }
    out
}

/// Push `el`'s children so the first child is popped first.
fn push_children<'a>(el: ElementRef<'a>, stack: &mut Vec<Visit<'a>>) {
    let start = stack.len();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => stack.push(Visit::Text(text)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    stack.push(Visit::Open(child_el));
                }
            }
            _ => {}
        }
    }
    stack[start..].reverse();
}

/// Whether an element is navigation, script, ad, or similar boilerplate.
fn is_chrome(el: ElementRef<'_>) -> bool {
    let value = el.value();
    if SKIP_TAGS.contains(&value.name()) {
        return true;
    }

    let id = value.id().unwrap_or("");
    has_marker(id) || value.classes().any(has_marker)
}

/// Whether any `-`/`_`-separated token of a class or id is a boilerplate marker.
fn has_marker(name: &str) -> bool {
    name.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .any(|token| {
            BOILERPLATE_MARKERS
                .iter()
                .any(|m| token.eq_ignore_ascii_case(m))
        })
}

/// Extract a headline from meta tags, known headline elements, `<h1>`, or `<title>`.
pub fn extract_title(doc: &Html) -> Option<String> {
    for (sel, attr) in TITLE_SELS.iter() {
        let Some(el) = doc.select(sel).next() else {
            continue;
        };
        let raw = match attr {
            Some(attr) => el.value().attr(attr).unwrap_or("").to_string(),
            None => el.text().collect::<String>(),
        };
        let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if !title.is_empty() {
            return Some(title);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_naver_article_body() {
        let html = r#"<html><head>
            <meta property="og:title" content="Central bank holds rates">
            </head><body>
            <nav><a href="/">Home</a><a href="/economy">Economy</a></nav>
            <h2 class="media_end_head_headline">Central bank holds rates</h2>
            <article id="dic_area">
                <p>The central bank kept its benchmark rate unchanged on Thursday.</p>
                <div class="share_area">Share on social</div>
                <p>Officials cited   persistent inflation.</p>
            </article>
            <footer>Copyright 2025</footer>
        </body></html>"#;

        let article = extract_article(html);
        assert_eq!(article.title.as_deref(), Some("Central bank holds rates"));
        assert_eq!(
            article.text,
            "The central bank kept its benchmark rate unchanged on Thursday.\nOfficials cited persistent inflation."
        );
    }

    #[test]
    fn strips_scripts_and_styles() {
        let html = r#"<html><body><main>
            <script>window.analytics = {};</script>
            <style>.x { color: red }</style>
            <p>Visible text only.</p>
        </main></body></html>"#;

        let text = extract(html);
        assert_eq!(text, "Visible text only.");
        assert!(!text.contains("analytics"));
    }

    #[test]
    fn falls_back_to_body_without_container() {
        let html = "<html><body><header>Site</header><p>Body paragraph.</p><aside>Ads</aside></body></html>";
        assert_eq!(extract(html), "Body paragraph.");
    }

    #[test]
    fn skips_empty_container_for_next_match() {
        let html = r#"<html><body>
            <article id="dic_area">   </article>
            <main><p>Real content lives here.</p></main>
        </body></html>"#;
        assert_eq!(extract(html), "Real content lives here.");
    }

    #[test]
    fn malformed_markup_is_best_effort() {
        let html = "<div><p>Unclosed paragraph <b>bold <i>mixed</div> tail";
        let text = extract(html);
        assert!(text.contains("Unclosed paragraph"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn empty_input_yields_empty_text() {
        assert_eq!(extract(""), "");
        assert_eq!(extract("<html><body><nav>menu</nav></body></html>"), "");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(extract("just   some\n\n text"), "just some\ntext");
    }

    #[test]
    fn token_markers_keep_lookalike_classes() {
        let html = r#"<html><body><article>
            <p class="lead-paragraph">The lead paragraph survives.</p>
            <div class="shareholder-letter">Shareholders were told in March.</div>
            <div id="commentary-body">The commentary follows.</div>
            <div class="ad-slot">Buy now</div>
            <div class="article_share">Share on social</div>
        </article></body></html>"#;

        let text = extract(html);
        assert_eq!(
            text,
            "The lead paragraph survives.\nShareholders were told in March.\nThe commentary follows."
        );
    }

    #[test]
    fn deeply_nested_markup_does_not_overflow() {
        const DEPTH: usize = 50_000;
        let html = format!(
            "<html><body><article>{}deep text{}</article></body></html>",
            "<span>".repeat(DEPTH),
            "</span>".repeat(DEPTH)
        );

        let text = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || extract(&html))
            .expect("spawn")
            .join()
            .expect("extraction thread");
        assert_eq!(text, "deep text");
    }

    #[test]
    fn title_falls_back_to_h1_then_title_tag() {
        let doc = Html::parse_document("<html><head><title>Tab Title</title></head><body><h1> Page  Heading </h1></body></html>");
        assert_eq!(extract_title(&doc).as_deref(), Some("Page Heading"));

        let doc = Html::parse_document("<html><head><title>Tab Title</title></head><body></body></html>");
        assert_eq!(extract_title(&doc).as_deref(), Some("Tab Title"));

        let doc = Html::parse_document("<p>no title</p>");
        assert_eq!(extract_title(&doc), None);
    }
}
