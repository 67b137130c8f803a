//! Turning fetched pages into news items.
//!
//! Each known source gets a [`SourceStrategy`]; anything else on the
//! allow-list is handled by [`generic::Generic`]. Listing pages run a ladder
//! of strategies and the first non-empty result wins:
//!
//! 1. a structured JSON payload ([`payload`])
//! 2. the source's own DOM strategy
//! 3. a scan of every anchor that looks like news

pub mod dailyforex;
pub mod generic;
pub mod investing;
pub mod json_ld;
pub mod payload;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Article bodies at or below this many characters are treated as a
/// blocked or restructured page.
pub const MIN_ARTICLE_CHARS: usize = 100;

/// Paragraphs at or below this many characters are dropped from bodies.
pub const MIN_PARAGRAPH_CHARS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl NewsItem {
    /// Returns `None` when the trimmed title or the link is empty.
    pub fn new(title: &str, link: String) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() || link.is_empty() {
            debug!(%link, "dropping candidate without title or link");
            return None;
        }
        Some(NewsItem {
            title: title.to_string(),
            link,
            summary: None,
            content: None,
            author: None,
            date: None,
        })
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self
    }
}

/// The full text of a single article page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArticleContent {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

impl ArticleContent {
    pub fn into_item(self, link: String) -> NewsItem {
        NewsItem {
            title: self.title,
            link,
            summary: None,
            content: Some(self.content),
            author: self.author,
            date: self.date,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Could not extract article content. The page might be protected or have a different structure.")]
    ContentTooShort { chars: usize },
}

/// Site-specific extraction rules.
pub trait SourceStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Pulls the body, author and date. `title` is the page-level title
    /// already resolved from `og:title` or the first heading.
    fn extract_article(&self, document: &Html, title: String) -> ArticleContent;

    fn extract_listing(&self, document: &Html, base: &Url) -> Vec<NewsItem>;
}

static STRATEGIES: &[(&str, &dyn SourceStrategy)] = &[
    ("investing.com", &investing::Investing),
    ("dailyforex.com", &dailyforex::DailyForex),
];

pub fn strategy_for(domain: &str) -> &'static dyn SourceStrategy {
    let domain = domain.to_lowercase();
    STRATEGIES
        .iter()
        .find(|(key, _)| domain.contains(*key))
        .map(|(_, strategy)| *strategy)
        .unwrap_or(&generic::Generic)
}

static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));

#[instrument(level = "debug", skip(document))]
pub fn extract_article(document: &Html, domain: &str) -> Result<ArticleContent, ExtractionError> {
    let strategy = strategy_for(domain);
    let article = strategy.extract_article(document, page_title(document));

    let chars = article.content.chars().count();
    info!(
        strategy = strategy.name(),
        title_chars = article.title.chars().count(),
        content_chars = chars,
        "Extracted article"
    );

    if chars <= MIN_ARTICLE_CHARS {
        warn!(chars, "Article content too short");
        return Err(ExtractionError::ContentTooShort { chars });
    }
    Ok(article)
}

#[instrument(level = "debug", skip(body, source))]
pub fn extract_listing(body: &str, content_type: &str, source: &Url, domain: &str) -> Vec<NewsItem> {
    if payload::looks_like_json(body, content_type) {
        let items = payload::extract(body, source);
        if !items.is_empty() {
            info!(count = items.len(), "Listing extracted from JSON payload");
            return items;
        }
    }

    let document = Html::parse_document(body);
    let strategy = strategy_for(domain);
    let items = strategy.extract_listing(&document, source);
    if !items.is_empty() {
        info!(strategy = strategy.name(), count = items.len(), "Listing extracted");
        return items;
    }

    let items = generic::scan_anchors(&document, source);
    info!(count = items.len(), "Listing extracted by anchor scan");
    items
}

/// `og:title`, then the first `h1`, then the document `<title>`.
pub fn page_title(document: &Html) -> String {
    document
        .select(&OG_TITLE)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| first_text(document, &[&*H1]))
        .or_else(|| first_text(document, &[&*TITLE]))
        .unwrap_or_default()
}

static NEWS_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/article|/story|/press|/analysis|/articles/").expect("valid regex"));
static NEWS_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)news|article|press|analysis|report|headline").expect("valid regex"));

/// Best-effort guess whether an anchor points at a news story.
pub fn looks_like_news(href: Option<&str>, text: &str) -> bool {
    let href = href.unwrap_or_default();
    if href.is_empty() && text.is_empty() {
        return false;
    }
    let lowered = href.to_lowercase();
    if lowered.contains("/news") || NEWS_HREF.is_match(&lowered) {
        return true;
    }
    NEWS_TEXT.is_match(text)
}

/// Resolves `href` against the page URL. Empty or malformed hrefs yield
/// `None`.
pub fn normalize_url(base: &Url, href: Option<&str>) -> Option<String> {
    let href = href.filter(|h| !h.is_empty())?;
    match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!(href, error = %e, "dropping unresolvable link");
            None
        }
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First element matching any of `selectors`, tried in order.
pub(crate) fn first_element<'a>(document: &'a Html, selectors: &[&Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| document.select(s).next())
}

pub(crate) fn first_text(document: &Html, selectors: &[&Selector]) -> Option<String> {
    first_element(document, selectors)
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// `datetime` attribute of a time-like element, else its text.
pub(crate) fn datetime_of(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("datetime")
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| Some(element_text(element)).filter(|t| !t.is_empty()))
}

pub(crate) fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

/// Paragraph texts inside `container` longer than [`MIN_PARAGRAPH_CHARS`]
/// and accepted by `keep`, joined by blank lines.
pub(crate) fn collect_paragraphs<F>(container: ElementRef<'_>, keep: F) -> String
where
    F: Fn(&str) -> bool,
{
    container
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS && keep(text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.dailyforex.com/forex-news").unwrap()
    }

    #[test]
    fn news_heuristic_matches_paths_and_text() {
        assert!(looks_like_news(Some("/news/eurusd"), ""));
        assert!(looks_like_news(Some("/forex-articles/articles/x"), "Read"));
        assert!(looks_like_news(Some("/Story/123"), "More"));
        assert!(looks_like_news(Some("/markets"), "Weekly Analysis"));
        assert!(looks_like_news(None, "Top headline"));
        assert!(!looks_like_news(Some("/about-us"), "About"));
        assert!(!looks_like_news(None, ""));
    }

    #[test]
    fn normalize_resolves_relative_links() {
        assert_eq!(
            normalize_url(&base(), Some("/forex-news/2024/01/eurusd")).as_deref(),
            Some("https://www.dailyforex.com/forex-news/2024/01/eurusd")
        );
        assert_eq!(
            normalize_url(&base(), Some("https://other.example/a")).as_deref(),
            Some("https://other.example/a")
        );
    }

    #[test]
    fn normalize_drops_empty_and_malformed() {
        assert_eq!(normalize_url(&base(), None), None);
        assert_eq!(normalize_url(&base(), Some("")), None);
        assert_eq!(normalize_url(&base(), Some("http://[::1")), None);
    }

    #[test]
    fn news_item_requires_title_and_link() {
        assert!(NewsItem::new("  ", "https://x.test/a".into()).is_none());
        assert!(NewsItem::new("Title", String::new()).is_none());
        let item = NewsItem::new("  EUR/USD rallies ", "https://x.test/a".into()).unwrap();
        assert_eq!(item.title, "EUR/USD rallies");
    }

    #[test]
    fn blank_summary_is_dropped() {
        let item = NewsItem::new("T", "https://x.test/a".into())
            .unwrap()
            .with_summary(Some("  ".into()));
        assert_eq!(item.summary, None);
    }

    #[test]
    fn title_prefers_og_then_h1_then_title() {
        let doc = Html::parse_document(
            r#"<html><head><title>Doc</title><meta property="og:title" content="OG"></head><body><h1>Heading</h1></body></html>"#,
        );
        assert_eq!(page_title(&doc), "OG");

        let doc = Html::parse_document("<html><head><title>Doc</title></head><body><h1> Heading </h1></body></html>");
        assert_eq!(page_title(&doc), "Heading");

        let doc = Html::parse_document("<html><head><title>Doc</title></head><body></body></html>");
        assert_eq!(page_title(&doc), "Doc");
    }

    #[test]
    fn strategy_lookup_by_host_substring() {
        assert_eq!(strategy_for("www.investing.com").name(), "investing.com");
        assert_eq!(strategy_for("m.DailyForex.com").name(), "dailyforex.com");
        assert_eq!(strategy_for("www.fxstreet.com").name(), "generic");
    }

    #[test]
    fn short_article_is_an_extraction_error() {
        let doc = Html::parse_document(
            "<html><body><article><p>This paragraph is a little over twenty characters.</p></article></body></html>",
        );
        let err = extract_article(&doc, "www.investing.com").unwrap_err();
        assert!(matches!(err, ExtractionError::ContentTooShort { .. }));
    }

    #[test]
    fn listing_ladder_prefers_json_payload() {
        let body = r#"{"items":[{"href":"/news/a","titleText":"EUR/USD steady"}]}"#;
        let items = extract_listing(body, "application/json", &base(), "www.dailyforex.com");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://www.dailyforex.com/news/a");
    }

    #[test]
    fn listing_falls_back_to_anchor_scan() {
        let body = r#"<html><body>
            <a href="/forex-news/2024/eur">EUR/USD news today</a>
            <a href="/contact">Contact</a>
        </body></html>"#;
        let items = extract_listing(body, "text/html", &base(), "www.fxstreet.com");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "EUR/USD news today");
    }

    #[test]
    fn listing_extraction_is_deterministic() {
        let body = r#"<html><body>
            <a href="/news/one">First news</a>
            <a href="/analysis/two">Second</a>
            <a href="/press/three">Third</a>
        </body></html>"#;
        let first = extract_listing(body, "text/html", &base(), "www.fxstreet.com");
        let second = extract_listing(body, "text/html", &base(), "www.fxstreet.com");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
