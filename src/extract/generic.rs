use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{
    collect_paragraphs, datetime_of, element_text, first_element, looks_like_news, meta_content,
    normalize_url, selector, ArticleContent, NewsItem, SourceStrategy,
};

static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static MAIN: Lazy<Selector> = Lazy::new(|| selector("main"));
static META_AUTHOR: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="author"]"#));
static META_PUBLISHED: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="article:published_time"]"#));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time"));

/// Allow-listed sources without rules of their own.
pub struct Generic;

impl SourceStrategy for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn extract_article(&self, document: &Html, title: String) -> ArticleContent {
        let content = first_element(document, &[&*ARTICLE, &*MAIN])
            .map(|container| collect_paragraphs(container, |_| true))
            .unwrap_or_default();

        ArticleContent {
            title,
            content,
            author: meta_content(document, &META_AUTHOR),
            date: meta_content(document, &META_PUBLISHED)
                .or_else(|| first_element(document, &[&*TIME]).and_then(datetime_of)),
        }
    }

    /// Nothing source-specific; the anchor scan that follows every
    /// strategy covers it.
    fn extract_listing(&self, _document: &Html, _base: &Url) -> Vec<NewsItem> {
        Vec::new()
    }
}

/// Every anchor with text that passes [`looks_like_news`].
pub fn scan_anchors(document: &Html, base: &Url) -> Vec<NewsItem> {
    document
        .select(&ANCHOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href");
            let title = element_text(anchor);
            if title.is_empty() || !looks_like_news(href, &title) {
                return None;
            }
            NewsItem::new(&title, normalize_url(base, href)?)
        })
        .collect()
}
