//! investing.com: article pages keep their body in `div#article`, listings
//! mark headline anchors with `data-test="article-title-link"`.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{
    collect_paragraphs, datetime_of, element_text, first_element, first_text, looks_like_news,
    normalize_url, selector, ArticleContent, NewsItem, SourceStrategy,
};

static ARTICLE_DIV: Lazy<Selector> = Lazy::new(|| selector("div#article"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static PROVIDER_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[data-test="article-provider-link"]"#));
static AUTHOR_NAME: Lazy<Selector> = Lazy::new(|| selector(".author-name"));
static REL_AUTHOR: Lazy<Selector> = Lazy::new(|| selector(r#"[rel="author"]"#));
static PUBLISH_TIME: Lazy<Selector> = Lazy::new(|| selector(r#"time[data-test="article-publish-date"]"#));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time"));

static HEADLINE_ANCHORS: Lazy<Selector> =
    Lazy::new(|| selector(r#"a[data-test="article-title-link"], a[class*="title"], article a"#));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[data-test="article-title-link"]"#));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));

pub struct Investing;

impl SourceStrategy for Investing {
    fn name(&self) -> &'static str {
        "investing.com"
    }

    fn extract_article(&self, document: &Html, title: String) -> ArticleContent {
        let content = first_element(document, &[&*ARTICLE_DIV, &*ARTICLE])
            .map(|container| {
                collect_paragraphs(container, |text| !text.to_lowercase().contains("advertisement"))
            })
            .unwrap_or_default();

        let author = first_text(document, &[&*PROVIDER_LINK, &*AUTHOR_NAME, &*REL_AUTHOR]);
        let date = first_element(document, &[&*PUBLISH_TIME, &*TIME]).and_then(datetime_of);

        ArticleContent {
            title,
            content,
            author,
            date,
        }
    }

    fn extract_listing(&self, document: &Html, base: &Url) -> Vec<NewsItem> {
        let items: Vec<NewsItem> = document
            .select(&HEADLINE_ANCHORS)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href");
                let title = element_text(anchor);
                if title.is_empty() {
                    return None;
                }
                let link = normalize_url(base, href)?;
                if !looks_like_news(href, &title) && !link.contains("/news") {
                    return None;
                }
                NewsItem::new(&title, link)
            })
            .collect();
        if !items.is_empty() {
            return items;
        }

        // Card layouts without recognisable anchors: first link per <article>.
        document
            .select(&ARTICLE)
            .filter_map(|block| {
                let anchor = block
                    .select(&TITLE_LINK)
                    .next()
                    .or_else(|| block.select(&ANCHOR).next())?;
                let link = normalize_url(base, anchor.value().attr("href"))?;
                NewsItem::new(&element_text(anchor), link)
            })
            .collect()
    }
}
