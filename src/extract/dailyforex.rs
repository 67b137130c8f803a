//! dailyforex.com publishes JSON-LD on both article and listing pages, so
//! structured data is preferred over the DOM wherever it is present.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::json_ld;
use super::{
    collect_paragraphs, first_element, first_text, generic, normalize_url, datetime_of,
    ArticleContent, NewsItem, SourceStrategy,
};

static CONTENT_BODY: Lazy<Selector> = Lazy::new(|| super::selector("div.content-body.article-content"));
static ARTICLE_CONTENT: Lazy<Selector> = Lazy::new(|| super::selector("div.article-content"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| super::selector("article"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| super::selector(r#"[rel="author"], .author-name"#));
static TIME: Lazy<Selector> = Lazy::new(|| super::selector("time"));

pub struct DailyForex;

impl SourceStrategy for DailyForex {
    fn name(&self) -> &'static str {
        "dailyforex.com"
    }

    fn extract_article(&self, document: &Html, title: String) -> ArticleContent {
        let content = first_element(document, &[&*CONTENT_BODY, &*ARTICLE_CONTENT, &*ARTICLE])
            .map(|container| collect_paragraphs(container, |_| true))
            .unwrap_or_default();

        let mut article = ArticleContent {
            title,
            content,
            author: first_text(document, &[&*AUTHOR]),
            date: first_element(document, &[&*TIME]).and_then(datetime_of),
        };

        let scripts = json_ld::scripts(document);
        let structured = scripts
            .iter()
            .flat_map(json_ld::nodes)
            .find(|node| json_ld::is_article(node));

        if let Some(node) = structured {
            if let Some(author) = json_ld::author_name(node) {
                article.author = Some(author);
            }
            if let Some(date) = json_ld::text_field(node, &["datePublished", "dateModified"]) {
                article.date = Some(date);
            }
            if article.title.is_empty() {
                article.title = json_ld::text_field(node, &["headline", "name"]).unwrap_or_default();
            }
        }
        article
    }

    fn extract_listing(&self, document: &Html, base: &Url) -> Vec<NewsItem> {
        let scripts = json_ld::scripts(document);
        let mut items = Vec::new();

        for node in scripts.iter().flat_map(json_ld::nodes) {
            if let Some(elements) = node.get("itemListElement").and_then(Value::as_array) {
                items.extend(elements.iter().filter_map(|el| list_element(el, base)));
            }
            if json_ld::is_article(node) {
                items.extend(article_node(node, base));
            }
        }

        if items.is_empty() {
            return generic::scan_anchors(document, base);
        }
        items
    }
}

/// A `ListItem`: the link lives on the element or on its nested `item`.
fn list_element(element: &Value, base: &Url) -> Option<NewsItem> {
    let nested = element.get("item");
    let link = json_ld::text_field(element, &["url", "@id"])
        .or_else(|| nested.and_then(json_ld::reference))?;
    let title = json_ld::text_field(element, &["name"])
        .or_else(|| nested.and_then(|item| json_ld::text_field(item, &["name", "headline"])))?;

    NewsItem::new(&title, normalize_url(base, Some(&link))?)
}

fn article_node(node: &Value, base: &Url) -> Option<NewsItem> {
    let link = json_ld::text_field(node, &["url"])
        .or_else(|| node.get("mainEntityOfPage").and_then(json_ld::reference))?;
    let title = json_ld::text_field(node, &["headline", "name"])?;
    let item = NewsItem::new(&title, normalize_url(base, Some(&link))?)?;

    Some(item.with_summary(json_ld::text_field(node, &["description"])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.dailyforex.com/forex-technical-analysis").unwrap()
    }

    #[test]
    fn article_prefers_json_ld_metadata() {
        let doc = Html::parse_document(
            r#"<html><head>
            <script type="application/ld+json">
            {"@context":"https://schema.org","@type":"NewsArticle","headline":"EUR/USD Forecast",
             "author":{"@type":"Person","name":"Christopher Lewis"},
             "datePublished":"2024-01-15T08:00:00+00:00"}
            </script></head><body>
            <a rel="author" href="/authors/x">Staff</a>
            <time datetime="2024-01-14">Yesterday</time>
            <div class="content-body article-content">
              <p>The EUR/USD pair fell during the trading session on Monday morning.</p>
              <p>Too short.</p>
              <p>Support at 1.09 should hold, while resistance sits near the 1.10 handle.</p>
            </div></body></html>"#,
        );

        let article = DailyForex.extract_article(&doc, String::new());
        assert_eq!(article.title, "EUR/USD Forecast");
        assert_eq!(article.author.as_deref(), Some("Christopher Lewis"));
        assert_eq!(article.date.as_deref(), Some("2024-01-15T08:00:00+00:00"));
        assert_eq!(
            article.content,
            "The EUR/USD pair fell during the trading session on Monday morning.\n\n\
             Support at 1.09 should hold, while resistance sits near the 1.10 handle."
        );
    }

    #[test]
    fn article_keeps_dom_title_and_metadata_without_json_ld() {
        let doc = Html::parse_document(
            r#"<html><body>
            <span class="author-name">Desk</span>
            <time datetime="2024-01-14T10:00:00Z"></time>
            <div class="article-content"><p>Advertisement paragraphs are kept on this site.</p></div>
            </body></html>"#,
        );
        let article = DailyForex.extract_article(&doc, "DOM Title".into());
        assert_eq!(article.title, "DOM Title");
        assert_eq!(article.author.as_deref(), Some("Desk"));
        assert_eq!(article.date.as_deref(), Some("2024-01-14T10:00:00Z"));
        assert_eq!(article.content, "Advertisement paragraphs are kept on this site.");
    }

    #[test]
    fn listing_reads_item_lists_and_articles() {
        let doc = Html::parse_document(
            r#"<html><head>
            <script type="application/ld+json">
            {"@type":"ItemList","itemListElement":[
              {"@type":"ListItem","position":1,"url":"/forex-technical-analysis/2024/01/15/eurusd","name":"EUR/USD analysis"},
              {"@type":"ListItem","position":2,"item":{"@id":"https://www.dailyforex.com/forex-technical-analysis/2024/01/15/gbpusd","name":"GBP/USD analysis"}},
              {"@type":"ListItem","position":3,"name":"No link"}
            ]}
            </script>
            <script type="application/ld+json">
            [{"@type":"NewsArticle","headline":"USD/JPY outlook","mainEntityOfPage":{"@id":"/usdjpy"},"description":"Yen weakens"}]
            </script>
            </head><body><a href="/news/ignored">Ignored news</a></body></html>"#,
        );

        let items = DailyForex.extract_listing(&doc, &base());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].link, "https://www.dailyforex.com/forex-technical-analysis/2024/01/15/eurusd");
        assert_eq!(items[1].title, "GBP/USD analysis");
        assert_eq!(items[2].link, "https://www.dailyforex.com/usdjpy");
        assert_eq!(items[2].summary.as_deref(), Some("Yen weakens"));
    }

    #[test]
    fn listing_without_json_ld_scans_anchors() {
        let doc = Html::parse_document(
            r#"<html><body>
            <a href="/forex-news/2024/01/eurusd">EUR/USD news</a>
            <a href="/brokers">Brokers</a>
            </body></html>"#,
        );
        let items = DailyForex.extract_listing(&doc, &base());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "EUR/USD news");
    }
}
