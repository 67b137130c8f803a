use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Article,
    Listing,
}

static ARTICLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/news/forex-news/[^/]+$",
        r"/forex-technical-analysis/\d{4}/\d{2}/",
        r"/articles/",
        r"/analysis/",
        r"-\d{5,}$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Decides from the URL path alone whether the page is a single article.
pub fn classify(url: &Url) -> PageKind {
    let path = url.path();
    if ARTICLE_PATTERNS.iter().any(|re| re.is_match(path)) {
        PageKind::Article
    } else {
        PageKind::Listing
    }
}
