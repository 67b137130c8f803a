use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::extract::NewsItem;

/// Upper bound on items returned for a listing page.
pub const MAX_ITEMS: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub domain: String,
    pub count: usize,
    pub items: Vec<NewsItem>,
}

impl ScrapeResult {
    /// Response for a single article page; skips dedup and capping.
    pub fn single(url: String, domain: String, item: NewsItem) -> Self {
        ScrapeResult {
            url,
            domain,
            count: 1,
            items: vec![item],
        }
    }
}

/// Deduplicates by link (first occurrence wins) and caps at [`MAX_ITEMS`].
pub fn assemble(url: String, domain: String, items: Vec<NewsItem>) -> ScrapeResult {
    let mut seen = HashSet::new();
    let items: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| !item.link.is_empty() && seen.insert(item.link.clone()))
        .take(MAX_ITEMS)
        .collect();

    ScrapeResult {
        url,
        domain,
        count: items.len(),
        items,
    }
}
