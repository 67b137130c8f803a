//! Listing endpoints that answer with JSON instead of HTML.

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{normalize_url, NewsItem};

type Locator = fn(&Value) -> Option<&Vec<Value>>;

/// Places an item array is known to live, probed in order.
const LOCATORS: &[(&str, Locator)] = &[
    ("items", items_at_root),
    ("page.items", items_under_page),
    ("$", root_array),
];

const HREF_KEYS: &[&str] = &["href", "url", "link"];
const TITLE_KEYS: &[&str] = &["titleText", "title", "name"];

fn items_at_root(value: &Value) -> Option<&Vec<Value>> {
    value.get("items")?.as_array()
}

fn items_under_page(value: &Value) -> Option<&Vec<Value>> {
    value.get("page")?.get("items")?.as_array()
}

fn root_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

pub fn looks_like_json(body: &str, content_type: &str) -> bool {
    let trimmed = body.trim_start();
    content_type.to_lowercase().contains("application/json")
        || trimmed.starts_with('{')
        || trimmed.starts_with('[')
}

/// Items from the first locator that yields any. Bodies that are not
/// valid JSON yield nothing.
pub fn extract(body: &str, base: &Url) -> Vec<NewsItem> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "body is not JSON");
            return Vec::new();
        }
    };

    for (name, locate) in LOCATORS {
        let Some(candidates) = locate(&value) else {
            continue;
        };
        let items: Vec<NewsItem> = candidates.iter().filter_map(|c| candidate(c, base)).collect();
        if !items.is_empty() {
            debug!(locator = name, count = items.len(), "JSON locator matched");
            return items;
        }
    }
    Vec::new()
}

fn candidate(value: &Value, base: &Url) -> Option<NewsItem> {
    let href = HREF_KEYS
        .iter()
        .filter_map(|key| value.get(*key)?.as_str())
        .find(|s| !s.is_empty())?;
    let title = TITLE_KEYS
        .iter()
        .filter_map(|key| scalar_text(value.get(*key)?))
        .find(|s| !s.trim().is_empty())?;

    NewsItem::new(&title, normalize_url(base, Some(href))?)
}

/// Strings as-is, numbers and booleans rendered.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
