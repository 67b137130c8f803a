//! Helpers for `<script type="application/ld+json">` blocks.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::selector;

static LD_JSON: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Every JSON-LD script on the page that parses. Broken scripts are skipped.
pub fn scripts(document: &Html) -> Vec<Value> {
    document
        .select(&LD_JSON)
        .filter_map(|script| {
            let text = script.text().collect::<String>();
            if text.trim().is_empty() {
                return None;
            }
            serde_json::from_str(&text)
                .map_err(|e| debug!(error = %e, "skipping malformed JSON-LD"))
                .ok()
        })
        .collect()
}

/// Flattens top-level arrays and `@graph` containers into a list of
/// objects, in document order.
pub fn nodes(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_nodes(value, &mut out);
    out
}

fn collect_nodes<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(values) => values.iter().for_each(|v| collect_nodes(v, out)),
        Value::Object(map) => {
            out.push(value);
            if let Some(graph) = map.get("@graph") {
                collect_nodes(graph, out);
            }
        }
        _ => {}
    }
}

pub fn has_type(node: &Value, wanted: &[&str]) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => wanted.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| wanted.contains(&t)),
        _ => false,
    }
}

pub fn is_article(node: &Value) -> bool {
    has_type(node, &["NewsArticle", "Article"])
}

/// First of `keys` holding a non-blank string.
pub fn text_field(node: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| node.get(*key)?.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// A string, or an object carrying `@id`.
pub fn reference(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(_) => text_field(value, &["@id", "url"]),
        _ => None,
    }
}

/// `author` as a plain string, a `Person` object, or a list of either.
pub fn author_name(node: &Value) -> Option<String> {
    fn one(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Object(_) => text_field(value, &["name"]),
            _ => None,
        }
    }

    match node.get("author")? {
        Value::Array(authors) => {
            let names: Vec<String> = authors.iter().filter_map(one).collect();
            if names.is_empty() { None } else { Some(names.join(", ")) }
        }
        other => one(other),
    }
}
