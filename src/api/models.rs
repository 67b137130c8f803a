use serde::Deserialize;

/// Body of `POST /scrape`.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
}
