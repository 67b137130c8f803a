//! Validation of the URL a client asks us to scrape.
//!
//! The allow-list check is what keeps the service from being used as an
//! open proxy, so it runs before any network I/O.

use url::Url;

use crate::error::{AppError, Result};

/// Hostname substrings the service is permitted to fetch from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowList {
    domains: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        AllowList { domains }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Substring match against the hostname, so subdomains such as
    /// `www.` and `m.` are covered.
    pub fn permits(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.domains.iter().any(|d| host.contains(d.as_str()))
    }
}

/// A validated scrape target.
#[derive(Clone, Debug)]
pub struct Target {
    /// The trimmed URL as submitted; echoed back in responses.
    pub raw: String,
    pub url: Url,
    pub domain: String,
}

pub fn parse_target(raw: &str, allowed: &AllowList) -> Result<Target> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("url is required".to_string()));
    }

    let url = Url::parse(raw).map_err(|_| AppError::Validation("invalid url".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation("invalid url".to_string()));
    }
    let domain = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(AppError::Validation("invalid url".to_string())),
    };

    if !allowed.permits(&domain) {
        return Err(AppError::Validation("domain not allowed".to_string()));
    }

    Ok(Target {
        raw: raw.to_string(),
        url,
        domain,
    })
}
