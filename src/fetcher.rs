//! Outbound page fetching.
//!
//! A [`Transport`] performs exactly one GET; [`retry`] wraps any attempt
//! closure with the backoff policy so the loop can be exercised without a
//! network. [`fetch_with_retry`] glues the two together for the handler.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119 Safari/537.36",
];

/// What came back from a single GET.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.status, 403 | 429)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Connection(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Terminal non-2xx status returned by the target.
    #[error("{0}")]
    Status(u16),

    /// Every attempt was answered with 403/429.
    #[error("{0}")]
    RateLimited(u16),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no fetch attempts were made")]
    NoAttempts,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// Why an attempt did not produce a usable response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryReason {
    Network,
    RateLimited,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay and maximum jitter for a failed attempt.
    pub fn window(reason: RetryReason) -> (Duration, Duration) {
        match reason {
            RetryReason::Network => (Duration::from_millis(500), Duration::from_millis(800)),
            RetryReason::RateLimited => (Duration::from_millis(1000), Duration::from_millis(2000)),
        }
    }

    pub fn delay(&self, reason: RetryReason) -> Duration {
        let (base, jitter) = Self::window(reason);
        let jitter_ms: u64 = rand::rng().random_range(0..=jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Runs `attempt` until it yields a response that is not rate limited, or
/// the policy's attempt budget is spent.
///
/// Non-2xx statuses other than 403/429 are handed back as `Ok` so the
/// caller decides what they mean.
pub async fn retry<F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<RawResponse, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<RawResponse, TransportError>>,
{
    let mut last_err = None;

    for index in 0..policy.max_attempts() {
        let is_last = index + 1 == policy.max_attempts();

        let reason = match attempt(index).await {
            Ok(response) if response.is_rate_limited() => {
                warn!(status = response.status, attempt = index + 1, "Rate limited");
                last_err = Some(FetchError::RateLimited(response.status));
                RetryReason::RateLimited
            }
            Ok(response) => return Ok(response),
            Err(e) => {
                warn!(error = %e, attempt = index + 1, "Fetch attempt failed");
                last_err = Some(FetchError::Transport(e));
                RetryReason::Network
            }
        };

        if !is_last {
            let delay = policy.delay(reason);
            debug!(?delay, ?reason, "Backing off before next attempt");
            sleep(delay).await;
        }
    }

    Err(last_err.unwrap_or(FetchError::NoAttempts))
}

#[instrument(level = "info", skip_all, fields(url = %url))]
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<RawResponse, FetchError> {
    let t0 = Instant::now();
    let result = retry(policy, |_| transport.get(url)).await;

    match &result {
        Ok(response) => info!(
            status = response.status,
            bytes = response.body.len(),
            content_type = %response.content_type,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        ),
        Err(e) => warn!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Fetch gave up"),
    }
    result
}

/// Headers a desktop browser sends on a top-level navigation.
///
/// `Accept-Encoding` is left to reqwest, which advertises gzip, deflate and
/// br and decodes the body for us.
pub fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(header::USER_AGENT, value);
    }
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS.choose(&mut rand::rng()).copied().unwrap_or(USER_AGENTS[0])
}

/// Production transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let user_agent = random_user_agent();
        debug!(%url, user_agent, "Sending GET");

        let response = self
            .client
            .get(url.as_str())
            .headers(browser_headers(user_agent))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
