use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header, HeaderName, Method},
    routing::{post, MethodRouter},
    Router,
};
use scraper::Html;
use tower_http::cors::{Any, CorsLayer};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn, Span};

use crate::api::models::ScrapeRequest;
use crate::assemble::{assemble, ScrapeResult};
use crate::classifier::{classify, PageKind};
use crate::error::{AppError, Result};
use crate::extract::{self, ExtractionError};
use crate::fetcher::{fetch_with_retry, FetchError, RawResponse, RetryPolicy};
use crate::target::{parse_target, Target};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    // OPTIONS never reaches the router: the CORS layer answers it.
    let scrape: MethodRouter<AppState> = post(scrape_handler).fallback(method_not_allowed);

    Router::new()
        .route("/scrape", scrape.clone())
        .route("/api/scrape", scrape)
        .layer(cors_layer())
        .with_state(app_state)
}

/// The dashboard calls from another origin and sends Supabase-style
/// auth headers along with the JSON body.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
        .max_age(Duration::from_secs(86400))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn scrape_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ScrapeResult>> {
    let start_time = Instant::now();

    let req: ScrapeRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("invalid json body".to_string()))?;

    let result = process_scrape_request(&state, &req).await;

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    match &result {
        Ok(res) => info!(url = %res.url, count = res.count, elapsed_ms, "Scrape succeeded"),
        Err(err) => warn!(status = err.status().as_u16(), error = %err, elapsed_ms, "Scrape failed"),
    }

    result.map(Json)
}

#[instrument(level = "info", skip_all)]
async fn process_scrape_request(state: &AppState, req: &ScrapeRequest) -> Result<ScrapeResult> {
    // Allow-list is checked before any outbound traffic.
    let target = parse_target(req.url.as_deref().unwrap_or_default(), &state.config.allowed_domains)?;
    let kind = classify(&target.url);
    info!(url = %target.raw, domain = %target.domain, ?kind, "Processing scrape request");

    let policy = RetryPolicy::new(state.config.max_attempts);
    let response = fetch_with_retry(state.transport.as_ref(), &target.url, &policy).await?;
    if !response.is_success() {
        return Err(FetchError::Status(response.status).into());
    }

    // Parsing is CPU-bound and `Html` is not `Send`; keep it off the runtime.
    let span = Span::current();
    let result = tokio::task::spawn_blocking(move || span.in_scope(|| extract_page(kind, target, response)))
        .await??;

    Ok(result)
}

/// Runs the article or listing extractor over a fetched page.
pub fn extract_page(
    kind: PageKind,
    target: Target,
    response: RawResponse,
) -> std::result::Result<ScrapeResult, ExtractionError> {
    match kind {
        PageKind::Article => {
            let document = Html::parse_document(&response.body);
            let article = extract::extract_article(&document, &target.domain)?;
            let item = article.into_item(target.raw.clone());
            Ok(ScrapeResult::single(target.raw, target.domain, item))
        }
        PageKind::Listing => {
            let items = extract::extract_listing(
                &response.body,
                &response.content_type,
                &target.url,
                &target.domain,
            );
            Ok(assemble(target.raw, target.domain, items))
        }
    }
}
