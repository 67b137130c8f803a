use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};
use forex_news_scraper::{
    config::Config,
    api::routes::create_router,
    fetcher::HttpTransport,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    info!(
        %server_addr,
        allowed = ?config.allowed_domains,
        max_attempts = config.max_attempts,
        "Starting server"
    );

    let transport = HttpTransport::new(&config)?;
    let app_state = AppState::new(config, Arc::new(transport));

    // Build the router with routes
    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    info!(%server_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
