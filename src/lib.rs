pub mod api;
pub mod assemble;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod target;

use std::sync::Arc;
use config::Config;
use fetcher::Transport;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        AppState {
            config: Arc::new(config),
            transport,
        }
    }
}
