use std::sync::Arc;

use config::Config;
use infrastructure::UpstreamClient;

pub mod cache;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod utils;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let upstream = UpstreamClient::new(Arc::clone(&config))?;
        Ok(Self { config, upstream })
    }
}
