use std::sync::Arc;

use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;
use crate::routes::search::ValidatedSearchQuery;

pub const SEARCH_REGION: &str = "us";
pub const SEARCH_LANGUAGE: &str = "en";
pub const SEARCH_ZOOM: u8 = 13;

/// Request body of the upstream local business search endpoint.
///
/// One query per call, even though the provider accepts a batch.
#[derive(Debug, Serialize)]
pub struct UpstreamSearchBody<'a> {
    pub queries: [&'a str; 1],
    pub limit: u32,
    pub region: &'static str,
    pub language: &'static str,
    pub coordinates: &'a str,
    pub zoom: u8,
    pub dedup: bool,
}

impl<'a> UpstreamSearchBody<'a> {
    pub fn new(query: &'a ValidatedSearchQuery) -> Self {
        Self {
            queries: [query.query.as_str()],
            limit: query.limit,
            region: SEARCH_REGION,
            language: SEARCH_LANGUAGE,
            coordinates: query.coordinates.as_str(),
            zoom: SEARCH_ZOOM,
            dedup: true,
        }
    }
}

/// Proxy to the third-party business data API. Makes exactly one attempt per call.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    config: Arc<Config>,
}

impl UpstreamClient {
    pub fn new(config: Arc<Config>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self::with_client(http, config))
    }

    /// Uses a caller-built HTTP client; its timeout settings are kept as-is.
    pub fn with_client(http: Client, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    pub fn search_url(&self) -> String {
        format!(
            "{}/search",
            self.config.upstream_base_url.trim_end_matches('/')
        )
    }

    pub async fn search(&self, query: &ValidatedSearchQuery) -> Result<Value, AppError> {
        let credentials = self.config.upstream_credentials()?;

        tracing::debug!(limit = query.limit, coordinates = %query.coordinates, "forwarding search upstream");

        let response = self
            .http
            .post(self.search_url())
            .header(CONTENT_TYPE, "application/json")
            .header("x-rapidapi-key", credentials.api_key)
            .header("x-rapidapi-host", credentials.api_host)
            .json(&UpstreamSearchBody::new(query))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "upstream search failed");

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AppError::UpstreamRateLimited);
            }
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout
            } else {
                AppError::Upstream {
                    status: status.as_u16(),
                    body: format!("undecodable response body: {e}"),
                }
            }
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout
    } else {
        AppError::Transport(e.without_url().to_string())
    }
}
