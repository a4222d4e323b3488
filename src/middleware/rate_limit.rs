use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;

use crate::{cache::RateLimitStore, config::Config, error::AppError};

/// Fixed-window limiter in front of the search route.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window: Duration,
    max_requests: u32,
    sweep_windows: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &Config) -> Self {
        Self {
            store,
            window: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
            sweep_windows: config.rate_limit_sweep_windows,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn check_rate_limit(&self, client_key: &str) -> Result<bool, AppError> {
        self.store
            .increment_or_reset(client_key, self.window, self.max_requests)
            .await
    }

    /// Removes counters idle for longer than the configured number of windows.
    pub async fn evict_stale(&self) -> usize {
        let max_idle = self.window.saturating_mul(self.sweep_windows);
        self.store.evict_stale(max_idle).await
    }

    /// Runs [`evict_stale`](Self::evict_stale) once per window. Returns `None` when sweeping is disabled.
    pub fn spawn_sweeper(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.sweep_windows == 0 || self.window.is_zero() {
            return None;
        }

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.window);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = self.evict_stale().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "evicted idle rate limit records");
                }
            }
        }))
    }
}

/// Derives the client key: `x-real-ip`, then the first `x-forwarded-for`
/// entry, then the socket peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let remote_ip = peer.map(|addr| addr.ip().to_string());

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let key = client_key(req.headers(), peer);

    match limiter.check_rate_limit(&key).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!(client = %key, "rate limit exceeded");
            AppError::RateLimited.into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryRateLimitStore;
    use axum::http::HeaderValue;

    fn limiter(max_requests: u32, sweep_windows: u32) -> (Arc<MemoryRateLimitStore>, RateLimiter) {
        let store = Arc::new(MemoryRateLimitStore::new());
        let config = Config {
            rate_limit_requests: max_requests,
            rate_limit_sweep_windows: sweep_windows,
            ..Config::default()
        };
        (store.clone(), RateLimiter::new(store, &config))
    }

    #[test]
    fn prefers_real_ip_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_key(&headers, None), "198.51.100.1");
    }

    #[test]
    fn falls_back_to_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" , 203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers, None), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "192.0.2.5:55000".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "192.0.2.5");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn thirty_first_request_in_window_is_denied() {
        let (_, limiter) = limiter(30, 5);

        for _ in 0..30 {
            assert!(limiter.check_rate_limit("client").await.unwrap());
        }
        assert!(!limiter.check_rate_limit("client").await.unwrap());

        tokio::time::advance(limiter.window() + Duration::from_millis(1)).await;
        assert!(limiter.check_rate_limit("client").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_idle_clients() {
        let (store, limiter) = limiter(30, 1);
        let limiter = Arc::new(limiter);
        limiter.check_rate_limit("idle").await.unwrap();

        let handle = limiter.clone().spawn_sweeper().unwrap();
        tokio::time::sleep(limiter.window() * 4).await;

        assert!(store.is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn extreme_settings_do_not_overflow() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let config = Config {
            rate_limit_window_secs: u64::MAX,
            rate_limit_requests: 1,
            rate_limit_sweep_windows: u32::MAX,
            ..Config::default()
        };
        let limiter = RateLimiter::new(store.clone(), &config);

        assert!(limiter.check_rate_limit("client").await.unwrap());
        assert!(!limiter.check_rate_limit("client").await.unwrap());
        assert_eq!(limiter.evict_stale().await, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweeper_disabled_with_zero_windows() {
        let (_, limiter) = limiter(30, 0);
        assert!(Arc::new(limiter).spawn_sweeper().is_none());
    }
}
