// 限流记录存储

pub mod models;
pub mod operations;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

pub use models::rate_limit::RateLimitRecord;
pub use operations::memory::MemoryRateLimitStore;
pub use operations::redis::RedisRateLimitStore;

/// Fixed-window counter storage keyed by client identity.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts one request for `key` and reports whether it is allowed.
    ///
    /// Starts a fresh window when none exists or the current one has ended.
    /// A denied request leaves the record untouched.
    async fn increment_or_reset(
        &self,
        key: &str,
        window: Duration,
        capacity: u32,
    ) -> Result<bool, AppError>;

    /// Drops records whose window ended more than `max_idle` ago.
    async fn evict_stale(&self, _max_idle: Duration) -> usize {
        0
    }
}
