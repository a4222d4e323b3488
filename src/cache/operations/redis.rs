use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{Client as RedisClient, Script};

use crate::cache::RateLimitStore;
use crate::error::AppError;

// KEYS[1] counter key, ARGV[1] window in ms, ARGV[2] capacity.
// Returns 1 when allowed, 0 when denied. A denial performs no write.
const INCREMENT_OR_RESET: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[2]) then
    return 0
end
current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return 1
"#;

/// Redis-backed rate-limit store for multi-instance deployments.
///
/// Window expiry is delegated to the key TTL, so no sweep is needed.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    redis: Arc<RedisClient>,
    script: Arc<Script>,
}

impl RedisRateLimitStore {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis: Arc::new(redis),
            script: Arc::new(Script::new(INCREMENT_OR_RESET)),
        }
    }

    pub fn open(url: &str) -> Result<Self, redis::RedisError> {
        Ok(Self::new(RedisClient::open(url)?))
    }

    pub fn counter_key(key: &str) -> String {
        format!("rate_limit:{}", key)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment_or_reset(
        &self,
        key: &str,
        window: Duration,
        capacity: u32,
    ) -> Result<bool, AppError> {
        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let allowed: i32 = self
            .script
            .key(Self::counter_key(key))
            .arg(window_ms)
            .arg(capacity)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        Ok(allowed == 1)
    }
}
