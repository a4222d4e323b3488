use std::time::Duration;

use tokio::time::Instant;

use crate::config::MAX_RATE_LIMIT_WINDOW_SECS;

/// 速率限制记录
#[derive(Debug, Clone)]
pub struct RateLimitRecord {
    pub key: String,
    pub count: u32,
    pub window_reset_at: Instant,
}

impl RateLimitRecord {
    pub fn new(key: &str, now: Instant, window: Duration) -> Self {
        Self {
            key: key.to_string(),
            count: 1,
            window_reset_at: window_end(now, window),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.window_reset_at
    }

    pub fn reset(&mut self, now: Instant, window: Duration) {
        self.count = 1;
        self.window_reset_at = window_end(now, window);
    }
}

// 窗口上限为一天
fn window_end(now: Instant, window: Duration) -> Instant {
    let window = window.min(Duration::from_secs(MAX_RATE_LIMIT_WINDOW_SECS));
    now.checked_add(window).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn huge_window_is_capped_at_one_day() {
        let now = Instant::now();
        let record = RateLimitRecord::new("k", now, Duration::MAX);
        assert_eq!(
            record.window_reset_at,
            now + Duration::from_secs(MAX_RATE_LIMIT_WINDOW_SECS)
        );
        assert!(!record.is_expired(now));
    }
}
