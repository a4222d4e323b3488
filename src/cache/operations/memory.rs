use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use crate::cache::{RateLimitRecord, RateLimitStore};
use crate::error::AppError;

/// Single-node rate-limit store.
///
/// Each key's increment-or-reset runs under the map's entry lock, so
/// concurrent requests from one client are all counted.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    records: DashMap<String, RateLimitRecord>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.get(key).map(|r| r.value().clone())
    }

    fn check(&self, key: &str, window: Duration, capacity: u32, now: Instant) -> bool {
        match self.records.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitRecord::new(key, now, window));
                true
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if record.is_expired(now) {
                    record.reset(now, window);
                    true
                } else if record.count < capacity {
                    record.count += 1;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment_or_reset(
        &self,
        key: &str,
        window: Duration,
        capacity: u32,
    ) -> Result<bool, AppError> {
        Ok(self.check(key, window, capacity, Instant::now()))
    }

    async fn evict_stale(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| {
            record
                .window_reset_at
                .checked_add(max_idle)
                .is_none_or(|idle_until| idle_until >= now)
        });
        before.saturating_sub(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn allows_up_to_capacity_then_denies() {
        let store = MemoryRateLimitStore::new();

        for _ in 0..30 {
            assert!(store.increment_or_reset("1.2.3.4", WINDOW, 30).await.unwrap());
        }
        assert!(!store.increment_or_reset("1.2.3.4", WINDOW, 30).await.unwrap());
        assert_eq!(store.get("1.2.3.4").unwrap().count, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn denial_does_not_mutate_record() {
        let store = MemoryRateLimitStore::new();
        store.increment_or_reset("k", WINDOW, 1).await.unwrap();
        let before = store.get("k").unwrap();

        assert!(!store.increment_or_reset("k", WINDOW, 1).await.unwrap());
        let after = store.get("k").unwrap();
        assert_eq!(after.count, before.count);
        assert_eq!(after.window_reset_at, before.window_reset_at);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_only_after_it_has_passed() {
        let store = MemoryRateLimitStore::new();
        for _ in 0..30 {
            store.increment_or_reset("k", WINDOW, 30).await.unwrap();
        }

        // At the exact boundary the window is still current.
        tokio::time::advance(WINDOW).await;
        assert!(!store.increment_or_reset("k", WINDOW, 30).await.unwrap());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.increment_or_reset("k", WINDOW, 30).await.unwrap());
        assert_eq!(store.get("k").unwrap().count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let store = MemoryRateLimitStore::new();
        assert!(store.increment_or_reset("a", WINDOW, 1).await.unwrap());
        assert!(!store.increment_or_reset("a", WINDOW, 1).await.unwrap());
        assert!(store.increment_or_reset("b", WINDOW, 1).await.unwrap());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_are_all_counted() {
        let store = Arc::new(MemoryRateLimitStore::new());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_or_reset("k", WINDOW, 30).await.unwrap() })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 30);
        assert_eq!(store.get("k").unwrap().count, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_only_idle_records() {
        let store = MemoryRateLimitStore::new();
        store.increment_or_reset("old", WINDOW, 30).await.unwrap();

        tokio::time::advance(WINDOW * 3).await;
        store.increment_or_reset("fresh", WINDOW, 30).await.unwrap();

        let evicted = store.evict_stale(WINDOW).await;
        assert_eq!(evicted, 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_idle_time_keeps_everything() {
        let store = MemoryRateLimitStore::new();
        store.increment_or_reset("k", WINDOW, 30).await.unwrap();

        tokio::time::advance(WINDOW * 3).await;
        assert_eq!(store.evict_stale(Duration::MAX).await, 0);
        assert_eq!(store.len(), 1);
    }
}
