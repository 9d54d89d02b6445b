use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

/// Counter state for one key after a hit has been recorded.
#[derive(Debug, Clone, Copy)]
pub struct WindowState {
    pub count: u32,
    pub reset_at: OffsetDateTime,
}

/// Storage contract for fixed-window counters.
///
/// `hit` must be atomic per key: concurrent callers on the same key observe
/// strictly increasing counts within a window. The in-memory implementation
/// relies on per-key entry locking; a store-backed implementation would use
/// an atomic upsert.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record one hit against `key`, rolling the window over if it has
    /// expired, and return the resulting counter state.
    async fn hit(&self, key: &str, window: Duration) -> anyhow::Result<WindowState>;

    /// Drop entries whose window has passed. Returns how many were removed.
    async fn sweep(&self) -> anyhow::Result<usize>;
}

struct WindowEntry {
    count: u32,
    reset_at: OffsetDateTime,
}

/// In-memory counter map for single-process deployments.
#[derive(Default)]
pub struct InMemoryCounterStore {
    entries: DashMap<String, WindowEntry>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn hit(&self, key: &str, window: Duration) -> anyhow::Result<WindowState> {
        let now = OffsetDateTime::now_utc();
        // The entry guard holds the shard lock for the whole
        // increment-and-compare, which keeps per-key updates atomic.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now + window,
            });
        if entry.reset_at <= now {
            entry.count = 1;
            entry.reset_at = now + window;
        } else {
            entry.count += 1;
        }
        Ok(WindowState {
            count: entry.count,
            reset_at: entry.reset_at,
        })
    }

    async fn sweep(&self) -> anyhow::Result<usize> {
        let now = OffsetDateTime::now_utc();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn counts_increase_within_window() {
        let store = InMemoryCounterStore::new();
        for expected in 1..=5 {
            let state = store.hit("k", WINDOW).await.unwrap();
            assert_eq!(state.count, expected);
        }
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = InMemoryCounterStore::new();
        for _ in 0..4 {
            store.hit("a", WINDOW).await.unwrap();
        }
        let state = store.hit("b", WINDOW).await.unwrap();
        assert_eq!(state.count, 1);
    }

    #[tokio::test]
    async fn window_rolls_over_after_reset() {
        let store = InMemoryCounterStore::new();
        let short = Duration::from_millis(20);
        store.hit("k", short).await.unwrap();
        store.hit("k", short).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let state = store.hit("k", short).await.unwrap();
        assert_eq!(state.count, 1, "a fresh window starts at 1");
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let store = InMemoryCounterStore::new();
        store.hit("stale", Duration::from_millis(10)).await.unwrap();
        store.hit("live", WINDOW).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let removed = store.sweep().await.unwrap();
        assert_eq!(removed, 1);
        // The surviving key keeps its count.
        let state = store.hit("live", WINDOW).await.unwrap();
        assert_eq!(state.count, 2);
    }

    #[tokio::test]
    async fn concurrent_hits_on_one_key_are_counted_exactly() {
        let store = std::sync::Arc::new(InMemoryCounterStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    store.hit("shared", WINDOW).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let state = store.hit("shared", WINDOW).await.unwrap();
        assert_eq!(state.count, 201);
    }
}
