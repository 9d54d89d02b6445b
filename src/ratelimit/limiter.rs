use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::error;

use super::store::{CounterStore, InMemoryCounterStore};

/// Outcome of a rate-limit check. Callers translate a denial into HTTP 429
/// with `Retry-After` and the `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: OffsetDateTime,
}

/// Fixed-window rate limiter over an injected counter store.
///
/// `check` never panics and never surfaces an error: a fault in the store
/// degrades to a deny unless the limiter was built fail-open.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    fail_open: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, fail_open: bool) -> Self {
        Self { store, fail_open }
    }

    pub fn in_memory(fail_open: bool) -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()), fail_open)
    }

    pub async fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        match self.store.hit(key, window).await {
            Ok(state) => RateLimitDecision {
                allowed: state.count <= max_requests,
                limit: max_requests,
                remaining: max_requests.saturating_sub(state.count),
                reset_at: state.reset_at,
            },
            Err(err) => {
                error!(error = %err, key, "rate limit store failure");
                RateLimitDecision {
                    allowed: self.fail_open,
                    limit: max_requests,
                    remaining: 0,
                    reset_at: OffsetDateTime::now_utc() + window,
                }
            }
        }
    }

    /// Expired-entry sweep, run periodically from a background task.
    pub async fn sweep(&self) -> usize {
        match self.store.sweep().await {
            Ok(removed) => removed,
            Err(err) => {
                error!(error = %err, "rate limit sweep failure");
                0
            }
        }
    }
}

/// Key for login throttling: scopes to IP *and* login identifier, so
/// brute-forcing one account from one address never penalizes unrelated
/// callers behind the same NAT.
pub fn login_key(client_ip: &str, identifier: &str) -> String {
    format!("login:{}:{}", client_ip, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const WINDOW: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn first_n_allowed_with_decreasing_remaining() {
        let limiter = RateLimiter::in_memory(false);
        for expected_remaining in (0..10).rev() {
            let decision = limiter.check("k", 10, WINDOW).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
        let decision = limiter.check("k", 10, WINDOW).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn exhausting_one_key_leaves_others_untouched() {
        let limiter = RateLimiter::in_memory(false);
        for _ in 0..11 {
            limiter.check("a", 10, WINDOW).await;
        }
        let decision = limiter.check("b", 10, WINDOW).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
    }

    #[tokio::test]
    async fn fresh_window_after_reset() {
        let limiter = RateLimiter::in_memory(false);
        let short = Duration::from_millis(20);
        for _ in 0..3 {
            limiter.check("k", 2, short).await;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;
        let decision = limiter.check("k", 2, short).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test]
    async fn login_scenario_ten_per_five_minutes() {
        let limiter = RateLimiter::in_memory(false);
        let key = login_key("192.168.1.1", "admin@acme.test");
        for expected_remaining in (0..10).rev() {
            let decision = limiter.check(&key, 10, Duration::from_millis(300_000)).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
        let denied = limiter.check(&key, 10, Duration::from_millis(300_000)).await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_at > OffsetDateTime::now_utc());
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn hit(
            &self,
            _key: &str,
            _window: Duration,
        ) -> anyhow::Result<crate::ratelimit::WindowState> {
            anyhow::bail!("store down")
        }

        async fn sweep(&self) -> anyhow::Result<usize> {
            anyhow::bail!("store down")
        }
    }

    #[tokio::test]
    async fn store_failure_denies_by_default() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore), false);
        let decision = limiter.check("k", 10, WINDOW).await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn store_failure_allows_when_fail_open() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore), true);
        let decision = limiter.check("k", 10, WINDOW).await;
        assert!(decision.allowed);
    }

    #[test]
    fn login_key_shape() {
        assert_eq!(
            login_key("10.1.2.3", "user@acme.test"),
            "login:10.1.2.3:user@acme.test"
        );
    }
}
