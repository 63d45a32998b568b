//! Politeness delay between fetches of one site

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::time::Duration;
use tracing::trace;

/// Spaces out consecutive fetches of a site by a fixed delay
///
/// Shared by every worker of the site, so the delay holds for the site as a
/// whole rather than per worker. A zero delay disables limiting.
pub struct PolitenessLimiter {
    limiter: Option<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl PolitenessLimiter {
    /// Create a limiter that admits one fetch per `delay`
    pub fn new(delay: Duration) -> Self {
        let limiter = Quota::with_period(delay)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));
        Self { limiter }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// Wait until the next fetch is allowed
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            trace!("Waiting for politeness delay");
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delay_between_fetches() {
        let limiter = PolitenessLimiter::from_millis(100);

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        let elapsed = start.elapsed();

        // First fetch is immediate, then two full delays
        assert!(elapsed >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_zero_delay_is_unlimited() {
        let limiter = PolitenessLimiter::from_millis(0);

        let start = Instant::now();
        for _ in 0..100 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
