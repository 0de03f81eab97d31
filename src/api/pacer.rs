//! Fixed inter-request pacing built on governor.
//!
//! Every API call against the remote consumes one permit; permits refill at
//! one per configured request delay, which keeps the client under the remote
//! system's implicit rate limit without hand-rolled sleeps at call sites.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::Duration;
use tracing::debug;

/// One-permit-per-period limiter shared by all calls of one client.
pub struct RequestPacer {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RequestPacer {
    /// A zero delay disables pacing entirely (used by tests).
    pub fn new(delay: Duration) -> Self {
        let limiter = Quota::with_period(delay).map(RateLimiter::direct);
        if limiter.is_none() {
            debug!("request pacing disabled (zero delay)");
        }
        Self { limiter }
    }

    /// Wait until the next request is allowed.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_zero_delay_never_blocks() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            pacer.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_millis(40));
        pacer.acquire().await;
        let start = Instant::now();
        pacer.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
