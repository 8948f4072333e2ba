//! Per-client rate limiting for the classify route.
//!
//! Each client IP gets its own token bucket: `burst` requests up front,
//! then one more every `60 / requests_per_minute` seconds.

use governor::{DefaultKeyedRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// A keyed rate limiter shared by all request handlers.
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl ClientRateLimiter {
    /// Create a limiter, or `None` when `requests_per_minute` is 0.
    ///
    /// A `burst` of 0 is treated as 1.
    pub fn new(requests_per_minute: u32, burst: u32) -> Option<Self> {
        let rate = NonZeroU32::new(requests_per_minute)?;
        let burst = NonZeroU32::new(burst).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_minute(rate).allow_burst(burst);

        Some(Self {
            limiter: Arc::new(DefaultKeyedRateLimiter::keyed(quota)),
        })
    }

    /// Take a token for `client` without waiting.
    ///
    /// Returns `false` once the client has used up its quota.
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Periodically forget clients whose buckets have refilled.
    pub fn spawn_housekeeping(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(&self.limiter);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                limiter.retain_recent();
                tracing::trace!("Rate limiter tracks {} clients", limiter.len());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_disabled_when_rate_is_zero() {
        assert!(ClientRateLimiter::new(0, 5).is_none());
    }

    #[test]
    fn test_burst_then_limited() {
        let limiter = ClientRateLimiter::new(1, 3).unwrap();

        for _ in 0..3 {
            assert!(limiter.try_acquire(A));
        }
        assert!(!limiter.try_acquire(A));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = ClientRateLimiter::new(1, 1).unwrap();

        assert!(limiter.try_acquire(A));
        assert!(!limiter.try_acquire(A));
        assert!(limiter.try_acquire(B));
    }

    #[test]
    fn test_clones_share_state() {
        let limiter1 = ClientRateLimiter::new(1, 1).unwrap();
        let limiter2 = limiter1.clone();

        assert!(limiter1.try_acquire(A));
        assert!(!limiter2.try_acquire(A));
    }

    #[test]
    fn test_zero_burst_allows_one() {
        let limiter = ClientRateLimiter::new(60, 0).unwrap();
        assert!(limiter.try_acquire(A));
        assert!(!limiter.try_acquire(A));
    }
}
