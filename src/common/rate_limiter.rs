//! Minimum-interval rate limiter
//!
//! Each limiter tracks the earliest instant at which the next call may go
//! out. `acquire` blocks the calling thread until that instant, then pushes
//! it forward by the configured interval. This is the only place in the
//! backtester that sleeps.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Configuration for the rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Minimum spacing between two calls to the same source
    pub min_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
        }
    }
}

impl RateLimiterConfig {
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

/// Per-source limiter holding an explicit "earliest next call" timestamp
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use dca_backtester::common::{RateLimiter, RateLimiterConfig};
///
/// let limiter = RateLimiter::new(
///     RateLimiterConfig::default().with_min_interval(Duration::from_millis(5)),
/// );
///
/// // First call goes out immediately
/// assert_eq!(limiter.acquire(), Duration::ZERO);
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            min_interval: config.min_interval,
            next_allowed: Mutex::new(None),
        }
    }

    pub fn with_min_interval(interval: Duration) -> Self {
        Self::new(RateLimiterConfig::default().with_min_interval(interval))
    }

    /// Block until a call is allowed, then reserve the slot.
    ///
    /// The lock is held while sleeping so concurrent callers of the same
    /// source queue up behind each other. Returns how long the caller waited.
    pub fn acquire(&self) -> Duration {
        let mut next_allowed = self.lock();

        let wait = next_allowed
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);
        if !wait.is_zero() {
            tracing::debug!("Rate limiter delaying call by {:?}", wait);
            std::thread::sleep(wait);
        }

        *next_allowed = Some(Instant::now() + self.min_interval);
        wait
    }

    fn lock(&self) -> MutexGuard<'_, Option<Instant>> {
        self.next_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_config() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.min_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_first_call_is_immediate() {
        let limiter = RateLimiter::with_min_interval(Duration::from_secs(60));
        assert_eq!(limiter.acquire(), Duration::ZERO);
    }

    #[test]
    fn test_second_call_waits_for_interval() {
        let limiter = RateLimiter::with_min_interval(Duration::from_millis(40));

        let start = Instant::now();
        limiter.acquire();
        limiter.acquire();

        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_ready_again_after_interval() {
        let limiter = RateLimiter::with_min_interval(Duration::from_millis(20));

        limiter.acquire();
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(limiter.acquire(), Duration::ZERO);
    }

    #[test]
    fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(RateLimiter::with_min_interval(Duration::from_millis(25)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let l = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    l.acquire();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // three calls need at least two full intervals between them
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
