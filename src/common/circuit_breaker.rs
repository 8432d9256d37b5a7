//! Circuit breaker for news sources
//!
//! A multi-year backtest asks each source about thousands of dates. When a
//! source is down (or simply has nothing that far back) the breaker stops us
//! from paying the rate-limit delay on every single day.
//!
//! States:
//! - Closed: calls go through
//! - Open: calls are skipped until `open_timeout` has passed
//! - HalfOpen: probing; successes close the circuit, a failure re-opens it

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Consecutive HalfOpen successes before the circuit closes
    pub success_threshold: u32,
    /// Time spent Open before probing again
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            open_timeout: Duration::from_secs(300),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

/// Failure tracker for one named source
///
/// # Example
///
/// ```
/// use dca_backtester::common::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
///
/// let mut cb = CircuitBreaker::new(
///     "newsapi",
///     CircuitBreakerConfig::default().with_failure_threshold(2),
/// );
/// cb.record_failure();
/// cb.record_failure();
/// assert_eq!(cb.state(), CircuitState::Open);
/// assert!(!cb.can_attempt());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    config: CircuitBreakerConfig,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            config,
            opened_at: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Whether a call may be attempted now. Moves Open -> HalfOpen once the
    /// timeout has elapsed.
    pub fn can_attempt(&mut self) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let expired = self
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.config.open_timeout);
                if expired {
                    tracing::info!(source = self.name, "Circuit half-open, probing source");
                    self.state = CircuitState::HalfOpen;
                    self.success_count = 0;
                }
                expired
            }
        }
    }

    pub fn record_success(&mut self) {
        match self.state {
            CircuitState::Closed => self.failure_count = 0,
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= self.config.success_threshold {
                    tracing::info!(source = self.name, "Circuit closed, source recovered");
                    self.reset();
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&mut self) {
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.config.failure_threshold {
                    tracing::warn!(
                        source = self.name,
                        failures = self.failure_count,
                        "Circuit opened, skipping source for {:?}",
                        self.config.open_timeout
                    );
                    self.open();
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!(source = self.name, "Trial request failed, circuit re-opened");
                self.open();
            }
            CircuitState::Open => {}
        }
    }

    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.success_count = 0;
        self.opened_at = None;
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.success_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(config: CircuitBreakerConfig) -> CircuitBreaker {
        CircuitBreaker::new("test", config)
    }

    #[test]
    fn test_initial_state_is_closed() {
        let mut cb = breaker(CircuitBreakerConfig::default());
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_attempt());
    }

    #[test]
    fn test_failure_threshold_opens_circuit() {
        let mut cb = breaker(CircuitBreakerConfig::default().with_failure_threshold(3));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 2);

        cb.record_failure();
        assert!(cb.is_open());
        assert!(!cb.can_attempt());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut cb = breaker(CircuitBreakerConfig::default().with_failure_threshold(3));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_closes_on_success() {
        let mut cb = breaker(
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_success_threshold(2)
                .with_open_timeout(Duration::from_millis(1)),
        );

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(5));

        assert!(cb.can_attempt());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_failure() {
        let mut cb = breaker(
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_open_timeout(Duration::from_millis(1)),
        );

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(cb.can_attempt());

        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn test_reset() {
        let mut cb = breaker(CircuitBreakerConfig::default().with_failure_threshold(1));
        cb.record_failure();
        assert!(cb.is_open());

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_attempt());
    }
}
