//! Call-pacing utilities shared by the news sources
//!
//! - Minimum-interval rate limiter (blocking)
//! - Circuit breaker to stop retrying a dead source every day

pub mod circuit_breaker;
pub mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
