//! Circuit-Breaker Registry (C1) and Rate Limiter (C2).
//!
//! Both are process-wide, mutex-guarded maps with O(1) critical sections and
//! no I/O inside the lock, matching the concurrency model's shared-resource
//! rules. Neither component suspends.

pub mod breaker;
pub mod rate_limiter;

pub use breaker::{BreakerRegistry, BreakerSnapshot};
pub use rate_limiter::RateLimiter;
