use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hrp_config::RateLimitConfig;

/// Per-user minimum-interval throttle (§4.2). Rejections are silently
/// dropped by the caller and must never be counted as circuit-breaker
/// failures — admission and breaker accounting are deliberately distinct.
pub struct RateLimiter {
    min_interval: chrono::Duration,
    last_admitted: Mutex<HashMap<u64, DateTime<Utc>>>,
}

const PURGE_AFTER_SECS: i64 = 3600;

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let millis = (config.min_interval_secs * 1000.0).round() as i64;
        Self {
            min_interval: chrono::Duration::milliseconds(millis),
            last_admitted: Mutex::new(HashMap::new()),
        }
    }

    /// Returns false when `now - last_admitted_ts[user_id] < MIN_INTERVAL`.
    /// Opportunistically purges entries older than one hour on every call.
    pub fn admit(&self, user_id: u64, now: DateTime<Utc>) -> bool {
        let mut last = self.last_admitted.lock().expect("rate limiter lock poisoned");

        last.retain(|_, ts| now - *ts < chrono::Duration::seconds(PURGE_AFTER_SECS));

        match last.get(&user_id) {
            Some(prev) if now - *prev < self.min_interval => false,
            _ => {
                last.insert(user_id, now);
                true
            }
        }
    }
}
