use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hrp_config::BreakerConfig;

/// Per-service failure counter with cool-down (§4.1).
#[derive(Debug, Clone, Default)]
struct BreakerState {
    failures: u32,
    last_failure_ts: Option<DateTime<Utc>>,
    open: bool,
}

/// Point-in-time view of a breaker, returned for logging/diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerSnapshot {
    pub service: String,
    pub failures: u32,
    pub open: bool,
}

/// Registry of named circuit breakers, one entry per downstream service
/// (`rag_search`, `web_search`, `llm`, ...). All mutations happen under a
/// single registry-wide lock; the critical section never performs I/O.
pub struct BreakerRegistry {
    config: BreakerConfig,
    states: Mutex<HashMap<String, BreakerState>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Returns false iff `failures >= THRESHOLD` and the cool-down has not
    /// yet elapsed. When the cool-down has elapsed, resets the counters and
    /// admits exactly one half-open probe.
    pub fn allow(&self, service: &str) -> bool {
        let mut states = self.states.lock().expect("breaker registry lock poisoned");
        let state = states.entry(service.to_string()).or_default();

        if state.failures < self.config.threshold {
            return true;
        }

        let cooldown = chrono::Duration::seconds(self.config.cooldown_secs as i64);
        let elapsed = state
            .last_failure_ts
            .map(|ts| Utc::now() - ts)
            .unwrap_or_else(|| chrono::Duration::days(3650));

        if elapsed >= cooldown {
            state.failures = 0;
            state.open = false;
            tracing::info!(service, "breaker cool-down elapsed, admitting half-open probe");
            true
        } else {
            false
        }
    }

    pub fn record_failure(&self, service: &str) {
        let mut states = self.states.lock().expect("breaker registry lock poisoned");
        let state = states.entry(service.to_string()).or_default();
        state.failures += 1;
        state.last_failure_ts = Some(Utc::now());
        if state.failures >= self.config.threshold {
            state.open = true;
            tracing::warn!(service, failures = state.failures, "breaker opened");
        }
    }

    pub fn record_success(&self, service: &str) {
        let mut states = self.states.lock().expect("breaker registry lock poisoned");
        let state = states.entry(service.to_string()).or_default();
        state.failures = state.failures.saturating_sub(1);
        if state.failures == 0 {
            state.open = false;
        }
    }

    pub fn snapshot(&self, service: &str) -> BreakerSnapshot {
        let states = self.states.lock().expect("breaker registry lock poisoned");
        let state = states.get(service).cloned().unwrap_or_default();
        BreakerSnapshot {
            service: service.to_string(),
            failures: state.failures,
            open: state.open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BreakerRegistry {
        BreakerRegistry::new(BreakerConfig {
            threshold: 3,
            cooldown_secs: 300,
        })
    }

    #[test]
    fn allows_until_threshold_reached() {
        let reg = registry();
        assert!(reg.allow("llm"));
        reg.record_failure("llm");
        assert!(reg.allow("llm"));
        reg.record_failure("llm");
        assert!(reg.allow("llm"));
        reg.record_failure("llm");
        assert!(!reg.allow("llm"));
    }

    #[test]
    fn success_decrements_and_closes() {
        let reg = registry();
        reg.record_failure("rag_search");
        reg.record_failure("rag_search");
        reg.record_success("rag_search");
        assert_eq!(reg.snapshot("rag_search").failures, 1);
        reg.record_success("rag_search");
        let snap = reg.snapshot("rag_search");
        assert_eq!(snap.failures, 0);
        assert!(!snap.open);
    }

    #[test]
    fn breakers_are_independent_per_service() {
        let reg = registry();
        reg.record_failure("web_search");
        reg.record_failure("web_search");
        reg.record_failure("web_search");
        assert!(!reg.allow("web_search"));
        assert!(reg.allow("llm"));
    }

    #[test]
    fn snapshot_reports_open_state() {
        let reg = registry();
        reg.record_failure("llm");
        reg.record_failure("llm");
        reg.record_failure("llm");
        let snap = reg.snapshot("llm");
        assert!(snap.open);
        assert_eq!(snap.failures, 3);
    }
}
