use std::collections::HashMap;
use std::sync::Mutex;

/// Process-wide sticky "current domain" per user, read by C4 on every turn
/// and updated when it returns `new_current_domain` (§4.11 step 4). Mirrors
/// the breaker registry and rate limiter in shape: a small owned map behind
/// a single lock, never a global.
#[derive(Default)]
pub struct DomainSessionState {
    current: Mutex<HashMap<u64, String>>,
}

impl DomainSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: u64) -> Option<String> {
        self.current.lock().expect("domain state lock poisoned").get(&user_id).cloned()
    }

    pub fn set(&self, user_id: u64, domain: String) {
        self.current.lock().expect("domain state lock poisoned").insert(user_id, domain);
    }

    /// Count of sessions currently sticky to each domain. Diagnostic only —
    /// mirrors the original bot's `get_domain_stats` (§10.6).
    pub fn domain_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for domain in self.current.lock().expect("domain state lock poisoned").values() {
            *counts.entry(domain.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_has_no_domain() {
        let state = DomainSessionState::new();
        assert_eq!(state.get(1), None);
    }

    #[test]
    fn set_then_get_roundtrips() {
        let state = DomainSessionState::new();
        state.set(1, "nba".to_string());
        assert_eq!(state.get(1), Some("nba".to_string()));
    }
}
