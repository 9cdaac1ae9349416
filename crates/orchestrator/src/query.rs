use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const MAX_QUERY_CHARS: usize = 2_000;

/// Immutable per-request record (§3 `Query`). Never mutated after
/// construction; raw text longer than [`MAX_QUERY_CHARS`] is truncated
/// before the Query is frozen.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub user_id: String,
    pub session_id: Option<String>,
    pub arrived_at: DateTime<Utc>,
    pub request_id: u64,
}

impl Query {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>, request_id: u64) -> Self {
        let mut text = text.into();
        if text.chars().count() > MAX_QUERY_CHARS {
            text = text.chars().take(MAX_QUERY_CHARS).collect();
        }
        Self {
            text,
            user_id: user_id.into(),
            session_id: None,
            arrived_at: Utc::now(),
            request_id,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Stable hash of the (string) user identifier into the `u64` used by
    /// rate limiting, session storage, and logging (§3: "normalized via a
    /// stable hash to a 64-bit integer for storage").
    pub fn user_id_hash(&self) -> u64 {
        hash_user_id(&self.user_id)
    }
}

pub fn hash_user_id(user_id: &str) -> u64 {
    let digest = Sha256::digest(user_id.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("sha256 digest is at least 8 bytes"))
}
