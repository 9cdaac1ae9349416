use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// One turn in a bounded per-user conversation window (§3 `SessionTurn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTurn {
    pub role: Role,
    pub content: String,
    pub ts: DateTime<Utc>,
}

/// Bookkeeping record for a user's session, stored in the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Monotonic count of messages ever appended; also the next free `seq`.
    pub message_count: u64,
    pub active: bool,
}

impl SessionRecord {
    pub fn new(user_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            created_at: now,
            last_activity: now,
            message_count: 0,
            active: true,
        }
    }
}
