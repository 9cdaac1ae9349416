//! Transactional session store backing Session Memory (C3).
//!
//! Persisted as two [`redb`] tables per the external-interfaces contract:
//! `sessions(user_id -> SessionRecord)` and `messages((user_id, seq) ->
//! SessionTurn)`. `seq` is the message's monotonic position within the
//! user's window, so a table scan bounded to one user's key range already
//! yields chronological order — the `(user_id, ts)` and session-ordering
//! indexes the spec calls for fall out of the key layout rather than a
//! separate secondary structure.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::schema::{Role, SessionRecord, SessionTurn};

const SESSIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sessions");
/// Key packs `user_id` into the high 64 bits and `seq` into the low 64 bits
/// so that a range scan `[user_id << 64, (user_id + 1) << 64)` yields every
/// message for that user in chronological (seq) order.
const MESSAGES_TABLE: TableDefinition<u128, &[u8]> = TableDefinition::new("messages");

fn message_key(user_id: u64, seq: u64) -> u128 {
    ((user_id as u128) << 64) | seq as u128
}

fn user_key_range(user_id: u64) -> std::ops::Range<u128> {
    let start = (user_id as u128) << 64;
    start..start + (1u128 << 64)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).context("encoding value")
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard()).context("decoding value")?;
    Ok(value)
}

#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
    max_turns: usize,
}

impl SessionStore {
    pub fn open(path: impl AsRef<Path>, max_turns: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).context("creating session store directory")?;
        }
        let db = Database::create(path).context("opening session store database")?;
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(SESSIONS_TABLE)?;
            write_txn.open_table(MESSAGES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self {
            db: Arc::new(db),
            max_turns,
        })
    }

    /// In-memory store for tests and the CLI demo harness.
    pub fn open_temp(max_turns: usize) -> Result<(Self, tempfile::TempDir)> {
        let dir = tempfile::tempdir()?;
        let store = Self::open(dir.path().join("sessions.redb"), max_turns)?;
        Ok((store, dir))
    }

    /// Appends a turn, trimming the window to `max_turns` in the same write
    /// transaction (§4.3: "a single atomic transaction").
    pub async fn append(&self, user_id: u64, role: Role, content: String) -> Result<()> {
        let db = self.db.clone();
        let max_turns = self.max_turns;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let now = Utc::now();
            let write_txn = db.begin_write()?;
            {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE)?;
                let mut record = match sessions.get(user_id)? {
                    Some(bytes) => decode::<SessionRecord>(bytes.value())?,
                    None => SessionRecord::new(user_id, now),
                };
                let seq = record.message_count;
                record.message_count += 1;
                record.last_activity = now;
                record.active = true;

                let mut messages = write_txn.open_table(MESSAGES_TABLE)?;
                let turn = SessionTurn { role, content, ts: now };
                let encoded = encode(&turn)?;
                messages.insert(message_key(user_id, seq), encoded.as_slice())?;

                if record.message_count > max_turns as u64 {
                    let cutoff = record.message_count - max_turns as u64;
                    for old_seq in 0..cutoff {
                        messages.remove(message_key(user_id, old_seq))?;
                    }
                }

                let encoded_record = encode(&record)?;
                sessions.insert(user_id, encoded_record.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
        .context("session store append task panicked")?
    }

    /// Returns up to `max_turns` most recent turns in chronological order.
    pub async fn recent(&self, user_id: u64, max_turns: usize) -> Result<Vec<SessionTurn>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<SessionTurn>> {
            let read_txn = db.begin_read()?;
            let messages = read_txn.open_table(MESSAGES_TABLE)?;
            let range = user_key_range(user_id);
            let mut turns: Vec<SessionTurn> = messages
                .range(range)?
                .filter_map(|entry| entry.ok())
                .map(|(_, v)| decode::<SessionTurn>(v.value()))
                .collect::<Result<Vec<_>>>()?;
            if turns.len() > max_turns {
                turns.drain(0..turns.len() - max_turns);
            }
            Ok(turns)
        })
        .await
        .context("session store recent task panicked")?
    }

    pub async fn clear(&self, user_id: u64) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let write_txn = db.begin_write()?;
            {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE)?;
                sessions.remove(user_id)?;
                let mut messages = write_txn.open_table(MESSAGES_TABLE)?;
                let keys: Vec<u128> = messages
                    .range(user_key_range(user_id))?
                    .filter_map(|entry| entry.ok())
                    .map(|(k, _)| k.value())
                    .collect();
                for key in keys {
                    messages.remove(key)?;
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
        .context("session store clear task panicked")?
    }

    /// Removes sessions whose `last_activity` is older than `cutoff`.
    /// Intended to be called periodically by an external scheduler; the
    /// core never calls this on the request path.
    pub async fn reap_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<usize> {
            let write_txn = db.begin_write()?;
            let mut reaped = 0usize;
            {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE)?;
                let stale_users: Vec<u64> = sessions
                    .iter()?
                    .filter_map(|entry| entry.ok())
                    .filter_map(|(k, v)| {
                        let record: SessionRecord = decode(v.value()).ok()?;
                        (record.last_activity < cutoff).then_some(k.value())
                    })
                    .collect();

                let mut messages = write_txn.open_table(MESSAGES_TABLE)?;
                for user_id in stale_users {
                    sessions.remove(user_id)?;
                    let keys: Vec<u128> = messages
                        .range(user_key_range(user_id))?
                        .filter_map(|entry| entry.ok())
                        .map(|(k, _)| k.value())
                        .collect();
                    for key in keys {
                        messages.remove(key)?;
                    }
                    reaped += 1;
                }
            }
            write_txn.commit()?;
            Ok(reaped)
        })
        .await
        .context("session store reap task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_recent_preserves_chronological_order() {
        let (store, _dir) = SessionStore::open_temp(50).unwrap();
        store.append(1, Role::User, "hi".into()).await.unwrap();
        store.append(1, Role::Assistant, "hello".into()).await.unwrap();
        store.append(1, Role::User, "how are you".into()).await.unwrap();

        let turns = store.recent(1, 10).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "hi");
        assert_eq!(turns[1].content, "hello");
        assert_eq!(turns[2].content, "how are you");
    }

    #[tokio::test]
    async fn recent_caps_at_requested_window() {
        let (store, _dir) = SessionStore::open_temp(50).unwrap();
        for i in 0..5 {
            store.append(1, Role::User, format!("msg {i}")).await.unwrap();
        }
        let turns = store.recent(1, 2).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "msg 3");
        assert_eq!(turns[1].content, "msg 4");
    }

    #[tokio::test]
    async fn append_trims_to_max_turns() {
        let (store, _dir) = SessionStore::open_temp(3).unwrap();
        for i in 0..10 {
            store.append(1, Role::User, format!("msg {i}")).await.unwrap();
        }
        let turns = store.recent(1, 100).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "msg 7");
        assert_eq!(turns[2].content, "msg 9");
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let (store, _dir) = SessionStore::open_temp(50).unwrap();
        store.append(1, Role::User, "from user 1".into()).await.unwrap();
        store.append(2, Role::User, "from user 2".into()).await.unwrap();

        let turns1 = store.recent(1, 10).await.unwrap();
        let turns2 = store.recent(2, 10).await.unwrap();
        assert_eq!(turns1.len(), 1);
        assert_eq!(turns2.len(), 1);
        assert_eq!(turns1[0].content, "from user 1");
        assert_eq!(turns2[0].content, "from user 2");
    }

    #[tokio::test]
    async fn clear_removes_all_turns_for_user() {
        let (store, _dir) = SessionStore::open_temp(50).unwrap();
        store.append(1, Role::User, "hi".into()).await.unwrap();
        store.clear(1).await.unwrap();
        let turns = store.recent(1, 10).await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn reap_older_than_removes_stale_sessions_only() {
        let (store, _dir) = SessionStore::open_temp(50).unwrap();
        store.append(1, Role::User, "old".into()).await.unwrap();
        store.append(2, Role::User, "fresh".into()).await.unwrap();

        let reaped = store.reap_older_than(Utc::now() + chrono::Duration::seconds(1)).await.unwrap();
        // Both are technically "older" than one second in the future; verify count and emptiness.
        assert_eq!(reaped, 2);
        assert!(store.recent(1, 10).await.unwrap().is_empty());
        assert!(store.recent(2, 10).await.unwrap().is_empty());
    }
}
