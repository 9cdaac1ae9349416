use std::path::Path;

use anyhow::Result;
use hrp_config::SessionConfig;

use crate::schema::{Role, SessionTurn};
use crate::store::SessionStore;

/// Session Memory (C3): a bounded, per-user conversation window.
pub struct SessionMemory {
    store: SessionStore,
    context_turns: usize,
}

impl SessionMemory {
    pub fn open(path: impl AsRef<Path>, config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            store: SessionStore::open(path, config.max_turns)?,
            context_turns: config.context_turns,
        })
    }

    pub fn open_temp(config: &SessionConfig) -> Result<(Self, tempfile::TempDir)> {
        let (store, dir) = SessionStore::open_temp(config.max_turns)?;
        Ok((
            Self {
                store,
                context_turns: config.context_turns,
            },
            dir,
        ))
    }

    pub async fn append(&self, user_id: u64, role: Role, content: impl Into<String>) -> Result<()> {
        self.store.append(user_id, role, content.into()).await
    }

    /// Returns the last `max_turns` (default `context_turns`) turns,
    /// concatenated as a prompt-ready block prefixed with "RECENT
    /// CONVERSATION:" in chronological order — or an empty string when the
    /// user has no prior turns.
    pub async fn context_for(&self, user_id: u64, max_turns: Option<usize>) -> Result<String> {
        let turns = self
            .store
            .recent(user_id, max_turns.unwrap_or(self.context_turns))
            .await?;
        if turns.is_empty() {
            return Ok(String::new());
        }

        let mut block = String::from("RECENT CONVERSATION:\n");
        for turn in &turns {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            block.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        Ok(block)
    }

    pub async fn clear(&self, user_id: u64) -> Result<()> {
        self.store.clear(user_id).await
    }

    /// Raw turns, chronological order — used by the Orchestrator to check
    /// whether a user has any prior history without formatting a prompt block.
    pub async fn recent_turns(&self, user_id: u64, max_turns: usize) -> Result<Vec<SessionTurn>> {
        self.store.recent(user_id, max_turns).await
    }
}
