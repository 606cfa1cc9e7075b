//! Memory manager coordinating short-term memory for the agent.
//!
//! Only the short-term tier exists; the manager is the seam where richer
//! tiers would plug in without touching callers.

use std::collections::HashMap;
use std::sync::Arc;

use agentline_types::config::MemoryConfig;
use agentline_types::memory::{MemoryItem, MemoryRole};
use tracing::info;

use super::short_term::{ShortTermMemory, format_items};
use super::snapshot::SnapshotStore;

pub struct MemoryManager {
    short_term: ShortTermMemory,
    token_limit: u32,
}

impl MemoryManager {
    /// Build from config. The snapshot is only attached when persistence is
    /// enabled.
    pub fn new(config: &MemoryConfig, snapshot: Option<Arc<dyn SnapshotStore>>) -> Self {
        let short_term = match snapshot {
            Some(store) if config.persistence_enabled => {
                ShortTermMemory::with_snapshot(config.short_term_size, store)
            }
            _ => ShortTermMemory::new(config.short_term_size),
        }
        .with_max_sessions(config.max_sessions);
        Self {
            short_term,
            token_limit: config.token_limit,
        }
    }

    pub fn short_term(&self) -> &ShortTermMemory {
        &self.short_term
    }

    /// Approximate token budget for formatted history.
    pub fn token_limit(&self) -> u32 {
        self.token_limit
    }

    /// Record a conversation message and return the stored item.
    pub fn store_message(
        &self,
        session_id: &str,
        user_id: &str,
        content: &str,
        role: MemoryRole,
        metadata: HashMap<String, serde_json::Value>,
    ) -> MemoryItem {
        let item = MemoryItem::message(session_id, user_id, role, content, metadata);
        self.short_term.add(item.clone());
        item
    }

    /// The last `limit` message items of a session (default: the memory
    /// bound), oldest first.
    pub fn get_conversation_history(&self, session_id: &str, limit: Option<usize>) -> Vec<MemoryItem> {
        let limit = limit.unwrap_or_else(|| self.short_term.max_size());
        let mut messages: Vec<MemoryItem> = self
            .short_term
            .get_all(Some(session_id))
            .into_iter()
            .filter(MemoryItem::is_message)
            .collect();
        let skip = messages.len().saturating_sub(limit);
        messages.drain(..skip);
        messages
    }

    /// Session history formatted for a prompt.
    pub fn get_formatted_history(&self, session_id: &str) -> String {
        format_items(&self.get_conversation_history(session_id, None))
    }

    pub fn clear_session(&self, session_id: &str) {
        self.short_term.clear(Some(session_id));
        info!(session_id, "cleared short-term memory for session");
    }

    pub fn clear_all(&self) {
        self.short_term.clear(None);
        info!("cleared all short-term memory");
    }

    /// Change the per-session bound, keeping the newest items.
    pub fn resize(&self, max_size: usize) {
        self.short_term.resize(max_size);
        info!(max_size, "short-term memory resized");
    }
}
