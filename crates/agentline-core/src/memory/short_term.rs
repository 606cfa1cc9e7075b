//! Per-session FIFO of recent memory items.
//!
//! Each session keeps at most `max_size` items; adding past the bound evicts
//! the oldest item of that session. At most `max_sessions` sessions are held
//! at once: when a new session pushes past that, the session written least
//! recently is dropped whole, so the memory never holds more than
//! `max_size * max_sessions` items.
//!
//! When a [`SnapshotStore`] is attached the whole memory is handed to it
//! after every mutation and restored on construction. Snapshot failures are
//! logged and otherwise ignored.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use agentline_types::memory::MemoryItem;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::snapshot::SnapshotStore;

/// Sessions held when no explicit limit is given.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

#[derive(Default)]
struct SessionQueue {
    items: VecDeque<MemoryItem>,
    /// Tick of the last write, for least-recently-written eviction.
    last_write: u64,
}

pub struct ShortTermMemory {
    max_size: AtomicUsize,
    max_sessions: AtomicUsize,
    clock: AtomicU64,
    sessions: DashMap<String, SessionQueue>,
    snapshot: Option<Arc<dyn SnapshotStore>>,
    /// Held across capture and save so saves land in capture order.
    persist_lock: Mutex<()>,
}

impl ShortTermMemory {
    /// In-process memory only. A `max_size` of zero is raised to one.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: AtomicUsize::new(max_size.max(1)),
            max_sessions: AtomicUsize::new(DEFAULT_MAX_SESSIONS),
            clock: AtomicU64::new(0),
            sessions: DashMap::new(),
            snapshot: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Memory backed by a snapshot, restored immediately.
    ///
    /// A missing or unreadable snapshot yields an empty memory.
    pub fn with_snapshot(max_size: usize, snapshot: Arc<dyn SnapshotStore>) -> Self {
        let mut memory = Self::new(max_size);
        match snapshot.load() {
            Ok(items) => {
                debug!(count = items.len(), "restoring short-term memory snapshot");
                for item in items {
                    memory.push(item);
                }
            }
            Err(e) => warn!(error = %e, "failed to load short-term memory, starting empty"),
        }
        memory.snapshot = Some(snapshot);
        memory
    }

    /// Cap the number of sessions held, dropping the least recently written
    /// ones right away. Zero is raised to one.
    pub fn with_max_sessions(self, max_sessions: usize) -> Self {
        self.max_sessions.store(max_sessions.max(1), Ordering::Relaxed);
        self.evict_idle_sessions();
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Relaxed)
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions.load(Ordering::Relaxed)
    }

    /// Add an item to its session, evicting the session's oldest item when full.
    pub fn add(&self, item: MemoryItem) {
        self.push(item);
        self.persist();
    }

    fn push(&self, item: MemoryItem) {
        let max = self.max_size();
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        {
            let mut session = self.sessions.entry(item.session_id.clone()).or_default();
            session.last_write = tick;
            session.items.push_back(item);
            while session.items.len() > max {
                session.items.pop_front();
            }
        }
        self.evict_idle_sessions();
    }

    fn evict_idle_sessions(&self) {
        let max_sessions = self.max_sessions();
        while self.sessions.len() > max_sessions {
            let idle = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_write)
                .map(|entry| (entry.key().clone(), entry.value().last_write));
            let Some((session_id, last_write)) = idle else {
                break;
            };
            // Skipped when the session was written meanwhile; the next pass
            // picks a new candidate.
            if self
                .sessions
                .remove_if(&session_id, |_, queue| queue.last_write == last_write)
                .is_some()
            {
                debug!(session_id = %session_id, "evicted idle short-term memory session");
            }
        }
    }

    /// Items of one session in insertion order, or of all sessions ordered
    /// by creation time.
    pub fn get_all(&self, session_id: Option<&str>) -> Vec<MemoryItem> {
        match session_id {
            Some(id) => self
                .sessions
                .get(id)
                .map(|queue| queue.items.iter().cloned().collect())
                .unwrap_or_default(),
            None => {
                let mut items: Vec<MemoryItem> = self
                    .sessions
                    .iter()
                    .flat_map(|entry| entry.value().items.iter().cloned().collect::<Vec<_>>())
                    .collect();
                items.sort_by_key(|item| (item.created_at, item.id));
                items
            }
        }
    }

    /// The last `count` items, oldest first.
    pub fn get_recent(&self, count: usize, session_id: Option<&str>) -> Vec<MemoryItem> {
        let mut items = self.get_all(session_id);
        let skip = items.len().saturating_sub(count);
        items.drain(..skip);
        items
    }

    /// Clear one session, or everything.
    pub fn clear(&self, session_id: Option<&str>) {
        match session_id {
            Some(id) => {
                self.sessions.remove(id);
            }
            None => self.sessions.clear(),
        }
        self.persist();
    }

    /// Change the per-session bound, keeping the newest items.
    pub fn resize(&self, max_size: usize) {
        let max = max_size.max(1);
        self.max_size.store(max, Ordering::Relaxed);
        for mut entry in self.sessions.iter_mut() {
            let queue = &mut entry.value_mut().items;
            while queue.len() > max {
                queue.pop_front();
            }
        }
        self.persist();
    }

    /// `"User: ...\n\nAssistant: ...\n\n"` over the message items.
    pub fn to_formatted_text(&self, session_id: Option<&str>) -> String {
        format_items(&self.get_all(session_id))
    }

    /// Total items across all sessions.
    pub fn len(&self) -> usize {
        self.sessions.iter().map(|entry| entry.value().items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn persist(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let _guard = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = snapshot.save(&self.get_all(None)) {
            warn!(error = %e, "failed to save short-term memory");
        }
    }
}

/// Format message items as prompt history. Non-message items are skipped.
pub fn format_items(items: &[MemoryItem]) -> String {
    items
        .iter()
        .filter(|item| item.is_message())
        .map(|item| format!("{}: {}\n\n", item.role.speaker(), item.content))
        .collect()
}
