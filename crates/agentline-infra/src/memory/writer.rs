//! Background writer for short-term memory snapshots.
//!
//! `ShortTermMemory` saves synchronously after every mutation, from inside
//! request handlers. [`SnapshotWriter`] turns each save into a channel send
//! and lets one task do the file IO on the blocking pool. Saves queued while
//! a write is in flight collapse into the newest one.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use agentline_core::memory::snapshot::SnapshotStore;
use agentline_types::error::MemoryError;
use agentline_types::memory::MemoryItem;

use super::snapshot::JsonSnapshotStore;

enum WriterCommand {
    Save(Vec<MemoryItem>),
    Flush(oneshot::Sender<()>),
}

pub struct SnapshotWriter {
    store: Arc<JsonSnapshotStore>,
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl SnapshotWriter {
    /// Start the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(store: JsonSnapshotStore) -> Arc<Self> {
        let store = Arc::new(store);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store.clone(), rx));
        Arc::new(Self { store, tx })
    }

    /// Wait until every save queued before this call is on disk.
    pub async fn flush(&self) -> Result<(), MemoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Flush(reply_tx))
            .map_err(|_| stopped())?;
        reply_rx.await.map_err(|_| stopped())
    }
}

fn stopped() -> MemoryError {
    MemoryError::Io("snapshot writer is not running".to_string())
}

impl SnapshotStore for SnapshotWriter {
    fn load(&self) -> Result<Vec<MemoryItem>, MemoryError> {
        self.store.load()
    }

    fn save(&self, items: &[MemoryItem]) -> Result<(), MemoryError> {
        self.tx
            .send(WriterCommand::Save(items.to_vec()))
            .map_err(|_| stopped())
    }
}

async fn run_writer(
    store: Arc<JsonSnapshotStore>,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
) {
    while let Some(first) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        let mut next = Some(first);
        while let Some(command) = next {
            match command {
                WriterCommand::Save(items) => latest = Some(items),
                WriterCommand::Flush(reply) => waiters.push(reply),
            }
            next = rx.try_recv().ok();
        }

        if let Some(items) = latest {
            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.save(&items)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "failed to save short-term memory"),
                Err(e) => warn!(error = %e, "short-term memory save task failed"),
            }
        }

        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use agentline_core::memory::short_term::ShortTermMemory;
    use agentline_types::memory::MemoryRole;

    fn item(session: &str, content: &str) -> MemoryItem {
        MemoryItem::message(session, "u", MemoryRole::Human, content, HashMap::new())
    }

    #[tokio::test]
    async fn flush_waits_for_queued_saves() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::spawn(JsonSnapshotStore::new(dir.path()).unwrap());

        for n in 1..=5 {
            let items: Vec<MemoryItem> = (0..n).map(|i| item("s", &i.to_string())).collect();
            writer.save(&items).unwrap();
        }
        writer.flush().await.unwrap();

        assert_eq!(writer.load().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn flush_without_saves_returns() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::spawn(JsonSnapshotStore::new(dir.path()).unwrap());
        writer.flush().await.unwrap();
        assert!(writer.load().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn memory_behind_writer_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::spawn(JsonSnapshotStore::new(dir.path()).unwrap());
        let memory = Arc::new(ShortTermMemory::with_snapshot(50, writer.clone()));

        let tasks: Vec<_> = (0..4)
            .map(|t| {
                let memory = memory.clone();
                tokio::spawn(async move {
                    for i in 0..10 {
                        memory.add(item(&format!("s{t}"), &i.to_string()));
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        writer.flush().await.unwrap();

        let restored = ShortTermMemory::with_snapshot(
            50,
            Arc::new(JsonSnapshotStore::new(dir.path()).unwrap()),
        );
        assert_eq!(restored.len(), 40);
        assert_eq!(restored.session_count(), 4);
    }
}
