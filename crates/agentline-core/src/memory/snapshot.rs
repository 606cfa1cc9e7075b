//! SnapshotStore trait definition.

use agentline_types::error::MemoryError;
use agentline_types::memory::MemoryItem;

/// Whole-memory persistence for [`super::short_term::ShortTermMemory`].
///
/// Synchronous, and called after every mutation on the request path, so
/// implementations used from async code should hand slow IO elsewhere.
/// Implementations live in agentline-infra (`JsonSnapshotStore`,
/// `SnapshotWriter`).
pub trait SnapshotStore: Send + Sync {
    /// Read the last saved items. A store that has never been written
    /// returns an empty list.
    fn load(&self) -> Result<Vec<MemoryItem>, MemoryError>;

    /// Replace the stored items.
    fn save(&self, items: &[MemoryItem]) -> Result<(), MemoryError>;
}
