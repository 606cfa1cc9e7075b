//! Short-term memory persistence.

pub mod snapshot;
pub mod writer;

pub use snapshot::JsonSnapshotStore;
pub use writer::SnapshotWriter;
