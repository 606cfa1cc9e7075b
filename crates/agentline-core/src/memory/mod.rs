//! Short-term conversational memory.
//!
//! - `ShortTermMemory`: bounded per-session FIFO of recent turns
//! - `MemoryManager`: the interface the agent service talks to
//! - `SnapshotStore`: persistence port implemented in agentline-infra

pub mod manager;
pub mod short_term;
pub mod snapshot;
