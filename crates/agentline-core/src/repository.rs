//! ConversationRepository trait definition.
//!
//! Persistence port for conversation messages. Messages are append-only and
//! grouped by an opaque `session_id`; there is no separate session table.

use agentline_types::conversation::StoredMessage;
use agentline_types::error::RepositoryError;

/// Repository trait for conversation message persistence.
///
/// Implementations live in agentline-infra (e.g., `SqliteConversationRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ConversationRepository: Send + Sync {
    /// Append a message to its session.
    fn append_message(
        &self,
        message: &StoredMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recent `limit` messages of a session, in chronological order.
    fn recent_messages(
        &self,
        session_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Page through a session's messages, ordered by created_at ASC.
    fn list_messages(
        &self,
        session_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// The newest message of a session, if any.
    fn latest_message(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<StoredMessage>, RepositoryError>> + Send;

    /// Delete every message of a session. Returns the number of rows removed.
    fn delete_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Total number of stored messages across all sessions.
    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
