//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `agentline-core` using sqlx with
//! split read/write pools: raw queries, a private Row struct, writes on the
//! writer pool and reads on the reader pool.

use agentline_core::repository::ConversationRepository;
use agentline_types::conversation::{MessageType, StoredMessage};
use agentline_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MessageRow {
    id: String,
    session_id: String,
    message_type: String,
    content: String,
    data: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            message_type: row.try_get("message_type")?,
            content: row.try_get("content")?,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let message_type: MessageType = self
            .message_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let data = self
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid message data: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(StoredMessage {
            id,
            session_id: self.session_id,
            message_type,
            content: self.content,
            data,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn collect_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<StoredMessage>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn append_message(&self, message: &StoredMessage) -> Result<(), RepositoryError> {
        let data = message
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("unserializable message data: {e}")))?;

        sqlx::query(
            r#"INSERT INTO messages (id, session_id, message_type, content, data, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&message.session_id)
        .bind(message.message_type.to_string())
        .bind(&message.content)
        .bind(data)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("message {} already exists", message.id))
            }
            other => RepositoryError::Query(other.to_string()),
        })?;

        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = collect_messages(&rows)?;
        messages.reverse();
        Ok(messages)
    }

    async fn list_messages(
        &self,
        session_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let mut sql = String::from(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        );

        // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
        match (limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let rows = sqlx::query(&sql)
            .bind(session_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        collect_messages(&rows)
    }

    async fn latest_message(
        &self,
        session_id: &str,
    ) -> Result<Option<StoredMessage>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row =
                    MessageRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(msg_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    async fn test_repo() -> (tempfile::TempDir, SqliteConversationRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteConversationRepository::new(pool))
    }

    /// Messages with strictly increasing timestamps, one second apart.
    fn conversation(session: &str, contents: &[&str]) -> Vec<StoredMessage> {
        let start = Utc::now() - Duration::seconds(contents.len() as i64);
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| {
                let message_type = if i % 2 == 0 {
                    MessageType::Human
                } else {
                    MessageType::Ai
                };
                let mut msg = StoredMessage::new(session, message_type, *content, None);
                msg.created_at = start + Duration::seconds(i as i64);
                msg
            })
            .collect()
    }

    #[tokio::test]
    async fn test_append_and_list_messages() {
        let (_dir, repo) = test_repo().await;
        for msg in conversation("s1", &["hello", "hi there", "how are you?"]) {
            repo.append_message(&msg).await.unwrap();
        }

        let messages = repo.list_messages("s1", None, None).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hi there", "how are you?"]);
        assert_eq!(messages[0].message_type, MessageType::Human);
        assert_eq!(messages[1].message_type, MessageType::Ai);
        assert!(repo.list_messages("other", None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_roundtrips_as_json() {
        let (_dir, repo) = test_repo().await;
        let msg = StoredMessage::new(
            "s1",
            MessageType::Ai,
            "Paris.",
            Some(json!({"request_id": "r-1", "confidence": 0.9, "sentiment": "positive"})),
        );
        repo.append_message(&msg).await.unwrap();

        let loaded = repo.latest_message("s1").await.unwrap().unwrap();
        assert_eq!(loaded.id, msg.id);
        let data = loaded.data.unwrap();
        assert_eq!(data["request_id"], "r-1");
        assert_eq!(data["confidence"], 0.9);
    }

    #[tokio::test]
    async fn test_recent_messages_returns_tail_in_order() {
        let (_dir, repo) = test_repo().await;
        for msg in conversation("s1", &["m0", "m1", "m2", "m3", "m4"]) {
            repo.append_message(&msg).await.unwrap();
        }

        let recent = repo.recent_messages("s1", 3).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_list_messages_pagination() {
        let (_dir, repo) = test_repo().await;
        for msg in conversation("s1", &["a", "b", "c", "d"]) {
            repo.append_message(&msg).await.unwrap();
        }

        let page = repo.list_messages("s1", Some(2), Some(1)).await.unwrap();
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);

        let tail = repo.list_messages("s1", None, Some(3)).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].content, "d");
    }

    #[tokio::test]
    async fn test_latest_message() {
        let (_dir, repo) = test_repo().await;
        assert!(repo.latest_message("s1").await.unwrap().is_none());

        for msg in conversation("s1", &["question", "answer"]) {
            repo.append_message(&msg).await.unwrap();
        }
        let latest = repo.latest_message("s1").await.unwrap().unwrap();
        assert_eq!(latest.content, "answer");
        assert_eq!(latest.message_type, MessageType::Ai);
    }

    #[tokio::test]
    async fn test_delete_session_only_touches_that_session() {
        let (_dir, repo) = test_repo().await;
        for msg in conversation("s1", &["a", "b"]) {
            repo.append_message(&msg).await.unwrap();
        }
        for msg in conversation("s2", &["c"]) {
            repo.append_message(&msg).await.unwrap();
        }

        assert_eq!(repo.delete_session("s1").await.unwrap(), 2);
        assert_eq!(repo.delete_session("s1").await.unwrap(), 0);
        assert_eq!(repo.count_messages().await.unwrap(), 1);
        assert_eq!(repo.list_messages("s2", None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_conflict() {
        let (_dir, repo) = test_repo().await;
        let msg = StoredMessage::new("s1", MessageType::Human, "once", None);
        repo.append_message(&msg).await.unwrap();

        let err = repo.append_message(&msg).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_timestamps_survive_storage() {
        let (_dir, repo) = test_repo().await;
        let msg = StoredMessage::new("s1", MessageType::Human, "when?", None);
        repo.append_message(&msg).await.unwrap();

        let loaded = repo.latest_message("s1").await.unwrap().unwrap();
        let drift = (loaded.created_at - msg.created_at).num_microseconds().unwrap().abs();
        assert!(drift < 1, "created_at should round-trip at microsecond precision");
    }
}
