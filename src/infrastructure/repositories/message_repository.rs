//! Message Repository Implementation
//!
//! PostgreSQL implementation of message operations with cursor-based
//! pagination and soft deletion. Track references are stored as JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{Message, MessageKind, MessageRepository, TrackRef};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
/// Maps to the messages table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    author_id: i64,
    kind: String,
    body: Option<String>,
    track: Option<serde_json::Value>,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl MessageRow {
    /// Converts database row to domain Message entity.
    fn into_message(self) -> Result<Message, AppError> {
        let track: Option<TrackRef> = self
            .track
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Corrupt track reference: {}", e)))?;

        Ok(Message {
            id: self.id,
            room_id: self.room_id,
            author_id: self.author_id,
            kind: MessageKind::from_str(&self.kind),
            body: self.body,
            track,
            parent_id: self.parent_id,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
        })
    }
}

const MESSAGE_COLUMNS: &str =
    "id, room_id, author_id, kind, body, track, parent_id, created_at, deleted_at";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    /// Find a message by its ID.
    ///
    /// Soft-deleted messages are returned too; callers decide whether a
    /// deleted message is visible for their operation.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MessageRow::into_message).transpose()
    }

    /// Find visible messages in a room with cursor-based pagination.
    ///
    /// Uses keyset pagination for efficient scrolling through large
    /// histories. Without an `after` cursor, messages come back newest
    /// first; with one, oldest first.
    async fn find_by_room(
        &self,
        room_id: i64,
        before: Option<i64>,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let limit = limit.clamp(1, 200);

        let rows = match (before, after) {
            (Some(before_id), _) => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    r#"
                    SELECT {}
                    FROM messages
                    WHERE room_id = $1 AND deleted_at IS NULL AND id < $2
                    ORDER BY id DESC
                    LIMIT $3
                    "#,
                    MESSAGE_COLUMNS
                ))
                .bind(room_id)
                .bind(before_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(after_id)) => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    r#"
                    SELECT {}
                    FROM messages
                    WHERE room_id = $1 AND deleted_at IS NULL AND id > $2
                    ORDER BY id ASC
                    LIMIT $3
                    "#,
                    MESSAGE_COLUMNS
                ))
                .bind(room_id)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    r#"
                    SELECT {}
                    FROM messages
                    WHERE room_id = $1 AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $2
                    "#,
                    MESSAGE_COLUMNS
                ))
                .bind(room_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Create a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let track = message
            .track
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Unserializable track reference: {}", e)))?;

        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (id, room_id, author_id, kind, body, track, parent_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(message.room_id)
        .bind(message.author_id)
        .bind(message.kind.as_str())
        .bind(&message.body)
        .bind(track)
        .bind(message.parent_id)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_message()
    }

    /// Soft-delete a message. Returns whether a visible row was affected.
    async fn soft_delete(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET deleted_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
