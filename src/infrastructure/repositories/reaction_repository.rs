//! Reaction Repository Implementation
//!
//! PostgreSQL implementation of message reaction operations. Reactions are
//! stored per-user per-emoji per-message; the composite primary key backs
//! the one-reaction-per-triple invariant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::map_unique_violation;
use crate::domain::entities::{Reaction, ReactionCount, ReactionRepository};
use crate::shared::error::AppError;

/// PostgreSQL implementation of the ReactionRepository.
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Creates a new PgReactionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for reaction count queries.
#[derive(Debug, sqlx::FromRow)]
struct ReactionCountRow {
    emoji: String,
    count: i64,
    first_reaction_at: DateTime<Utc>,
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    /// Add a reaction to a message.
    ///
    /// A duplicate triple surfaces as `Conflict`: the service checks first,
    /// but two concurrent adds can both pass that check and only one may
    /// win the insert.
    async fn add(&self, reaction: &Reaction) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO message_reactions (message_id, user_id, emoji, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reaction.message_id)
        .bind(reaction.user_id)
        .bind(&reaction.emoji)
        .bind(reaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Reaction already exists"))?;

        Ok(())
    }

    /// Remove a reaction from a message. Returns whether a row was deleted.
    async fn remove(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM message_reactions
            WHERE message_id = $1 AND user_id = $2 AND emoji = $3
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a user has reacted with a specific emoji.
    ///
    /// Efficient single-row check using EXISTS.
    async fn has_reacted(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM message_reactions
                WHERE message_id = $1 AND user_id = $2 AND emoji = $3
            )
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Get aggregated reaction counts for a message.
    ///
    /// Returns reactions ordered by when each emoji was first used.
    async fn get_counts(&self, message_id: i64) -> Result<Vec<ReactionCount>, AppError> {
        let rows = sqlx::query_as::<_, ReactionCountRow>(
            r#"
            SELECT
                emoji,
                COUNT(*) as count,
                MIN(created_at) as first_reaction_at
            FROM message_reactions
            WHERE message_id = $1
            GROUP BY emoji
            ORDER BY first_reaction_at ASC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ReactionCount {
                emoji: r.emoji,
                count: r.count,
            })
            .collect())
    }

    /// Remove all reactions from a message.
    async fn remove_all(&self, message_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM message_reactions
            WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
