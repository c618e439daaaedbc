//! Membership Repository Implementation
//!
//! PostgreSQL implementation of room membership operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::map_unique_violation;
use crate::domain::entities::{Membership, MembershipRepository, RoomRole};
use crate::shared::error::AppError;

/// PostgreSQL implementation of the MembershipRepository.
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Creates a new PgMembershipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for membership queries.
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    room_id: i64,
    user_id: i64,
    role: String,
    muted_until: Option<DateTime<Utc>>,
    joined_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> Membership {
        Membership {
            room_id: self.room_id,
            user_id: self.user_id,
            role: RoomRole::from_str(&self.role),
            muted_until: self.muted_until,
            joined_at: self.joined_at,
        }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    /// Find a membership by room and user ID.
    async fn find(&self, room_id: i64, user_id: i64) -> Result<Option<Membership>, AppError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT room_id, user_id, role, muted_until, joined_at
            FROM room_members
            WHERE room_id = $1 AND user_id = $2
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MembershipRow::into_membership))
    }

    /// Check if a user is a member of a room.
    async fn is_member(&self, room_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM room_members
                WHERE room_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Add a member to a room.
    async fn create(&self, membership: &Membership) -> Result<Membership, AppError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO room_members (room_id, user_id, role, muted_until, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING room_id, user_id, role, muted_until, joined_at
            "#,
        )
        .bind(membership.room_id)
        .bind(membership.user_id)
        .bind(membership.role.as_str())
        .bind(membership.muted_until)
        .bind(membership.joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Already a member of this room"))?;

        Ok(row.into_membership())
    }

    /// Remove a member from a room. Returns whether a record was deleted.
    async fn delete(&self, room_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM room_members
            WHERE room_id = $1 AND user_id = $2
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set or clear a member's mute expiry.
    async fn set_muted_until(
        &self,
        room_id: i64,
        user_id: i64,
        muted_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE room_members
            SET muted_until = $3
            WHERE room_id = $1 AND user_id = $2
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(muted_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
