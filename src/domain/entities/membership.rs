//! Room membership entity and repository trait.
//!
//! Maps to the `room_members` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Privilege level inside a single room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomRole {
    /// The room creator; full control.
    Owner,
    /// May apply moderation actions.
    Moderator,
    /// Regular participant.
    #[default]
    Member,
}

impl RoomRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "owner" => Self::Owner,
            "moderator" => Self::Moderator,
            _ => Self::Member,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }

    /// Check whether this role may apply moderation actions.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Owner | Self::Moderator)
    }
}

/// Represents a user's membership in a room.
///
/// Maps to the `room_members` table:
/// - room_id: BIGINT NOT NULL REFERENCES rooms(id) (composite PK)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) (composite PK)
/// - role: VARCHAR(10) NOT NULL DEFAULT 'member'
/// - muted_until: TIMESTAMPTZ NULL
/// - joined_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Room ID (part of composite primary key)
    pub room_id: i64,

    /// User ID (part of composite primary key)
    pub user_id: i64,

    /// Privilege level in this room
    pub role: RoomRole,

    /// If set and in the future, the member may not send messages
    pub muted_until: Option<DateTime<Utc>>,

    /// When the user joined the room
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Create a new membership with the default role.
    pub fn new(room_id: i64, user_id: i64) -> Self {
        Self {
            room_id,
            user_id,
            role: RoomRole::Member,
            muted_until: None,
            joined_at: Utc::now(),
        }
    }

    /// Check whether the member is muted at the given instant.
    pub fn is_muted_at(&self, now: DateTime<Utc>) -> bool {
        self.muted_until.map(|until| until > now).unwrap_or(false)
    }
}

/// Repository trait for Membership data access operations.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Find a membership by room and user ID.
    async fn find(&self, room_id: i64, user_id: i64) -> Result<Option<Membership>, AppError>;

    /// Check if a user is a member of a room.
    async fn is_member(&self, room_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Add a member to a room.
    ///
    /// A duplicate (room, user) pair is a `Conflict`.
    async fn create(&self, membership: &Membership) -> Result<Membership, AppError>;

    /// Remove a member from a room. Returns whether a record was deleted.
    async fn delete(&self, room_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Set or clear a member's mute expiry.
    async fn set_muted_until(
        &self,
        room_id: i64,
        user_id: i64,
        muted_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn mute_expiry_is_compared_against_now() {
        let mut membership = Membership::new(1, 2);
        let now = Utc::now();
        assert!(!membership.is_muted_at(now));

        membership.muted_until = Some(now + Duration::minutes(5));
        assert!(membership.is_muted_at(now));

        membership.muted_until = Some(now - Duration::minutes(5));
        assert!(!membership.is_muted_at(now));
    }

    #[test]
    fn only_elevated_roles_moderate() {
        assert!(RoomRole::Owner.can_moderate());
        assert!(RoomRole::Moderator.can_moderate());
        assert!(!RoomRole::Member.can_moderate());
    }
}
