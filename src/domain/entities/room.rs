//! Room entity and repository trait.
//!
//! Maps to the `rooms` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Room visibility matching the database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomVisibility {
    /// Anyone may join; membership is created on first join.
    #[default]
    Public,
    /// Joining and reading require a pre-existing membership.
    Private,
}

impl RoomVisibility {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "private" => Self::Private,
            _ => Self::Public,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl std::fmt::Display for RoomVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a listening room.
///
/// Maps to the `rooms` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(100) NOT NULL
/// - description: TEXT NULL
/// - visibility: VARCHAR(10) NOT NULL DEFAULT 'public'
/// - creator_id: BIGINT NOT NULL REFERENCES users(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Visibility is immutable once the room exists; changing it belongs to the
/// platform's CRUD surface, not this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Room name (1-100 characters)
    pub name: String,

    /// Room description
    pub description: Option<String>,

    /// Who may join and read
    pub visibility: RoomVisibility,

    /// User ID of the room creator
    pub creator_id: i64,

    /// Room creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Check if the room is joinable without a pre-existing membership.
    pub fn is_public(&self) -> bool {
        self.visibility == RoomVisibility::Public
    }
}

impl Default for Room {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: None,
            visibility: RoomVisibility::default(),
            creator_id: 0,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for Room data access operations.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a room by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError>;

    /// Create a new room.
    async fn create(&self, room: &Room) -> Result<Room, AppError>;
}
