//! Message entity, track reference, and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Message kinds matching the database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A regular user message
    #[default]
    Text,
    /// A shared track rendered as a card
    TrackCard,
    /// Server-generated notice; never accepted from clients
    System,
    /// A reply to another message in the same room
    Reply,
}

impl MessageKind {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "track_card" => Self::TrackCard,
            "system" => Self::System,
            "reply" => Self::Reply,
            _ => Self::Text,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TrackCard => "track_card",
            Self::System => "system",
            Self::Reply => "reply",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported track providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackProvider {
    Spotify,
    AppleMusic,
    Youtube,
    Soundcloud,
    Bandcamp,
}

impl TrackProvider {
    /// Parse a provider name. Returns None for unknown providers.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spotify" => Some(Self::Spotify),
            "apple_music" => Some(Self::AppleMusic),
            "youtube" => Some(Self::Youtube),
            "soundcloud" => Some(Self::Soundcloud),
            "bandcamp" => Some(Self::Bandcamp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::AppleMusic => "apple_music",
            Self::Youtube => "youtube",
            Self::Soundcloud => "soundcloud",
            Self::Bandcamp => "bandcamp",
        }
    }
}

/// A normalized reference to an externally hosted track.
///
/// Immutable once attached to a message; stored as JSONB on the
/// `messages` row. Construction goes through the track validator so a
/// stored reference is always well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub provider: TrackProvider,
    pub provider_id: String,
    pub url: String,
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

/// Represents a message in a room.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_id: BIGINT NOT NULL REFERENCES rooms(id)
/// - author_id: BIGINT NOT NULL REFERENCES users(id)
/// - kind: VARCHAR(20) NOT NULL DEFAULT 'text'
/// - body: TEXT NULL (required for text/reply, max 2000 characters)
/// - track: JSONB NULL (present iff kind = 'track_card')
/// - parent_id: BIGINT NULL REFERENCES messages(id) (present iff kind = 'reply')
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - deleted_at: TIMESTAMPTZ NULL (soft delete)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Room the message was sent to
    pub room_id: i64,

    /// Author user ID
    pub author_id: i64,

    /// Kind of message
    pub kind: MessageKind,

    /// Message text (up to 2000 characters)
    pub body: Option<String>,

    /// Attached track reference (track cards only)
    pub track: Option<TrackRef>,

    /// ID of the message being replied to (replies only)
    pub parent_id: Option<i64>,

    /// Timestamp when the message was sent
    pub created_at: DateTime<Utc>,

    /// Soft-delete timestamp (None while the message is visible)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Check if this message has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if this is a reply message.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: 0,
            room_id: 0,
            author_id: 0,
            kind: MessageKind::default(),
            body: None,
            track: None,
            parent_id: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message by its Snowflake ID, including soft-deleted ones.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Find visible messages in a room with cursor-based pagination.
    ///
    /// Uses keyset pagination; soft-deleted messages are excluded.
    /// - `before`: fetch messages older than this message ID (descending)
    /// - `after`: fetch messages newer than this message ID (ascending)
    /// - `limit`: maximum number of messages to return
    async fn find_by_room(
        &self,
        room_id: i64,
        before: Option<i64>,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;

    /// Create a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Soft-delete a message. Returns whether a visible row was affected.
    async fn soft_delete(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<bool, AppError>;
}
