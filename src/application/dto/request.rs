//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use validator::Validate;

use crate::domain::entities::MessageKind;
use crate::domain::services::TrackRefInput;

/// Create room request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    /// "public" (default) or "private"
    pub visibility: Option<String>,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub kind: MessageKind,

    #[validate(length(max = 2000, message = "Message body too long (max 2000 characters)"))]
    pub body: Option<String>,

    pub track: Option<TrackRefInput>,

    /// String-encoded snowflake of the message being replied to
    pub parent_id: Option<String>,
}

/// History query parameters
#[derive(Debug, Deserialize, Default)]
pub struct MessageHistoryQuery {
    /// Opaque cursor: fetch messages older than this
    pub before: Option<String>,
    /// Opaque cursor: fetch messages newer than this
    pub after: Option<String>,
    pub limit: Option<i64>,
}

/// Add reaction request
#[derive(Debug, Deserialize, Validate)]
pub struct AddReactionRequest {
    #[validate(length(min = 1, max = 100, message = "Emoji must be 1-100 characters"))]
    pub emoji: String,
}

/// Apply moderation action request
#[derive(Debug, Deserialize, Validate)]
pub struct ModerationRequest {
    /// "delete_message", "mute_user", or "clear_reactions"
    pub action: String,

    /// String-encoded snowflake of the target message or user
    pub target_id: String,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}
