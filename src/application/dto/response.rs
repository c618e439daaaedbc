//! Response DTOs
//!
//! Data structures for API response bodies and gateway event payloads.
//! `MessageView` is the single hydrated message shape observed by both the
//! REST surface and duplex subscribers.

use serde::Serialize;

use crate::domain::entities::{Membership, Message, MessageKind, Reaction, ReactionCount, Room, TrackRef, User};

/// Author display info embedded in message views.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A fully hydrated message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    pub room_id: String,
    pub author: UserSummary,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub reactions: Vec<ReactionCount>,
    pub created_at: String,
}

impl MessageView {
    pub fn new(message: &Message, author: &User, reactions: Vec<ReactionCount>) -> Self {
        Self {
            id: message.id.to_string(),
            room_id: message.room_id.to_string(),
            author: UserSummary::from(author),
            kind: message.kind,
            body: message.body.clone(),
            track: message.track.clone(),
            parent_id: message.parent_id.map(|id| id.to_string()),
            reactions,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// One page of room history.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    /// Opaque cursor for the next older page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Room response
#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub visibility: String,
    pub creator_id: String,
    pub created_at: String,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.name,
            description: room.description,
            visibility: room.visibility.as_str().to_string(),
            creator_id: room.creator_id.to_string(),
            created_at: room.created_at.to_rfc3339(),
        }
    }
}

/// Membership response (REST join)
#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    pub room_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            room_id: membership.room_id.to_string(),
            user_id: membership.user_id.to_string(),
            role: membership.role.as_str().to_string(),
            joined_at: membership.joined_at.to_rfc3339(),
        }
    }
}

/// Reaction response (REST add)
#[derive(Debug, Clone, Serialize)]
pub struct ReactionResponse {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at: String,
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self {
            message_id: reaction.message_id.to_string(),
            user_id: reaction.user_id.to_string(),
            emoji: reaction.emoji,
            created_at: reaction.created_at.to_rfc3339(),
        }
    }
}
