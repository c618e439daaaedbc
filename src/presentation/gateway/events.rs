//! Gateway wire types.
//!
//! Inbound client commands are `{"op": ..., "d": {...}}`; outbound events
//! are `{"t": ..., "d": {...}}`.

use serde::{Deserialize, Serialize};

use crate::application::dto::response::MessageView;
use crate::domain::entities::MessageKind;
use crate::domain::services::TrackRefInput;
use crate::shared::error::AppError;

/// Outbound event pushed to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", content = "d", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once after the connection is authenticated and registered.
    Ready(ReadyEvent),
    MessageCreated(MessageView),
    MessageDeleted(MessageDeletedEvent),
    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),
    ReactionsCleared(ReactionsClearedEvent),
    UserJoined(PresenceEvent),
    UserLeft(PresenceEvent),
    UserTyping(TypingEvent),
    UserMuted(UserMutedEvent),
    /// Scoped to the originating connection; never broadcast.
    Error(ErrorEvent),
}

impl ServerEvent {
    /// Event name for dispatch metrics and logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Ready(_) => "ready",
            ServerEvent::MessageCreated(_) => "message_created",
            ServerEvent::MessageDeleted(_) => "message_deleted",
            ServerEvent::ReactionAdded(_) => "reaction_added",
            ServerEvent::ReactionRemoved(_) => "reaction_removed",
            ServerEvent::ReactionsCleared(_) => "reactions_cleared",
            ServerEvent::UserJoined(_) => "user_joined",
            ServerEvent::UserLeft(_) => "user_left",
            ServerEvent::UserTyping(_) => "user_typing",
            ServerEvent::UserMuted(_) => "user_muted",
            ServerEvent::Error(_) => "error",
        }
    }

    /// Build a scoped error event from an application error.
    pub fn from_error(err: &AppError) -> Self {
        ServerEvent::Error(ErrorEvent {
            code: err.code().to_string(),
            message: err.client_message(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDeletedEvent {
    pub message_id: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionEvent {
    pub message_id: String,
    pub room_id: String,
    pub user_id: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionsClearedEvent {
    pub message_id: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceEvent {
    pub room_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypingEvent {
    pub room_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMutedEvent {
    pub room_id: String,
    pub user_id: String,
    pub muted_until: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub code: String,
    pub message: String,
}

/// Inbound command from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientCommand {
    JoinRoom(RoomTarget),
    LeaveRoom(RoomTarget),
    SendMessage(SendMessagePayload),
    AddReaction(ReactionTarget),
    RemoveReaction(ReactionTarget),
    TypingStart(RoomTarget),
    TypingStop(RoomTarget),
}

#[derive(Debug, Deserialize)]
pub struct RoomTarget {
    pub room_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessagePayload {
    pub room_id: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub track: Option<TrackRefInput>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionTarget {
    pub message_id: String,
    pub emoji: String,
}

/// Parse a string-encoded snowflake id from the wire.
pub fn parse_snowflake(raw: &str, field: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid {}", field)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"op":"join_room","d":{"room_id":"42"}}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::JoinRoom(RoomTarget { ref room_id }) if room_id == "42"));

        let cmd: ClientCommand = serde_json::from_str(
            r#"{"op":"send_message","d":{"room_id":"42","kind":"text","body":"hi"}}"#,
        )
        .unwrap();
        match cmd {
            ClientCommand::SendMessage(p) => {
                assert_eq!(p.room_id, "42");
                assert_eq!(p.kind, MessageKind::Text);
                assert_eq!(p.body.as_deref(), Some("hi"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn events_serialize_with_tag_and_payload() {
        let event = ServerEvent::UserTyping(TypingEvent {
            room_id: "1".into(),
            user_id: "2".into(),
            is_typing: true,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["t"], "user_typing");
        assert_eq!(json["d"]["room_id"], "1");
        assert_eq!(json["d"]["is_typing"], true);
    }

    #[test]
    fn error_events_carry_stable_codes() {
        let event = ServerEvent::from_error(&AppError::Conflict("Already joined".into()));
        match event {
            ServerEvent::Error(e) => {
                assert_eq!(e.code, "conflict");
                assert!(e.message.contains("Already joined"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn snowflake_parsing_rejects_garbage() {
        assert_eq!(parse_snowflake("123", "room id").unwrap(), 123);
        assert!(parse_snowflake("abc", "room id").is_err());
    }
}
