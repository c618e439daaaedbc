//! Moderation Action Handler
//!
//! Applies privileged room actions (delete message, mute user, clear
//! reactions) and emits the matching room-scoped broadcast. Actors must
//! hold an elevated role in the room; the role check is delegated to the
//! membership authority.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::entities::{MembershipRepository, MessageRepository, ReactionRepository};
use crate::presentation::gateway::events::{
    MessageDeletedEvent, ReactionsClearedEvent, ServerEvent, UserMutedEvent,
};
use crate::presentation::gateway::RoomDispatcher;
use crate::shared::error::AppError;

use super::membership_service::MembershipService;

/// Privileged room actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    DeleteMessage,
    MuteUser,
    ClearReactions,
}

impl ModerationAction {
    /// Parse an action name. Returns None for unknown actions.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delete_message" => Some(Self::DeleteMessage),
            "mute_user" => Some(Self::MuteUser),
            "clear_reactions" => Some(Self::ClearReactions),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteMessage => "delete_message",
            Self::MuteUser => "mute_user",
            Self::ClearReactions => "clear_reactions",
        }
    }
}

/// Result of an applied action, echoed to the REST caller.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationOutcome {
    pub action: ModerationAction,
    pub room_id: String,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted_until: Option<String>,
}

#[derive(Clone)]
pub struct ModerationService {
    messages: Arc<dyn MessageRepository>,
    reactions: Arc<dyn ReactionRepository>,
    memberships: Arc<dyn MembershipRepository>,
    membership: MembershipService,
    dispatcher: Arc<RoomDispatcher>,
    mute_duration: Duration,
}

impl ModerationService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        reactions: Arc<dyn ReactionRepository>,
        memberships: Arc<dyn MembershipRepository>,
        membership: MembershipService,
        dispatcher: Arc<RoomDispatcher>,
        mute_minutes: i64,
    ) -> Self {
        Self {
            messages,
            reactions,
            memberships,
            membership,
            dispatcher,
            mute_duration: Duration::minutes(mute_minutes),
        }
    }

    /// Apply a moderation action in a room.
    pub async fn apply(
        &self,
        actor_id: i64,
        room_id: i64,
        action: ModerationAction,
        target_id: i64,
        reason: Option<&str>,
    ) -> Result<ModerationOutcome, AppError> {
        self.membership.authorize_moderator(actor_id, room_id).await?;

        let muted_until = match action {
            ModerationAction::DeleteMessage => {
                self.delete_message(room_id, target_id).await?;
                None
            }
            ModerationAction::MuteUser => Some(self.mute_user(room_id, target_id).await?),
            ModerationAction::ClearReactions => {
                self.clear_reactions(room_id, target_id).await?;
                None
            }
        };

        tracing::info!(
            actor_id = actor_id,
            room_id = room_id,
            action = action.as_str(),
            target_id = target_id,
            reason = reason.unwrap_or(""),
            "Moderation action applied"
        );

        Ok(ModerationOutcome {
            action,
            room_id: room_id.to_string(),
            target_id: target_id.to_string(),
            muted_until: muted_until.map(|t| t.to_rfc3339()),
        })
    }

    /// Resolve a visible message belonging to the room being moderated.
    async fn room_message(
        &self,
        room_id: i64,
        message_id: i64,
    ) -> Result<crate::domain::entities::Message, AppError> {
        self.messages
            .find_by_id(message_id)
            .await?
            .filter(|m| m.room_id == room_id && !m.is_deleted())
            .ok_or_else(AppError::message_not_found)
    }

    async fn delete_message(&self, room_id: i64, message_id: i64) -> Result<(), AppError> {
        let message = self.room_message(room_id, message_id).await?;
        self.messages.soft_delete(message.id, Utc::now()).await?;

        self.dispatcher.broadcast(
            room_id,
            ServerEvent::MessageDeleted(MessageDeletedEvent {
                message_id: message.id.to_string(),
                room_id: room_id.to_string(),
            }),
        );
        Ok(())
    }

    async fn mute_user(&self, room_id: i64, user_id: i64) -> Result<DateTime<Utc>, AppError> {
        self.memberships
            .find(room_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found in this room".into()))?;

        let muted_until = Utc::now() + self.mute_duration;
        self.memberships
            .set_muted_until(room_id, user_id, Some(muted_until))
            .await?;

        self.dispatcher.broadcast(
            room_id,
            ServerEvent::UserMuted(UserMutedEvent {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
                muted_until: muted_until.to_rfc3339(),
            }),
        );
        Ok(muted_until)
    }

    async fn clear_reactions(&self, room_id: i64, message_id: i64) -> Result<(), AppError> {
        let message = self.room_message(room_id, message_id).await?;
        self.reactions.remove_all(message.id).await?;

        self.dispatcher.broadcast(
            room_id,
            ServerEvent::ReactionsCleared(ReactionsClearedEvent {
                message_id: message.id.to_string(),
                room_id: room_id.to_string(),
            }),
        );
        Ok(())
    }
}
