//! Reaction Manager
//!
//! Adds and removes reactions, resolving the owning room from the message
//! before every broadcast so reaction events never leave the room that
//! owns them.

use std::sync::Arc;

use crate::domain::entities::{Message, MessageRepository, Reaction, ReactionRepository};
use crate::presentation::gateway::events::{ReactionEvent, ServerEvent};
use crate::presentation::gateway::RoomDispatcher;
use crate::shared::error::AppError;

use super::membership_service::MembershipService;

/// Maximum emoji identifier length (matches the column constraint).
const MAX_EMOJI_LEN: usize = 100;

#[derive(Clone)]
pub struct ReactionService {
    reactions: Arc<dyn ReactionRepository>,
    messages: Arc<dyn MessageRepository>,
    membership: MembershipService,
    dispatcher: Arc<RoomDispatcher>,
}

impl ReactionService {
    pub fn new(
        reactions: Arc<dyn ReactionRepository>,
        messages: Arc<dyn MessageRepository>,
        membership: MembershipService,
        dispatcher: Arc<RoomDispatcher>,
    ) -> Self {
        Self {
            reactions,
            messages,
            membership,
            dispatcher,
        }
    }

    /// Resolve a visible message the user is allowed to react to.
    async fn accessible_message(&self, user_id: i64, message_id: i64) -> Result<Message, AppError> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .filter(|m| !m.is_deleted())
            .ok_or_else(AppError::message_not_found)?;
        // Room access uses the same opaque rules as reading history.
        self.membership
            .authorize_member(user_id, message.room_id)
            .await?;
        Ok(message)
    }

    fn validate_emoji(emoji: &str) -> Result<&str, AppError> {
        let emoji = emoji.trim();
        if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LEN {
            return Err(AppError::Validation(format!(
                "Emoji must be 1-{} characters",
                MAX_EMOJI_LEN
            )));
        }
        Ok(emoji)
    }

    /// Add a reaction to a message.
    ///
    /// A second identical reaction from the same user is a conflict, not a
    /// toggle.
    pub async fn add(
        &self,
        user_id: i64,
        message_id: i64,
        emoji: &str,
    ) -> Result<Reaction, AppError> {
        let emoji = Self::validate_emoji(emoji)?;
        let message = self.accessible_message(user_id, message_id).await?;

        if self.reactions.has_reacted(message_id, user_id, emoji).await? {
            return Err(AppError::Conflict("Reaction already exists".into()));
        }

        let reaction = Reaction::new(message_id, user_id, emoji.to_string());
        self.reactions.add(&reaction).await?;

        self.dispatcher.broadcast(
            message.room_id,
            ServerEvent::ReactionAdded(ReactionEvent {
                message_id: message_id.to_string(),
                room_id: message.room_id.to_string(),
                user_id: user_id.to_string(),
                emoji: emoji.to_string(),
            }),
        );

        Ok(reaction)
    }

    /// Remove a user's reaction from a message.
    pub async fn remove(
        &self,
        user_id: i64,
        message_id: i64,
        emoji: &str,
    ) -> Result<(), AppError> {
        let emoji = Self::validate_emoji(emoji)?;
        let message = self.accessible_message(user_id, message_id).await?;

        let removed = self.reactions.remove(message_id, user_id, emoji).await?;
        if !removed {
            return Err(AppError::NotFound("Reaction not found".into()));
        }

        self.dispatcher.broadcast(
            message.room_id,
            ServerEvent::ReactionRemoved(ReactionEvent {
                message_id: message_id.to_string(),
                room_id: message.room_id.to_string(),
                user_id: user_id.to_string(),
                emoji: emoji.to_string(),
            }),
        );

        Ok(())
    }
}
