//! Message Pipeline
//!
//! Validates, persists, hydrates, and broadcasts messages. The write plus
//! its room-scoped broadcast is one logical step used by both the gateway
//! and the REST handlers, so duplex subscribers and polling clients observe
//! the same event/record timeline. History reads are cursor-paginated over
//! the same store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::application::dto::response::{MessagePage, MessageView};
use crate::domain::entities::{
    Message, MessageKind, MessageRepository, ReactionRepository, User, UserRepository,
};
use crate::domain::services::{validate_track_ref, TrackRefInput};
use crate::presentation::gateway::{RoomDispatcher, ServerEvent};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::membership_service::MembershipService;

/// Maximum message body length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Default and maximum history page sizes.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validated-at-the-edge send request (ids already parsed).
#[derive(Debug, Clone, Default)]
pub struct SendMessageInput {
    pub kind: MessageKind,
    pub body: Option<String>,
    pub track: Option<TrackRefInput>,
    pub parent_id: Option<i64>,
}

/// Parsed history query.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub before: Option<i64>,
    pub after: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    reactions: Arc<dyn ReactionRepository>,
    users: Arc<dyn UserRepository>,
    membership: MembershipService,
    dispatcher: Arc<RoomDispatcher>,
    snowflake: Arc<SnowflakeGenerator>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserRepository>,
        membership: MembershipService,
        dispatcher: Arc<RoomDispatcher>,
        snowflake: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            messages,
            reactions,
            users,
            membership,
            dispatcher,
            snowflake,
        }
    }

    /// Send a message to a room.
    ///
    /// Validation and persistence complete before anything is broadcast;
    /// a rejected send writes nothing and notifies no one but the caller.
    pub async fn send(
        &self,
        room_id: i64,
        author_id: i64,
        input: SendMessageInput,
    ) -> Result<MessageView, AppError> {
        let (_room, membership) = self.membership.authorize_member(author_id, room_id).await?;

        let now = Utc::now();
        if membership.map(|m| m.is_muted_at(now)).unwrap_or(false) {
            return Err(AppError::Forbidden("You are muted in this room".into()));
        }

        let (body, track, parent_id) = self.validate_content(room_id, &input).await?;

        let message = Message {
            id: self.snowflake.generate(),
            room_id,
            author_id,
            kind: input.kind,
            body,
            track,
            parent_id,
            created_at: now,
            deleted_at: None,
        };
        let created = self.messages.create(&message).await?;

        let author = self
            .users
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Author {} missing", author_id)))?;

        let view = MessageView::new(&created, &author, Vec::new());
        self.dispatcher
            .broadcast(room_id, ServerEvent::MessageCreated(view.clone()));

        tracing::debug!(
            message_id = created.id,
            room_id = room_id,
            author_id = author_id,
            kind = %created.kind,
            "Message created"
        );

        Ok(view)
    }

    /// Kind-specific validation. Returns the normalized content fields.
    async fn validate_content(
        &self,
        room_id: i64,
        input: &SendMessageInput,
    ) -> Result<(Option<String>, Option<crate::domain::entities::TrackRef>, Option<i64>), AppError>
    {
        match input.kind {
            MessageKind::System => Err(AppError::Validation(
                "System messages cannot be sent directly".into(),
            )),

            MessageKind::Text => {
                if input.track.is_some() {
                    return Err(AppError::Validation(
                        "Track references are only valid on track cards".into(),
                    ));
                }
                if input.parent_id.is_some() {
                    return Err(AppError::Validation(
                        "Use the reply kind to reference a parent message".into(),
                    ));
                }
                Ok((Some(self.require_body(input)?), None, None))
            }

            MessageKind::Reply => {
                if input.track.is_some() {
                    return Err(AppError::Validation(
                        "Track references are only valid on track cards".into(),
                    ));
                }
                let parent_id = input.parent_id.ok_or_else(|| {
                    AppError::Validation("A reply requires a parent message".into())
                })?;
                let parent = self
                    .messages
                    .find_by_id(parent_id)
                    .await?
                    .filter(|p| p.room_id == room_id && !p.is_deleted())
                    .ok_or_else(|| {
                        AppError::Validation("Reply parent not found in this room".into())
                    })?;
                Ok((Some(self.require_body(input)?), None, Some(parent.id)))
            }

            MessageKind::TrackCard => {
                if input.parent_id.is_some() {
                    return Err(AppError::Validation(
                        "Use the reply kind to reference a parent message".into(),
                    ));
                }
                let raw = input.track.as_ref().ok_or_else(|| {
                    AppError::Validation("A track card requires a track reference".into())
                })?;
                let track = validate_track_ref(raw)?;
                let body = match input.body.as_deref().map(str::trim) {
                    Some("") | None => None,
                    Some(text) if text.chars().count() > MAX_MESSAGE_LENGTH => {
                        return Err(AppError::Validation(format!(
                            "Message body too long (max {} characters)",
                            MAX_MESSAGE_LENGTH
                        )))
                    }
                    Some(text) => Some(text.to_string()),
                };
                Ok((body, Some(track), None))
            }
        }
    }

    fn require_body(&self, input: &SendMessageInput) -> Result<String, AppError> {
        let body = input
            .body
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AppError::Validation("Message body is required".into()))?;
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "Message body too long (max {} characters)",
                MAX_MESSAGE_LENGTH
            )));
        }
        Ok(body.to_string())
    }

    /// Read a page of room history (newest first unless `after` is given).
    pub async fn history(
        &self,
        room_id: i64,
        user_id: i64,
        query: HistoryQuery,
    ) -> Result<MessagePage, AppError> {
        self.membership.authorize_member(user_id, room_id).await?;

        if query.before.is_some() && query.after.is_some() {
            return Err(AppError::Validation(
                "Use either a before or an after cursor, not both".into(),
            ));
        }
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        // Fetch one extra row to learn whether another page exists.
        let mut rows = self
            .messages
            .find_by_room(room_id, query.before, query.after, limit + 1)
            .await?;
        let has_more = rows.len() as i64 > limit;
        rows.truncate(limit as usize);

        let author_ids: Vec<i64> = {
            let mut ids: Vec<i64> = rows.iter().map(|m| m.author_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let authors: HashMap<i64, User> = self
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let author = authors
                .get(&row.author_id)
                .ok_or_else(|| AppError::Internal(format!("Author {} missing", row.author_id)))?;
            let reactions = self.reactions.get_counts(row.id).await?;
            messages.push(MessageView::new(row, author, reactions));
        }

        let next_cursor = has_more
            .then(|| rows.last().map(|m| m.id.to_string()))
            .flatten();

        Ok(MessagePage {
            messages,
            next_cursor,
            has_more,
        })
    }
}
