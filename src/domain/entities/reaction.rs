//! Message Reaction entity and repository trait.
//!
//! Maps to the `message_reactions` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// One user's emoji reaction on a message.
///
/// Maps to the `message_reactions` table, whose composite primary key
/// (message_id, user_id, emoji) backs the one-reaction-per-triple
/// invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Message carrying the reaction
    pub message_id: i64,

    /// Who reacted
    pub user_id: i64,

    /// Emoji identifier (Unicode emoji or shortcode)
    pub emoji: String,

    /// When the reaction was created
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new reaction.
    pub fn new(message_id: i64, user_id: i64, emoji: String) -> Self {
        Self {
            message_id,
            user_id,
            emoji,
            created_at: Utc::now(),
        }
    }
}

/// Per-emoji tally for a message, in first-used order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: String,

    /// How many users reacted with this emoji
    pub count: i64,
}

/// Storage contract for reactions.
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Add a reaction to a message.
    ///
    /// A duplicate (message, user, emoji) triple is a `Conflict`: the
    /// unique violation is mapped rather than swallowed so concurrent
    /// duplicate adds surface the same error as the service-level check.
    async fn add(&self, reaction: &Reaction) -> Result<(), AppError>;

    /// Remove a reaction from a message. Returns whether a row was deleted.
    async fn remove(&self, message_id: i64, user_id: i64, emoji: &str)
        -> Result<bool, AppError>;

    /// Check if a user has reacted with a specific emoji.
    async fn has_reacted(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool, AppError>;

    /// Get aggregated reaction counts for a message.
    async fn get_counts(&self, message_id: i64) -> Result<Vec<ReactionCount>, AppError>;

    /// Remove all reactions from a message.
    ///
    /// Used by moderators clearing a message's reactions.
    async fn remove_all(&self, message_id: i64) -> Result<(), AppError>;
}
