//! User entity and repository trait.
//!
//! Read-only projection of the `users` table. Account management (sign-up,
//! profiles, credentials) belongs to the platform's CRUD modules; this core
//! only reads users to hydrate author display info.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A user account as seen by the messaging core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name with a username fallback.
    pub fn display_name_or_username(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            username: String::new(),
            display_name: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }
}

/// Read access to user display data.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Batch lookup, used to hydrate the authors of a history page.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;
}
