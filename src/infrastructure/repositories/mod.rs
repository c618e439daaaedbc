//! PostgreSQL repository implementations.

pub mod membership_repository;
pub mod message_repository;
pub mod reaction_repository;
pub mod room_repository;
pub mod user_repository;

pub use membership_repository::PgMembershipRepository;
pub use message_repository::PgMessageRepository;
pub use reaction_repository::PgReactionRepository;
pub use room_repository::PgRoomRepository;
pub use user_repository::PgUserRepository;

use crate::shared::error::AppError;

/// Map a unique-constraint violation to a `Conflict`, leaving every other
/// database error as a transient storage failure.
pub(crate) fn map_unique_violation(err: sqlx::Error, conflict: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(conflict.to_string())
        }
        _ => AppError::Database(err),
    }
}
