//! Room Repository Implementation
//!
//! PostgreSQL implementation of room storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::{Room, RoomRepository, RoomVisibility};
use crate::shared::error::AppError;

/// PostgreSQL implementation of the RoomRepository.
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Creates a new PgRoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for room queries.
#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    name: String,
    description: Option<String>,
    visibility: String,
    creator_id: i64,
    created_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> Room {
        Room {
            id: self.id,
            name: self.name,
            description: self.description,
            visibility: RoomVisibility::from_str(&self.visibility),
            creator_id: self.creator_id,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    /// Find a room by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, name, description, visibility, creator_id, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RoomRow::into_room))
    }

    /// Create a new room.
    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            INSERT INTO rooms (id, name, description, visibility, creator_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, visibility, creator_id, created_at
            "#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.visibility.as_str())
        .bind(room.creator_id)
        .bind(room.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_room())
    }
}
