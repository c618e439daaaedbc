//! Membership Authority
//!
//! Source of truth for "is user U a member of room R", join authorization,
//! and elevated-privilege checks. Both the REST surface and the gateway
//! delegate here; a private room a caller cannot access and a room that
//! does not exist are indistinguishable from the outside.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entities::{
    Membership, MembershipRepository, Room, RoomRepository, RoomRole, RoomVisibility,
};
use crate::presentation::gateway::RoomDispatcher;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

#[derive(Clone)]
pub struct MembershipService {
    rooms: Arc<dyn RoomRepository>,
    memberships: Arc<dyn MembershipRepository>,
    dispatcher: Arc<RoomDispatcher>,
    snowflake: Arc<SnowflakeGenerator>,
}

impl MembershipService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        memberships: Arc<dyn MembershipRepository>,
        dispatcher: Arc<RoomDispatcher>,
        snowflake: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            rooms,
            memberships,
            dispatcher,
            snowflake,
        }
    }

    /// Create a room; the creator becomes its owner member.
    pub async fn create_room(
        &self,
        creator_id: i64,
        name: String,
        description: Option<String>,
        visibility: RoomVisibility,
    ) -> Result<Room, AppError> {
        let room = Room {
            id: self.snowflake.generate(),
            name,
            description,
            visibility,
            creator_id,
            created_at: Utc::now(),
        };
        let created = self.rooms.create(&room).await?;

        let owner = Membership {
            room_id: created.id,
            user_id: creator_id,
            role: RoomRole::Owner,
            muted_until: None,
            joined_at: Utc::now(),
        };
        self.memberships.create(&owner).await?;

        tracing::info!(
            room_id = created.id,
            creator_id = creator_id,
            visibility = %created.visibility,
            "Room created"
        );

        Ok(created)
    }

    /// Check whether a user is a member of a room.
    pub async fn is_member(&self, user_id: i64, room_id: i64) -> Result<bool, AppError> {
        self.memberships.is_member(room_id, user_id).await
    }

    /// Check whether a user may join a room.
    ///
    /// Public rooms are always joinable; private rooms require an existing
    /// membership. A nonexistent room is simply not joinable.
    pub async fn can_join(&self, user_id: i64, room_id: i64) -> Result<bool, AppError> {
        match self.rooms.find_by_id(room_id).await? {
            None => Ok(false),
            Some(room) if room.is_public() => Ok(true),
            Some(_) => self.memberships.is_member(room_id, user_id).await,
        }
    }

    /// Resolve a room the user is allowed to see.
    ///
    /// Returns the room and the user's membership (if any). Nonexistent
    /// rooms and private rooms without membership yield the same opaque
    /// not-found error.
    pub async fn authorize_member(
        &self,
        user_id: i64,
        room_id: i64,
    ) -> Result<(Room, Option<Membership>), AppError> {
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(AppError::room_not_found)?;

        let membership = self.memberships.find(room_id, user_id).await?;
        if room.visibility == RoomVisibility::Private && membership.is_none() {
            return Err(AppError::room_not_found());
        }
        Ok((room, membership))
    }

    /// Resolve a room the user may moderate.
    pub async fn authorize_moderator(&self, user_id: i64, room_id: i64) -> Result<Room, AppError> {
        let (room, membership) = self.authorize_member(user_id, room_id).await?;
        match membership {
            Some(m) if m.role.can_moderate() => Ok(room),
            _ => Err(AppError::Forbidden(
                "Moderator privileges required".into(),
            )),
        }
    }

    /// Gateway join path: make sure a membership exists.
    ///
    /// Creates one on first join of a public room; idempotent for existing
    /// members. Private rooms without membership get the opaque not-found.
    pub async fn ensure_member(&self, user_id: i64, room_id: i64) -> Result<Room, AppError> {
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(AppError::room_not_found)?;

        if self.memberships.is_member(room_id, user_id).await? {
            return Ok(room);
        }
        if room.visibility == RoomVisibility::Private {
            return Err(AppError::room_not_found());
        }

        self.memberships
            .create(&Membership::new(room_id, user_id))
            .await?;
        Ok(room)
    }

    /// REST join: create the membership and announce presence.
    ///
    /// Joining a room you are already a member of is a conflict.
    pub async fn join(&self, user_id: i64, room_id: i64) -> Result<Membership, AppError> {
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(AppError::room_not_found)?;

        if self.memberships.is_member(room_id, user_id).await? {
            return Err(AppError::Conflict("Already a member of this room".into()));
        }
        if room.visibility == RoomVisibility::Private {
            return Err(AppError::room_not_found());
        }

        let membership = self.memberships.create(&Membership::new(room_id, user_id)).await?;
        self.dispatcher.broadcast_presence(room_id, user_id, true);
        Ok(membership)
    }

    /// REST leave: remove the membership and announce departure.
    pub async fn leave(&self, user_id: i64, room_id: i64) -> Result<(), AppError> {
        let (_room, membership) = self.authorize_member(user_id, room_id).await?;
        let membership =
            membership.ok_or_else(|| AppError::NotFound("Not a member of this room".into()))?;

        if membership.role == RoomRole::Owner {
            return Err(AppError::Conflict("Room owner cannot leave".into()));
        }

        self.memberships.delete(room_id, user_id).await?;
        self.dispatcher.broadcast_presence(room_id, user_id, false);
        Ok(())
    }
}
