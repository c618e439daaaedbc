//! Common Test Utilities
//!
//! In-memory repository implementations and a wired-up application fixture
//! for end-to-end gateway tests without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use trackroom::application::services::{SendMessageInput, Services};
use trackroom::domain::entities::{
    Membership, MembershipRepository, Message, MessageKind, MessageRepository, Reaction,
    ReactionCount, ReactionRepository, Room, RoomRepository, RoomVisibility, User, UserRepository,
};
use trackroom::presentation::gateway::{Gateway, GatewayConnection, ServerEvent};
use trackroom::shared::error::AppError;
use trackroom::shared::snowflake::SnowflakeGenerator;

#[derive(Default)]
pub struct MemoryRooms {
    rows: Mutex<HashMap<i64, Room>>,
}

#[async_trait]
impl RoomRepository for MemoryRooms {
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        Ok(self.rows.lock().get(&id).cloned())
    }

    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        self.rows.lock().insert(room.id, room.clone());
        Ok(room.clone())
    }
}

#[derive(Default)]
pub struct MemoryMemberships {
    rows: Mutex<HashMap<(i64, i64), Membership>>,
}

#[async_trait]
impl MembershipRepository for MemoryMemberships {
    async fn find(&self, room_id: i64, user_id: i64) -> Result<Option<Membership>, AppError> {
        Ok(self.rows.lock().get(&(room_id, user_id)).cloned())
    }

    async fn is_member(&self, room_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self.rows.lock().contains_key(&(room_id, user_id)))
    }

    async fn create(&self, membership: &Membership) -> Result<Membership, AppError> {
        let key = (membership.room_id, membership.user_id);
        let mut rows = self.rows.lock();
        if rows.contains_key(&key) {
            return Err(AppError::Conflict("Already a member of this room".into()));
        }
        rows.insert(key, membership.clone());
        Ok(membership.clone())
    }

    async fn delete(&self, room_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self.rows.lock().remove(&(room_id, user_id)).is_some())
    }

    async fn set_muted_until(
        &self,
        room_id: i64,
        user_id: i64,
        muted_until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        if let Some(membership) = self.rows.lock().get_mut(&(room_id, user_id)) {
            membership.muted_until = muted_until;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMessages {
    rows: Mutex<Vec<Message>>,
}

#[async_trait]
impl MessageRepository for MemoryMessages {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.rows.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_room(
        &self,
        room_id: i64,
        before: Option<i64>,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let rows = self.rows.lock();
        let mut page: Vec<Message> = rows
            .iter()
            .filter(|m| m.room_id == room_id && m.deleted_at.is_none())
            .filter(|m| before.map_or(true, |b| m.id < b))
            .filter(|m| after.map_or(true, |a| m.id > a))
            .cloned()
            .collect();
        if after.is_some() {
            page.sort_by_key(|m| m.id);
        } else {
            page.sort_by_key(|m| std::cmp::Reverse(m.id));
        }
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        self.rows.lock().push(message.clone());
        Ok(message.clone())
    }

    async fn soft_delete(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|m| m.id == id && m.deleted_at.is_none()) {
            Some(message) => {
                message.deleted_at = Some(deleted_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryReactions {
    rows: Mutex<Vec<Reaction>>,
}

#[async_trait]
impl ReactionRepository for MemoryReactions {
    async fn add(&self, reaction: &Reaction) -> Result<(), AppError> {
        let mut rows = self.rows.lock();
        let duplicate = rows.iter().any(|r| {
            r.message_id == reaction.message_id
                && r.user_id == reaction.user_id
                && r.emoji == reaction.emoji
        });
        if duplicate {
            return Err(AppError::Conflict("Reaction already exists".into()));
        }
        rows.push(reaction.clone());
        Ok(())
    }

    async fn remove(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool, AppError> {
        let mut rows = self.rows.lock();
        let len = rows.len();
        rows.retain(|r| {
            !(r.message_id == message_id && r.user_id == user_id && r.emoji == emoji)
        });
        Ok(rows.len() < len)
    }

    async fn has_reacted(
        &self,
        message_id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<bool, AppError> {
        Ok(self.rows.lock().iter().any(|r| {
            r.message_id == message_id && r.user_id == user_id && r.emoji == emoji
        }))
    }

    async fn get_counts(&self, message_id: i64) -> Result<Vec<ReactionCount>, AppError> {
        let rows = self.rows.lock();
        let mut counts: Vec<ReactionCount> = Vec::new();
        for reaction in rows.iter().filter(|r| r.message_id == message_id) {
            match counts.iter_mut().find(|c| c.emoji == reaction.emoji) {
                Some(count) => count.count += 1,
                None => counts.push(ReactionCount {
                    emoji: reaction.emoji.clone(),
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn remove_all(&self, message_id: i64) -> Result<(), AppError> {
        self.rows.lock().retain(|r| r.message_id != message_id);
        Ok(())
    }
}

pub struct MemoryUsers {
    rows: HashMap<i64, User>,
}

impl MemoryUsers {
    fn seeded(ids: &[i64]) -> Self {
        let rows = ids
            .iter()
            .map(|&id| {
                (
                    id,
                    User {
                        id,
                        username: format!("user{}", id),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self { rows }
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.rows.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError> {
        Ok(ids.iter().filter_map(|id| self.rows.get(id).cloned()).collect())
    }
}

/// One simulated gateway client: a registered connection plus its event
/// receiver.
pub struct TestClient {
    pub connection: Arc<GatewayConnection>,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    /// Drain every queued event.
    pub fn events(&mut self) -> Vec<ServerEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            seen.push(event);
        }
        seen
    }

    pub fn event_names(&mut self) -> Vec<String> {
        self.events().iter().map(|e| e.name().to_string()).collect()
    }

    /// Discard everything received so far.
    pub fn drain(&mut self) {
        let _ = self.events();
    }
}

/// Gateway plus services wired over in-memory storage. Users 1-4 exist.
pub struct TestApp {
    pub gateway: Arc<Gateway>,
    pub services: Services,
}

impl TestApp {
    pub fn new() -> Self {
        let gateway = Arc::new(Gateway::new());
        let services = Services::new(
            Arc::new(MemoryRooms::default()),
            Arc::new(MemoryMemberships::default()),
            Arc::new(MemoryMessages::default()),
            Arc::new(MemoryReactions::default()),
            Arc::new(MemoryUsers::seeded(&[1, 2, 3, 4])),
            gateway.dispatcher(),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            10,
        );
        Self { gateway, services }
    }

    /// Create a public room owned by `creator_id`; returns the room id.
    pub async fn create_room(&self, creator_id: i64) -> i64 {
        self.services
            .membership
            .create_room(creator_id, "listening-party".into(), None, RoomVisibility::Public)
            .await
            .unwrap()
            .id
    }

    /// Open an authenticated connection. The `ready` event is consumed.
    pub fn connect(&self, user_id: i64) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = self.gateway.connect(user_id, tx);
        let mut client = TestClient { connection, rx };
        client.drain();
        client
    }

    /// The duplex join path: membership check, then fanout subscription.
    pub async fn join(&self, client: &TestClient, room_id: i64) {
        self.services
            .membership
            .ensure_member(client.connection.user_id, room_id)
            .await
            .unwrap();
        self.gateway.join_room(client.connection.id, room_id).unwrap();
    }
}

/// Build a plain text send request.
pub fn text_input(body: &str) -> SendMessageInput {
    SendMessageInput {
        kind: MessageKind::Text,
        body: Some(body.to_string()),
        ..Default::default()
    }
}
