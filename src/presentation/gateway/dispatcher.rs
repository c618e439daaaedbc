//! Room Broadcast Dispatcher
//!
//! Fans domain events out to every connection currently subscribed to a
//! room, and only those. Delivery is fire-and-forget per connection via
//! each connection's unbounded channel, so a dead or slow connection never
//! blocks delivery to the rest of the room.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::events::{PresenceEvent, ServerEvent, TypingEvent};
use super::registry::ConnectionRegistry;
use crate::infrastructure::metrics;

/// Dispatches room-scoped events to subscribed connections.
pub struct RoomDispatcher {
    registry: Arc<ConnectionRegistry>,
    /// Room ID to subscribed connection IDs.
    rooms: DashMap<i64, HashSet<Uuid>>,
}

impl RoomDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            rooms: DashMap::new(),
        }
    }

    /// Subscribe a connection to a room's fanout.
    pub fn subscribe(&self, room_id: i64, connection_id: Uuid) {
        self.rooms.entry(room_id).or_default().insert(connection_id);
    }

    /// Remove a connection from a room's fanout.
    pub fn unsubscribe(&self, room_id: i64, connection_id: Uuid) {
        if let Some(mut subscribers) = self.rooms.get_mut(&room_id) {
            subscribers.remove(&connection_id);
            if subscribers.is_empty() {
                drop(subscribers);
                self.rooms.remove_if(&room_id, |_, s| s.is_empty());
            }
        }
    }

    /// Number of connections currently subscribed to a room.
    pub fn subscriber_count(&self, room_id: i64) -> usize {
        self.rooms.get(&room_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Deliver an event to every connection subscribed to the room.
    pub fn broadcast(&self, room_id: i64, event: ServerEvent) {
        self.deliver(room_id, event, |_| true);
    }

    /// Announce a connection-level join or leave to the room.
    pub fn broadcast_presence(&self, room_id: i64, user_id: i64, joined: bool) {
        let payload = PresenceEvent {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
        };
        let event = if joined {
            ServerEvent::UserJoined(payload)
        } else {
            ServerEvent::UserLeft(payload)
        };
        self.deliver(room_id, event, |_| true);
    }

    /// Announce a typing transition to the room.
    ///
    /// Never delivered to the typing user's own connections.
    pub fn broadcast_typing(&self, room_id: i64, user_id: i64, is_typing: bool) {
        let event = ServerEvent::UserTyping(TypingEvent {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            is_typing,
        });
        self.deliver(room_id, event, |conn_user| conn_user != user_id);
    }

    fn deliver<F>(&self, room_id: i64, event: ServerEvent, include_user: F)
    where
        F: Fn(i64) -> bool,
    {
        let Some(subscribers) = self.rooms.get(&room_id) else {
            return;
        };

        metrics::record_gateway_event(event.name());
        tracing::debug!(
            room_id = room_id,
            event = event.name(),
            subscribers = subscribers.len(),
            "Broadcasting room event"
        );

        // Subscription ids whose connection is already gone (disconnect can
        // race a subscribe) are pruned lazily here.
        let mut stale: Vec<Uuid> = Vec::new();
        for connection_id in subscribers.iter() {
            match self.registry.get(*connection_id) {
                Some(connection) => {
                    if include_user(connection.user_id) {
                        connection.send(event.clone());
                    }
                }
                None => stale.push(*connection_id),
            }
        }
        drop(subscribers);

        for connection_id in stale {
            self.unsubscribe(room_id, connection_id);
        }
    }
}
