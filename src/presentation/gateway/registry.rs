//! Connection Registry
//!
//! Owns the mapping from live gateway connections to their authenticated
//! user and the rooms each connection has joined. All mutation goes through
//! this type; handlers never touch the maps directly.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;
use crate::infrastructure::metrics;

/// One authenticated gateway connection.
///
/// Created exactly once at authentication time and shared by reference;
/// nothing outside the registry mutates the joined-room set.
pub struct GatewayConnection {
    pub id: Uuid,
    pub user_id: i64,
    sender: mpsc::UnboundedSender<ServerEvent>,
    rooms: RwLock<HashSet<i64>>,
}

impl GatewayConnection {
    /// Queue an event for this connection.
    ///
    /// Fire-and-forget: a closed receiver just drops the event, so one dead
    /// connection never affects delivery to others.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Check whether this connection has joined a room.
    pub fn is_joined(&self, room_id: i64) -> bool {
        self.rooms.read().contains(&room_id)
    }

    /// Snapshot of the rooms this connection has joined.
    pub fn joined_rooms(&self) -> Vec<i64> {
        self.rooms.read().iter().copied().collect()
    }
}

/// Registry of all live connections.
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Arc<GatewayConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a newly authenticated connection.
    pub fn register(
        &self,
        user_id: i64,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Arc<GatewayConnection> {
        let connection = Arc::new(GatewayConnection {
            id: Uuid::new_v4(),
            user_id,
            sender,
            rooms: RwLock::new(HashSet::new()),
        });
        self.connections.insert(connection.id, connection.clone());
        metrics::set_gateway_connections(self.connections.len() as i64);

        tracing::info!(
            user_id = user_id,
            connection_id = %connection.id,
            "Connection registered"
        );

        connection
    }

    /// Look up a live connection.
    pub fn get(&self, connection_id: Uuid) -> Option<Arc<GatewayConnection>> {
        self.connections
            .get(&connection_id)
            .map(|c| Arc::clone(c.value()))
    }

    /// Record that a connection joined a room.
    ///
    /// Returns `None` if the connection is already torn down (an in-flight
    /// join completing after disconnect must not re-register state),
    /// `Some(false)` if the room was already joined on this connection.
    pub fn record_join(&self, connection_id: Uuid, room_id: i64) -> Option<bool> {
        let connection = self.get(connection_id)?;
        let inserted = connection.rooms.write().insert(room_id);
        Some(inserted)
    }

    /// Record that a connection left a room. Returns whether it was joined.
    pub fn record_leave(&self, connection_id: Uuid, room_id: i64) -> bool {
        self.get(connection_id)
            .map(|c| c.rooms.write().remove(&room_id))
            .unwrap_or(false)
    }

    /// Remove a connection, returning its user and joined rooms exactly once.
    ///
    /// Idempotent: repeat calls return `None` and have no effect, so the
    /// caller's cleanup (typing, presence) runs at most once per lifetime.
    pub fn unregister(&self, connection_id: Uuid) -> Option<(i64, Vec<i64>)> {
        let (_, connection) = self.connections.remove(&connection_id)?;
        metrics::set_gateway_connections(self.connections.len() as i64);

        tracing::info!(
            user_id = connection.user_id,
            connection_id = %connection_id,
            "Connection unregistered"
        );

        Some((connection.user_id, connection.joined_rooms()))
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_connection() -> (ConnectionRegistry, Arc<GatewayConnection>) {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = registry.register(7, tx);
        (registry, connection)
    }

    #[test]
    fn join_is_tracked_and_double_join_detected() {
        let (registry, connection) = registry_with_connection();

        assert_eq!(registry.record_join(connection.id, 1), Some(true));
        assert_eq!(registry.record_join(connection.id, 1), Some(false));
        assert!(connection.is_joined(1));
        assert!(!connection.is_joined(2));
    }

    #[test]
    fn leave_is_idempotent() {
        let (registry, connection) = registry_with_connection();
        registry.record_join(connection.id, 1);

        assert!(registry.record_leave(connection.id, 1));
        assert!(!registry.record_leave(connection.id, 1));
    }

    #[test]
    fn unregister_returns_cleanup_snapshot_once() {
        let (registry, connection) = registry_with_connection();
        registry.record_join(connection.id, 1);
        registry.record_join(connection.id, 2);

        let (user_id, mut rooms) = registry.unregister(connection.id).unwrap();
        rooms.sort_unstable();
        assert_eq!(user_id, 7);
        assert_eq!(rooms, vec![1, 2]);

        // Second unregister is a no-op.
        assert!(registry.unregister(connection.id).is_none());
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn operations_on_dead_connections_are_noops() {
        let (registry, connection) = registry_with_connection();
        registry.unregister(connection.id);

        assert_eq!(registry.record_join(connection.id, 1), None);
        assert!(!registry.record_leave(connection.id, 1));
    }

    #[test]
    fn send_to_closed_receiver_does_not_panic() {
        let (registry, connection) = registry_with_connection();
        drop(registry);
        connection.send(ServerEvent::from_error(
            &crate::shared::error::AppError::Conflict("x".into()),
        ));
    }
}
