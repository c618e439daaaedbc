//! WebSocket gateway.
//!
//! The gateway façade composes the connection registry, the room broadcast
//! dispatcher, and the typing tracker. Every mutation of connection-scoped
//! state (join, leave, typing, disconnect) funnels through the methods
//! here so the symmetry and idempotence invariants are enforced in one
//! place.

pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod registry;
pub mod typing;

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::error::AppError;

pub use dispatcher::RoomDispatcher;
pub use events::{ClientCommand, ServerEvent};
pub use handler::ws_handler;
pub use registry::{ConnectionRegistry, GatewayConnection};
pub use typing::{TypingTracker, TYPING_TTL};

/// Shared gateway state: registry + dispatcher + typing tracker.
pub struct Gateway {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<RoomDispatcher>,
    typing: Arc<TypingTracker>,
}

impl Gateway {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(RoomDispatcher::new(registry.clone()));
        let typing = Arc::new(TypingTracker::new(dispatcher.clone()));
        Self {
            registry,
            dispatcher,
            typing,
        }
    }

    /// The dispatcher, shared with the application services so REST
    /// mutations broadcast through the same fanout as duplex ones.
    pub fn dispatcher(&self) -> Arc<RoomDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register an authenticated connection and push its `ready` event.
    pub fn connect(
        &self,
        user_id: i64,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Arc<GatewayConnection> {
        let connection = self.registry.register(user_id, sender);
        connection.send(ServerEvent::Ready(events::ReadyEvent {
            session_id: connection.id.to_string(),
            user_id: user_id.to_string(),
        }));
        connection
    }

    /// Subscribe a connection to a room's fanout and announce presence.
    ///
    /// Membership authorization happens before this is called; here the
    /// room is only wired into the connection's fanout.
    pub fn join_room(&self, connection_id: Uuid, room_id: i64) -> Result<(), AppError> {
        match self.registry.record_join(connection_id, room_id) {
            // Connection already torn down; a late join must not
            // re-register state.
            None => Ok(()),
            Some(false) => Err(AppError::Conflict("Already joined to this room".into())),
            Some(true) => {
                self.dispatcher.subscribe(room_id, connection_id);
                if let Some(connection) = self.registry.get(connection_id) {
                    self.dispatcher
                        .broadcast_presence(room_id, connection.user_id, true);
                }
                Ok(())
            }
        }
    }

    /// Unsubscribe a connection from a room's fanout.
    ///
    /// Leaving a room that was never joined is a no-op; removal must stay
    /// idempotent under reordering with disconnect cleanup.
    pub fn leave_room(&self, connection_id: Uuid, room_id: i64) -> Result<(), AppError> {
        if self.registry.record_leave(connection_id, room_id) {
            if let Some(connection) = self.registry.get(connection_id) {
                self.typing.stop(room_id, connection.user_id);
                self.dispatcher.unsubscribe(room_id, connection_id);
                self.dispatcher
                    .broadcast_presence(room_id, connection.user_id, false);
            }
        }
        Ok(())
    }

    /// Start a typing indicator; requires the connection to be in the room.
    pub fn typing_start(&self, connection_id: Uuid, room_id: i64) -> Result<(), AppError> {
        let Some(connection) = self.registry.get(connection_id) else {
            return Ok(());
        };
        if !connection.is_joined(room_id) {
            return Err(AppError::Forbidden("Join the room before typing".into()));
        }
        self.typing.start(room_id, connection.user_id);
        Ok(())
    }

    /// Stop a typing indicator. No-op when there is nothing to stop.
    pub fn typing_stop(&self, connection_id: Uuid, room_id: i64) -> Result<(), AppError> {
        if let Some(connection) = self.registry.get(connection_id) {
            self.typing.stop(room_id, connection.user_id);
        }
        Ok(())
    }

    /// Tear down a connection.
    ///
    /// The universal cancellation signal: clears typing state and announces
    /// presence-left for every room the connection had joined. Safe to call
    /// more than once.
    pub fn disconnect(&self, connection_id: Uuid) {
        let Some((user_id, rooms)) = self.registry.unregister(connection_id) else {
            return;
        };
        for room_id in rooms {
            self.typing.stop(room_id, user_id);
            self.dispatcher.unsubscribe(room_id, connection_id);
            self.dispatcher.broadcast_presence(room_id, user_id, false);
        }
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
