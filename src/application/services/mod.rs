//! Application services.
//!
//! Business logic shared by the WebSocket gateway and the REST surface.
//! Each mutating operation persists first and then broadcasts through the
//! room dispatcher, so both client types observe one consistent event
//! stream.

pub mod membership_service;
pub mod message_service;
pub mod moderation_service;
pub mod reaction_service;

use std::sync::Arc;

use crate::domain::entities::{
    MembershipRepository, MessageRepository, ReactionRepository, RoomRepository, UserRepository,
};
use crate::presentation::gateway::RoomDispatcher;
use crate::shared::snowflake::SnowflakeGenerator;

pub use membership_service::MembershipService;
pub use message_service::{HistoryQuery, MessageService, SendMessageInput, MAX_MESSAGE_LENGTH};
pub use moderation_service::{ModerationAction, ModerationOutcome, ModerationService};
pub use reaction_service::ReactionService;

/// Bundle of all application services, shared via `AppState`.
pub struct Services {
    pub membership: MembershipService,
    pub messages: MessageService,
    pub reactions: ReactionService,
    pub moderation: ModerationService,
}

impl Services {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        memberships: Arc<dyn MembershipRepository>,
        messages: Arc<dyn MessageRepository>,
        reactions: Arc<dyn ReactionRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: Arc<RoomDispatcher>,
        snowflake: Arc<SnowflakeGenerator>,
        mute_minutes: i64,
    ) -> Self {
        let membership = MembershipService::new(
            rooms,
            memberships.clone(),
            dispatcher.clone(),
            snowflake.clone(),
        );
        let message_service = MessageService::new(
            messages.clone(),
            reactions.clone(),
            users,
            membership.clone(),
            dispatcher.clone(),
            snowflake,
        );
        let reaction_service = ReactionService::new(
            reactions.clone(),
            messages.clone(),
            membership.clone(),
            dispatcher.clone(),
        );
        let moderation = ModerationService::new(
            messages,
            reactions,
            memberships,
            membership.clone(),
            dispatcher,
            mute_minutes,
        );
        Self {
            membership,
            messages: message_service,
            reactions: reaction_service,
            moderation,
        }
    }
}

/// Shared fixtures and repository mocks for service tests.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mockall::mock;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use crate::domain::entities::{
        Membership, MembershipRepository, Message, MessageKind, MessageRepository, Reaction,
        ReactionCount, ReactionRepository, Room, RoomRepository, RoomRole, RoomVisibility, User,
        UserRepository,
    };
    use crate::presentation::gateway::{ConnectionRegistry, RoomDispatcher, ServerEvent};
    use crate::shared::error::AppError;

    pub const USER_ID: i64 = 1;
    pub const OTHER_USER_ID: i64 = 2;
    pub const THIRD_USER_ID: i64 = 3;
    pub const ROOM_ID: i64 = 10;
    pub const OTHER_ROOM_ID: i64 = 20;
    pub const MESSAGE_ID: i64 = 100;

    mock! {
        pub Rooms {}

        #[async_trait]
        impl RoomRepository for Rooms {
            async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError>;
            async fn create(&self, room: &Room) -> Result<Room, AppError>;
        }
    }

    mock! {
        pub Memberships {}

        #[async_trait]
        impl MembershipRepository for Memberships {
            async fn find(&self, room_id: i64, user_id: i64) -> Result<Option<Membership>, AppError>;
            async fn is_member(&self, room_id: i64, user_id: i64) -> Result<bool, AppError>;
            async fn create(&self, membership: &Membership) -> Result<Membership, AppError>;
            async fn delete(&self, room_id: i64, user_id: i64) -> Result<bool, AppError>;
            async fn set_muted_until(
                &self,
                room_id: i64,
                user_id: i64,
                muted_until: Option<DateTime<Utc>>,
            ) -> Result<(), AppError>;
        }
    }

    mock! {
        pub Messages {}

        #[async_trait]
        impl MessageRepository for Messages {
            async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;
            async fn find_by_room(
                &self,
                room_id: i64,
                before: Option<i64>,
                after: Option<i64>,
                limit: i64,
            ) -> Result<Vec<Message>, AppError>;
            async fn create(&self, message: &Message) -> Result<Message, AppError>;
            async fn soft_delete(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<bool, AppError>;
        }
    }

    mock! {
        pub Reactions {}

        #[async_trait]
        impl ReactionRepository for Reactions {
            async fn add(&self, reaction: &Reaction) -> Result<(), AppError>;
            async fn remove(
                &self,
                message_id: i64,
                user_id: i64,
                emoji: &str,
            ) -> Result<bool, AppError>;
            async fn has_reacted(
                &self,
                message_id: i64,
                user_id: i64,
                emoji: &str,
            ) -> Result<bool, AppError>;
            async fn get_counts(&self, message_id: i64) -> Result<Vec<ReactionCount>, AppError>;
            async fn remove_all(&self, message_id: i64) -> Result<(), AppError>;
        }
    }

    mock! {
        pub Users {}

        #[async_trait]
        impl UserRepository for Users {
            async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
            async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;
        }
    }

    pub fn public_room(id: i64) -> Room {
        Room {
            id,
            name: format!("room-{}", id),
            visibility: RoomVisibility::Public,
            creator_id: OTHER_USER_ID,
            ..Default::default()
        }
    }

    pub fn private_room(id: i64) -> Room {
        Room {
            visibility: RoomVisibility::Private,
            ..public_room(id)
        }
    }

    pub fn fixture_user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            ..Default::default()
        }
    }

    pub fn membership_with_role(room_id: i64, user_id: i64, role: RoomRole) -> Membership {
        Membership {
            role,
            ..Membership::new(room_id, user_id)
        }
    }

    pub fn text_message(id: i64, room_id: i64, author_id: i64, body: &str) -> Message {
        Message {
            id,
            room_id,
            author_id,
            kind: MessageKind::Text,
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    /// Events captured by connections subscribed through a real dispatcher.
    pub struct EventProbe {
        _registry: Arc<ConnectionRegistry>,
        receivers: Mutex<Vec<mpsc::UnboundedReceiver<ServerEvent>>>,
    }

    impl EventProbe {
        /// Drain every observer, preserving per-observer ordering.
        pub fn events_per_observer(&self) -> Vec<Vec<ServerEvent>> {
            self.receivers
                .lock()
                .iter_mut()
                .map(|rx| {
                    let mut seen = Vec::new();
                    while let Ok(event) = rx.try_recv() {
                        seen.push(event);
                    }
                    seen
                })
                .collect()
        }

        /// Drain all observers into one list.
        pub fn events(&self) -> Vec<ServerEvent> {
            self.events_per_observer().into_iter().flatten().collect()
        }

        pub fn event_names(&self) -> Vec<String> {
            self.events()
                .iter()
                .map(|e| e.name().to_string())
                .collect()
        }
    }

    /// Build a real dispatcher with one observing connection per
    /// (room, user) pair.
    pub fn probe_dispatcher(observers: &[(i64, i64)]) -> (Arc<RoomDispatcher>, EventProbe) {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(RoomDispatcher::new(registry.clone()));

        let mut receivers = Vec::new();
        for &(room_id, user_id) in observers {
            let (tx, rx) = mpsc::unbounded_channel();
            let connection = registry.register(user_id, tx);
            registry.record_join(connection.id, room_id);
            dispatcher.subscribe(room_id, connection.id);
            receivers.push(rx);
        }

        let probe = EventProbe {
            _registry: registry,
            receivers: Mutex::new(receivers),
        };
        (dispatcher, probe)
    }
}
