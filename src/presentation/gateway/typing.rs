//! Typing Tracker
//!
//! Ephemeral per-room typing indicators with self-expiring entries. State
//! lives only in process memory and is keyed by (room, user); every entry
//! dies on `typing_stop`, on expiry, or on connection teardown.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use super::dispatcher::RoomDispatcher;

/// How long a typing indicator survives without a fresh `typing_start`.
pub const TYPING_TTL: Duration = Duration::from_secs(5);

struct TypingEntry {
    /// Bumped on every `typing_start`; a pending expiry task only fires if
    /// its generation still matches, so refreshes reset the timer instead
    /// of double-broadcasting.
    generation: u64,
}

/// Tracks which users are typing in which rooms.
pub struct TypingTracker {
    dispatcher: Arc<RoomDispatcher>,
    entries: DashMap<(i64, i64), TypingEntry>,
}

impl TypingTracker {
    pub fn new(dispatcher: Arc<RoomDispatcher>) -> Self {
        Self {
            dispatcher,
            entries: DashMap::new(),
        }
    }

    /// Mark a user as typing in a room.
    ///
    /// Broadcasts `user_typing(true)` only on the Idle → Typing transition;
    /// a repeat start while already typing just resets the expiry timer.
    pub fn start(self: &Arc<Self>, room_id: i64, user_id: i64) {
        let mut newly_typing = false;
        let generation = {
            let mut entry = self
                .entries
                .entry((room_id, user_id))
                .or_insert_with(|| {
                    newly_typing = true;
                    TypingEntry { generation: 0 }
                });
            entry.generation += 1;
            entry.generation
        };

        if newly_typing {
            self.dispatcher.broadcast_typing(room_id, user_id, true);
        }

        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(TYPING_TTL).await;
            tracker.expire(room_id, user_id, generation);
        });
    }

    /// Mark a user as no longer typing.
    ///
    /// A stop for an entry that no longer exists (already expired, or
    /// cleaned up by a disconnect) is a silent no-op.
    pub fn stop(&self, room_id: i64, user_id: i64) {
        if self.entries.remove(&(room_id, user_id)).is_some() {
            self.dispatcher.broadcast_typing(room_id, user_id, false);
        }
    }

    /// Check whether a user currently counts as typing in a room.
    pub fn is_typing(&self, room_id: i64, user_id: i64) -> bool {
        self.entries.contains_key(&(room_id, user_id))
    }

    fn expire(&self, room_id: i64, user_id: i64, generation: u64) {
        let removed = self
            .entries
            .remove_if(&(room_id, user_id), |_, entry| entry.generation == generation)
            .is_some();
        if removed {
            tracing::debug!(room_id = room_id, user_id = user_id, "Typing indicator expired");
            self.dispatcher.broadcast_typing(room_id, user_id, false);
        }
    }
}
