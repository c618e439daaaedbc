//! Core domain entities and their repository traits.

pub mod membership;
pub mod message;
pub mod reaction;
pub mod room;
pub mod user;

pub use membership::{Membership, MembershipRepository, RoomRole};
pub use message::{Message, MessageKind, MessageRepository, TrackProvider, TrackRef};
pub use reaction::{Reaction, ReactionCount, ReactionRepository};
pub use room::{Room, RoomRepository, RoomVisibility};
pub use user::{User, UserRepository};
