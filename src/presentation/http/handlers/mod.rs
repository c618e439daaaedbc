//! HTTP request handlers.

pub mod health;
pub mod message;
pub mod moderation;
pub mod reaction;
pub mod room;
