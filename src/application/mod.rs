//! # Application Layer
//!
//! Business services and the DTOs they exchange with the presentation
//! layer. Services depend only on domain traits plus the room dispatcher,
//! so the same code path serves duplex and REST clients.

pub mod dto;
pub mod services;

pub use services::Services;
