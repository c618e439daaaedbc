//! # Trackroom Server Library
//!
//! The real-time room messaging core of a social music platform:
//! a WebSocket gateway for subscribed clients, an equivalent REST surface
//! for polling ones, and PostgreSQL persistence behind repository traits.
//!
//! ## Layers
//!
//! - **domain**: entities, repository traits, and validators
//! - **application**: business services and DTOs
//! - **infrastructure**: PostgreSQL, JWT identity, Prometheus metrics
//! - **presentation**: HTTP routes, middleware, and the gateway
//! - **config** / **shared** / **startup** / **telemetry**: the ambient
//!   plumbing around them

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod startup;
pub mod telemetry;
