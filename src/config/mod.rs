//! Configuration management.

pub mod settings;

pub use settings::{
    AuthSettings, CorsSettings, DatabaseSettings, ModerationSettings, ServerSettings, Settings,
    SnowflakeSettings,
};
