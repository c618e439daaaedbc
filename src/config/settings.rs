//! Layered application configuration.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// All runtime settings, assembled by [`Settings::load`].
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub snowflake: SnowflakeSettings,
    pub cors: CorsSettings,
    pub moderation: ModerationSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Listen address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// PostgreSQL pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Token verification configuration.
///
/// Token issuance is owned by the platform's identity service; this server
/// only verifies credentials it is handed.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-31)
    pub machine_id: u16,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationSettings {
    /// How long a room mute lasts, in minutes
    pub mute_minutes: i64,
}

/// Minimum accepted JWT secret length (256 bits).
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings, later sources overriding earlier ones:
    /// built-in defaults, `config/default.toml`, `config/{RUN_ENV}.toml`,
    /// then environment variables.
    ///
    /// Fails when required values are missing, a value does not parse, or
    /// the JWT secret is shorter than [`MIN_JWT_SECRET_LENGTH`].
    pub fn load() -> Result<Self, ConfigError> {
        // A .env file is optional.
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("moderation.mute_minutes", 10)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Short-form variables for the common deployment knobs.
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                if settings.auth.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
                    return Err(ConfigError::Message(format!(
                        "JWT secret must be at least {} characters; got {}",
                        MIN_JWT_SECRET_LENGTH,
                        settings.auth.jwt_secret.len()
                    )));
                }
                Ok(settings)
            })
    }

    /// The address to bind, as `host:port`.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
