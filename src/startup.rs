//! Application wiring: pool, gateway, services, router, listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::application::Services;
use crate::config::Settings;
use crate::domain::services::IdentityVerifier;
use crate::infrastructure::database;
use crate::infrastructure::identity::JwtIdentityVerifier;
use crate::infrastructure::repositories::{
    PgMembershipRepository, PgMessageRepository, PgReactionRepository, PgRoomRepository,
    PgUserRepository,
};
use crate::presentation::gateway::Gateway;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

/// Shared state handed to every handler and the gateway.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub gateway: Arc<Gateway>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub services: Arc<Services>,
    pub settings: Arc<Settings>,
}

/// A built server, ready to run.
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Wire every component from settings and bind the listener.
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Storage pool ready");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            0,
        ));

        // Gateway: registry + dispatcher + typing tracker
        let gateway = Arc::new(Gateway::new());

        // Identity collaborator
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(&settings.auth.jwt_secret));

        // Application services share the gateway's dispatcher so REST
        // mutations broadcast to duplex subscribers.
        let services = Arc::new(Services::new(
            Arc::new(PgRoomRepository::new(db.clone())),
            Arc::new(PgMembershipRepository::new(db.clone())),
            Arc::new(PgMessageRepository::new(db.clone())),
            Arc::new(PgReactionRepository::new(db.clone())),
            Arc::new(PgUserRepository::new(db.clone())),
            gateway.dispatcher(),
            snowflake.clone(),
            settings.moderation.mute_minutes,
        ));

        let state = AppState {
            db,
            snowflake,
            gateway,
            identity,
            services,
            settings: Arc::new(settings.clone()),
        };

        let router = routes::create_router(state).layer(
            ServiceBuilder::new()
                .layer(logging::create_trace_layer())
                .layer(cors::create_cors_layer(&settings.cors)),
        );

        let addr: SocketAddr = settings.server_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Serve until the process is stopped.
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
