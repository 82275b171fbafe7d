//! Roomdesk - room reservation and facility status backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomdesk::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAnnouncementRepository, SqlxInventoryRequestRepository, SqlxLoginLogRepository,
            SqlxReservationRepository, SqlxRoomRepository, SqlxUserRepository,
        },
    },
    services::{ReservationService, TokenService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomdesk=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Roomdesk...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    if config.auth.is_placeholder_secret() {
        tracing::warn!("Using the default JWT secret; set ROOMDESK_AUTH_JWT_SECRET in production");
    }

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let login_log_repo = SqlxLoginLogRepository::boxed(pool.clone());
    let room_repo = SqlxRoomRepository::boxed(pool.clone());
    let reservation_repo = SqlxReservationRepository::boxed(pool.clone());
    let announcement_repo = SqlxAnnouncementRepository::boxed(pool.clone());
    let inventory_repo = SqlxInventoryRequestRepository::boxed(pool.clone());

    // Initialize services
    let token_service = Arc::new(TokenService::new(&config.auth));
    let user_service = Arc::new(UserService::new(user_repo, login_log_repo, token_service));
    let reservation_service = Arc::new(ReservationService::new(
        reservation_repo,
        room_repo.clone(),
    ));

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service,
        reservation_service,
        room_repo,
        announcement_repo,
        inventory_repo,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
