use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use clinic_site_api::app::{self, Backends};
use clinic_site_api::config::{Config, StorageBackend};
use clinic_site_api::middleware;
use clinic_site_api::services::{GoogleIdentityVerifier, LocalObjectStorage, NominatimClient};
use persistence::repositories::{AuditLogRepository, DocumentRepository, UserRepository};
use persistence::InMemoryStore;
use shared::jwt::JwtConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting clinic site API v{}", env!("CARGO_PKG_VERSION"));

    let jwt = Arc::new(
        JwtConfig::with_leeway(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.session_expiry_secs,
            config.jwt.leeway_secs,
        )
        .context("Invalid session signing keys")?,
    );

    tokio::fs::create_dir_all(LocalObjectStorage::public_dir(&config.uploads.root_dir))
        .await
        .with_context(|| format!("Cannot create uploads dir {}", config.uploads.root_dir))?;
    let objects = Arc::new(LocalObjectStorage::new(
        &config.uploads.root_dir,
        &config.uploads.public_base_url,
    ));
    let identity = Arc::new(GoogleIdentityVerifier::new(&config.identity)?);
    let geocoding = Arc::new(NominatimClient::new(&config.geocoding)?);

    let backends = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            Backends {
                documents: Arc::new(DocumentRepository::new(pool.clone())),
                users: Arc::new(UserRepository::new(pool.clone())),
                audit_logs: Arc::new(AuditLogRepository::new(pool.clone())),
                objects,
                identity,
                geocoding,
                jwt,
                pool: Some(pool),
            }
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; content is lost on restart");
            Backends::in_memory(
                Arc::new(InMemoryStore::new()),
                objects,
                identity,
                geocoding,
                jwt,
            )
        }
    };

    let addr = config.socket_addr()?;
    let app = app::create_app(config, backends);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
