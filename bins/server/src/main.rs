//! QR Pulse API Server
//!
//! Main entry point for the QR Pulse analytics backend.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qrpulse_api::{AppState, create_router};
use qrpulse_core::session::{KnownSessionCache, RetentionSweep, SessionRegister};
use qrpulse_db::{SeaOrmClaimStore, connect};
use qrpulse_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrpulse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    // Session register over the shared claim table
    let mut register = SessionRegister::new(Arc::new(SeaOrmClaimStore::new(db.clone())));
    if config.session.cache_capacity > 0 {
        register = register.with_cache(KnownSessionCache::with_config(
            config.session.cache_capacity,
            config.session.cache_ttl_secs,
        ));
        info!(
            capacity = config.session.cache_capacity,
            ttl_secs = config.session.cache_ttl_secs,
            "Known-session cache enabled"
        );
    }
    let register = Arc::new(register);

    if config.retention.enabled {
        let max_age = chrono::Duration::try_days(config.retention.max_age_days)
            .context("retention.max_age_days out of range")?;
        RetentionSweep::new(
            Arc::clone(&register),
            max_age,
            StdDuration::from_secs(config.retention.sweep_interval_secs),
        )
        .spawn();
    } else {
        info!("Session retention sweep disabled");
    }

    let state = AppState {
        db: Arc::new(db),
        register,
        session: Arc::new(config.session.clone()),
        retention: Arc::new(config.retention.clone()),
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
