//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Public logging endpoints (QR scans, social clicks) and the `/r/{code}` landing route
//! - Hierarchy and QR code management
//! - Analytics and session maintenance routes
//! - JSON error responses

pub mod error;
pub mod routes;
pub mod visitor;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use qrpulse_core::session::SessionRegister;
use qrpulse_shared::{RetentionConfig, SessionConfig};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Session first-seen register.
    pub register: Arc<SessionRegister>,
    /// Session cookie settings.
    pub session: Arc<SessionConfig>,
    /// Retention settings, for the manual purge default.
    pub retention: Arc<RetentionConfig>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .merge(routes::redirect::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
