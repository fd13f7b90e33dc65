//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod analytics;
pub mod health;
pub mod hierarchy;
pub mod maintenance;
pub mod public;
pub mod qr_codes;
pub mod redirect;
pub mod sessions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(public::routes())
        .merge(sessions::routes())
        .merge(hierarchy::routes())
        .merge(qr_codes::routes())
        .merge(analytics::routes())
        .merge(maintenance::routes())
}
