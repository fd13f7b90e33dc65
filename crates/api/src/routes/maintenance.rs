//! Maintenance routes.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use chrono::Duration;
use qrpulse_shared::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, ApiError};

/// Creates the maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/maintenance/purge-sessions", post(purge_sessions))
}

/// Optional body for a manual purge.
#[derive(Debug, Deserialize)]
pub struct PurgeSessionsRequest {
    /// Overrides the configured retention age.
    pub max_age_days: Option<i64>,
}

/// POST `/maintenance/purge-sessions` - Run the retention purge now.
async fn purge_sessions(
    State(state): State<AppState>,
    payload: Option<Json<PurgeSessionsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let max_age_days = payload
        .and_then(|Json(body)| body.max_age_days)
        .unwrap_or(state.retention.max_age_days);

    let age = Duration::try_days(max_age_days).ok_or_else(|| {
        AppError::Validation(format!("max_age_days out of range: {max_age_days}"))
    })?;

    let removed = state.register.purge_older_than(age).await?;

    Ok(Json(json!({
        "status": "success",
        "removed": removed,
        "max_age_days": max_age_days,
    })))
}
