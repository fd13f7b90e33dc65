//! Session lookup route.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use qrpulse_core::session::SessionKey;
use qrpulse_shared::AppError;

use crate::{AppState, ApiError};

/// Creates the session routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sessions/{session_id}", get(get_first_action))
}

/// GET `/sessions/{session_id}` - When and how a session was first seen.
async fn get_first_action(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = SessionKey::parse(&session_id)
        .ok_or_else(|| AppError::Validation("Invalid session id".to_string()))?;

    let claim = state
        .register
        .first_action(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(claim))
}
