//! QR code landing endpoint.
//!
//! The printed QR code points at `/r/{code}`. The landing page calls this
//! route to learn where to send the visitor, and the visitor leaves with a
//! session cookie so the scan it logs next is attributed to one session.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use qrpulse_core::session::SessionKey;
use qrpulse_db::repositories::QrCodeRepository;
use qrpulse_shared::AppError;
use serde_json::json;
use tracing::{debug, info};

use crate::{AppState, ApiError, visitor::session_cookie};

/// Creates the landing route. Mounted at the root, outside `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/r/{code}", get(resolve_qr_code))
}

/// GET `/r/{code}` - Resolve a printed code to its target.
async fn resolve_qr_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let qr_code = QrCodeRepository::new((*state.db).clone())
        .find_by_code(code.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("QR code not found".to_string()))?;

    if !qr_code.is_active {
        return Err(AppError::Gone("QR code deactivated".to_string()).into());
    }

    // A first visit has no cookie yet, so a generated id is expected here.
    let resolved = SessionKey::resolve([jar.get(&state.session.cookie_name).map(Cookie::value)]);
    if resolved.synthesized {
        debug!(session = %resolved.key.log_prefix(), "Issued session for landing visit");
    }
    let key = resolved.key;
    let jar = jar.add(session_cookie(&key, &state.session));

    let redirect_url = with_branch_param(&qr_code.target_url, &qr_code.code);
    info!(qr_code = %qr_code.code, session = %key.log_prefix(), "Resolved QR code");

    Ok((
        jar,
        Json(json!({
            "qr_code_id": qr_code.id,
            "code": qr_code.code,
            "redirect_url": redirect_url,
            "session_id": key.as_str(),
        })),
    ))
}

/// Appends `branch=<code>` to the target URL.
fn with_branch_param(target_url: &str, code: &str) -> String {
    let separator = if target_url.contains('?') { '&' } else { '?' };
    format!("{target_url}{separator}branch={code}")
}
