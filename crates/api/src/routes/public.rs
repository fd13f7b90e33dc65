//! Public visitor endpoints: scan logging and social-click logging.
//!
//! Both classify the visitor with the session register and hand the session
//! id back in the `qr_session` cookie.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use qrpulse_core::session::{ActionKind, ClaimContext};
use qrpulse_db::repositories::{ActivityRepository, NewScan, NewSocialClick, QrCodeRepository};
use qrpulse_shared::{AppError, types::QrCodeId};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState, ApiError,
    visitor::{ClientFields, SessionPriority, resolve_session, session_cookie},
};

/// Longest platform name stored.
const MAX_PLATFORM_LEN: usize = 50;

/// Creates the public logging routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scan-log", post(log_scan))
        .route("/social-click", post(log_social_click))
}

/// Request body for logging a scan.
#[derive(Debug, Deserialize)]
pub struct ScanLogRequest {
    /// Scanned QR code.
    pub qr_code_id: Uuid,
    /// Session id held by the landing page.
    pub session_id: Option<String>,
    /// GPS latitude.
    pub latitude: Option<f64>,
    /// GPS longitude.
    pub longitude: Option<f64>,
    /// True when this call only carries a GPS fix for an earlier scan.
    #[serde(default)]
    pub is_gps_update: bool,
    /// Device and location details.
    #[serde(flatten)]
    pub client: ClientFields,
}

/// Request body for logging a social click.
#[derive(Debug, Deserialize)]
pub struct SocialClickRequest {
    /// Platform clicked (facebook, instagram, ...).
    pub platform: Option<String>,
    /// Public code of the QR code that led to the links page.
    pub branch_code: Option<String>,
    /// Session id held by the links page.
    pub session_id: Option<String>,
    /// Device and location details.
    #[serde(flatten)]
    pub client: ClientFields,
}

/// POST `/scan-log` - Log a QR scan or attach GPS to a recent one.
async fn log_scan(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<ScanLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = resolve_session(
        &jar,
        &state.session,
        payload.session_id.as_deref(),
        SessionPriority::BodyFirst,
    );
    let jar = jar.add(session_cookie(&key, &state.session));

    let qr_code_id = QrCodeId::from_uuid(payload.qr_code_id);
    let qr = QrCodeRepository::new((*state.db).clone())
        .find_active(qr_code_id)
        .await?
        .ok_or_else(|| AppError::NotFound("QR code not found".to_string()))?;

    let activity = ActivityRepository::new((*state.db).clone());

    if payload.is_gps_update
        && let (Some(latitude), Some(longitude)) = (payload.latitude, payload.longitude)
        && let Some(scan_id) = activity
            .attach_gps(qr_code_id, key.as_str(), latitude, longitude)
            .await?
    {
        info!(scan = %scan_id, session = %key.log_prefix(), "Attached GPS to scan");
        return Ok((jar, Json(json!({ "status": "updated", "scan_id": scan_id }))));
    }

    let is_new_user = state
        .register
        .claim(
            &key,
            ActionKind::QrScan,
            ClaimContext::scan(qr_code_id, Some(qr.branch_id)),
        )
        .await;

    let scan = activity
        .record_scan(NewScan {
            qr_code_id,
            session_id: key.as_str().to_string(),
            is_new_user,
            latitude: payload.latitude,
            longitude: payload.longitude,
            client: payload.client.into_details(&headers),
        })
        .await?;

    info!(
        scan = %scan.id,
        qr_code = %qr.qr_code.code,
        session = %key.log_prefix(),
        is_new_user,
        "Scan recorded"
    );

    Ok((
        jar,
        Json(json!({
            "status": "success",
            "scan_id": scan.id,
            "is_new_user": is_new_user,
        })),
    ))
}

/// POST `/social-click` - Log a click on a social-media link.
async fn log_social_click(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<SocialClickRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = resolve_session(
        &jar,
        &state.session,
        payload.session_id.as_deref(),
        SessionPriority::CookieFirst,
    );
    let jar = jar.add(session_cookie(&key, &state.session));

    let activity = ActivityRepository::new((*state.db).clone());
    let branch_id = match payload.branch_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => activity.branch_for_code(code).await?,
        _ => None,
    };

    let platform = normalize_platform(payload.platform.as_deref());
    let is_new_user = state
        .register
        .claim(&key, ActionKind::SocialClick, ClaimContext::click(branch_id))
        .await;

    activity
        .record_social_click(NewSocialClick {
            platform: platform.clone(),
            branch_id,
            session_id: key.as_str().to_string(),
            is_new_user,
            client: payload.client.into_details(&headers),
        })
        .await?;

    info!(
        platform = %platform,
        attributed = branch_id.is_some(),
        session = %key.log_prefix(),
        is_new_user,
        "Social click recorded"
    );

    Ok((
        jar,
        Json(json!({ "status": "success", "is_new_user": is_new_user })),
    ))
}

/// Lower-cases the platform name; missing or blank becomes `unknown`.
fn normalize_platform(raw: Option<&str>) -> String {
    let platform = raw.map(str::trim).unwrap_or_default();
    if platform.is_empty() {
        return "unknown".to_string();
    }
    platform
        .to_lowercase()
        .chars()
        .take(MAX_PLATFORM_LEN)
        .collect()
}
