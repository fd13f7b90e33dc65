//! QR code management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use qrpulse_core::analytics::{AnalyticsService, DateWindow};
use qrpulse_db::repositories::{
    AnalyticsRepository, CreateQrCodeInput, QrCodeError, QrCodeRepository, UpdateQrCodeInput,
};
use qrpulse_shared::types::{BranchId, QrCodeId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, ApiError};

/// Creates the QR code routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/qr-codes", get(list_qr_codes).post(create_qr_code))
        .route(
            "/qr-codes/{qr_code_id}",
            get(get_qr_code)
                .put(update_qr_code)
                .delete(deactivate_qr_code),
        )
        .route("/qr-codes/{qr_code_id}/analytics", get(qr_code_analytics))
}

/// Request body for creating a QR code.
#[derive(Debug, Deserialize)]
pub struct CreateQrCodeRequest {
    /// Owning branch.
    pub branch_id: BranchId,
    /// Public code; generated when omitted.
    pub code: Option<String>,
    /// Redirect target.
    pub target_url: String,
}

/// Request body for updating a QR code.
#[derive(Debug, Deserialize)]
pub struct UpdateQrCodeRequest {
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Date window for one QR code's report.
#[derive(Debug, Deserialize)]
pub struct QrAnalyticsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Query for listing a branch's QR codes.
#[derive(Debug, Deserialize)]
pub struct ListQrCodesQuery {
    pub branch_id: BranchId,
    #[serde(default)]
    pub include_inactive: bool,
}

/// POST `/qr-codes` - Create a QR code.
async fn create_qr_code(
    State(state): State<AppState>,
    Json(payload): Json<CreateQrCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_code = QrCodeRepository::new((*state.db).clone())
        .create(CreateQrCodeInput {
            branch_id: payload.branch_id,
            code: payload.code,
            target_url: payload.target_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(qr_code)))
}

/// GET `/qr-codes?branch_id=` - List a branch's QR codes.
async fn list_qr_codes(
    State(state): State<AppState>,
    Query(query): Query<ListQrCodesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_codes = QrCodeRepository::new((*state.db).clone())
        .list_by_branch(query.branch_id, query.include_inactive)
        .await?;
    Ok(Json(json!({ "qr_codes": qr_codes })))
}

/// GET `/qr-codes/{qr_code_id}` - Fetch one QR code.
async fn get_qr_code(
    State(state): State<AppState>,
    Path(qr_code_id): Path<QrCodeId>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_code = QrCodeRepository::new((*state.db).clone())
        .find_by_id(qr_code_id)
        .await?
        .ok_or(QrCodeError::NotFound(qr_code_id))?;
    Ok(Json(qr_code))
}

/// PUT `/qr-codes/{qr_code_id}` - Change the target or reactivate a code.
async fn update_qr_code(
    State(state): State<AppState>,
    Path(qr_code_id): Path<QrCodeId>,
    Json(payload): Json<UpdateQrCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_code = QrCodeRepository::new((*state.db).clone())
        .update(
            qr_code_id,
            UpdateQrCodeInput {
                target_url: payload.target_url,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(qr_code))
}

/// GET `/qr-codes/{qr_code_id}/analytics` - Scans and new vs returning for one code.
async fn qr_code_analytics(
    State(state): State<AppState>,
    Path(qr_code_id): Path<QrCodeId>,
    Query(query): Query<QrAnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = DateWindow::new(query.start_date, query.end_date)?;

    let qr_code = QrCodeRepository::new((*state.db).clone())
        .find_by_id(qr_code_id)
        .await?
        .ok_or(QrCodeError::NotFound(qr_code_id))?;
    let counts = AnalyticsRepository::new((*state.db).clone())
        .qr_scan_counts(qr_code_id, &window)
        .await?;

    Ok(Json(AnalyticsService::qr_code_report(
        qr_code_id,
        qr_code.code,
        counts.new_users,
        counts.returning_users,
        counts.devices,
    )))
}

/// DELETE `/qr-codes/{qr_code_id}` - Deactivate a QR code.
async fn deactivate_qr_code(
    State(state): State<AppState>,
    Path(qr_code_id): Path<QrCodeId>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_code = QrCodeRepository::new((*state.db).clone())
        .deactivate(qr_code_id)
        .await?;
    tracing::info!(qr_code = %qr_code.code, "Deactivated QR code");
    Ok(Json(qr_code))
}
