//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qrpulse_core::analytics::AnalyticsError;
use qrpulse_core::session::SessionError;
use qrpulse_db::repositories::{HierarchyError, QrCodeError};
use qrpulse_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;

/// Handler error rendered as `{"error": CODE, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                Self(AppError::Unavailable("Database unavailable".to_string()))
            }
            other => Self(AppError::Database(other.to_string())),
        }
    }
}

impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::RegionNotFound(_)
            | HierarchyError::ClusterNotFound(_)
            | HierarchyError::BranchNotFound(_) => Self(AppError::NotFound(err.to_string())),
            HierarchyError::Duplicate(_) => Self(AppError::Conflict(err.to_string())),
            HierarchyError::Database(e) => e.into(),
        }
    }
}

impl From<QrCodeError> for ApiError {
    fn from(err: QrCodeError) -> Self {
        match err {
            QrCodeError::NotFound(_) | QrCodeError::BranchNotFound(_) => {
                Self(AppError::NotFound(err.to_string()))
            }
            QrCodeError::DuplicateCode(_) => Self(AppError::Conflict(err.to_string())),
            QrCodeError::InvalidTargetUrl(_) => Self(AppError::Validation(err.to_string())),
            QrCodeError::Database(e) => e.into(),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NegativeRetentionAge(_) | SessionError::RetentionAgeTooLarge(_) => {
                Self(AppError::Validation(err.to_string()))
            }
            SessionError::Store(e) if e.is_transient() => {
                Self(AppError::Unavailable("Session store unavailable".to_string()))
            }
            SessionError::Store(e) => Self(AppError::Internal(e.to_string())),
        }
    }
}
