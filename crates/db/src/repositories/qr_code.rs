//! QR code repository.

use qrpulse_shared::types::{BranchId, QrCodeId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::{branches, qr_codes};

/// Error types for QR code operations.
#[derive(Debug, thiserror::Error)]
pub enum QrCodeError {
    /// QR code not found.
    #[error("QR code not found: {0}")]
    NotFound(QrCodeId),

    /// Owning branch not found or inactive.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// Code already in use.
    #[error("QR code with code '{0}' already exists")]
    DuplicateCode(String),

    /// Target URL missing or not http(s).
    #[error("Invalid target URL: {0}")]
    InvalidTargetUrl(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a QR code.
#[derive(Debug, Clone)]
pub struct CreateQrCodeInput {
    /// Owning branch.
    pub branch_id: BranchId,
    /// Public code; generated from the branch code when absent.
    pub code: Option<String>,
    /// Where the code redirects to.
    pub target_url: String,
}

/// Input for updating a QR code. The printed code itself never changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateQrCodeInput {
    /// New redirect target.
    pub target_url: Option<String>,
    /// Whether the code accepts scans.
    pub is_active: Option<bool>,
}

/// A QR code with the branch it belongs to.
#[derive(Debug, Clone)]
pub struct ActiveQrCode {
    /// The QR code row.
    pub qr_code: qr_codes::Model,
    /// Its branch.
    pub branch_id: BranchId,
}

/// QR code repository.
#[derive(Debug, Clone)]
pub struct QrCodeRepository {
    db: DatabaseConnection,
}

impl QrCodeRepository {
    /// Creates a new QR code repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a QR code for an active branch.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Branch not found or inactive
    /// - Target URL is not an http(s) URL
    /// - Code already exists
    pub async fn create(&self, input: CreateQrCodeInput) -> Result<qr_codes::Model, QrCodeError> {
        let target_url = validate_target_url(&input.target_url)?;

        let branch = branches::Entity::find_by_id(input.branch_id.into_inner())
            .filter(branches::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(QrCodeError::BranchNotFound(input.branch_id))?;

        let code = match input.code.map(|c| c.trim().to_string()) {
            Some(code) if !code.is_empty() => code,
            _ => generate_code(&branch.code),
        };

        if self.find_by_code(&code).await?.is_some() {
            return Err(QrCodeError::DuplicateCode(code));
        }

        let model = qr_codes::ActiveModel {
            id: Set(QrCodeId::new().into_inner()),
            code: Set(code.clone()),
            target_url: Set(target_url),
            branch_id: Set(branch.id),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => QrCodeError::DuplicateCode(code.clone()),
            _ => QrCodeError::Database(e),
        })?;

        tracing::info!(qr_code = %model.code, branch = %branch.code, "Created QR code");
        Ok(model)
    }

    /// Finds a QR code by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: QrCodeId) -> Result<Option<qr_codes::Model>, QrCodeError> {
        Ok(qr_codes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Finds a QR code by its public code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<qr_codes::Model>, QrCodeError> {
        Ok(qr_codes::Entity::find()
            .filter(qr_codes::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    /// Finds an active QR code by ID, for scan logging.
    ///
    /// Inactive codes are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: QrCodeId) -> Result<Option<ActiveQrCode>, QrCodeError> {
        let found = qr_codes::Entity::find_by_id(id.into_inner())
            .filter(qr_codes::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;

        Ok(found.map(|qr_code| ActiveQrCode {
            branch_id: BranchId::from_uuid(qr_code.branch_id),
            qr_code,
        }))
    }

    /// Lists a branch's QR codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_branch(
        &self,
        branch_id: BranchId,
        include_inactive: bool,
    ) -> Result<Vec<qr_codes::Model>, QrCodeError> {
        let mut query = qr_codes::Entity::find()
            .filter(qr_codes::Column::BranchId.eq(branch_id.into_inner()))
            .order_by_desc(qr_codes::Column::CreatedAt);
        if !include_inactive {
            query = query.filter(qr_codes::Column::IsActive.eq(true));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Updates a QR code's target or active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - QR code not found
    /// - Target URL is not an http(s) URL
    pub async fn update(
        &self,
        id: QrCodeId,
        input: UpdateQrCodeInput,
    ) -> Result<qr_codes::Model, QrCodeError> {
        let target_url = input
            .target_url
            .map(|url| validate_target_url(&url))
            .transpose()?;

        let qr_code = self
            .find_by_id(id)
            .await?
            .ok_or(QrCodeError::NotFound(id))?;

        let mut active: qr_codes::ActiveModel = qr_code.into();
        if let Some(target_url) = target_url {
            active.target_url = Set(target_url);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let model = active.update(&self.db).await?;
        tracing::info!(qr_code = %model.code, is_active = model.is_active, "Updated QR code");
        Ok(model)
    }

    /// Deactivates a QR code. Logged scans are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the QR code does not exist.
    pub async fn deactivate(&self, id: QrCodeId) -> Result<qr_codes::Model, QrCodeError> {
        let qr_code = self
            .find_by_id(id)
            .await?
            .ok_or(QrCodeError::NotFound(id))?;

        let mut active: qr_codes::ActiveModel = qr_code.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        Ok(active.update(&self.db).await?)
    }
}

/// Trims the URL and requires an http(s) scheme.
fn validate_target_url(raw: &str) -> Result<String, QrCodeError> {
    let target_url = raw.trim().to_string();
    if !(target_url.starts_with("http://") || target_url.starts_with("https://")) {
        return Err(QrCodeError::InvalidTargetUrl(target_url));
    }
    Ok(target_url)
}

/// Builds a public code such as `B001-3f9a2c1e`.
fn generate_code(branch_code: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", branch_code.to_uppercase(), &suffix[..8])
}
