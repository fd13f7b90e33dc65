//! Activity repository: QR scans and social-media clicks.

use chrono::{Duration, Utc};
use qrpulse_shared::types::{BranchId, QrCodeId, ScanId, SocialClickId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{qr_codes, qr_scans, social_clicks};

/// How long after a scan a GPS fix may still be attached to it.
pub const GPS_UPDATE_WINDOW_MINUTES: i64 = 5;

/// Client-supplied device and location details.
#[derive(Debug, Clone, Default)]
pub struct ClientDetails {
    /// Device class (mobile, tablet, desktop).
    pub device_type: Option<String>,
    /// Browser name.
    pub browser: Option<String>,
    /// Operating system.
    pub os: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Raw user agent.
    pub user_agent: Option<String>,
}

/// A scan to record.
#[derive(Debug, Clone)]
pub struct NewScan {
    /// Scanned QR code.
    pub qr_code_id: QrCodeId,
    /// Visitor session.
    pub session_id: String,
    /// Outcome of the session claim.
    pub is_new_user: bool,
    /// GPS latitude.
    pub latitude: Option<f64>,
    /// GPS longitude.
    pub longitude: Option<f64>,
    /// Device and location details.
    pub client: ClientDetails,
}

/// A social click to record.
#[derive(Debug, Clone)]
pub struct NewSocialClick {
    /// Platform name, lower case.
    pub platform: String,
    /// Branch the visitor came from, if known.
    pub branch_id: Option<BranchId>,
    /// Visitor session.
    pub session_id: String,
    /// Outcome of the session claim.
    pub is_new_user: bool,
    /// Device and location details.
    pub client: ClientDetails,
}

/// Repository for scan and click logs.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    db: DatabaseConnection,
}

impl ActivityRepository {
    /// Creates a new activity repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a QR scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record_scan(&self, scan: NewScan) -> Result<qr_scans::Model, DbErr> {
        let client = scan.client;
        qr_scans::ActiveModel {
            id: Set(ScanId::new().into_inner()),
            qr_code_id: Set(scan.qr_code_id.into_inner()),
            scanned_at: Set(Utc::now().into()),
            session_id: Set(scan.session_id),
            is_new_user: Set(scan.is_new_user),
            device_type: Set(client.device_type),
            browser: Set(client.browser),
            os: Set(client.os),
            ip_address: Set(client.ip_address),
            country: Set(client.country),
            city: Set(client.city),
            latitude: Set(scan.latitude),
            longitude: Set(scan.longitude),
            user_agent: Set(client.user_agent),
        }
        .insert(&self.db)
        .await
    }

    /// Attaches a GPS fix to the session's latest scan of this QR code.
    ///
    /// Only a scan from the last [`GPS_UPDATE_WINDOW_MINUTES`] minutes that
    /// has no coordinates yet is updated. Returns the updated scan's ID, or
    /// `None` when nothing qualified.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or update fails.
    pub async fn attach_gps(
        &self,
        qr_code_id: QrCodeId,
        session_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<ScanId>, DbErr> {
        let threshold = Utc::now() - Duration::minutes(GPS_UPDATE_WINDOW_MINUTES);

        let Some(scan) = qr_scans::Entity::find()
            .filter(qr_scans::Column::QrCodeId.eq(qr_code_id.into_inner()))
            .filter(qr_scans::Column::SessionId.eq(session_id))
            .filter(qr_scans::Column::ScannedAt.gte(threshold.fixed_offset()))
            .filter(qr_scans::Column::Latitude.is_null())
            .order_by_desc(qr_scans::Column::ScannedAt)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active: qr_scans::ActiveModel = scan.into();
        active.latitude = Set(Some(latitude));
        active.longitude = Set(Some(longitude));
        let updated = active.update(&self.db).await?;

        Ok(Some(ScanId::from_uuid(updated.id)))
    }

    /// Records a social-media click.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record_social_click(
        &self,
        click: NewSocialClick,
    ) -> Result<social_clicks::Model, DbErr> {
        let client = click.client;
        social_clicks::ActiveModel {
            id: Set(SocialClickId::new().into_inner()),
            platform: Set(click.platform),
            branch_id: Set(click.branch_id.map(BranchId::into_inner)),
            clicked_at: Set(Utc::now().into()),
            session_id: Set(click.session_id),
            is_new_user: Set(click.is_new_user),
            device_type: Set(client.device_type),
            browser: Set(client.browser),
            os: Set(client.os),
            ip_address: Set(client.ip_address),
            country: Set(client.country),
            city: Set(client.city),
            user_agent: Set(client.user_agent),
        }
        .insert(&self.db)
        .await
    }

    /// Resolves the branch behind a QR code's public code.
    ///
    /// The social links page is reached through a QR redirect that carries
    /// the QR code, so clicks are attributed through it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn branch_for_code(&self, code: &str) -> Result<Option<BranchId>, DbErr> {
        let qr_code = qr_codes::Entity::find()
            .filter(qr_codes::Column::Code.eq(code))
            .one(&self.db)
            .await?;

        Ok(qr_code.map(|q| BranchId::from_uuid(q.branch_id)))
    }
}
