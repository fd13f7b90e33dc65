//! Analytics queries.
//!
//! Counts are grouped in SQL and handed to `qrpulse_core::analytics` for
//! roll-up; nothing here computes ratios.

use std::collections::HashMap;

use qrpulse_core::analytics::{ActivityCounts, DateWindow};
use qrpulse_shared::types::{BranchId, ClusterId, QrCodeId, RegionId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait, Select,
};
use uuid::Uuid;

use crate::entities::{branches, clusters, qr_codes, qr_scans, social_clicks};

/// Which social clicks a social report covers.
///
/// The narrowest given scope wins: branch, then cluster, then region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocialScope {
    /// Every click, including clicks with no branch.
    #[default]
    All,
    /// Clicks attributed to branches in a region.
    Region(RegionId),
    /// Clicks attributed to branches in a cluster.
    Cluster(ClusterId),
    /// Clicks attributed to one branch.
    Branch(BranchId),
}

impl SocialScope {
    /// Picks the narrowest scope from optional filters.
    #[must_use]
    pub const fn narrowest(
        region_id: Option<RegionId>,
        cluster_id: Option<ClusterId>,
        branch_id: Option<BranchId>,
    ) -> Self {
        match (branch_id, cluster_id, region_id) {
            (Some(id), _, _) => Self::Branch(id),
            (None, Some(id), _) => Self::Cluster(id),
            (None, None, Some(id)) => Self::Region(id),
            (None, None, None) => Self::All,
        }
    }
}

/// Raw social numbers for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialCounts {
    /// Clicks per platform.
    pub platforms: Vec<(String, u64)>,
    /// Clicks that were a session's first action.
    pub new_users: u64,
    /// Clicks by sessions seen before.
    pub returning_users: u64,
}

/// Raw scan numbers for one QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrScanCounts {
    /// Scans that were a session's first action.
    pub new_users: u64,
    /// Scans by sessions seen before.
    pub returning_users: u64,
    /// Scans per device class as stored.
    pub devices: Vec<(Option<String>, u64)>,
}

/// Repository for analytics aggregates.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Counts scans and clicks per branch inside the window.
    ///
    /// Branches without activity are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn branch_activity(
        &self,
        window: &DateWindow,
    ) -> Result<HashMap<BranchId, ActivityCounts>, DbErr> {
        let mut counts: HashMap<BranchId, ActivityCounts> = HashMap::new();

        let mut scans = qr_scans::Entity::find()
            .select_only()
            .column(qr_codes::Column::BranchId)
            .column(qr_scans::Column::IsNewUser)
            .column_as(Expr::col((qr_scans::Entity, qr_scans::Column::Id)).count(), "total")
            .join(JoinType::InnerJoin, qr_scans::Relation::QrCodes.def())
            .group_by(qr_codes::Column::BranchId)
            .group_by(qr_scans::Column::IsNewUser);
        if let Some(from) = window.from() {
            scans = scans.filter(qr_scans::Column::ScannedAt.gte(from.fixed_offset()));
        }
        if let Some(until) = window.until() {
            scans = scans.filter(qr_scans::Column::ScannedAt.lt(until.fixed_offset()));
        }

        for (branch_id, is_new, total) in scans.into_tuple::<(Uuid, bool, i64)>().all(&self.db).await? {
            let entry = counts.entry(BranchId::from_uuid(branch_id)).or_default();
            let total = to_count(total);
            entry.qr_scans += total;
            add_split(entry, is_new, total);
        }

        let clicks = windowed_clicks(social_clicks::Entity::find(), window)
            .select_only()
            .column(social_clicks::Column::BranchId)
            .column(social_clicks::Column::IsNewUser)
            .column_as(
                Expr::col((social_clicks::Entity, social_clicks::Column::Id)).count(),
                "total",
            )
            .filter(social_clicks::Column::BranchId.is_not_null())
            .group_by(social_clicks::Column::BranchId)
            .group_by(social_clicks::Column::IsNewUser);

        for (branch_id, is_new, total) in clicks.into_tuple::<(Uuid, bool, i64)>().all(&self.db).await? {
            let entry = counts.entry(BranchId::from_uuid(branch_id)).or_default();
            let total = to_count(total);
            entry.social_clicks += total;
            add_split(entry, is_new, total);
        }

        Ok(counts)
    }

    /// Counts one QR code's scans inside the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn qr_scan_counts(
        &self,
        qr_code_id: QrCodeId,
        window: &DateWindow,
    ) -> Result<QrScanCounts, DbErr> {
        let split = windowed_scans(qr_code_id, window)
            .select_only()
            .column(qr_scans::Column::IsNewUser)
            .column_as(Expr::col((qr_scans::Entity, qr_scans::Column::Id)).count(), "total")
            .group_by(qr_scans::Column::IsNewUser)
            .into_tuple::<(bool, i64)>()
            .all(&self.db)
            .await?;

        let devices = windowed_scans(qr_code_id, window)
            .select_only()
            .column(qr_scans::Column::DeviceType)
            .column_as(Expr::col((qr_scans::Entity, qr_scans::Column::Id)).count(), "total")
            .group_by(qr_scans::Column::DeviceType)
            .into_tuple::<(Option<String>, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(device, total)| (device, to_count(total)))
            .collect();

        let mut counts = QrScanCounts {
            devices,
            ..QrScanCounts::default()
        };
        for (is_new, total) in split {
            if is_new {
                counts.new_users += to_count(total);
            } else {
                counts.returning_users += to_count(total);
            }
        }
        Ok(counts)
    }

    /// Counts social clicks per platform and by new vs returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn social_counts(
        &self,
        scope: SocialScope,
        window: &DateWindow,
    ) -> Result<SocialCounts, DbErr> {
        let platforms = scoped_clicks(scope, window)
            .select_only()
            .column(social_clicks::Column::Platform)
            .column_as(
                Expr::col((social_clicks::Entity, social_clicks::Column::Id)).count(),
                "total",
            )
            .group_by(social_clicks::Column::Platform)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(platform, total)| (platform, to_count(total)))
            .collect();

        let split = scoped_clicks(scope, window)
            .select_only()
            .column(social_clicks::Column::IsNewUser)
            .column_as(
                Expr::col((social_clicks::Entity, social_clicks::Column::Id)).count(),
                "total",
            )
            .group_by(social_clicks::Column::IsNewUser)
            .into_tuple::<(bool, i64)>()
            .all(&self.db)
            .await?;

        let mut counts = SocialCounts {
            platforms,
            ..SocialCounts::default()
        };
        for (is_new, total) in split {
            if is_new {
                counts.new_users += to_count(total);
            } else {
                counts.returning_users += to_count(total);
            }
        }
        Ok(counts)
    }
}

fn windowed_scans(qr_code_id: QrCodeId, window: &DateWindow) -> Select<qr_scans::Entity> {
    let mut query =
        qr_scans::Entity::find().filter(qr_scans::Column::QrCodeId.eq(qr_code_id.into_inner()));
    if let Some(from) = window.from() {
        query = query.filter(qr_scans::Column::ScannedAt.gte(from.fixed_offset()));
    }
    if let Some(until) = window.until() {
        query = query.filter(qr_scans::Column::ScannedAt.lt(until.fixed_offset()));
    }
    query
}

fn windowed_clicks(
    mut query: Select<social_clicks::Entity>,
    window: &DateWindow,
) -> Select<social_clicks::Entity> {
    if let Some(from) = window.from() {
        query = query.filter(social_clicks::Column::ClickedAt.gte(from.fixed_offset()));
    }
    if let Some(until) = window.until() {
        query = query.filter(social_clicks::Column::ClickedAt.lt(until.fixed_offset()));
    }
    query
}

fn scoped_clicks(scope: SocialScope, window: &DateWindow) -> Select<social_clicks::Entity> {
    let query = windowed_clicks(social_clicks::Entity::find(), window);
    match scope {
        SocialScope::All => query,
        SocialScope::Branch(id) => {
            query.filter(social_clicks::Column::BranchId.eq(id.into_inner()))
        }
        SocialScope::Cluster(id) => query
            .join(JoinType::InnerJoin, social_clicks::Relation::Branches.def())
            .filter(branches::Column::ClusterId.eq(id.into_inner())),
        SocialScope::Region(id) => query
            .join(JoinType::InnerJoin, social_clicks::Relation::Branches.def())
            .join(JoinType::InnerJoin, branches::Relation::Clusters.def())
            .filter(clusters::Column::RegionId.eq(id.into_inner())),
    }
}

fn add_split(entry: &mut ActivityCounts, is_new: bool, total: u64) {
    if is_new {
        entry.new_users += total;
    } else {
        entry.returning_users += total;
    }
}

fn to_count(total: i64) -> u64 {
    u64::try_from(total).unwrap_or_default()
}
