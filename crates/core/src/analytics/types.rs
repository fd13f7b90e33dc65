//! Analytics types.

use std::ops::{Add, AddAssign};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use qrpulse_shared::types::{BranchId, ClusterId, QrCodeId, RegionId};
use serde::Serialize;

use super::error::AnalyticsError;

/// Inclusive calendar-date window for analytics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateWindow {
    /// Creates a window; either side may be open.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is after `end`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AnalyticsError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(AnalyticsError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Inclusive lower bound: midnight UTC of the start date.
    #[must_use]
    pub fn from(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Exclusive upper bound: midnight UTC after the end date.
    ///
    /// The whole end date is included.
    #[must_use]
    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.succ_opt())
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Returns true if the timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from().is_none_or(|from| at >= from) && self.until().is_none_or(|until| at < until)
    }
}

/// Split of actions between new and returning visitors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NewVsReturning {
    /// Actions that were a session's first.
    pub new_users: u64,
    /// Actions by sessions seen before.
    pub returning_users: u64,
    /// Share of new actions, in percent with 2 decimals.
    pub new_percentage: f64,
    /// Share of returning actions, in percent with 2 decimals.
    pub returning_percentage: f64,
}

/// Per-entity activity counts, as read from the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    /// Number of QR scans.
    pub qr_scans: u64,
    /// Number of social clicks.
    pub social_clicks: u64,
    /// Actions flagged as a new visitor.
    pub new_users: u64,
    /// Actions flagged as a returning visitor.
    pub returning_users: u64,
}

impl ActivityCounts {
    /// Scans plus clicks.
    #[must_use]
    pub const fn combined_total(&self) -> u64 {
        self.qr_scans + self.social_clicks
    }
}

impl Add for ActivityCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            qr_scans: self.qr_scans + rhs.qr_scans,
            social_clicks: self.social_clicks + rhs.social_clicks,
            new_users: self.new_users + rhs.new_users,
            returning_users: self.returning_users + rhs.returning_users,
        }
    }
}

impl AddAssign for ActivityCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A region in the reporting hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionNode {
    /// Region ID.
    pub id: RegionId,
    /// Region name.
    pub name: String,
}

/// A cluster in the reporting hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    /// Cluster ID.
    pub id: ClusterId,
    /// Owning region.
    pub region_id: RegionId,
    /// Cluster name.
    pub name: String,
}

/// A branch in the reporting hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    /// Branch ID.
    pub id: BranchId,
    /// Owning cluster.
    pub cluster_id: ClusterId,
    /// Branch name.
    pub name: String,
}

/// Active regions, clusters and branches to report on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    /// Regions.
    pub regions: Vec<RegionNode>,
    /// Clusters.
    pub clusters: Vec<ClusterNode>,
    /// Branches.
    pub branches: Vec<BranchNode>,
}

/// Branch-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchReport {
    /// Branch ID.
    pub branch_id: BranchId,
    /// Branch name.
    pub branch_name: String,
    /// Owning cluster.
    pub cluster_id: ClusterId,
    /// QR scans.
    pub total_qr_scans: u64,
    /// Social clicks.
    pub total_social_clicks: u64,
    /// Scans plus clicks.
    pub combined_total: u64,
    /// New vs returning split.
    pub new_vs_returning: NewVsReturning,
}

/// Cluster-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    /// Cluster ID.
    pub cluster_id: ClusterId,
    /// Cluster name.
    pub cluster_name: String,
    /// Owning region.
    pub region_id: RegionId,
    /// QR scans.
    pub total_qr_scans: u64,
    /// Social clicks.
    pub total_social_clicks: u64,
    /// Scans plus clicks.
    pub combined_total: u64,
    /// New vs returning split.
    pub new_vs_returning: NewVsReturning,
    /// Branch breakdown.
    pub branches: Vec<BranchReport>,
}

/// Region-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    /// Region ID.
    pub region_id: RegionId,
    /// Region name.
    pub region_name: String,
    /// QR scans.
    pub total_qr_scans: u64,
    /// Social clicks.
    pub total_social_clicks: u64,
    /// Scans plus clicks.
    pub combined_total: u64,
    /// New vs returning split.
    pub new_vs_returning: NewVsReturning,
    /// Cluster breakdown.
    pub clusters: Vec<ClusterReport>,
}

/// Clicks for one social platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCount {
    /// Platform name.
    pub platform: String,
    /// Number of clicks.
    pub count: u64,
}

/// Social-click report for a scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialReport {
    /// Total clicks.
    pub total_clicks: u64,
    /// New vs returning split.
    pub new_vs_returning: NewVsReturning,
    /// Clicks per platform, busiest first.
    pub platform_breakdown: Vec<PlatformCount>,
}

/// Scans from one device class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    /// Device class, `unknown` when the client sent none.
    pub device_type: String,
    /// Number of scans.
    pub count: u64,
}

/// Scan report for a single QR code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrCodeReport {
    /// QR code ID.
    pub qr_code_id: QrCodeId,
    /// Public code.
    pub code: String,
    /// Scans in the window.
    pub total_scans: u64,
    /// New vs returning split of those scans.
    pub new_vs_returning: NewVsReturning,
    /// Scans per device class, busiest first.
    pub device_breakdown: Vec<DeviceCount>,
}
