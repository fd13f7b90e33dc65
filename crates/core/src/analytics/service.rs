//! Analytics roll-up service.

use std::collections::HashMap;

use qrpulse_shared::types::{BranchId, ClusterId, QrCodeId};

use super::types::{
    ActivityCounts, BranchReport, ClusterReport, DeviceCount, Hierarchy, NewVsReturning,
    PlatformCount, QrCodeReport, RegionReport, SocialReport,
};

/// Service shaping raw counts into reports.
pub struct AnalyticsService;

impl AnalyticsService {
    /// Builds the new vs returning split from raw counts.
    ///
    /// Percentages are rounded to 2 decimals and are both 0 when there is
    /// no activity.
    #[must_use]
    pub fn new_vs_returning(new_users: u64, returning_users: u64) -> NewVsReturning {
        let total = new_users + returning_users;
        NewVsReturning {
            new_users,
            returning_users,
            new_percentage: Self::percentage(new_users, total),
            returning_percentage: Self::percentage(returning_users, total),
        }
    }

    /// Rolls branch counts up into cluster and region reports.
    ///
    /// Every parent's totals are the sum of its children. Branches missing
    /// from `counts` report zeros; counts for branches outside the hierarchy
    /// are ignored. Output keeps the hierarchy's ordering.
    #[must_use]
    pub fn rollup(
        hierarchy: &Hierarchy,
        counts: &HashMap<BranchId, ActivityCounts>,
    ) -> Vec<RegionReport> {
        let mut branches_by_cluster: HashMap<ClusterId, Vec<BranchReport>> = HashMap::new();
        for branch in &hierarchy.branches {
            let activity = counts.get(&branch.id).copied().unwrap_or_default();
            branches_by_cluster
                .entry(branch.cluster_id)
                .or_default()
                .push(BranchReport {
                    branch_id: branch.id,
                    branch_name: branch.name.clone(),
                    cluster_id: branch.cluster_id,
                    total_qr_scans: activity.qr_scans,
                    total_social_clicks: activity.social_clicks,
                    combined_total: activity.combined_total(),
                    new_vs_returning: Self::new_vs_returning(
                        activity.new_users,
                        activity.returning_users,
                    ),
                });
        }

        let mut clusters_by_region: HashMap<_, Vec<ClusterReport>> = HashMap::new();
        for cluster in &hierarchy.clusters {
            let branches = branches_by_cluster.remove(&cluster.id).unwrap_or_default();
            let totals = branches
                .iter()
                .map(|b| Self::counts_of(b.total_qr_scans, b.total_social_clicks, &b.new_vs_returning))
                .fold(ActivityCounts::default(), |acc, c| acc + c);

            clusters_by_region
                .entry(cluster.region_id)
                .or_default()
                .push(ClusterReport {
                    cluster_id: cluster.id,
                    cluster_name: cluster.name.clone(),
                    region_id: cluster.region_id,
                    total_qr_scans: totals.qr_scans,
                    total_social_clicks: totals.social_clicks,
                    combined_total: totals.combined_total(),
                    new_vs_returning: Self::new_vs_returning(
                        totals.new_users,
                        totals.returning_users,
                    ),
                    branches,
                });
        }

        hierarchy
            .regions
            .iter()
            .map(|region| {
                let clusters = clusters_by_region.remove(&region.id).unwrap_or_default();
                let totals = clusters
                    .iter()
                    .map(|c| {
                        Self::counts_of(c.total_qr_scans, c.total_social_clicks, &c.new_vs_returning)
                    })
                    .fold(ActivityCounts::default(), |acc, c| acc + c);

                RegionReport {
                    region_id: region.id,
                    region_name: region.name.clone(),
                    total_qr_scans: totals.qr_scans,
                    total_social_clicks: totals.social_clicks,
                    combined_total: totals.combined_total(),
                    new_vs_returning: Self::new_vs_returning(
                        totals.new_users,
                        totals.returning_users,
                    ),
                    clusters,
                }
            })
            .collect()
    }

    /// Drops cluster and branch detail from region reports, keeping totals.
    #[must_use]
    pub fn without_details(mut reports: Vec<RegionReport>) -> Vec<RegionReport> {
        for report in &mut reports {
            report.clusters.clear();
        }
        reports
    }

    /// Builds a social report from per-platform counts.
    ///
    /// Platforms are sorted by click count descending, then by name.
    #[must_use]
    pub fn social_report(
        platform_counts: Vec<(String, u64)>,
        new_users: u64,
        returning_users: u64,
    ) -> SocialReport {
        let mut platform_breakdown: Vec<PlatformCount> = platform_counts
            .into_iter()
            .map(|(platform, count)| PlatformCount { platform, count })
            .collect();
        platform_breakdown.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.platform.cmp(&b.platform))
        });

        SocialReport {
            total_clicks: platform_breakdown.iter().map(|p| p.count).sum(),
            new_vs_returning: Self::new_vs_returning(new_users, returning_users),
            platform_breakdown,
        }
    }

    /// Flattens region reports into a branch ranking.
    ///
    /// Busiest branch first by combined total, ties by name.
    #[must_use]
    pub fn branch_performance(reports: Vec<RegionReport>) -> Vec<BranchReport> {
        let mut branches: Vec<BranchReport> = reports
            .into_iter()
            .flat_map(|region| region.clusters)
            .flat_map(|cluster| cluster.branches)
            .collect();
        branches.sort_by(|a, b| {
            b.combined_total
                .cmp(&a.combined_total)
                .then_with(|| a.branch_name.cmp(&b.branch_name))
        });
        branches
    }

    /// Builds the scan report for one QR code.
    ///
    /// Scans without a device class are counted under `unknown`.
    #[must_use]
    pub fn qr_code_report(
        qr_code_id: QrCodeId,
        code: String,
        new_users: u64,
        returning_users: u64,
        device_counts: Vec<(Option<String>, u64)>,
    ) -> QrCodeReport {
        let mut merged: HashMap<String, u64> = HashMap::new();
        for (device, count) in device_counts {
            let device = device
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            *merged.entry(device).or_default() += count;
        }

        let mut device_breakdown: Vec<DeviceCount> = merged
            .into_iter()
            .map(|(device_type, count)| DeviceCount { device_type, count })
            .collect();
        device_breakdown.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.device_type.cmp(&b.device_type))
        });

        QrCodeReport {
            qr_code_id,
            code,
            total_scans: new_users + returning_users,
            new_vs_returning: Self::new_vs_returning(new_users, returning_users),
            device_breakdown,
        }
    }

    const fn counts_of(
        qr_scans: u64,
        social_clicks: u64,
        split: &NewVsReturning,
    ) -> ActivityCounts {
        ActivityCounts {
            qr_scans,
            social_clicks,
            new_users: split.new_users,
            returning_users: split.returning_users,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn percentage(part: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (part as f64 / total as f64 * 10_000.0).round() / 100.0
    }
}
