//! Tests for analytics roll-ups.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use qrpulse_shared::types::{BranchId, ClusterId, QrCodeId, RegionId};
use rstest::rstest;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two regions; the first has two clusters, one with two branches.
fn sample_hierarchy() -> (Hierarchy, [BranchId; 3]) {
    let ntr = RegionId::new();
    let krishna = RegionId::new();
    let c1 = ClusterId::new();
    let c2 = ClusterId::new();
    let b1 = BranchId::new();
    let b2 = BranchId::new();
    let b3 = BranchId::new();

    let hierarchy = Hierarchy {
        regions: vec![
            RegionNode { id: ntr, name: "NTR".into() },
            RegionNode { id: krishna, name: "Krishna".into() },
        ],
        clusters: vec![
            ClusterNode { id: c1, region_id: ntr, name: "C1".into() },
            ClusterNode { id: c2, region_id: ntr, name: "C2".into() },
        ],
        branches: vec![
            BranchNode { id: b1, cluster_id: c1, name: "B1".into() },
            BranchNode { id: b2, cluster_id: c1, name: "B2".into() },
            BranchNode { id: b3, cluster_id: c2, name: "B3".into() },
        ],
    };
    (hierarchy, [b1, b2, b3])
}

#[rstest]
#[case(0, 0, 0.0, 0.0)]
#[case(1, 0, 100.0, 0.0)]
#[case(1, 1, 50.0, 50.0)]
#[case(1, 2, 33.33, 66.67)]
#[case(2, 1, 66.67, 33.33)]
fn test_new_vs_returning_percentages(
    #[case] new_users: u64,
    #[case] returning_users: u64,
    #[case] new_pct: f64,
    #[case] ret_pct: f64,
) {
    let split = AnalyticsService::new_vs_returning(new_users, returning_users);
    assert_eq!(split.new_users, new_users);
    assert_eq!(split.returning_users, returning_users);
    assert!((split.new_percentage - new_pct).abs() < 1e-9);
    assert!((split.returning_percentage - ret_pct).abs() < 1e-9);
}

#[test]
fn test_rollup_sums_children() {
    let (hierarchy, [b1, b2, b3]) = sample_hierarchy();
    let counts = HashMap::from([
        (b1, ActivityCounts { qr_scans: 10, social_clicks: 2, new_users: 5, returning_users: 7 }),
        (b2, ActivityCounts { qr_scans: 3, social_clicks: 1, new_users: 4, returning_users: 0 }),
        (b3, ActivityCounts { qr_scans: 0, social_clicks: 6, new_users: 1, returning_users: 5 }),
    ]);

    let reports = AnalyticsService::rollup(&hierarchy, &counts);
    assert_eq!(reports.len(), 2);

    let ntr = &reports[0];
    assert_eq!(ntr.region_name, "NTR");
    assert_eq!(ntr.total_qr_scans, 13);
    assert_eq!(ntr.total_social_clicks, 9);
    assert_eq!(ntr.combined_total, 22);
    assert_eq!(ntr.new_vs_returning.new_users, 10);
    assert_eq!(ntr.new_vs_returning.returning_users, 12);
    assert_eq!(ntr.clusters.len(), 2);

    let c1 = &ntr.clusters[0];
    assert_eq!(c1.combined_total, 16);
    assert_eq!(c1.branches.len(), 2);
    assert_eq!(c1.branches[1].branch_name, "B2");
    assert!((c1.branches[1].new_vs_returning.new_percentage - 100.0).abs() < 1e-9);

    let krishna = &reports[1];
    assert_eq!(krishna.combined_total, 0);
    assert!(krishna.clusters.is_empty());
}

#[test]
fn test_rollup_ignores_unknown_branches() {
    let (hierarchy, _) = sample_hierarchy();
    let counts = HashMap::from([(
        BranchId::new(),
        ActivityCounts { qr_scans: 99, ..ActivityCounts::default() },
    )]);

    let reports = AnalyticsService::rollup(&hierarchy, &counts);
    assert!(reports.iter().all(|r| r.combined_total == 0));
}

#[test]
fn test_without_details_keeps_totals() {
    let (hierarchy, [b1, _, _]) = sample_hierarchy();
    let counts = HashMap::from([(
        b1,
        ActivityCounts { qr_scans: 4, ..ActivityCounts::default() },
    )]);

    let reports = AnalyticsService::without_details(AnalyticsService::rollup(&hierarchy, &counts));
    assert_eq!(reports[0].total_qr_scans, 4);
    assert!(reports[0].clusters.is_empty());
}

#[test]
fn test_social_report_sorts_busiest_first() {
    let report = AnalyticsService::social_report(
        vec![
            ("youtube".into(), 3),
            ("facebook".into(), 7),
            ("instagram".into(), 7),
            ("threads".into(), 1),
        ],
        8,
        10,
    );

    assert_eq!(report.total_clicks, 18);
    let order: Vec<&str> = report
        .platform_breakdown
        .iter()
        .map(|p| p.platform.as_str())
        .collect();
    assert_eq!(order, ["facebook", "instagram", "youtube", "threads"]);
    assert!((report.new_vs_returning.new_percentage - 44.44).abs() < 1e-9);
}

#[test]
fn test_branch_performance_ranks_busiest_first() {
    let (hierarchy, [b1, b2, b3]) = sample_hierarchy();
    let counts = HashMap::from([
        (b1, ActivityCounts { qr_scans: 1, ..ActivityCounts::default() }),
        (b3, ActivityCounts { qr_scans: 2, social_clicks: 3, ..ActivityCounts::default() }),
    ]);

    let ranking = AnalyticsService::branch_performance(AnalyticsService::rollup(&hierarchy, &counts));

    let order: Vec<BranchId> = ranking.iter().map(|b| b.branch_id).collect();
    assert_eq!(order, [b3, b1, b2]);
    assert_eq!(ranking[0].combined_total, 5);
    assert_eq!(ranking[2].combined_total, 0);
}

#[test]
fn test_qr_code_report_merges_unknown_devices() {
    let id = QrCodeId::new();
    let report = AnalyticsService::qr_code_report(
        id,
        "B001-QR".into(),
        3,
        1,
        vec![
            (Some("Mobile".into()), 2),
            (None, 1),
            (Some(String::new()), 1),
        ],
    );

    assert_eq!(report.qr_code_id, id);
    assert_eq!(report.total_scans, 4);
    assert!((report.new_vs_returning.new_percentage - 75.0).abs() < 1e-9);
    assert_eq!(
        report.device_breakdown,
        [
            DeviceCount { device_type: "mobile".into(), count: 2 },
            DeviceCount { device_type: "unknown".into(), count: 2 },
        ]
    );
}

#[test]
fn test_date_window_rejects_inverted_range() {
    let result = DateWindow::new(Some(date(2025, 3, 2)), Some(date(2025, 3, 1)));
    assert_eq!(
        result,
        Err(AnalyticsError::InvalidDateRange {
            start: date(2025, 3, 2),
            end: date(2025, 3, 1),
        })
    );
}

#[test]
fn test_date_window_includes_whole_end_day() {
    let window = DateWindow::new(Some(date(2025, 3, 1)), Some(date(2025, 3, 1))).unwrap();

    assert!(window.contains(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
    assert!(window.contains(Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap()));
    assert!(!window.contains(Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()));
    assert!(!window.contains(Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()));
}

#[test]
fn test_unbounded_window_contains_everything() {
    let window = DateWindow::unbounded();
    assert!(window.from().is_none());
    assert!(window.until().is_none());
    assert!(window.contains(Utc::now()));
}

fn counts_strategy() -> impl Strategy<Value = ActivityCounts> {
    (0u64..10_000, 0u64..10_000, 0u64..10_000, 0u64..10_000).prop_map(
        |(qr_scans, social_clicks, new_users, returning_users)| ActivityCounts {
            qr_scans,
            social_clicks,
            new_users,
            returning_users,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Region totals always equal the sum over all branches.
    #[test]
    fn prop_rollup_preserves_totals(
        a in counts_strategy(),
        b in counts_strategy(),
        c in counts_strategy(),
    ) {
        let (hierarchy, [b1, b2, b3]) = sample_hierarchy();
        let counts = HashMap::from([(b1, a), (b2, b), (b3, c)]);
        let expected = a + b + c;

        let reports = AnalyticsService::rollup(&hierarchy, &counts);
        let total_scans: u64 = reports.iter().map(|r| r.total_qr_scans).sum();
        let total_clicks: u64 = reports.iter().map(|r| r.total_social_clicks).sum();
        let total_new: u64 = reports.iter().map(|r| r.new_vs_returning.new_users).sum();

        prop_assert_eq!(total_scans, expected.qr_scans);
        prop_assert_eq!(total_clicks, expected.social_clicks);
        prop_assert_eq!(total_new, expected.new_users);
    }

    /// Non-empty splits always add up to 100% within rounding.
    #[test]
    fn prop_percentages_sum_to_100(new_users in 0u64..1_000_000, returning_users in 0u64..1_000_000) {
        prop_assume!(new_users + returning_users > 0);
        let split = AnalyticsService::new_vs_returning(new_users, returning_users);
        prop_assert!((split.new_percentage + split.returning_percentage - 100.0).abs() <= 0.011);
    }
}
