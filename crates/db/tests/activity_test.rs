//! Integration tests for activity logging and analytics aggregates.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use qrpulse_core::analytics::{AnalyticsService, DateWindow};
use qrpulse_db::repositories::{
    ActivityRepository, AnalyticsRepository, ClientDetails, HierarchyRepository, NewScan,
    NewSocialClick, SocialScope,
};
use qrpulse_shared::types::BranchId;

use common::{Fixture, seed_branch, setup_db};

fn scan(fixture: &Fixture, session: &str, is_new_user: bool) -> NewScan {
    NewScan {
        qr_code_id: fixture.qr_code_id,
        session_id: session.to_string(),
        is_new_user,
        latitude: None,
        longitude: None,
        client: ClientDetails {
            device_type: Some("mobile".to_string()),
            ..ClientDetails::default()
        },
    }
}

fn click(branch_id: Option<BranchId>, platform: &str, session: &str, is_new_user: bool) -> NewSocialClick {
    NewSocialClick {
        platform: platform.to_string(),
        branch_id,
        session_id: session.to_string(),
        is_new_user,
        client: ClientDetails::default(),
    }
}

#[tokio::test]
async fn test_record_scan_and_attach_gps() {
    let db = setup_db().await;
    let fixture = seed_branch(&db, "NTR", "C1", "B001").await;
    let repo = ActivityRepository::new(db);

    let recorded = repo.record_scan(scan(&fixture, "s1", true)).await.expect("record");
    assert!(recorded.latitude.is_none());
    assert_eq!(recorded.device_type.as_deref(), Some("mobile"));

    let updated = repo
        .attach_gps(fixture.qr_code_id, "s1", 16.5, 80.6)
        .await
        .expect("attach")
        .expect("recent scan without coordinates");
    assert_eq!(updated.into_inner(), recorded.id);

    // Coordinates are only attached once.
    let again = repo
        .attach_gps(fixture.qr_code_id, "s1", 16.6, 80.7)
        .await
        .expect("attach");
    assert!(again.is_none());
}

#[tokio::test]
async fn test_attach_gps_ignores_other_sessions() {
    let db = setup_db().await;
    let fixture = seed_branch(&db, "NTR", "C1", "B001").await;
    let repo = ActivityRepository::new(db);

    repo.record_scan(scan(&fixture, "s1", true)).await.expect("record");

    let updated = repo
        .attach_gps(fixture.qr_code_id, "s2", 16.5, 80.6)
        .await
        .expect("attach");
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_branch_for_code() {
    let db = setup_db().await;
    let fixture = seed_branch(&db, "NTR", "C1", "B001").await;
    let repo = ActivityRepository::new(db);

    let found = repo.branch_for_code(&fixture.qr_code).await.expect("lookup");
    assert_eq!(found, Some(fixture.branch_id));
    assert!(repo.branch_for_code("nope").await.expect("lookup").is_none());
}

#[tokio::test]
async fn test_branch_activity_counts() {
    let db = setup_db().await;
    let b1 = seed_branch(&db, "NTR", "C1", "B001").await;
    let b2 = seed_branch(&db, "NTR", "C2", "B002").await;
    let activity = ActivityRepository::new(db.clone());

    activity.record_scan(scan(&b1, "s1", true)).await.expect("record");
    activity.record_scan(scan(&b1, "s1", false)).await.expect("record");
    activity.record_scan(scan(&b1, "s2", true)).await.expect("record");
    activity
        .record_social_click(click(Some(b1.branch_id), "facebook", "s1", false))
        .await
        .expect("record");
    activity
        .record_social_click(click(Some(b2.branch_id), "instagram", "s3", true))
        .await
        .expect("record");
    activity
        .record_social_click(click(None, "youtube", "s4", true))
        .await
        .expect("record");

    let counts = AnalyticsRepository::new(db.clone())
        .branch_activity(&DateWindow::unbounded())
        .await
        .expect("counts");

    let first = counts.get(&b1.branch_id).copied().unwrap_or_default();
    assert_eq!(first.qr_scans, 3);
    assert_eq!(first.social_clicks, 1);
    assert_eq!(first.new_users, 2);
    assert_eq!(first.returning_users, 2);

    let second = counts.get(&b2.branch_id).copied().unwrap_or_default();
    assert_eq!(second.qr_scans, 0);
    assert_eq!(second.social_clicks, 1);
    assert_eq!(second.new_users, 1);

    let hierarchy = HierarchyRepository::new(db)
        .load_active_hierarchy(None)
        .await
        .expect("hierarchy");
    let reports = AnalyticsService::rollup(&hierarchy, &counts);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].total_qr_scans, 3);
    assert_eq!(reports[0].total_social_clicks, 2);
    assert_eq!(reports[0].combined_total, 5);
    assert_eq!(reports[0].clusters.len(), 2);
}

#[tokio::test]
async fn test_window_excludes_other_days() {
    let db = setup_db().await;
    let fixture = seed_branch(&db, "NTR", "C1", "B001").await;
    ActivityRepository::new(db.clone())
        .record_scan(scan(&fixture, "s1", true))
        .await
        .expect("record");
    let repo = AnalyticsRepository::new(db);

    let today = Utc::now().date_naive();
    let inside = DateWindow::new(Some(today), Some(today)).expect("window");
    let counts = repo.branch_activity(&inside).await.expect("counts");
    assert_eq!(counts.get(&fixture.branch_id).map(|c| c.qr_scans), Some(1));

    let tomorrow = today + Duration::days(1);
    let later = DateWindow::new(Some(tomorrow), None).expect("window");
    assert!(repo.branch_activity(&later).await.expect("counts").is_empty());

    let past = NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");
    let before = DateWindow::new(None, Some(past)).expect("window");
    assert!(repo.branch_activity(&before).await.expect("counts").is_empty());
}

#[tokio::test]
async fn test_qr_scan_counts() {
    let db = setup_db().await;
    let fixture = seed_branch(&db, "NTR", "C1", "B001").await;
    let other = seed_branch(&db, "NTR", "C1", "B002").await;
    let activity = ActivityRepository::new(db.clone());

    activity.record_scan(scan(&fixture, "s1", true)).await.expect("record");
    activity.record_scan(scan(&fixture, "s1", false)).await.expect("record");
    let mut desktop = scan(&fixture, "s2", true);
    desktop.client.device_type = None;
    activity.record_scan(desktop).await.expect("record");
    activity.record_scan(scan(&other, "s3", true)).await.expect("record");

    let repo = AnalyticsRepository::new(db);
    let counts = repo
        .qr_scan_counts(fixture.qr_code_id, &DateWindow::default())
        .await
        .expect("counts");
    assert_eq!(counts.new_users, 2);
    assert_eq!(counts.returning_users, 1);

    let mut devices = counts.devices;
    devices.sort();
    assert_eq!(devices, [(None, 1), (Some("mobile".to_string()), 2)]);

    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let later = DateWindow::new(Some(tomorrow), None).expect("window");
    let empty = repo.qr_scan_counts(fixture.qr_code_id, &later).await.expect("counts");
    assert_eq!(empty.new_users + empty.returning_users, 0);
    assert!(empty.devices.is_empty());
}

#[tokio::test]
async fn test_social_counts_by_scope() {
    let db = setup_db().await;
    let ntr = seed_branch(&db, "NTR", "C1", "B001").await;
    let ntr_other = seed_branch(&db, "NTR", "C2", "B002").await;
    let kri = seed_branch(&db, "KRI", "C1", "B101").await;
    let activity = ActivityRepository::new(db.clone());

    for (branch, platform, session, is_new) in [
        (Some(ntr.branch_id), "facebook", "s1", true),
        (Some(ntr.branch_id), "facebook", "s1", false),
        (Some(ntr_other.branch_id), "instagram", "s2", true),
        (Some(kri.branch_id), "youtube", "s3", true),
        (None, "threads", "s4", true),
    ] {
        activity
            .record_social_click(click(branch, platform, session, is_new))
            .await
            .expect("record");
    }
    let repo = AnalyticsRepository::new(db);
    let window = DateWindow::unbounded();

    let all = repo.social_counts(SocialScope::All, &window).await.expect("all");
    assert_eq!(all.platforms.iter().map(|(_, n)| n).sum::<u64>(), 5);
    assert_eq!((all.new_users, all.returning_users), (4, 1));

    let region = repo
        .social_counts(SocialScope::Region(ntr.region_id), &window)
        .await
        .expect("region");
    let report = AnalyticsService::social_report(region.platforms, region.new_users, region.returning_users);
    assert_eq!(report.total_clicks, 3);
    assert_eq!(report.platform_breakdown[0].platform, "facebook");
    assert_eq!(report.platform_breakdown[0].count, 2);

    let cluster = repo
        .social_counts(SocialScope::Cluster(ntr_other.cluster_id), &window)
        .await
        .expect("cluster");
    assert_eq!(cluster.platforms, vec![("instagram".to_string(), 1)]);

    let branch = repo
        .social_counts(SocialScope::Branch(kri.branch_id), &window)
        .await
        .expect("branch");
    assert_eq!(branch.platforms, vec![("youtube".to_string(), 1)]);
    assert_eq!((branch.new_users, branch.returning_users), (1, 0));
}
