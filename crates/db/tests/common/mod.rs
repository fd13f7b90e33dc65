//! Shared setup for db integration tests.
//!
//! Each test gets its own in-memory SQLite database with all migrations
//! applied. The pool holds exactly one connection so the database lives as
//! long as the pool does. Tests that need several real connections racing
//! each other use [`setup_file_db`] instead.

#![allow(dead_code)]

use qrpulse_db::migration::{Migrator, MigratorTrait};
use qrpulse_db::repositories::{
    CreateBranchInput, CreateClusterInput, CreateQrCodeInput, CreateRegionInput,
    HierarchyRepository, QrCodeRepository,
};
use qrpulse_shared::types::{BranchId, ClusterId, QrCodeId, RegionId};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;

/// Opens a fresh migrated database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Opens a fresh migrated database file behind a pool of `connections`.
///
/// The returned directory owns the file; keep it alive for the test.
pub async fn setup_file_db(connections: u32) -> (TempDir, DatabaseConnection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("claims.db").display());

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open database file");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    (dir, db)
}

/// One region → cluster → branch chain with a QR code.
pub struct Fixture {
    pub region_id: RegionId,
    pub cluster_id: ClusterId,
    pub branch_id: BranchId,
    pub qr_code_id: QrCodeId,
    pub qr_code: String,
}

/// Creates a region, cluster, branch and QR code with the given codes.
pub async fn seed_branch(db: &DatabaseConnection, region: &str, cluster: &str, branch: &str) -> Fixture {
    let hierarchy = HierarchyRepository::new(db.clone());

    let region_model = match hierarchy
        .list_regions(false)
        .await
        .expect("Failed to list regions")
        .into_iter()
        .find(|r| r.code == region)
    {
        Some(existing) => existing,
        None => hierarchy
            .create_region(CreateRegionInput {
                name: format!("Region {region}"),
                code: region.to_string(),
            })
            .await
            .expect("Failed to create region"),
    };
    let region_id = RegionId::from_uuid(region_model.id);

    let cluster_model = match hierarchy
        .list_clusters(Some(region_id))
        .await
        .expect("Failed to list clusters")
        .into_iter()
        .find(|c| c.code == cluster)
    {
        Some(existing) => existing,
        None => hierarchy
            .create_cluster(CreateClusterInput {
                region_id,
                name: format!("Cluster {cluster}"),
                code: cluster.to_string(),
            })
            .await
            .expect("Failed to create cluster"),
    };
    let cluster_id = ClusterId::from_uuid(cluster_model.id);

    let branch_model = hierarchy
        .create_branch(CreateBranchInput {
            cluster_id,
            name: format!("Branch {branch}"),
            code: branch.to_string(),
            location: None,
        })
        .await
        .expect("Failed to create branch");
    let branch_id = BranchId::from_uuid(branch_model.id);

    let qr = QrCodeRepository::new(db.clone())
        .create(CreateQrCodeInput {
            branch_id,
            code: Some(format!("{branch}-QR")),
            target_url: "https://example.com/social-links".to_string(),
        })
        .await
        .expect("Failed to create QR code");

    Fixture {
        region_id,
        cluster_id,
        branch_id,
        qr_code_id: QrCodeId::from_uuid(qr.id),
        qr_code: qr.code,
    }
}
