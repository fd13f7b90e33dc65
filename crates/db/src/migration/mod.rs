//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the
//! schema builder so they run on both Postgres and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_hierarchy;
mod m20260301_000002_activity;
mod m20260301_000003_session_first_seen;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_hierarchy::Migration),
            Box::new(m20260301_000002_activity::Migration),
            Box::new(m20260301_000003_session_first_seen::Migration),
        ]
    }
}
