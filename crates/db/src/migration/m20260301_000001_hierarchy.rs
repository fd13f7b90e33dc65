//! Hierarchy migration.
//!
//! Creates regions, clusters, branches and the QR codes branches own.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Regions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Regions::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Regions::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Regions::Code)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Regions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Regions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clusters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clusters::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Clusters::RegionId).uuid().not_null())
                    .col(ColumnDef::new(Clusters::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Clusters::Code).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Clusters::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Clusters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clusters_region")
                            .from(Clusters::Table, Clusters::RegionId)
                            .to(Regions::Table, Regions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Cluster codes (C1, C2, ...) repeat across regions, not within one
        manager
            .create_index(
                Index::create()
                    .name("idx_clusters_region_code")
                    .table(Clusters::Table)
                    .col(Clusters::RegionId)
                    .col(Clusters::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Branches::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Branches::ClusterId).uuid().not_null())
                    .col(ColumnDef::new(Branches::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Branches::Code).string_len(20).not_null())
                    .col(ColumnDef::new(Branches::Location).string_len(200).null())
                    .col(
                        ColumnDef::new(Branches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Branches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_branches_cluster")
                            .from(Branches::Table, Branches::ClusterId)
                            .to(Clusters::Table, Clusters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_branches_cluster_code")
                    .table(Branches::Table)
                    .col(Branches::ClusterId)
                    .col(Branches::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QrCodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QrCodes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(QrCodes::Code)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(QrCodes::TargetUrl).text().not_null())
                    .col(ColumnDef::new(QrCodes::BranchId).uuid().not_null())
                    .col(
                        ColumnDef::new(QrCodes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(QrCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(QrCodes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_codes_branch")
                            .from(QrCodes::Table, QrCodes::BranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Active codes per branch (listing and analytics joins)
        manager
            .create_index(
                Index::create()
                    .name("idx_qr_codes_branch_active")
                    .table(QrCodes::Table)
                    .col(QrCodes::BranchId)
                    .col(QrCodes::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QrCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Branches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clusters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Regions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Regions {
    Table,
    Id,
    Name,
    Code,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Clusters {
    Table,
    Id,
    RegionId,
    Name,
    Code,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Branches {
    Table,
    Id,
    ClusterId,
    Name,
    Code,
    Location,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
    Code,
    TargetUrl,
    BranchId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
