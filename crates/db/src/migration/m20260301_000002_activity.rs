//! Activity migration.
//!
//! Creates the QR scan and social click logs.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QrScans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QrScans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(QrScans::QrCodeId).uuid().not_null())
                    .col(
                        ColumnDef::new(QrScans::ScannedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(QrScans::SessionId).string_len(100).not_null())
                    .col(ColumnDef::new(QrScans::IsNewUser).boolean().not_null())
                    .col(ColumnDef::new(QrScans::DeviceType).string_len(20).null())
                    .col(ColumnDef::new(QrScans::Browser).string_len(50).null())
                    .col(ColumnDef::new(QrScans::Os).string_len(50).null())
                    .col(ColumnDef::new(QrScans::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(QrScans::Country).string_len(100).null())
                    .col(ColumnDef::new(QrScans::City).string_len(100).null())
                    .col(ColumnDef::new(QrScans::Latitude).double().null())
                    .col(ColumnDef::new(QrScans::Longitude).double().null())
                    .col(ColumnDef::new(QrScans::UserAgent).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_scans_qr_code")
                            .from(QrScans::Table, QrScans::QrCodeId)
                            .to(QrCodes::Table, QrCodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_qr_scans_qr_scanned")
                    .table(QrScans::Table)
                    .col(QrScans::QrCodeId)
                    .col(QrScans::ScannedAt)
                    .to_owned(),
            )
            .await?;

        // GPS follow-ups look up the latest scan of a session
        manager
            .create_index(
                Index::create()
                    .name("idx_qr_scans_session")
                    .table(QrScans::Table)
                    .col(QrScans::SessionId)
                    .col(QrScans::ScannedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SocialClicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialClicks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SocialClicks::Platform)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SocialClicks::BranchId).uuid().null())
                    .col(
                        ColumnDef::new(SocialClicks::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SocialClicks::SessionId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SocialClicks::IsNewUser).boolean().not_null())
                    .col(ColumnDef::new(SocialClicks::DeviceType).string_len(20).null())
                    .col(ColumnDef::new(SocialClicks::Browser).string_len(50).null())
                    .col(ColumnDef::new(SocialClicks::Os).string_len(50).null())
                    .col(ColumnDef::new(SocialClicks::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(SocialClicks::Country).string_len(100).null())
                    .col(ColumnDef::new(SocialClicks::City).string_len(100).null())
                    .col(ColumnDef::new(SocialClicks::UserAgent).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_clicks_branch")
                            .from(SocialClicks::Table, SocialClicks::BranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_social_clicks_branch_platform")
                    .table(SocialClicks::Table)
                    .col(SocialClicks::BranchId)
                    .col(SocialClicks::Platform)
                    .col(SocialClicks::ClickedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_social_clicks_clicked_at")
                    .table(SocialClicks::Table)
                    .col(SocialClicks::ClickedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialClicks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QrScans::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QrScans {
    Table,
    Id,
    QrCodeId,
    ScannedAt,
    SessionId,
    IsNewUser,
    DeviceType,
    Browser,
    Os,
    IpAddress,
    Country,
    City,
    Latitude,
    Longitude,
    UserAgent,
}

#[derive(DeriveIden)]
enum SocialClicks {
    Table,
    Id,
    Platform,
    BranchId,
    ClickedAt,
    SessionId,
    IsNewUser,
    DeviceType,
    Browser,
    Os,
    IpAddress,
    Country,
    City,
    UserAgent,
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Branches {
    Table,
    Id,
}
