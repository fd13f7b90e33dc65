//! Session first-seen migration.
//!
//! The primary key on `session_id` is the only thing deciding which request
//! saw a session first. Do not relax it to a plain index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SessionFirstSeen::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionFirstSeen::SessionId)
                            .string_len(100)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SessionFirstSeen::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SessionFirstSeen::FirstActionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SessionFirstSeen::FirstBranchId).uuid().null())
                    .col(ColumnDef::new(SessionFirstSeen::FirstQrCodeId).uuid().null())
                    .col(
                        ColumnDef::new(SessionFirstSeen::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_first_seen_branch")
                            .from(SessionFirstSeen::Table, SessionFirstSeen::FirstBranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_first_seen_qr_code")
                            .from(SessionFirstSeen::Table, SessionFirstSeen::FirstQrCodeId)
                            .to(QrCodes::Table, QrCodes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Retention sweep deletes by age
        manager
            .create_index(
                Index::create()
                    .name("idx_session_first_seen_created")
                    .table(SessionFirstSeen::Table)
                    .col(SessionFirstSeen::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_session_first_seen_action_created")
                    .table(SessionFirstSeen::Table)
                    .col(SessionFirstSeen::FirstActionType)
                    .col(SessionFirstSeen::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SessionFirstSeen::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SessionFirstSeen {
    Table,
    SessionId,
    FirstSeenAt,
    FirstActionType,
    FirstBranchId,
    FirstQrCodeId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Branches {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
}
