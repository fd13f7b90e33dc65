//! SQL-backed claim store for the session first-seen register.
//!
//! A claim is a single `INSERT .. ON CONFLICT (session_id) DO NOTHING
//! RETURNING session_id`. A returned row means this call inserted it; no row
//! means another caller already had. There is no read before the insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qrpulse_core::session::{
    ActionKind, ClaimOutcome, ClaimStore, ClaimStoreError, NewClaim, SessionClaim, SessionKey,
};
use qrpulse_shared::types::{BranchId, QrCodeId};
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};

use crate::entities::session_first_seen;

/// Claim store over the `session_first_seen` table.
#[derive(Debug, Clone)]
pub struct SeaOrmClaimStore {
    db: DatabaseConnection,
}

impl SeaOrmClaimStore {
    /// Creates a new claim store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClaimStore for SeaOrmClaimStore {
    async fn try_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, ClaimStoreError> {
        use session_first_seen::Column;

        let at = claim.attempted_at.fixed_offset();
        let mut insert = Query::insert();
        insert
            .into_table(session_first_seen::Entity)
            .columns([
                Column::SessionId,
                Column::FirstSeenAt,
                Column::FirstActionType,
                Column::FirstBranchId,
                Column::FirstQrCodeId,
                Column::CreatedAt,
            ])
            .values([
                claim.session_id.as_str().into(),
                at.into(),
                claim.action.as_str().into(),
                claim.context.branch_id.map(BranchId::into_inner).into(),
                claim.context.qr_code_id.map(QrCodeId::into_inner).into(),
                at.into(),
            ])
            .map_err(|e| ClaimStoreError::Backend(e.to_string()))?
            .on_conflict(OnConflict::column(Column::SessionId).do_nothing().to_owned())
            .returning_col(Column::SessionId);

        let stmt = self.db.get_database_backend().build(&insert);
        let row = self.db.query_one(stmt).await.map_err(classify)?;

        Ok(if row.is_some() {
            ClaimOutcome::Claimed
        } else {
            ClaimOutcome::AlreadyClaimed
        })
    }

    async fn find(&self, session_id: &SessionKey) -> Result<Option<SessionClaim>, ClaimStoreError> {
        let model = session_first_seen::Entity::find_by_id(session_id.as_str())
            .one(&self.db)
            .await
            .map_err(classify)?;

        model.map(to_claim).transpose()
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClaimStoreError> {
        let result = session_first_seen::Entity::delete_many()
            .filter(session_first_seen::Column::CreatedAt.lt(cutoff.fixed_offset()))
            .exec(&self.db)
            .await
            .map_err(classify)?;

        tracing::debug!(removed = result.rows_affected, %cutoff, "Deleted expired session claims");
        Ok(result.rows_affected)
    }
}

fn to_claim(model: session_first_seen::Model) -> Result<SessionClaim, ClaimStoreError> {
    let first_action_kind = model
        .first_action_type
        .parse::<ActionKind>()
        .map_err(|e| ClaimStoreError::Corrupt(e.to_string()))?;

    Ok(SessionClaim {
        session_id: model.session_id,
        first_seen_at: model.first_seen_at.with_timezone(&Utc),
        first_action_kind,
        first_branch_id: model.first_branch_id.map(BranchId::from_uuid),
        first_qr_code_id: model.first_qr_code_id.map(QrCodeId::from_uuid),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

/// Splits connectivity failures from everything else.
fn classify(err: DbErr) -> ClaimStoreError {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            ClaimStoreError::Unavailable(err.to_string())
        }
        other => ClaimStoreError::Backend(other.to_string()),
    }
}
