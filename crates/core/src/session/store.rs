//! Storage seam for session claims.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::ClaimStoreError;
use super::types::{ClaimOutcome, NewClaim, SessionClaim, SessionKey};

/// Shared store of session claims keyed by session id.
///
/// Implementations must back `try_claim` with a single atomic
/// insert-if-absent that reports whether this call inserted the row. A
/// separate existence check followed by an insert is not acceptable: two
/// racers would both see "absent" and both report a new session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Inserts the claim unless a row for the session already exists.
    async fn try_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, ClaimStoreError>;

    /// Fetches the stored claim for a session.
    async fn find(&self, session_id: &SessionKey) -> Result<Option<SessionClaim>, ClaimStoreError>;

    /// Deletes claims created strictly before `cutoff`, returning how many were removed.
    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClaimStoreError>;
}
