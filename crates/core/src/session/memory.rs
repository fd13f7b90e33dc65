//! In-process claim store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::ClaimStoreError;
use super::store::ClaimStore;
use super::types::{ClaimOutcome, NewClaim, SessionClaim, SessionKey};

/// Claim store backed by a concurrent map.
///
/// The map's entry API gives the same first-writer-wins guarantee as a
/// unique index, but only inside one process. Use it for tests and local
/// runs, never behind more than one server instance.
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    claims: DashMap<String, SessionClaim>,
}

impl InMemoryClaimStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true when no claims are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn try_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, ClaimStoreError> {
        match self.claims.entry(claim.session_id.as_str().to_string()) {
            Entry::Occupied(_) => Ok(ClaimOutcome::AlreadyClaimed),
            Entry::Vacant(slot) => {
                slot.insert(SessionClaim::from(claim));
                Ok(ClaimOutcome::Claimed)
            }
        }
    }

    async fn find(&self, session_id: &SessionKey) -> Result<Option<SessionClaim>, ClaimStoreError> {
        Ok(self
            .claims
            .get(session_id.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ClaimStoreError> {
        let mut removed = 0u64;
        self.claims.retain(|_, claim| {
            let keep = claim.created_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
