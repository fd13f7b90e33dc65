//! The claim operation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::cache::KnownSessionCache;
use super::error::SessionError;
use super::store::ClaimStore;
use super::types::{ActionKind, ClaimContext, ClaimOutcome, NewClaim, SessionClaim, SessionKey};

/// Converts session ids into one-time "new visitor" signals.
///
/// Holds no authoritative state of its own; any number of registers across
/// any number of processes can share one store.
#[derive(Clone)]
pub struct SessionRegister {
    store: Arc<dyn ClaimStore>,
    known: Option<KnownSessionCache>,
}

impl SessionRegister {
    /// Creates a register over the given store, without a cache.
    #[must_use]
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store, known: None }
    }

    /// Layers a known-session cache in front of the store.
    #[must_use]
    pub fn with_cache(mut self, cache: KnownSessionCache) -> Self {
        self.known = Some(cache);
        self
    }

    /// Claims a session and reports whether this action is its first.
    ///
    /// Exactly one of any number of concurrent callers for the same session
    /// gets `true`, and only after the claim row is committed. A duplicate is
    /// the normal "returning" answer. Store failures are logged and answered
    /// with `false`, so the caller's request path never breaks.
    pub async fn claim(&self, key: &SessionKey, action: ActionKind, context: ClaimContext) -> bool {
        if let Some(known) = &self.known
            && known.contains(key)
        {
            debug!(session = %key.log_prefix(), action = %action, "Returning visitor (cached)");
            return false;
        }

        let generation = self.known.as_ref().map(KnownSessionCache::generation);
        let attempt = NewClaim::new(key.clone(), action, context);

        match self.store.try_claim(&attempt).await {
            Ok(outcome) => {
                if let (Some(known), Some(generation)) = (&self.known, generation) {
                    known.remember_since(key, generation);
                }
                match outcome {
                    ClaimOutcome::Claimed => {
                        info!(session = %key.log_prefix(), action = %action, "New visitor");
                    }
                    ClaimOutcome::AlreadyClaimed => {
                        info!(session = %key.log_prefix(), action = %action, "Returning visitor");
                    }
                }
                outcome.is_new()
            }
            Err(e) => {
                warn!(
                    session = %key.log_prefix(),
                    action = %action,
                    transient = e.is_transient(),
                    error = %e,
                    "Session claim failed, counting visitor as returning"
                );
                false
            }
        }
    }

    /// Looks up when and how a session was first seen.
    pub async fn first_action(&self, key: &SessionKey) -> Result<Option<SessionClaim>, SessionError> {
        Ok(self.store.find(key).await?)
    }

    /// Deletes claims older than `age`, returning the number removed.
    ///
    /// A purged session id can be claimed as new again afterwards.
    pub async fn purge_older_than(&self, age: Duration) -> Result<u64, SessionError> {
        if age < Duration::zero() {
            return Err(SessionError::NegativeRetentionAge(age.num_seconds()));
        }

        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .ok_or(SessionError::RetentionAgeTooLarge(age.num_days()))?;
        let removed = self.store.purge_created_before(cutoff).await?;

        if let Some(known) = &self.known {
            known.clear();
        }

        info!(
            removed,
            cutoff = %cutoff,
            max_age_days = age.num_days(),
            "Purged old session claims"
        );
        Ok(removed)
    }
}

impl std::fmt::Debug for SessionRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegister")
            .field("cached", &self.known.is_some())
            .finish_non_exhaustive()
    }
}
