//! Known-session cache using Moka.
//!
//! Remembers sessions the store has confirmed as claimed so repeat actions
//! can skip the round trip. The cache only ever answers "returning"; a miss
//! always goes to the store, and nothing here can produce a "new" result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use super::types::SessionKey;

/// Default cache capacity (number of sessions).
const DEFAULT_CACHE_CAPACITY: u64 = 100_000;

/// Default time-to-live for cache entries (1 hour).
const DEFAULT_TTL_SECS: u64 = 3600;

/// Advisory cache of sessions already claimed in the store.
#[derive(Clone)]
pub struct KnownSessionCache {
    cache: Cache<String, ()>,
    /// Bumped by every `clear`, shared between clones.
    generation: Arc<AtomicU64>,
}

impl KnownSessionCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 100,000 sessions, 1 hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and TTL.
    ///
    /// The TTL must stay well below the retention age, otherwise a purged
    /// session could keep answering "returning" on this instance.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns true if the session is known to be claimed.
    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.cache.contains_key(key.as_str())
    }

    /// Current clear generation. Read it before asking the store, then pass
    /// it to [`remember_since`](Self::remember_since).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Records a session the store reported as claimed.
    pub fn remember(&self, key: &SessionKey) {
        self.cache.insert(key.as_str().to_string(), ());
    }

    /// Records a session unless the cache was cleared after `generation`.
    ///
    /// An answer read from the store before a purge may describe a row the
    /// purge has since deleted; such answers are dropped. Returns whether
    /// the session was kept.
    pub fn remember_since(&self, key: &SessionKey, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.cache.insert(key.as_str().to_string(), ());

        // A clear may have landed between the check and the insert.
        if self.generation() != generation {
            self.cache.invalidate(key.as_str());
            return false;
        }
        true
    }

    /// Forgets every session, e.g. after a retention purge.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }
}

impl Default for KnownSessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnownSessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownSessionCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
