//! Periodic purge of old session claims.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use super::register::SessionRegister;

/// Default claim age after which claims are purged (90 days).
pub const DEFAULT_MAX_AGE_DAYS: i64 = 90;

/// Shortest allowed interval between sweeps.
const MIN_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Runs `purge_older_than` on a fixed schedule.
///
/// Purely storage hygiene: a failed run is logged and the next tick tries
/// again.
#[derive(Debug, Clone)]
pub struct RetentionSweep {
    register: Arc<SessionRegister>,
    max_age: Duration,
    every: StdDuration,
}

impl RetentionSweep {
    /// Creates a sweep purging claims older than `max_age` every `every`.
    #[must_use]
    pub fn new(register: Arc<SessionRegister>, max_age: Duration, every: StdDuration) -> Self {
        Self {
            register,
            max_age,
            every: every.max(MIN_INTERVAL),
        }
    }

    /// Runs one purge, returning the number of removed claims or `None` on failure.
    pub async fn run_once(&self) -> Option<u64> {
        match self.register.purge_older_than(self.max_age).await {
            Ok(removed) => Some(removed),
            Err(e) => {
                error!(error = %e, "Session retention sweep failed, retrying next run");
                None
            }
        }
    }

    /// Spawns the sweep loop onto the Tokio runtime.
    ///
    /// The first run happens immediately. Abort the handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            max_age_days = self.max_age.num_days(),
            interval_secs = self.every.as_secs(),
            "Starting session retention sweep"
        );

        tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
