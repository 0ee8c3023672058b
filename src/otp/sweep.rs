//! Periodic eviction of expired one-time codes.
//!
//! Verification already refuses expired codes; the sweep keeps `otps.json`
//! from accumulating codes that were requested but never used.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::otp::repo::OtpRepo;
use crate::store::StoreError;

/// Interval between sweep cycles.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct OtpSweeper {
    otps: Arc<OtpRepo>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl OtpSweeper {
    pub fn new(otps: Arc<OtpRepo>, clock: Arc<dyn Clock>) -> Self {
        Self {
            otps,
            clock,
            interval: SWEEP_INTERVAL,
        }
    }

    /// Create with custom interval (for testing).
    #[cfg(test)]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run a single sweep cycle, returning how many codes were evicted.
    pub async fn run_cycle(&self) -> Result<usize, StoreError> {
        let removed = self.otps.purge_expired(self.clock.now_millis()).await?;
        if removed > 0 {
            info!(removed, "expired security codes evicted");
        } else {
            debug!("no expired security codes");
        }
        Ok(removed)
    }

    /// Start the sweep background task.
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cycle().await {
                    warn!(error = %e, "security code sweep failed");
                }
            }
        })
    }
}
