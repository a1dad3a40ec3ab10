use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS};
use crate::scheduler::PriceUpdater;

/// Background task driving update passes on a fixed interval until cancelled.
pub struct PriceScheduler {
    updater: Arc<PriceUpdater>,
    interval: Duration,
}

impl PriceScheduler {
    /// A zero interval falls back to the default; anything above
    /// `MAX_INTERVAL_SECS` is capped so tick deadlines stay representable.
    pub fn new(updater: Arc<PriceUpdater>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_secs(DEFAULT_INTERVAL_SECS)
        } else {
            interval.min(Duration::from_secs(MAX_INTERVAL_SECS))
        };
        Self { updater, interval }
    }

    /// Runs one pass immediately, then one per tick. Ticks are anchored at
    /// loop start; ticks missed during a slow pass are dropped, not queued.
    /// Returns once `cancel` fires; an in-flight pass is left to observe the
    /// same token at its next product boundary.
    pub async fn run(self, cancel: CancellationToken) {
        let start = Instant::now();
        let first_tick = start
            .checked_add(self.interval)
            .unwrap_or_else(|| start + Duration::from_secs(DEFAULT_INTERVAL_SECS));
        let mut ticker = interval_at(first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Price scheduler started, interval {:?}", self.interval);

        self.updater.run_pass(&cancel).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Price scheduler stopping: cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    self.updater.run_pass(&cancel).await;
                }
            }
        }
    }
}
