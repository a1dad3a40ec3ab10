use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::db::PriceStore;
use crate::pricing::next_price;

/// Runs update passes: one synthetic price per known product, appended to history.
///
/// Failures are isolated per product and only logged; a product that fails is
/// picked up again on the next pass. Only one pass runs at a time: a pass
/// requested while another is active is skipped.
pub struct PriceUpdater {
    store: Arc<dyn PriceStore>,
    rng: Mutex<StdRng>,
    health: Arc<HealthState>,
}

impl PriceUpdater {
    pub fn new(store: Arc<dyn PriceStore>, rng: StdRng, health: Arc<HealthState>) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
            health,
        }
    }

    pub async fn run_pass(&self, cancel: &CancellationToken) {
        let Some(_guard) = PassGuard::acquire(&self.health) else {
            warn!("Update pass skipped: previous pass still running");
            return;
        };

        let ids = match self.store.list_product_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                self.health.inc_failures();
                error!("Update pass aborted, failed to list product ids: {e}");
                return;
            }
        };

        let total = ids.len();
        let mut written = 0usize;
        let mut failed = 0usize;
        let mut cancelled = false;

        for product_id in ids {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let last = match self.store.latest_price(product_id).await {
                Ok(last) => last,
                Err(e) => {
                    failed += 1;
                    self.health.inc_failures();
                    warn!(product_id, "Failed to read latest price: {e}");
                    continue;
                }
            };

            // Lock held only for the draw, never across a store call.
            let price = {
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                next_price(&mut *rng, last)
            };

            match self.store.append_price(product_id, price).await {
                Ok(()) => {
                    written += 1;
                    self.health.inc_prices_written();
                    info!(product_id, price, "Price updated");
                }
                Err(e) => {
                    failed += 1;
                    self.health.inc_failures();
                    warn!(product_id, price, "Failed to append price: {e}");
                }
            }
        }

        self.health.record_pass_finished(now_ns());
        let skipped = total - written - failed;
        info!(
            total,
            written,
            failed,
            skipped,
            cancelled,
            "Update pass complete: {written}/{total} written, {failed} failed, {skipped} skipped",
        );
    }
}

/// Holds the single-flight marker for the duration of a pass, including
/// when the pass future is dropped midway.
struct PassGuard<'a> {
    health: &'a HealthState,
}

impl<'a> PassGuard<'a> {
    fn acquire(health: &'a HealthState) -> Option<Self> {
        health.try_begin_pass().then_some(Self { health })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.health.end_pass();
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
