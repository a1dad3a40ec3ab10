//! Shared health state for the /health endpoint.
//! Updated by PriceUpdater, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Shared updater metrics. Also carries the single-flight marker for passes.
#[derive(Default)]
pub struct HealthState {
    /// True while an update pass is running.
    pass_in_progress: AtomicBool,
    /// Passes that got past the id listing (cancelled ones included).
    passes_completed: AtomicU64,
    /// Nanosecond timestamp of the last finished pass (0 = none).
    last_pass_at_ns: AtomicU64,
    /// Price records written since startup.
    prices_written: AtomicU64,
    /// Store failures seen by passes since startup.
    failures: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub pass_in_progress: bool,
    pub passes_completed: u64,
    pub last_pass_at_ns: u64,
    pub prices_written: u64,
    pub failures: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a pass as started. Returns false if one is already running.
    pub fn try_begin_pass(&self) -> bool {
        self.pass_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_pass(&self) {
        self.pass_in_progress.store(false, Ordering::Release);
    }

    pub fn record_pass_finished(&self, at_ns: u64) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
        self.last_pass_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn inc_prices_written(&self) {
        self.prices_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_in_progress(&self) -> bool {
        self.pass_in_progress.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            pass_in_progress: self.pass_in_progress(),
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            last_pass_at_ns: self.last_pass_at_ns.load(Ordering::Relaxed),
            prices_written: self.prices_written.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
