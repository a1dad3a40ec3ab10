pub mod price_scheduler;
pub mod price_updater;

pub use price_scheduler::PriceScheduler;
pub use price_updater::PriceUpdater;
