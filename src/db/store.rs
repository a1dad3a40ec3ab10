use async_trait::async_trait;

use crate::config::HISTORY_LIMIT;
use crate::error::{AppError, Result};
use crate::types::{NewProduct, PriceRecord, Product, ProductId};

/// Persistence contract over products and their append-only price history.
///
/// Every operation is an independent statement; no call spans a transaction.
/// Dropping a returned future abandons the operation.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// All known product ids. Used to snapshot the scope of an update pass.
    async fn list_product_ids(&self) -> Result<Vec<ProductId>>;

    /// Price of the most recent record by `recorded_at`, or `None` when the
    /// product has no history yet. A missing record is not an error.
    async fn latest_price(&self, product_id: ProductId) -> Result<Option<f64>>;

    /// Appends a record with a store-assigned timestamp. Rejects non-positive prices.
    async fn append_price(&self, product_id: ProductId, price: f64) -> Result<()>;

    /// Most recent records first, at most `limit` (clamped to `1..=HISTORY_LIMIT`).
    async fn price_history(&self, product_id: ProductId, limit: i64) -> Result<Vec<PriceRecord>>;

    /// Single product with its latest price; `NotFound` if the id is unknown.
    async fn get_product(&self, product_id: ProductId) -> Result<Product>;

    /// Every product with its latest price attached, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Creates a product and returns it with its assigned id and creation time.
    async fn insert_product(&self, product: &NewProduct) -> Result<Product>;
}

pub fn clamp_history_limit(limit: i64) -> i64 {
    limit.clamp(1, HISTORY_LIMIT)
}

/// Guard shared by every store implementation: no price <= 0 (or NaN/inf) is ever written.
pub fn check_price(price: f64) -> Result<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!("price must be positive, got {price}")))
    }
}
