//! Database row types matching `migrations/0001_init.sql`.
//! Used by sqlx for typed queries.

use crate::types::{PriceRecord, Product};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_at: i64,
    /// Correlated latest-price lookup; NULL when the product has no history.
    pub current_price: Option<f64>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            url: r.url,
            current_price: r.current_price,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: i64,
    pub product_id: i64,
    pub price: f64,
    pub recorded_at: i64,
}

impl From<PriceHistoryRow> for PriceRecord {
    fn from(r: PriceHistoryRow) -> Self {
        PriceRecord {
            id: r.id,
            product_id: r.product_id,
            price: r.price,
            recorded_at: r.recorded_at,
        }
    }
}
