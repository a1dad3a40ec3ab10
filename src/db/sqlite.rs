use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::{PriceHistoryRow, ProductRow};
use crate::db::store::{check_price, clamp_history_limit, PriceStore};
use crate::error::{AppError, Result};
use crate::types::{NewProduct, PriceRecord, Product, ProductId};

/// SQLite-backed price store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database file and applies migrations.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database. One connection, since each `:memory:`
    /// connection would otherwise see its own empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn list_product_ids(&self) -> Result<Vec<ProductId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn latest_price(&self, product_id: ProductId) -> Result<Option<f64>> {
        let price = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT price FROM price_history
            WHERE product_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(price)
    }

    async fn append_price(&self, product_id: ProductId, price: f64) -> Result<()> {
        check_price(price)?;

        // recorded_at never goes backwards for a product, even if the wall clock does.
        sqlx::query(
            r#"
            INSERT INTO price_history (product_id, price, recorded_at)
            VALUES (?, ?, MAX(?, COALESCE(
                (SELECT MAX(recorded_at) + 1 FROM price_history WHERE product_id = ?), 0)))
            "#,
        )
        .bind(product_id)
        .bind(price)
        .bind(now_ns())
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        debug!(product_id, price, "Price appended");
        Ok(())
    }

    async fn price_history(&self, product_id: ProductId, limit: i64) -> Result<Vec<PriceRecord>> {
        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r#"
            SELECT id, product_id, price, recorded_at
            FROM price_history
            WHERE product_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(product_id)
        .bind(clamp_history_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT p.id, p.name, p.url, p.created_at,
                   (SELECT ph.price FROM price_history ph
                    WHERE ph.product_id = p.id
                    ORDER BY ph.recorded_at DESC, ph.id DESC
                    LIMIT 1) AS current_price
            FROM products p
            WHERE p.id = ?
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::from)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT p.id, p.name, p.url, p.created_at,
                   (SELECT ph.price FROM price_history ph
                    WHERE ph.product_id = p.id
                    ORDER BY ph.recorded_at DESC, ph.id DESC
                    LIMIT 1) AS current_price
            FROM products p
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product> {
        product.validate()?;
        let created_at = now_ns();

        let result = sqlx::query("INSERT INTO products (name, url, created_at) VALUES (?, ?, ?)")
            .bind(&product.name)
            .bind(&product.url)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name: product.name.clone(),
            url: product.url.clone(),
            current_price: None,
            created_at,
        })
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
