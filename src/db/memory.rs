//! In-memory `PriceStore` for exercising the update pass and scheduler
//! without SQLite I/O (keeps paused-clock tests deterministic).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::db::store::{check_price, clamp_history_limit, PriceStore};
use crate::error::{AppError, Result};
use crate::types::{NewProduct, PriceRecord, Product, ProductId};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    history: Vec<PriceRecord>,
    clock: i64,
}

impl Inner {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn latest(&self, product_id: ProductId) -> Option<&PriceRecord> {
        self.history
            .iter()
            .filter(|r| r.product_id == product_id)
            .max_by_key(|r| (r.recorded_at, r.id))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `count` products named `product-N` and returns their ids.
    pub async fn with_products(count: usize) -> (Self, Vec<ProductId>) {
        let store = Self::new();
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let p = store
                .insert_product(&NewProduct {
                    name: format!("product-{i}"),
                    url: format!("https://shop.example/{i}"),
                })
                .await
                .unwrap();
            ids.push(p.id);
        }
        (store, ids)
    }

    /// Every record for a product in insertion order.
    pub fn records(&self, product_id: ProductId) -> Vec<PriceRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .history
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.inner.lock().unwrap().history.len()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn list_product_ids(&self) -> Result<Vec<ProductId>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.iter().map(|p| p.id).collect())
    }

    async fn latest_price(&self, product_id: ProductId) -> Result<Option<f64>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.latest(product_id).map(|r| r.price))
    }

    async fn append_price(&self, product_id: ProductId, price: f64) -> Result<()> {
        check_price(price)?;
        let mut inner = self.inner.lock().unwrap();
        if !inner.products.iter().any(|p| p.id == product_id) {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        let recorded_at = inner.tick();
        let id = inner.history.len() as i64 + 1;
        inner.history.push(PriceRecord { id, product_id, price, recorded_at });
        Ok(())
    }

    async fn price_history(&self, product_id: ProductId, limit: i64) -> Result<Vec<PriceRecord>> {
        let mut records = self.records(product_id);
        records.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));
        records.truncate(clamp_history_limit(limit) as usize);
        Ok(records)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let inner = self.inner.lock().unwrap();
        let mut product = inner
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
        product.current_price = inner.latest(product_id).map(|r| r.price);
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .products
            .iter()
            .map(|p| Product { current_price: inner.latest(p.id).map(|r| r.price), ..p.clone() })
            .collect())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product> {
        product.validate()?;
        let mut inner = self.inner.lock().unwrap();
        let created_at = inner.tick();
        let stored = Product {
            id: inner.products.len() as i64 + 1,
            name: product.name.clone(),
            url: product.url.clone(),
            current_price: None,
            created_at,
        };
        inner.products.push(stored.clone());
        Ok(stored)
    }
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

/// Wraps a `MemoryStore` and fails or stalls selected operations.
pub struct FaultyStore {
    pub inner: MemoryStore,
    /// Number of upcoming `list_product_ids` calls that fail.
    pub failing_listings: AtomicUsize,
    /// Products whose `latest_price` read fails.
    pub failing_reads: Vec<ProductId>,
    /// Products whose `append_price` write fails.
    pub failing_appends: Vec<ProductId>,
    /// Cancelled right after the first successful append.
    pub cancel_on_append: Option<CancellationToken>,
    /// When set, the next `list_product_ids` call waits for a notification
    /// before answering. Later calls are not gated.
    pub listing_gate: Mutex<Option<Arc<Notify>>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing_listings: AtomicUsize::new(0),
            failing_reads: Vec::new(),
            failing_appends: Vec::new(),
            cancel_on_append: None,
            listing_gate: Mutex::new(None),
        }
    }

    fn injected() -> AppError {
        AppError::Database(sqlx::Error::Protocol("injected fault".into()))
    }
}

#[async_trait]
impl PriceStore for FaultyStore {
    async fn list_product_ids(&self) -> Result<Vec<ProductId>> {
        let gate = self.listing_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let remaining = self.failing_listings.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_listings.store(remaining - 1, Ordering::SeqCst);
            return Err(Self::injected());
        }
        self.inner.list_product_ids().await
    }

    async fn latest_price(&self, product_id: ProductId) -> Result<Option<f64>> {
        if self.failing_reads.contains(&product_id) {
            return Err(Self::injected());
        }
        self.inner.latest_price(product_id).await
    }

    async fn append_price(&self, product_id: ProductId, price: f64) -> Result<()> {
        if self.failing_appends.contains(&product_id) {
            return Err(Self::injected());
        }
        self.inner.append_price(product_id, price).await?;
        if let Some(cancel) = &self.cancel_on_append {
            cancel.cancel();
        }
        Ok(())
    }

    async fn price_history(&self, product_id: ProductId, limit: i64) -> Result<Vec<PriceRecord>> {
        self.inner.price_history(product_id, limit).await
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.inner.get_product(product_id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product> {
        self.inner.insert_product(product).await
    }
}
