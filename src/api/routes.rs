use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::health::{HealthSnapshot, HealthState};
use crate::config::HISTORY_LIMIT;
use crate::db::PriceStore;
use crate::error::AppError;
use crate::types::{NewProduct, PriceRecord, Product, ProductId};

/// Read side of the store plus product creation. Price generation is never
/// driven from here.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn PriceStore>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product))
        .route("/api/products/:id/history", get(get_price_history))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------
//
// Extractors are taken as `Result` so malformed input is reported through
// `AppError` (JSON body, 400) instead of axum's plain-text rejections.

async fn list_products(State(state): State<ApiState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.store.list_products().await?))
}

async fn create_product(
    State(state): State<ApiState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(input) = payload?;
    let product = state.store.insert_product(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<ApiState>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = id?;
    Ok(Json(state.store.get_product(id).await?))
}

async fn get_price_history(
    State(state): State<ApiState>,
    id: Result<Path<ProductId>, PathRejection>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<PriceRecord>>, AppError> {
    let Path(id) = id?;
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(HISTORY_LIMIT);
    Ok(Json(state.store.price_history(id, limit).await?))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}
