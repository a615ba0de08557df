//! Product catalog service.
//!
//! Read-only collaborator: a fixed product table behind lookup
//! endpoints. The listing route carries an occasional-latency gate so
//! the stack's consumers see realistic slow responses.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::chaos::FaultDice;
use crate::config::ChaosConfig;
use crate::error::ServiceError;

/// One catalog entry. Immutable and owned by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub category: String,
}

fn seed_products() -> Vec<Product> {
    let entries = [
        (1, "iPhone 15 Pro", 999.0, "electronics"),
        (2, "MacBook Pro M3", 2499.0, "electronics"),
        (3, "AirPods Pro", 249.0, "accessories"),
        (4, "iPad Air", 599.0, "electronics"),
        (5, "Apple Watch Ultra", 799.0, "accessories"),
    ];
    entries
        .into_iter()
        .map(|(id, name, price, category)| Product {
            id,
            name: name.to_string(),
            price,
            category: category.to_string(),
        })
        .collect()
}

/// Shared state for the catalog handlers.
pub struct CatalogState {
    products: Vec<Product>,
    version: String,
    dice: Arc<dyn FaultDice>,
    slow_rate: f64,
    slow_delay: Duration,
}

impl CatalogState {
    pub fn new(version: &str, dice: Arc<dyn FaultDice>, chaos: &ChaosConfig) -> Self {
        Self {
            products: seed_products(),
            version: version.to_string(),
            dice,
            slow_rate: chaos.catalog_slow_rate,
            slow_delay: Duration::from_millis(chaos.catalog_slow_ms),
        }
    }

    /// Direct lookup, also used by in-process test doubles.
    pub fn find(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Build the catalog service router.
pub fn router(state: Arc<CatalogState>) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn list_products(State(state): State<Arc<CatalogState>>) -> impl IntoResponse {
    if state.dice.roll() < state.slow_rate {
        tracing::debug!(delay = ?state.slow_delay, "slow listing gate fired");
        tokio::time::sleep(state.slow_delay).await;
    }

    Json(serde_json::json!({
        "products": &state.products,
        "version": &state.version,
        "total": state.products.len(),
    }))
}

async fn get_product(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .find(id)
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
    Ok(Json(serde_json::json!({
        "product": product,
        "version": &state.version,
    })))
}

async fn health(State(state): State<Arc<CatalogState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": &state.version,
    }))
}

async fn metrics(State(state): State<Arc<CatalogState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "products_total": state.products.len(),
        "version": &state.version,
    }))
}
