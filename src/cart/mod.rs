//! Cart service.
//!
//! # Data Flow
//! ```text
//! POST /cart/{user}/add
//!     → catalog hop (lookup name/price)
//!     → store.rs (upsert under the user's lock, recompute total)
//!
//! POST /cart/{user}/checkout
//!     → checkout.rs (empty-cart precondition, chaos gate,
//!       payment hop, clear-on-success)
//! ```
//!
//! # Design Decisions
//! - Store and both hop clients are injected; the handlers never build
//!   their own transports
//! - Every cart mutation runs under the per-user lock from store.rs

pub mod checkout;
pub mod store;

pub use checkout::{CheckoutError, CheckoutReceipt};
pub use store::{Cart, CartItem, CartStore, InMemoryCartStore, StoreError, UserLocks};

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::chaos::FaultDice;
use crate::clients::{PaymentClient, ProductLookup};
use crate::config::ChaosConfig;
use crate::error::ServiceError;

/// Shared state for the cart service handlers.
pub struct CartState {
    pub(crate) store: Arc<dyn CartStore>,
    pub(crate) locks: UserLocks,
    pub(crate) catalog: Arc<dyn ProductLookup>,
    pub(crate) payment: Arc<dyn PaymentClient>,
    pub(crate) dice: Arc<dyn FaultDice>,
    pub(crate) checkout_failure_rate: f64,
    pub(crate) payment_timeout: Duration,
    pub(crate) version: String,
}

impl CartState {
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductLookup>,
        payment: Arc<dyn PaymentClient>,
        dice: Arc<dyn FaultDice>,
        chaos: &ChaosConfig,
        payment_timeout: Duration,
        version: &str,
    ) -> Self {
        Self {
            store,
            locks: UserLocks::new(),
            catalog,
            payment,
            dice,
            checkout_failure_rate: chaos.checkout_failure_rate,
            payment_timeout,
            version: version.to_string(),
        }
    }

    /// Existing cart or a fresh empty one. The empty cart is not
    /// persisted.
    pub async fn get_cart(&self, user_id: &str) -> Result<Cart, ServiceError> {
        let cart = self
            .store
            .load(user_id)
            .await
            .map_err(|e| ServiceError::DownstreamUnavailable(format!(
                "Cart storage unavailable: {e}"
            )))?;
        Ok(cart.unwrap_or_default())
    }

    /// Look the product up, then upsert it into the user's cart under
    /// the user's lock. No mutation happens on a failed lookup.
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: u32,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .catalog
            .lookup(product_id)
            .await
            .map_err(|e| {
                ServiceError::DownstreamUnavailable(format!("Catalog service unavailable: {e}"))
            })?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let _guard = self.locks.acquire(user_id).lock_owned().await;
        let mut cart = self
            .store
            .load(user_id)
            .await
            .map_err(|e| ServiceError::DownstreamUnavailable(format!(
                "Cart storage unavailable: {e}"
            )))?
            .unwrap_or_default();
        cart.upsert(&product, quantity);
        self.store
            .save(user_id, &cart)
            .await
            .map_err(|e| ServiceError::DownstreamUnavailable(format!(
                "Cart storage unavailable: {e}"
            )))?;

        tracing::debug!(
            user_id = %user_id,
            product_id,
            quantity,
            total = cart.total,
            "item added to cart"
        );
        Ok(cart)
    }
}

/// Build the cart service router.
pub fn router(state: Arc<CartState>) -> Router {
    Router::new()
        .route("/cart/{user_id}", get(get_cart))
        .route("/cart/{user_id}/add", post(add_item))
        .route("/cart/{user_id}/checkout", post(run_checkout))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn get_cart(
    State(state): State<Arc<CartState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.get_cart(&user_id).await?;
    Ok(Json(serde_json::json!({
        "cart": cart,
        "version": &state.version,
    })))
}

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    product_id: u32,
    quantity: Option<u32>,
}

async fn add_item(
    State(state): State<Arc<CartState>>,
    Path(user_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quantity = request.quantity.unwrap_or(1);
    let cart = state.add_item(&user_id, request.product_id, quantity).await?;
    Ok(Json(serde_json::json!({
        "message": "Product added to cart",
        "cart": cart,
        "version": &state.version,
    })))
}

async fn run_checkout(
    State(state): State<Arc<CartState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, CheckoutError> {
    let receipt = state.checkout(&user_id).await?;
    Ok(Json(serde_json::json!({
        "message": "Checkout successful",
        "order_id": receipt.order_id,
        "total": receipt.total,
        "version": &state.version,
    })))
}

async fn health(State(state): State<Arc<CartState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": &state.version,
    }))
}

async fn metrics(State(state): State<Arc<CartState>>) -> impl IntoResponse {
    match state.store.stats().await {
        Ok(stats) => Json(serde_json::json!({
            "active_carts": stats.active_carts,
            "total_items": stats.total_items,
            "version": &state.version,
        })),
        Err(err) => Json(serde_json::json!({
            "error": format!("Cart storage unavailable: {err}"),
            "version": &state.version,
        })),
    }
}
