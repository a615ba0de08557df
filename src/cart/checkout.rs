//! Checkout orchestration.
//!
//! # Algorithm (strict order, no retries)
//! 1. Load the cart under the user's lock; absent or empty fails fast
//! 2. Roll the checkout chaos gate, independent of the payment profile
//! 3. Call the payment hop under the orchestrator's own timeout
//! 4. Clear the cart if and only if payment confirmed success
//!
//! A failed checkout of any kind leaves the cart exactly as it was.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::cart::store::StoreError;
use crate::cart::CartState;
use crate::clients::{HopError, PaymentReply};

/// Successful checkout result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub total: f64,
}

/// Everything that can stop a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart absent or holds no items; no downstream call was made.
    #[error("Cart is empty")]
    EmptyCart,

    /// The checkout-level chaos gate fired before the payment hop.
    #[error("Checkout temporarily unavailable")]
    GateTripped,

    /// The payment service declined; carries its own code and body.
    #[error("Payment failed")]
    Declined {
        http_code: u16,
        details: serde_json::Value,
    },

    /// The payment hop exceeded the orchestrator's timeout.
    #[error("Payment service timeout")]
    PaymentTimeout,

    /// The payment service could not be reached.
    #[error("Payment service error: {0}")]
    PaymentUnreachable(String),

    /// The cart store failed before any payment was attempted.
    #[error("Cart storage unavailable: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    pub fn status(&self) -> StatusCode {
        match self {
            CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
            CheckoutError::GateTripped
            | CheckoutError::PaymentUnreachable(_)
            | CheckoutError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::Declined { http_code, .. } => {
                StatusCode::from_u16(*http_code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CheckoutError::PaymentTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            CheckoutError::Declined { details, .. } => serde_json::json!({
                "error": "Payment failed",
                "details": details,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl CartState {
    /// Run one checkout for `user_id`. Holds the user's lock for the
    /// whole flow so concurrent checkouts cannot both consume the cart.
    pub async fn checkout(&self, user_id: &str) -> Result<CheckoutReceipt, CheckoutError> {
        let _guard = self.locks.acquire(user_id).lock_owned().await;

        let cart = match self.store.load(user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CheckoutError::EmptyCart),
        };

        if self.dice.roll() < self.checkout_failure_rate {
            tracing::warn!(user_id = %user_id, "checkout chaos gate tripped");
            return Err(CheckoutError::GateTripped);
        }

        let call = self
            .payment
            .process(user_id, cart.total, cart.items.len() as u32);
        let reply = match tokio::time::timeout(self.payment_timeout, call).await {
            Err(_) | Ok(Err(HopError::Timeout)) => {
                tracing::warn!(user_id = %user_id, "payment hop timed out");
                return Err(CheckoutError::PaymentTimeout);
            }
            Ok(Err(err)) => return Err(CheckoutError::PaymentUnreachable(err.to_string())),
            Ok(Ok(reply)) => reply,
        };

        match reply {
            PaymentReply::Declined { http_code, details } => {
                tracing::info!(user_id = %user_id, http_code, "payment declined, cart preserved");
                Err(CheckoutError::Declined { http_code, details })
            }
            PaymentReply::Approved(approval) => {
                // Consumption is coupled to the outcome: only a confirmed
                // success clears the cart.
                if let Err(err) = self.store.remove(user_id).await {
                    tracing::error!(
                        user_id = %user_id,
                        order_id = %approval.order_id,
                        error = %err,
                        "payment committed but cart clear failed"
                    );
                }
                tracing::info!(
                    user_id = %user_id,
                    order_id = %approval.order_id,
                    total = cart.total,
                    "checkout complete"
                );
                Ok(CheckoutReceipt {
                    order_id: approval.order_id,
                    total: cart.total,
                })
            }
        }
    }
}
