//! Typed HTTP clients for the inter-service hops.
//!
//! # Responsibilities
//! - Catalog lookup and payment processing calls over the wire
//! - Classify failures: hop timeout, transport failure, undecodable body
//! - Trait seams so the cart service can run against in-process doubles
//!
//! # Design Decisions
//! - Every call carries its own timeout; budgets never compose
//! - A decline is a payment answer, not a transport error; it travels
//!   back with the originating status code and body

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::Product;

/// Transport-level failure of one hop.
#[derive(Debug, Error)]
pub enum HopError {
    /// The hop exceeded its timeout budget.
    #[error("timed out")]
    Timeout,

    /// The peer could not be reached or dropped the connection.
    #[error("{0}")]
    Transport(String),

    /// The peer answered, but the body was empty or undecodable.
    #[error("unexpected response body: {0}")]
    BadBody(String),
}

impl HopError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HopError::Timeout
        } else {
            HopError::Transport(err.to_string())
        }
    }
}

/// Catalog lookup seam used by the cart service.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` means the catalog answered and the product does not
    /// exist; transport problems surface as `Err`.
    async fn lookup(&self, product_id: u32) -> Result<Option<Product>, HopError>;
}

/// HTTP implementation of [`ProductLookup`].
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[async_trait]
impl ProductLookup for HttpCatalogClient {
    async fn lookup(&self, product_id: u32) -> Result<Option<Product>, HopError> {
        let url = format!("{}/products/{product_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(HopError::from_reqwest)?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let envelope: ProductEnvelope = response
            .json()
            .await
            .map_err(|e| HopError::BadBody(e.to_string()))?;
        Ok(Some(envelope.product))
    }
}

/// Successful payment fields the orchestrator cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentApproval {
    pub order_id: Uuid,
    pub amount: f64,
    pub processing_time: f64,
}

/// What the payment service answered, transport problems excluded.
#[derive(Debug, Clone)]
pub enum PaymentReply {
    Approved(PaymentApproval),
    /// Payment-level decline; carries the originating status code and
    /// the decoded error body for pass-through.
    Declined {
        http_code: u16,
        details: serde_json::Value,
    },
}

/// Payment hop seam used by the checkout orchestrator.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    async fn process(&self, user_id: &str, amount: f64, items: u32)
        -> Result<PaymentReply, HopError>;
}

/// HTTP implementation of [`PaymentClient`].
pub struct HttpPaymentClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPaymentClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn process(
        &self,
        user_id: &str,
        amount: f64,
        items: u32,
    ) -> Result<PaymentReply, HopError> {
        let url = format!("{}/process", self.base_url);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&serde_json::json!({
                "user_id": user_id,
                "amount": amount,
                "items": items,
            }))
            .send()
            .await
            .map_err(HopError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            let approval: PaymentApproval = response
                .json()
                .await
                .map_err(|e| HopError::BadBody(e.to_string()))?;
            return Ok(PaymentReply::Approved(approval));
        }

        let details: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HopError::BadBody(e.to_string()))?;
        Ok(PaymentReply::Declined {
            http_code: status.as_u16(),
            details,
        })
    }
}
