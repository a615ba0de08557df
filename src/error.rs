//! Service error taxonomy with HTTP response mapping.
//!
//! # Responsibilities
//! - One error vocabulary shared by every service in the stack
//! - Map each kind to its wire status code
//! - Render machine-readable `{"error": ...}` JSON bodies
//!
//! # Design Decisions
//! - No component retries internally; errors translate one level up
//! - Timeouts (504) stay distinct from transport failures (503)
//! - Chaos-injected faults are indistinguishable from real ones

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by any of the storefront services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required request fields are missing or malformed. Never retried.
    #[error("{0}")]
    Validation(String),

    /// Product, payment, or cart does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A downstream hop exceeded its timeout budget.
    #[error("{0}")]
    DownstreamTimeout(String),

    /// A downstream hop could not be reached at all.
    #[error("{0}")]
    DownstreamUnavailable(String),

    /// Downstream answered with an empty or undecodable body.
    #[error("{0}")]
    BadUpstreamBody(String),

    /// Intentional fault from a chaos gate. Callers cannot tell it apart
    /// from a real outage.
    #[error("Checkout temporarily unavailable")]
    ChaosInjected,
}

impl ServiceError {
    /// The HTTP status this error maps to on the wire.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::DownstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::DownstreamUnavailable(_) | ServiceError::ChaosInjected => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServiceError::BadUpstreamBody(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
