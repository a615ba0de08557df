//! Payment simulator service.
//!
//! # Data Flow
//! ```text
//! POST /process
//!     → simulator.rs (validate, delay, roll the profile, mint order id)
//!     → ledger.rs (append on success only)
//!
//! GET /payments/{order_id}
//!     → ledger.rs (pure read)
//!
//! POST /simulate-failure
//!     → chaos drills: hang, error out, or kill the process
//! ```
//!
//! # Design Decisions
//! - One BehaviorProfile per instance, bound at construction
//! - Declines leave no ledger trace
//! - The crash drill is irrecoverable on purpose; callers must observe
//!   a connection failure, not a decoded error body

pub mod ledger;
pub mod profile;
pub mod simulator;

pub use ledger::{LedgerSummary, PaymentLedger, PaymentRecord};
pub use profile::BehaviorProfile;
pub use simulator::{DeclineKind, PaymentOutcome, PaymentSimulator, ProcessRequest};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ServiceError;

/// Shared state for the payment service handlers.
pub struct PaymentState {
    pub simulator: PaymentSimulator,
    pub ledger: Arc<PaymentLedger>,
    /// Sleep applied by the `timeout` drill.
    pub drill_timeout: Duration,
}

impl PaymentState {
    pub fn new(
        profile: BehaviorProfile,
        dice: Arc<dyn crate::chaos::FaultDice>,
        drill_timeout: Duration,
    ) -> Self {
        let ledger = Arc::new(PaymentLedger::new());
        Self {
            simulator: PaymentSimulator::new(profile, dice, ledger.clone()),
            ledger,
            drill_timeout,
        }
    }

    fn version(&self) -> &str {
        &self.simulator.profile().version
    }
}

/// Build the payment service router.
pub fn router(state: Arc<PaymentState>) -> Router {
    Router::new()
        .route("/process", post(process_payment))
        .route("/payments/{order_id}", get(get_payment))
        .route("/simulate-failure", post(simulate_failure))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn process_payment(
    State(state): State<Arc<PaymentState>>,
    Json(request): Json<ProcessRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.simulator.process(&request).await?;
    let version = state.version();

    let response = match outcome {
        PaymentOutcome::Approved(record) => {
            let body = serde_json::json!({
                "order_id": record.order_id,
                "status": "success",
                "amount": record.amount,
                "version": version,
                "processing_time": record.processing_time,
                "message": format!("Payment processed successfully by {version}"),
            });
            (StatusCode::OK, Json(body))
        }
        PaymentOutcome::Declined {
            kind,
            processing_time,
        } => {
            let body = serde_json::json!({
                "error": kind.message(),
                "version": version,
                "processing_time": processing_time,
            });
            (kind.http_code(), Json(body))
        }
    };
    Ok(response)
}

async fn get_payment(
    State(state): State<Arc<PaymentState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentRecord>, ServiceError> {
    state
        .ledger
        .get(&order_id)
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Payment not found".to_string()))
}

#[derive(Debug, Deserialize)]
struct SimulateFailureRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Chaos drill endpoint. `timeout` hangs past any client budget,
/// `error` answers 500 immediately, `crash` kills the process with no
/// response at all.
async fn simulate_failure(
    State(state): State<Arc<PaymentState>>,
    Json(request): Json<SimulateFailureRequest>,
) -> impl IntoResponse {
    match request.kind.as_deref() {
        Some("timeout") => {
            tracing::warn!(
                sleep_secs = state.drill_timeout.as_secs(),
                "timeout drill engaged"
            );
            tokio::time::sleep(state.drill_timeout).await;
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(serde_json::json!({ "error": "Simulated timeout" })),
            )
                .into_response()
        }
        Some("error") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Simulated error" })),
        )
            .into_response(),
        Some("crash") => {
            tracing::error!("crash drill engaged, terminating process");
            std::process::exit(1);
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Unknown failure type" })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<Arc<PaymentState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": state.version(),
    }))
}

async fn metrics(State(state): State<Arc<PaymentState>>) -> impl IntoResponse {
    let summary = state.ledger.summary();
    Json(serde_json::json!({
        "version": state.version(),
        "total_payments": summary.total_payments,
        "total_amount": summary.total_amount,
        "average_processing_time": summary.average_processing_time,
        "failure_rate": state.simulator.profile().failure_rate,
    }))
}
