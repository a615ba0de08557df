//! API gateway service.
//!
//! # Responsibilities
//! - Single public entry point mapping `/api/*` onto the downstreams
//! - Pass downstream status codes through untouched
//! - Normalize transport faults: timeout → 504, unreachable → 503,
//!   empty or undecodable body → 502
//! - Stamp checkout responses with gateway-observed elapsed time
//! - Aggregate downstream health without failing the aggregate call

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{TimeoutsConfig, UpstreamsConfig};
use crate::error::ServiceError;
use crate::observability::metrics;

/// Shared state for the gateway handlers.
pub struct GatewayState {
    http: reqwest::Client,
    upstreams: UpstreamsConfig,
    timeouts: TimeoutsConfig,
    version: String,
}

impl GatewayState {
    pub fn new(upstreams: UpstreamsConfig, timeouts: TimeoutsConfig, version: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstreams,
            timeouts,
            version: version.to_string(),
        }
    }

    /// Forward one hop and decode the JSON body, classifying transport
    /// faults under the downstream's display name.
    async fn fetch_json(
        &self,
        request: reqwest::RequestBuilder,
        downstream: &str,
        timeout: Duration,
    ) -> Result<(StatusCode, Value), ServiceError> {
        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::DownstreamTimeout(format!("{downstream} timeout"))
            } else {
                ServiceError::DownstreamUnavailable(format!("{downstream} error: {e}"))
            }
        })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let bytes = response.bytes().await.map_err(|e| {
            ServiceError::DownstreamUnavailable(format!("{downstream} error: {e}"))
        })?;
        if bytes.is_empty() {
            return Err(ServiceError::BadUpstreamBody(format!(
                "Empty response from {downstream}"
            )));
        }
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ServiceError::BadUpstreamBody(format!("Invalid JSON from {downstream}: {e}"))
        })?;
        Ok((status, body))
    }

    fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.catalog_secs)
    }

    fn cart_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.cart_secs)
    }
}

/// Build the gateway router.
///
/// The request timeout layer sits above the checkout budget so the
/// gateway itself never cuts a checkout short.
pub fn router(state: Arc<GatewayState>) -> Router {
    let request_timeout = Duration::from_secs(state.timeouts.checkout_secs + 5);
    Router::new()
        .route("/", get(index))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/cart/{user_id}", get(get_cart))
        .route("/api/cart/{user_id}/add", post(add_to_cart))
        .route("/api/checkout/{user_id}", post(run_checkout))
        .route("/health", get(health))
        .route("/metrics", get(aggregate_metrics))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "E-Commerce API Gateway",
        "version": &state.version,
        "endpoints": {
            "catalog": "/api/products",
            "cart": "/api/cart/{user_id}",
            "checkout": "/api/checkout/{user_id}",
            "health": "/health",
            "metrics": "/metrics",
        },
    }))
}

fn passthrough(
    route: &'static str,
    started: Instant,
    result: Result<(StatusCode, Value), ServiceError>,
) -> Response {
    match result {
        Ok((status, body)) => {
            metrics::record_gateway_request(route, status.as_u16(), started);
            (status, Json(body)).into_response()
        }
        Err(err) => {
            metrics::record_gateway_request(route, err.status().as_u16(), started);
            err.into_response()
        }
    }
}

async fn list_products(State(state): State<Arc<GatewayState>>) -> Response {
    let started = Instant::now();
    let url = format!("{}/products", state.upstreams.catalog_url);
    let result = state
        .fetch_json(state.http.get(&url), "Catalog service", state.catalog_timeout())
        .await;
    passthrough("products", started, result)
}

async fn get_product(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<u32>,
) -> Response {
    let started = Instant::now();
    let url = format!("{}/products/{id}", state.upstreams.catalog_url);
    let result = state
        .fetch_json(state.http.get(&url), "Catalog service", state.catalog_timeout())
        .await;
    passthrough("product_detail", started, result)
}

async fn get_cart(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
) -> Response {
    let started = Instant::now();
    let url = format!("{}/cart/{user_id}", state.upstreams.cart_url);
    let result = state
        .fetch_json(state.http.get(&url), "Cart service", state.cart_timeout())
        .await;
    passthrough("cart_view", started, result)
}

async fn add_to_cart(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let url = format!("{}/cart/{user_id}/add", state.upstreams.cart_url);
    let result = state
        .fetch_json(
            state.http.post(&url).json(&body),
            "Cart service",
            state.cart_timeout(),
        )
        .await;
    passthrough("cart_add", started, result)
}

/// Checkout forward. Success or failure, the response carries the total
/// gateway-observed elapsed time.
async fn run_checkout(
    State(state): State<Arc<GatewayState>>,
    Path(user_id): Path<String>,
) -> Response {
    let started = Instant::now();
    let url = format!("{}/cart/{user_id}/checkout", state.upstreams.cart_url);
    let timeout = Duration::from_secs(state.timeouts.checkout_secs);

    let result = state
        .fetch_json(state.http.post(&url), "Checkout", timeout)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    let (status, mut body) = match result {
        Ok((status, body)) => (status, body),
        Err(err) => {
            let message = match &err {
                ServiceError::DownstreamTimeout(_) => "Checkout timeout".to_string(),
                other => other.to_string(),
            };
            (err.status(), serde_json::json!({ "error": message }))
        }
    };

    if let Some(object) = body.as_object_mut() {
        object.insert(
            "gateway_processing_time".to_string(),
            serde_json::json!(elapsed),
        );
    }

    tracing::info!(
        user_id = %user_id,
        status = status.as_u16(),
        elapsed,
        "checkout forwarded"
    );
    metrics::record_gateway_request("checkout", status.as_u16(), started);
    (status, Json(body)).into_response()
}

async fn health(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": &state.version,
        "service": "api-gateway",
    }))
}

/// Probe one downstream's health endpoint. Failures report as a status
/// value rather than an error so the aggregate never fails.
async fn probe_health(state: &GatewayState, base_url: &str) -> Value {
    let url = format!("{base_url}/health");
    let timeout = Duration::from_secs(state.timeouts.health_probe_secs);
    match state.http.get(&url).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => response
            .json::<Value>()
            .await
            .unwrap_or_else(|_| serde_json::json!({ "status": "unhealthy" })),
        Ok(_) => serde_json::json!({ "status": "unhealthy" }),
        Err(_) => serde_json::json!({ "status": "unreachable" }),
    }
}

async fn aggregate_metrics(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let (catalog, cart, payment) = tokio::join!(
        probe_health(&state, &state.upstreams.catalog_url),
        probe_health(&state, &state.upstreams.cart_url),
        probe_health(&state, &state.upstreams.payment_url),
    );

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    Json(serde_json::json!({
        "gateway_version": &state.version,
        "services": {
            "catalog": catalog,
            "cart": cart,
            "payment": payment,
        },
        "timestamp": timestamp,
    }))
}
