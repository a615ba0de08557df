//! Shared harness for integration tests.
//!
//! Builds the four services on ephemeral loopback ports with injected
//! dice, so every suite controls the fault model deterministically.

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use storefront::cart::{CartState, InMemoryCartStore};
use storefront::catalog::CatalogState;
use storefront::chaos::{FaultDice, RiggedDice};
use storefront::clients::{HttpCatalogClient, HttpPaymentClient};
use storefront::config::{ChaosConfig, TimeoutsConfig, UpstreamsConfig};
use storefront::gateway::GatewayState;
use storefront::payment::{BehaviorProfile, PaymentState};
use storefront::{cart, catalog, gateway, payment};

/// Bind a router on an ephemeral port and serve it in the background.
pub async fn spawn_app(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on; connections are refused immediately.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Knobs for one spawned stack.
pub struct StackOptions {
    /// Dice handed to the cart service (checkout chaos gate).
    pub cart_dice: Arc<dyn FaultDice>,
    /// Dice handed to the payment simulator.
    pub payment_dice: Arc<dyn FaultDice>,
    pub payment_profile: BehaviorProfile,
    pub checkout_failure_rate: f64,
    /// The cart service's payment hop budget.
    pub payment_timeout: Duration,
    pub payment_up: bool,
    pub catalog_up: bool,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            cart_dice: Arc::new(RiggedDice::always_succeed()),
            payment_dice: Arc::new(RiggedDice::always_succeed()),
            payment_profile: BehaviorProfile::instant("v1", 0.0),
            checkout_failure_rate: 0.0,
            payment_timeout: Duration::from_secs(2),
            payment_up: true,
            catalog_up: true,
        }
    }
}

/// URLs of one running stack.
pub struct Stack {
    pub gateway_url: String,
    pub catalog_url: String,
    pub cart_url: String,
    pub payment_url: String,
}

/// Spawn catalog, payment, cart, and gateway wired together.
pub async fn spawn_stack(options: StackOptions) -> Stack {
    let chaos = ChaosConfig {
        checkout_failure_rate: options.checkout_failure_rate,
        catalog_slow_rate: 0.0,
        ..ChaosConfig::default()
    };

    let catalog_addr = if options.catalog_up {
        let state = Arc::new(CatalogState::new(
            "v1",
            Arc::new(RiggedDice::always_succeed()),
            &chaos,
        ));
        spawn_app(catalog::router(state)).await
    } else {
        unreachable_addr().await
    };

    let payment_addr = if options.payment_up {
        let state = Arc::new(PaymentState::new(
            options.payment_profile.clone(),
            options.payment_dice.clone(),
            Duration::from_secs(5),
        ));
        spawn_app(payment::router(state)).await
    } else {
        unreachable_addr().await
    };

    let catalog_url = format!("http://{catalog_addr}");
    let payment_url = format!("http://{payment_addr}");

    let cart_state = Arc::new(CartState::new(
        Arc::new(InMemoryCartStore::new()),
        Arc::new(HttpCatalogClient::new(&catalog_url, Duration::from_secs(2))),
        Arc::new(HttpPaymentClient::new(&payment_url, options.payment_timeout)),
        options.cart_dice.clone(),
        &chaos,
        options.payment_timeout,
        "v1",
    ));
    let cart_addr = spawn_app(cart::router(cart_state)).await;
    let cart_url = format!("http://{cart_addr}");

    let upstreams = UpstreamsConfig {
        catalog_url: catalog_url.clone(),
        cart_url: cart_url.clone(),
        payment_url: payment_url.clone(),
    };
    let gateway_state = Arc::new(GatewayState::new(upstreams, TimeoutsConfig::default(), "v1"));
    let gateway_addr = spawn_app(gateway::router(gateway_state)).await;

    Stack {
        gateway_url: format!("http://{gateway_addr}"),
        catalog_url,
        cart_url,
        payment_url,
    }
}

/// Per-test client without pooling surprises.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
