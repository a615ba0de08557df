//! Storefront stack entry point.
//!
//! Boots the catalog, cart, payment, and gateway services: all four in
//! one process by default, or a single one selected with `--service`
//! for independent deployment.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::cart::{CartState, InMemoryCartStore};
use storefront::catalog::CatalogState;
use storefront::chaos::{FaultDice, ThreadRngDice};
use storefront::clients::{HttpCatalogClient, HttpPaymentClient};
use storefront::config::{load_config, StorefrontConfig};
use storefront::gateway::GatewayState;
use storefront::lifecycle::{self, Shutdown};
use storefront::payment::{BehaviorProfile, PaymentState};
use storefront::{cart, catalog, gateway, observability, payment};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Chaos-instrumented storefront stack")]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which service to run.
    #[arg(long, value_enum, default_value_t = Service::All)]
    service: Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Service {
    All,
    Gateway,
    Catalog,
    Cart,
    Payment,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => StorefrontConfig::default(),
    };

    tracing::info!(
        gateway = %config.listeners.gateway,
        payment_profile = %config.payment.profile,
        checkout_failure_rate = config.chaos.checkout_failure_rate,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let dice: Arc<dyn FaultDice> = Arc::new(ThreadRngDice);
    let runs = |kind| args.service == Service::All || args.service == kind;
    let mut tasks = tokio::task::JoinSet::new();

    if runs(Service::Catalog) {
        let state = Arc::new(CatalogState::new(
            &config.version,
            dice.clone(),
            &config.chaos,
        ));
        let addr: SocketAddr = config.listeners.catalog.parse()?;
        tasks.spawn(lifecycle::serve(
            "catalog",
            addr,
            catalog::router(state),
            shutdown.subscribe(),
        ));
    }

    if runs(Service::Payment) {
        let profile = BehaviorProfile::from_config(&config.payment)
            .ok_or_else(|| format!("unknown payment profile '{}'", config.payment.profile))?;
        let state = Arc::new(PaymentState::new(
            profile,
            dice.clone(),
            Duration::from_secs(config.chaos.drill_timeout_secs),
        ));
        let addr: SocketAddr = config.listeners.payment.parse()?;
        tasks.spawn(lifecycle::serve(
            "payment",
            addr,
            payment::router(state),
            shutdown.subscribe(),
        ));
    }

    if runs(Service::Cart) {
        let catalog_client = Arc::new(HttpCatalogClient::new(
            &config.upstreams.catalog_url,
            Duration::from_secs(config.timeouts.catalog_secs),
        ));
        let payment_client = Arc::new(HttpPaymentClient::new(
            &config.upstreams.payment_url,
            Duration::from_secs(config.timeouts.payment_secs),
        ));
        let state = Arc::new(CartState::new(
            Arc::new(InMemoryCartStore::new()),
            catalog_client,
            payment_client,
            dice.clone(),
            &config.chaos,
            Duration::from_secs(config.timeouts.payment_secs),
            &config.version,
        ));
        let addr: SocketAddr = config.listeners.cart.parse()?;
        tasks.spawn(lifecycle::serve(
            "cart",
            addr,
            cart::router(state),
            shutdown.subscribe(),
        ));
    }

    if runs(Service::Gateway) {
        let state = Arc::new(GatewayState::new(
            config.upstreams.clone(),
            config.timeouts,
            &config.version,
        ));
        let addr: SocketAddr = config.listeners.gateway.parse()?;
        tasks.spawn(lifecycle::serve(
            "gateway",
            addr,
            gateway::router(state),
            shutdown.subscribe(),
        ));
    }

    tokio::spawn(async move {
        lifecycle::shutdown_signal().await;
        shutdown.trigger();
    });

    while let Some(joined) = tasks.join_next().await {
        joined??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
