//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config
//! files. Every section has defaults so a minimal config (or none at
//! all) boots the full stack on loopback ports.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Bind addresses for each service.
    pub listeners: ListenersConfig,

    /// Base URLs each service uses to reach its downstreams.
    pub upstreams: UpstreamsConfig,

    /// Per-hop timeout budgets.
    pub timeouts: TimeoutsConfig,

    /// Chaos gates outside the payment simulator's own fault model.
    pub chaos: ChaosConfig,

    /// Payment simulator behavior profile.
    pub payment: PaymentProfileConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Version label reported by the catalog, cart, and gateway
    /// services. The payment service reports its profile label instead.
    pub version: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            listeners: ListenersConfig::default(),
            upstreams: UpstreamsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            chaos: ChaosConfig::default(),
            payment: PaymentProfileConfig::default(),
            observability: ObservabilityConfig::default(),
            version: "v1".to_string(),
        }
    }
}

/// Bind addresses for the four services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenersConfig {
    pub gateway: String,
    pub catalog: String,
    pub cart: String,
    pub payment: String,
}

impl Default for ListenersConfig {
    fn default() -> Self {
        Self {
            gateway: "127.0.0.1:5000".to_string(),
            catalog: "127.0.0.1:5001".to_string(),
            cart: "127.0.0.1:5002".to_string(),
            payment: "127.0.0.1:5003".to_string(),
        }
    }
}

/// Downstream base URLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    pub catalog_url: String,
    pub cart_url: String,
    pub payment_url: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            catalog_url: "http://127.0.0.1:5001".to_string(),
            cart_url: "http://127.0.0.1:5002".to_string(),
            payment_url: "http://127.0.0.1:5003".to_string(),
        }
    }
}

/// Per-hop timeouts in seconds.
///
/// Timeouts never compose automatically. The cart service bounds its
/// payment hop on its own; the gateway's checkout budget is materially
/// larger because it absorbs the full cart-to-payment round trip.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Catalog lookup hop (cart and gateway).
    pub catalog_secs: u64,

    /// Gateway's cart read/add forwards.
    pub cart_secs: u64,

    /// Cart service's payment hop.
    pub payment_secs: u64,

    /// Gateway's end-to-end checkout forward.
    pub checkout_secs: u64,

    /// Gateway's per-service health probes.
    pub health_probe_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            catalog_secs: 5,
            cart_secs: 5,
            payment_secs: 10,
            checkout_secs: 30,
            health_probe_secs: 2,
        }
    }
}

/// Chaos gates independent of the payment profile.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Probability that a checkout short-circuits with 503 before the
    /// payment hop. Deliberately separate from the payment simulator's
    /// failure rate.
    pub checkout_failure_rate: f64,

    /// Probability that a catalog listing answers slowly.
    pub catalog_slow_rate: f64,

    /// Added catalog latency when the slow gate fires, in milliseconds.
    pub catalog_slow_ms: u64,

    /// Sleep applied by the `timeout` chaos drill, in seconds. Must sit
    /// far beyond any realistic client budget.
    pub drill_timeout_secs: u64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            checkout_failure_rate: 0.05,
            catalog_slow_rate: 0.1,
            catalog_slow_ms: 2000,
            drill_timeout_secs: 30,
        }
    }
}

/// Payment simulator profile selection.
///
/// `profile` names a preset (`v1` or `v2`); the optional fields override
/// individual knobs on top of it. The profile binds once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentProfileConfig {
    pub profile: String,
    pub failure_rate: Option<f64>,
    pub latency_min_ms: Option<u64>,
    pub latency_max_ms: Option<u64>,
}

impl Default for PaymentProfileConfig {
    fn default() -> Self {
        Self {
            profile: "v1".to_string(),
            failure_rate: None,
            latency_min_ms: None,
            latency_max_ms: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_documented_constants() {
        let cfg = StorefrontConfig::default();
        assert_eq!(cfg.timeouts.payment_secs, 10);
        assert_eq!(cfg.timeouts.checkout_secs, 30);
        assert_eq!(cfg.timeouts.health_probe_secs, 2);
        assert!((cfg.chaos.checkout_failure_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.payment.profile, "v1");
        assert_eq!(cfg.version, "v1");
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let cfg: StorefrontConfig = toml::from_str(
            r#"
            [payment]
            profile = "v2"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.payment.profile, "v2");
        assert_eq!(cfg.listeners.gateway, "127.0.0.1:5000");
        assert_eq!(cfg.timeouts.catalog_secs, 5);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg = StorefrontConfig::default();
        let rendered = toml::to_string(&cfg).unwrap();
        let parsed: StorefrontConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.upstreams.payment_url, cfg.upstreams.payment_url);
        assert_eq!(parsed.chaos.drill_timeout_secs, cfg.chaos.drill_timeout_secs);
    }
}
