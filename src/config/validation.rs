//! Semantic configuration checks.
//!
//! Serde handles the syntactic layer; everything here validates values
//! that parse fine but would misbehave at runtime.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::StorefrontConfig;
use crate::payment::BehaviorProfile;

/// A single semantic problem found in a config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    #[error("payment latency_min ({min_ms}ms) exceeds latency_max ({max_ms}ms)")]
    LatencyInverted { min_ms: u128, max_ms: u128 },

    #[error("unknown payment profile '{0}' (expected v1 or v2)")]
    UnknownProfile(String),

    #[error("{field} is not a valid socket address: {value}")]
    BadListener { field: &'static str, value: String },

    #[error("{field} is not a valid URL: {value}")]
    BadUpstream { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed config, collecting every problem rather than
/// stopping at the first.
pub fn validate_config(config: &StorefrontConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_rate(
        "chaos.checkout_failure_rate",
        config.chaos.checkout_failure_rate,
        &mut errors,
    );
    check_rate(
        "chaos.catalog_slow_rate",
        config.chaos.catalog_slow_rate,
        &mut errors,
    );

    match BehaviorProfile::from_config(&config.payment) {
        Some(profile) => {
            check_rate("payment.failure_rate", profile.failure_rate, &mut errors);
            if profile.latency_min > profile.latency_max {
                errors.push(ValidationError::LatencyInverted {
                    min_ms: profile.latency_min.as_millis(),
                    max_ms: profile.latency_max.as_millis(),
                });
            }
        }
        None => errors.push(ValidationError::UnknownProfile(
            config.payment.profile.clone(),
        )),
    }

    for (field, value) in [
        ("listeners.gateway", &config.listeners.gateway),
        ("listeners.catalog", &config.listeners.catalog),
        ("listeners.cart", &config.listeners.cart),
        ("listeners.payment", &config.listeners.payment),
    ] {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BadListener {
                field,
                value: value.clone(),
            });
        }
    }

    for (field, value) in [
        ("upstreams.catalog_url", &config.upstreams.catalog_url),
        ("upstreams.cart_url", &config.upstreams.cart_url),
        ("upstreams.payment_url", &config.upstreams.payment_url),
    ] {
        if Url::parse(value).is_err() {
            errors.push(ValidationError::BadUpstream {
                field,
                value: value.clone(),
            });
        }
    }

    for (field, value) in [
        ("timeouts.catalog_secs", config.timeouts.catalog_secs),
        ("timeouts.cart_secs", config.timeouts.cart_secs),
        ("timeouts.payment_secs", config.timeouts.payment_secs),
        ("timeouts.checkout_secs", config.timeouts.checkout_secs),
        ("timeouts.health_probe_secs", config.timeouts.health_probe_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rate(field: &'static str, value: f64, errors: &mut Vec<ValidationError>) {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        errors.push(ValidationError::RateOutOfRange { field, value });
    }
}
