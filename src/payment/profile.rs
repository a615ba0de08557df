//! Behavioral profiles for the payment simulator.
//!
//! A profile is one deployable variant of the simulator: a failure rate
//! plus a latency range, bound once at construction. The `v1`/`v2`
//! split models an original and an optimized rollout of the same
//! service side by side.

use std::time::Duration;

use crate::config::PaymentProfileConfig;

/// Failure-rate and latency bundle selected at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorProfile {
    /// Label reported in every payment response.
    pub version: String,

    /// Probability in `[0, 1]` that a processed payment is declined.
    pub failure_rate: f64,

    /// Lower bound of the simulated processing delay.
    pub latency_min: Duration,

    /// Upper bound of the simulated processing delay.
    pub latency_max: Duration,
}

impl BehaviorProfile {
    /// The original rollout: slow and flaky.
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            failure_rate: 0.15,
            latency_min: Duration::from_millis(500),
            latency_max: Duration::from_millis(3000),
        }
    }

    /// The optimized rollout: fast and mostly reliable.
    pub fn v2() -> Self {
        Self {
            version: "v2".to_string(),
            failure_rate: 0.02,
            latency_min: Duration::from_millis(100),
            latency_max: Duration::from_millis(500),
        }
    }

    /// Look up a preset by label.
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "v1" => Some(Self::v1()),
            "v2" => Some(Self::v2()),
            _ => None,
        }
    }

    /// Resolve the configured preset and apply any overrides on top.
    /// Returns `None` when the preset label is unknown.
    pub fn from_config(config: &PaymentProfileConfig) -> Option<Self> {
        let mut profile = Self::named(&config.profile)?;
        if let Some(rate) = config.failure_rate {
            profile.failure_rate = rate;
        }
        if let Some(min_ms) = config.latency_min_ms {
            profile.latency_min = Duration::from_millis(min_ms);
        }
        if let Some(max_ms) = config.latency_max_ms {
            profile.latency_max = Duration::from_millis(max_ms);
        }
        Some(profile)
    }

    /// A profile with no delay and a pinned failure rate. Test builds
    /// lean on this to keep suites fast and deterministic.
    pub fn instant(version: &str, failure_rate: f64) -> Self {
        Self {
            version: version.to_string(),
            failure_rate,
            latency_min: Duration::ZERO,
            latency_max: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_their_documented_shape() {
        let v1 = BehaviorProfile::v1();
        assert!((v1.failure_rate - 0.15).abs() < f64::EPSILON);
        assert_eq!(v1.latency_max, Duration::from_secs(3));

        let v2 = BehaviorProfile::v2();
        assert!((v2.failure_rate - 0.02).abs() < f64::EPSILON);
        assert!(v2.latency_max < v1.latency_min * 2);
    }

    #[test]
    fn config_overrides_apply_on_top_of_the_preset() {
        let config = PaymentProfileConfig {
            profile: "v2".to_string(),
            failure_rate: Some(0.5),
            latency_min_ms: None,
            latency_max_ms: Some(50),
        };
        let profile = BehaviorProfile::from_config(&config).unwrap();
        assert_eq!(profile.version, "v2");
        assert!((profile.failure_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(profile.latency_min, Duration::from_millis(100));
        assert_eq!(profile.latency_max, Duration::from_millis(50));
    }

    #[test]
    fn unknown_label_resolves_to_none() {
        assert!(BehaviorProfile::named("v9").is_none());
    }
}
