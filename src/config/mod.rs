//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StorefrontConfig (validated, immutable)
//!     → handed to each service at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; chaos knobs and the payment
//!   profile bind at service construction, never per request
//! - All fields have defaults so the stack boots with no config file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ChaosConfig, ListenersConfig, ObservabilityConfig, PaymentProfileConfig, StorefrontConfig,
    TimeoutsConfig, UpstreamsConfig,
};
