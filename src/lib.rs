//! Chaos-instrumented storefront services library.
//!
//! Four independently deployable services share this crate:
//! - `catalog`: read-only product table
//! - `cart`: per-user carts plus the checkout orchestrator
//! - `payment`: payment simulator with a bound behavior profile
//! - `gateway`: public entry point with fault normalization
//!
//! The checkout chain is Gateway → Cart → Payment, each hop a blocking
//! call under its own timeout budget.

pub mod cart;
pub mod catalog;
pub mod chaos;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod payment;

pub use config::StorefrontConfig;
pub use error::ServiceError;
pub use lifecycle::Shutdown;
