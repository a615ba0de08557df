//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; every hop logs its identifiers
//! - Gateway metrics are cheap (atomic increments behind the `metrics`
//!   facade) with an optional Prometheus scrape listener
//! - Per-service JSON `/metrics` snapshots are computed from component
//!   state, not from this module

pub mod metrics;
