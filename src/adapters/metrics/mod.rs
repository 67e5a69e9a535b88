//! Metrics Adapters - Prometheus Registry and Health State

pub mod health;
pub mod prometheus;

pub use health::HealthState;
pub use prometheus::MetricsRegistry;
