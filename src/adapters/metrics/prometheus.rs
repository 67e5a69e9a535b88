//! Prometheus Metrics Registry - Integration Observability
//!
//! Registers and renders Prometheus metrics for the `/metrics`
//! endpoint. Covers supplier dispatch volume and failures, search
//! ladder behavior (steps served, live and degraded fallbacks), and
//! order submission outcomes.

use prometheus::{
  Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the supplier bridge.
///
/// All metrics follow the naming convention `supplier_bridge_*` and
/// carry a `supplier` label for per-integration filtering.
pub struct MetricsRegistry {
  /// Prometheus registry.
  registry: Registry,
  /// Dispatched supplier operations.
  pub supplier_requests: IntCounterVec,
  /// Failed supplier operations, by status class.
  pub supplier_errors: IntCounterVec,
  /// Search invocations by the step that served them.
  pub search_requests: IntCounterVec,
  /// Searches degraded to an empty fallback result.
  pub search_fallbacks: IntCounterVec,
  /// Search duration histogram (milliseconds).
  pub search_duration_ms: HistogramVec,
  /// Orders submitted, by outcome (confirmed / accepted_locally).
  pub orders_submitted: IntCounterVec,
}

impl MetricsRegistry {
  /// Create and register all Prometheus metrics.
  pub fn new() -> anyhow::Result<Self> {
    let registry = Registry::new();

    let supplier_requests = IntCounterVec::new(
      Opts::new(
        "supplier_bridge_requests_total",
        "Supplier operations dispatched",
      ),
      &["supplier", "action"],
    )?;

    let supplier_errors = IntCounterVec::new(
      Opts::new(
        "supplier_bridge_errors_total",
        "Supplier operations that failed",
      ),
      &["supplier", "action", "status"],
    )?;

    let search_requests = IntCounterVec::new(
      Opts::new(
        "supplier_bridge_search_requests_total",
        "Product searches by serving step",
      ),
      &["supplier", "step"],
    )?;

    let search_fallbacks = IntCounterVec::new(
      Opts::new(
        "supplier_bridge_search_fallbacks_total",
        "Searches that degraded to an empty fallback result",
      ),
      &["supplier"],
    )?;

    let search_duration_ms = HistogramVec::new(
      HistogramOpts::new(
        "supplier_bridge_search_duration_ms",
        "Search ladder duration in milliseconds",
      )
      .buckets(vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 15000.0]),
      &["supplier"],
    )?;

    let orders_submitted = IntCounterVec::new(
      Opts::new(
        "supplier_bridge_orders_submitted_total",
        "Orders submitted, by outcome",
      ),
      &["supplier", "outcome"],
    )?;

    registry.register(Box::new(supplier_requests.clone()))?;
    registry.register(Box::new(supplier_errors.clone()))?;
    registry.register(Box::new(search_requests.clone()))?;
    registry.register(Box::new(search_fallbacks.clone()))?;
    registry.register(Box::new(search_duration_ms.clone()))?;
    registry.register(Box::new(orders_submitted.clone()))?;

    Ok(Self {
      registry,
      supplier_requests,
      supplier_errors,
      search_requests,
      search_fallbacks,
      search_duration_ms,
      orders_submitted,
    })
  }

  /// Render the registry in the Prometheus text exposition format.
  pub fn render(&self) -> String {
    let encoder = TextEncoder::new();
    let metric_families = self.registry.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
      return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registry_registers_and_renders() {
    let metrics = MetricsRegistry::new().unwrap();
    metrics
      .supplier_requests
      .with_label_values(&["ABC", "getPricing"])
      .inc();
    let text = metrics.render();
    assert!(text.contains("supplier_bridge_requests_total"));
  }
}
