//! Supplier Gateway - The Dispatch Entry Point
//!
//! One front door for supplier operations: parse the routing triple
//! (supplier, environment, action), dispatch to the right adapter,
//! and map every failure to a response status. Parse failures are
//! rejected before any adapter is touched; typed errors carry their
//! own status and are never re-derived from message text.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::order::lines_from_payload;
use crate::domain::{Action, Environment, Order, SupplierError, SupplierKey};

use super::pricing::PricingService;
use super::AdapterMap;

/// An unparsed dispatch call, straight off the wire.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
  pub supplier_key: String,
  pub environment: Option<String>,
  pub action: String,
  pub payload: Value,
}

/// A status plus response body; the REST layer serializes it as-is.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
  pub status: u16,
  pub body: Value,
}

impl GatewayResponse {
  fn ok(body: Value) -> Self {
    Self { status: 200, body }
  }

  fn error(status: u16, message: &str) -> Self {
    Self {
      status,
      body: json!({"success": false, "error": message}),
    }
  }
}

pub struct SupplierGateway {
  adapters: AdapterMap,
  pricing: PricingService,
  default_environment: Environment,
  metrics: Arc<MetricsRegistry>,
}

impl SupplierGateway {
  pub fn new(
    adapters: AdapterMap,
    default_environment: Environment,
    metrics: Arc<MetricsRegistry>,
  ) -> Self {
    let pricing = PricingService::new(adapters.clone());
    Self {
      adapters,
      pricing,
      default_environment,
      metrics,
    }
  }

  /// Route one dispatch call. Always returns a response; failures
  /// are statuses, never panics or hung calls.
  #[instrument(skip(self, request), fields(supplier = %request.supplier_key, action = %request.action))]
  pub async fn dispatch(&self, request: DispatchRequest) -> GatewayResponse {
    let (supplier, environment, action) = match self.parse_route(&request) {
      Ok(route) => route,
      Err(err) => return self.failure(&request.supplier_key, &request.action, err),
    };

    self
      .metrics
      .supplier_requests
      .with_label_values(&[supplier.as_str(), action.as_str()])
      .inc();

    let result = match action {
      Action::Login => self.login(supplier, environment).await,
      Action::GetPricing => self.get_pricing(supplier, environment, &request.payload).await,
      Action::Order => self.order(supplier, environment, &request.payload).await,
    };

    match result {
      Ok(body) => GatewayResponse::ok(body),
      Err(err) => self.failure(supplier.as_str(), action.as_str(), err),
    }
  }

  /// Parse the routing triple; no adapter is touched on failure.
  fn parse_route(
    &self,
    request: &DispatchRequest,
  ) -> Result<(SupplierKey, Option<Environment>, Action), SupplierError> {
    let supplier: SupplierKey = request.supplier_key.parse()?;
    let environment = match &request.environment {
      Some(raw) => Some(raw.parse::<Environment>()?),
      None => None,
    };
    let action: Action = request.action.parse()?;
    Ok((supplier, environment, action))
  }

  async fn login(
    &self,
    supplier: SupplierKey,
    environment: Option<Environment>,
  ) -> Result<Value, SupplierError> {
    let adapter = self.adapter(supplier)?;
    let session = adapter.authenticate(environment).await?;
    let effective = environment.unwrap_or(self.default_environment);
    info!(supplier = supplier.as_str(), environment = effective.as_str(), "supplier login ok");
    Ok(session.to_body(effective))
  }

  async fn get_pricing(
    &self,
    supplier: SupplierKey,
    environment: Option<Environment>,
    payload: &Value,
  ) -> Result<Value, SupplierError> {
    let lines = lines_from_payload(payload)?;
    let priced = self.pricing.price(supplier, environment, &lines).await?;

    // A supplier that answers 200 but embeds a line-level error is
    // reporting a bad request, not a partial price.
    if let Some(message) = embedded_error(&priced.records) {
      return Err(SupplierError::InvalidRequest(message));
    }

    Ok(json!({
      "success": true,
      "data": priced.raw,
      "lines": priced.lines,
      "total": priced.total,
      "environment": priced.environment.map(|e| e.as_str()),
    }))
  }

  async fn order(
    &self,
    supplier: SupplierKey,
    environment: Option<Environment>,
    payload: &Value,
  ) -> Result<Value, SupplierError> {
    let adapter = self.adapter(supplier)?;
    let order = Order::from_payload(supplier, payload)?;
    let outcome = adapter.submit_order(environment, &order).await?;

    Ok(json!({
      "success": true,
      "confirmationNumber": outcome.confirmation(),
      "acceptedLocally": outcome.is_stub(),
      "environment": match &outcome {
        crate::ports::supplier::OrderOutcome::Confirmed { environment, .. } => environment.as_str(),
        crate::ports::supplier::OrderOutcome::AcceptedLocally { environment, .. } => environment.as_str(),
      },
    }))
  }

  fn adapter(
    &self,
    supplier: SupplierKey,
  ) -> Result<&Arc<dyn crate::ports::supplier::SupplierAdapter>, SupplierError> {
    self.adapters.get(&supplier).ok_or_else(|| {
      SupplierError::Config(format!("no adapter wired for {}", supplier.as_str()))
    })
  }

  fn failure(&self, supplier: &str, action: &str, err: SupplierError) -> GatewayResponse {
    let status = err.status_code();
    warn!(supplier, action, status, error = %err, "dispatch failed");
    self
      .metrics
      .supplier_errors
      .with_label_values(&[supplier, action, &status.to_string()])
      .inc();
    GatewayResponse::error(status, &err.to_string())
  }
}

/// First supplier-reported record error in a pricing response, if
/// any. Reconciliation's own annotations ("SKU not found") are not
/// supplier errors and do not reclassify the dispatch.
fn embedded_error(records: &[crate::domain::PricedRecord]) -> Option<String> {
  records.iter().find_map(|record| record.error.clone())
}
