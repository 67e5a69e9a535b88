//! Pricing Service - Adapter Call plus Reconciliation
//!
//! Orchestrates one supplier pricing round trip: call the adapter,
//! reconcile the normalized records onto the requested lines, total
//! the order. The lenient variant never fails; a transport or auth
//! failure becomes per-line errors so a cart can always render.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::domain::{fail_all, reconcile, Environment, LineItem, PricedRecord, SupplierError, SupplierKey};
use crate::ports::supplier::SupplierAdapter;

use super::AdapterMap;

/// Lines annotated by one pricing round trip.
#[derive(Debug, Clone)]
pub struct PricedOrder {
  pub lines: Vec<LineItem>,
  pub total: Decimal,
  /// Raw supplier payload, for callers that pass it through.
  pub raw: serde_json::Value,
  /// Canonical records the reconciliation was driven by.
  pub records: Vec<PricedRecord>,
  pub environment: Option<Environment>,
}

pub struct PricingService {
  adapters: AdapterMap,
}

impl PricingService {
  pub fn new(adapters: AdapterMap) -> Self {
    Self { adapters }
  }

  fn adapter(&self, supplier: SupplierKey) -> Result<&Arc<dyn SupplierAdapter>, SupplierError> {
    self.adapters.get(&supplier).ok_or_else(|| {
      SupplierError::Config(format!("no adapter wired for {}", supplier.as_str()))
    })
  }

  /// Price and reconcile, propagating supplier failures to the
  /// caller (the gateway maps them to statuses).
  #[instrument(skip(self, lines), fields(supplier = supplier.as_str(), lines = lines.len()))]
  pub async fn price(
    &self,
    supplier: SupplierKey,
    env: Option<Environment>,
    lines: &[LineItem],
  ) -> Result<PricedOrder, SupplierError> {
    let adapter = self.adapter(supplier)?;
    let outcome = adapter.get_pricing(env, lines).await?;
    let reconciled = reconcile(lines, &outcome.records);
    let total = total_of(&reconciled);

    Ok(PricedOrder {
      lines: reconciled,
      total,
      raw: outcome.raw,
      records: outcome.records,
      environment: Some(outcome.environment),
    })
  }

  /// Price and reconcile, absorbing total failure into per-line
  /// errors. Always returns a value; partial pricing is normal and
  /// a dead supplier just means every line carries the cause.
  #[instrument(skip(self, lines), fields(supplier = supplier.as_str(), lines = lines.len()))]
  pub async fn price_lenient(
    &self,
    supplier: SupplierKey,
    env: Option<Environment>,
    lines: &[LineItem],
  ) -> PricedOrder {
    match self.price(supplier, env, lines).await {
      Ok(priced) => priced,
      Err(err) => {
        warn!(error = %err, "pricing failed; marking all lines");
        let failed = fail_all(lines, &err.to_string());
        PricedOrder {
          lines: failed,
          total: Decimal::ZERO,
          raw: serde_json::Value::Null,
          records: Vec::new(),
          environment: None,
        }
      }
    }
  }
}

fn total_of(lines: &[LineItem]) -> Decimal {
  lines.iter().filter_map(|line| line.line_price).sum()
}
