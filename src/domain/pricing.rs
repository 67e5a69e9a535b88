//! Pricing Reconciliation Engine - Matching Supplier Prices onto Lines
//!
//! Pure matching logic: given the requested line items and the
//! canonical records an adapter normalized out of a supplier
//! response, annotate every line with a price or an explicit
//! unpriced reason. Partial pricing is a normal outcome; this module
//! never fails an operation for individual unmatched lines.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::line_item::{normalize_sku, LineItem, PricingState, Uom};

/// One supplier-priced line in canonical form.
///
/// Adapters translate their own wire shapes (ABC `lines`, SRS
/// `productList`, BEACON `priceInfo` UOM maps) into these records so
/// nothing downstream ever probes a raw response. One requested SKU
/// may map to several records, one per UOM option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedRecord {
  /// Primary SKU the supplier keyed this record by.
  pub sku: String,
  /// Secondary key some suppliers also report (e.g. SRS productId).
  pub alt_sku: Option<String>,
  /// Unit the supplier priced at, when reported.
  pub uom: Option<Uom>,
  /// First positive price found among the supplier's price fields.
  pub unit_price: Option<Decimal>,
  /// Quantity the supplier actually priced for, when reported.
  pub quantity: Option<Decimal>,
  /// Supplier-reported line-level error message, if any.
  pub error: Option<String>,
  /// Units the supplier says this SKU is available in.
  pub available_uoms: Vec<Uom>,
}

impl PricedRecord {
  /// A record with just a SKU; builder-style setters fill the rest.
  pub fn new(sku: impl Into<String>) -> Self {
    Self {
      sku: sku.into(),
      alt_sku: None,
      uom: None,
      unit_price: None,
      quantity: None,
      error: None,
      available_uoms: Vec::new(),
    }
  }

  fn has_positive_price(&self) -> bool {
    self.unit_price.is_some_and(|p| p > Decimal::ZERO)
  }
}

/// Reconcile supplier records back onto the requested lines.
///
/// Each returned line is the requested line annotated with either a
/// price (`Priced`, with `line_price = quantity * unit_price` exact)
/// or an explicit reason (`Error`). The requested UOM is advisory:
/// when the supplier priced a different unit, that unit is adopted as
/// authoritative and the override is logged for audit.
pub fn reconcile(lines: &[LineItem], records: &[PricedRecord]) -> Vec<LineItem> {
  let index = build_index(records);
  let mut matched = 0usize;

  let out: Vec<LineItem> = lines
    .iter()
    .map(|line| {
      let key = line.normalized_sku();
      match index.get(key.as_str()) {
        Some(candidates) => {
          matched += 1;
          reconcile_one(line, candidates)
        }
        None => unpriced(line, "SKU not found"),
      }
    })
    .collect();

  let unmatched = lines.len() - matched;
  if unmatched > 0 {
    warn!(requested = lines.len(), unmatched, "some requested SKUs were not in the supplier response");
  }
  out
}

/// Mark every requested line failed with the same cause.
///
/// Used when the supplier could not be reached at all (auth or
/// transport failure) — the one case that fails the whole operation.
pub fn fail_all(lines: &[LineItem], cause: &str) -> Vec<LineItem> {
  lines.iter().map(|line| unpriced(line, cause)).collect()
}

fn build_index<'a>(records: &'a [PricedRecord]) -> HashMap<String, Vec<&'a PricedRecord>> {
  let mut index: HashMap<String, Vec<&PricedRecord>> = HashMap::new();
  for record in records {
    let primary = normalize_sku(&record.sku);
    if !primary.is_empty() {
      index.entry(primary.clone()).or_default().push(record);
    }
    if let Some(alt) = &record.alt_sku {
      let alt = normalize_sku(alt);
      if !alt.is_empty() && alt != primary {
        index.entry(alt).or_default().push(record);
      }
    }
  }
  index
}

fn reconcile_one(line: &LineItem, candidates: &[&PricedRecord]) -> LineItem {
  let record = choose_record(line, candidates);

  if let Some(message) = &record.error {
    return unpriced(line, message);
  }

  let Some(price) = record.unit_price.filter(|p| *p > Decimal::ZERO) else {
    return unpriced(line, "Price unavailable");
  };

  // The supplier's UOM wins; log the override so it can be audited
  // separately from normal pricing.
  let final_uom = record.uom.clone().unwrap_or_else(|| line.uom.clone());
  if final_uom != line.uom {
    warn!(
      sku = %line.sku,
      requested_uom = %line.uom,
      supplier_uom = %final_uom,
      "supplier overrode requested UOM"
    );
  }

  if let Some(priced_qty) = record.quantity {
    if priced_qty != line.quantity {
      warn!(
        sku = %line.sku,
        requested_qty = %line.quantity,
        priced_qty = %priced_qty,
        "supplier priced a different quantity than requested"
      );
    }
  }

  let mut available = line.available_uoms.clone();
  for candidate in candidates {
    for uom in &candidate.available_uoms {
      if !available.contains(uom) {
        available.push(uom.clone());
      }
    }
    if let Some(uom) = &candidate.uom {
      if !available.contains(uom) {
        available.push(uom.clone());
      }
    }
  }

  let mut priced = line.clone();
  priced.unit_price = Some(price);
  priced.line_price = Some(line.quantity * price);
  priced.uom = final_uom;
  priced.available_uoms = available;
  priced.pricing = PricingState::Priced;
  priced
}

/// Pick the best record for a line: a usable price in the requested
/// UOM beats a usable price in any UOM, which beats an exact-UOM
/// record without one, which beats whatever came first.
fn choose_record<'a>(line: &LineItem, candidates: &[&'a PricedRecord]) -> &'a PricedRecord {
  candidates
    .iter()
    .find(|r| r.has_positive_price() && r.uom.as_ref() == Some(&line.uom))
    .or_else(|| candidates.iter().find(|r| r.has_positive_price()))
    .or_else(|| candidates.iter().find(|r| r.uom.as_ref() == Some(&line.uom)))
    .unwrap_or(&candidates[0])
}

fn unpriced(line: &LineItem, reason: &str) -> LineItem {
  let mut out = line.clone();
  out.unit_price = None;
  out.line_price = None;
  out.pricing = PricingState::Error(reason.to_string());
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::line_item::Uom;
  use rust_decimal_macros::dec;

  fn line(sku: &str, qty: Decimal, uom: &str) -> LineItem {
    LineItem::new(sku, qty, Uom::new(uom))
  }

  fn record(sku: &str, price: Decimal, uom: &str) -> PricedRecord {
    let mut r = PricedRecord::new(sku);
    r.unit_price = Some(price);
    r.uom = Some(Uom::new(uom));
    r
  }

  #[test]
  fn full_round_trip_prices_exactly() {
    let lines = vec![line("26VPJ118CY", dec!(10), "EA")];
    let records = vec![record("26VPJ118CY", dec!(12.50), "EA")];

    let out = reconcile(&lines, &records);
    assert_eq!(out[0].pricing, PricingState::Priced);
    assert_eq!(out[0].unit_price, Some(dec!(12.50)));
    assert_eq!(out[0].line_price, Some(dec!(125.00)));
  }

  #[test]
  fn missing_sku_is_marked_not_found() {
    let lines = vec![line("NOPE-1", dec!(2), "EA")];
    let out = reconcile(&lines, &[record("OTHER", dec!(5), "EA")]);
    assert_eq!(out[0].pricing, PricingState::Error("SKU not found".into()));
    assert_eq!(out[0].line_price, None);
  }

  #[test]
  fn sku_matching_ignores_case_and_whitespace() {
    let lines = vec![line(" abc-1 ", dec!(1), "EA")];
    let out = reconcile(&lines, &[record("ABC-1", dec!(3.25), "EA")]);
    assert!(out[0].is_priced());
  }

  #[test]
  fn supplier_error_message_passes_through() {
    let mut bad = PricedRecord::new("X9");
    bad.error = Some("Item discontinued".into());
    let out = reconcile(&[line("X9", dec!(1), "EA")], &[bad]);
    assert_eq!(out[0].pricing, PricingState::Error("Item discontinued".into()));
  }

  #[test]
  fn zero_price_is_price_unavailable() {
    let out = reconcile(&[line("Z1", dec!(1), "EA")], &[record("Z1", dec!(0), "EA")]);
    assert_eq!(out[0].pricing, PricingState::Error("Price unavailable".into()));
  }

  #[test]
  fn requested_uom_preferred_among_multiple_records() {
    let records = vec![record("R1", dec!(30.00), "BNDL"), record("R1", dec!(90.00), "SQ")];
    let out = reconcile(&[line("R1", dec!(2), "SQ")], &records);
    assert_eq!(out[0].unit_price, Some(dec!(90.00)));
    assert_eq!(out[0].uom, Uom::new("SQ"));
  }

  #[test]
  fn supplier_uom_overrides_when_requested_unavailable() {
    let records = vec![record("R2", dec!(30.00), "BNDL")];
    let out = reconcile(&[line("R2", dec!(3), "SQ")], &records);
    assert!(out[0].is_priced());
    assert_eq!(out[0].uom, Uom::new("BNDL"));
    assert_eq!(out[0].line_price, Some(dec!(90.00)));
  }

  #[test]
  fn alt_sku_also_matches() {
    let mut r = PricedRecord::new("ITEM-CODE");
    r.alt_sku = Some("123456".into());
    r.unit_price = Some(dec!(7.00));
    let out = reconcile(&[line("123456", dec!(1), "EA")], &[r]);
    assert!(out[0].is_priced());
  }

  #[test]
  fn partial_order_keeps_all_lines() {
    let lines = vec![
      line("A1", dec!(1), "EA"),
      line("B2", dec!(2), "EA"),
      line("C3", dec!(3), "EA"),
    ];
    let records = vec![record("A1", dec!(1.00), "EA"), record("B2", dec!(2.00), "EA")];

    let out = reconcile(&lines, &records);
    assert_eq!(out.len(), 3);
    assert_eq!(out.iter().filter(|l| l.is_priced()).count(), 2);
    assert_eq!(out[2].pricing, PricingState::Error("SKU not found".into()));
  }

  #[test]
  fn quantity_mismatch_is_advisory_only() {
    let mut r = record("Q1", dec!(4.00), "EA");
    r.quantity = Some(dec!(5));
    let out = reconcile(&[line("Q1", dec!(2), "EA")], &[r]);
    assert!(out[0].is_priced());
    assert_eq!(out[0].line_price, Some(dec!(8.00)));
  }

  #[test]
  fn fail_all_marks_every_line() {
    let lines = vec![line("A", dec!(1), "EA"), line("B", dec!(1), "EA")];
    let out = fail_all(&lines, "ABC unreachable: connection refused");
    assert!(out.iter().all(|l| matches!(l.pricing, PricingState::Error(_))));
  }
}
