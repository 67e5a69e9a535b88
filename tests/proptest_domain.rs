//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the pricing-reconciliation engine
//! and line normalization maintain their invariants across random
//! inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use supplier_bridge::domain::line_item::decimal_from_json;
use supplier_bridge::domain::{
  fail_all, normalize_sku, reconcile, sanitize_lines, LineItem, PricedRecord, PricingState, Uom,
};

fn arb_decimal(max_units: u64) -> impl Strategy<Value = Decimal> {
  // Two-decimal money values, the shape suppliers actually return.
  (1..max_units * 100).prop_map(|cents| Decimal::new(cents as i64, 2))
}

// ── Reconciliation Properties ───────────────────────────────

proptest! {
  /// Priced lines must satisfy line_price == quantity * unit_price
  /// exactly, with no float drift at any magnitude.
  #[test]
  fn reconciled_line_price_is_exact(
    qty in 1u32..10_000,
    price in arb_decimal(100_000),
  ) {
    let quantity = Decimal::from(qty);
    let line = LineItem::new("SKU-1", quantity, Uom::ea());

    let mut record = PricedRecord::new("SKU-1");
    record.unit_price = Some(price);
    record.uom = Some(Uom::ea());

    let out = reconcile(&[line], &[record]);
    prop_assert_eq!(out.len(), 1);
    prop_assert_eq!(&out[0].pricing, &PricingState::Priced);
    prop_assert_eq!(out[0].unit_price, Some(price));
    prop_assert_eq!(out[0].line_price, Some(quantity * price));
  }

  /// A record matches its line under any casing/whitespace of the
  /// requested SKU.
  #[test]
  fn reconcile_matches_skus_case_insensitively(
    sku in "[a-zA-Z0-9]{3,12}",
    pad in " {0,3}",
  ) {
    let requested = format!("{pad}{}{pad}", sku.to_lowercase());
    let line = LineItem::new(requested, Decimal::ONE, Uom::ea());

    let mut record = PricedRecord::new(sku.to_uppercase());
    record.unit_price = Some(Decimal::new(995, 2));

    let out = reconcile(&[line], &[record]);
    prop_assert_eq!(&out[0].pricing, &PricingState::Priced);
  }

  /// Non-positive and absent supplier prices always yield an explicit
  /// per-line error, never a silent zero price.
  #[test]
  fn non_positive_price_becomes_line_error(zero_or_negative in -1000i64..=0) {
    let line = LineItem::new("SKU-9", Decimal::ONE, Uom::ea());

    let mut record = PricedRecord::new("SKU-9");
    record.unit_price = Some(Decimal::new(zero_or_negative, 2));

    let out = reconcile(&[line], &[record]);
    prop_assert_eq!(
      &out[0].pricing,
      &PricingState::Error("Price unavailable".to_string())
    );
    prop_assert_eq!(out[0].line_price, None);
  }

  /// fail_all marks every line with the same cause and clears prices.
  #[test]
  fn fail_all_marks_every_line(count in 1usize..20) {
    let lines: Vec<LineItem> = (0..count)
      .map(|i| LineItem::new(format!("SKU-{i}"), Decimal::ONE, Uom::ea()))
      .collect();

    let out = fail_all(&lines, "connection refused");
    prop_assert_eq!(out.len(), count);
    for line in &out {
      prop_assert_eq!(
        &line.pricing,
        &PricingState::Error("connection refused".to_string())
      );
      prop_assert_eq!(line.unit_price, None);
      prop_assert_eq!(line.line_price, None);
    }
  }
}

// ── Normalization Properties ────────────────────────────────

proptest! {
  /// SKU normalization is idempotent.
  #[test]
  fn normalize_sku_idempotent(raw in "\\PC{0,24}") {
    let once = normalize_sku(&raw);
    prop_assert_eq!(normalize_sku(&once), once.clone());
    prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
  }

  /// UOM codes normalize to trimmed uppercase, defaulting to EA.
  #[test]
  fn uom_normalizes_to_uppercase(raw in "[a-zA-Z]{0,6}") {
    let uom = Uom::new(&format!(" {raw} "));
    if raw.is_empty() {
      prop_assert_eq!(uom.as_str(), "EA");
    } else {
      prop_assert_eq!(uom.as_str(), raw.to_uppercase());
    }
  }

  /// Sanitized request lines never carry an empty SKU or a quantity
  /// below one.
  #[test]
  fn sanitized_lines_are_well_formed(
    skus in prop::collection::vec("[ a-zA-Z0-9]{0,8}", 0..8),
    qty in -5i64..50,
  ) {
    let lines: Vec<LineItem> = skus
      .iter()
      .map(|sku| LineItem::new(sku.clone(), Decimal::from(qty), Uom::ea()))
      .collect();

    for request in sanitize_lines(&lines) {
      prop_assert!(!request.sku.trim().is_empty());
      prop_assert!(request.quantity >= Decimal::ONE);
    }
  }

  /// JSON numbers survive the string round trip without losing the
  /// decimal representation.
  #[test]
  fn decimal_from_json_number_is_exact(units in 0u32..1_000_000, cents in 0u32..100) {
    let text = format!("{units}.{cents:02}");
    let value: serde_json::Value = text.parse::<f64>().unwrap().into();
    let direct = decimal_from_json(&json!(text)).unwrap();
    prop_assert_eq!(direct, text.parse::<Decimal>().unwrap());
    // Number form parses too, even if the float detour reformats it.
    prop_assert!(decimal_from_json(&value).is_some());
  }
}
