//! Line Items - Requested Units of Product
//!
//! A line item is created when the user adds a product to an order
//! (manual entry or search result) and is only ever re-priced by the
//! reconciliation engine. Quantities and prices use Decimal so the
//! `line_price == quantity * unit_price` invariant holds exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unit of measure (EA, SQ, BNDL, ...). Always stored trimmed and
/// uppercased; an empty unit normalizes to EA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uom(String);

impl Uom {
  /// Normalize a raw unit code: trim, uppercase, default EA.
  pub fn new(raw: &str) -> Self {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
      Self("EA".to_string())
    } else {
      Self(code)
    }
  }

  pub fn ea() -> Self {
    Self("EA".to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Uom {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Pricing lifecycle of a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingState {
  /// No pricing attempt has been made yet.
  Unpriced,
  /// A positive unit price was reconciled onto the line.
  Priced,
  /// Pricing failed for this line only; the reason is user-visible
  /// ("SKU not found", "Price unavailable", or a supplier message).
  Error(String),
}

/// One requested unit of product on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: String,
  pub sku: String,
  pub quantity: Decimal,
  pub uom: Uom,
  pub unit_price: Option<Decimal>,
  pub line_price: Option<Decimal>,
  /// Units the supplier has reported it can price this SKU in.
  pub available_uoms: Vec<Uom>,
  pub pricing: PricingState,
}

impl LineItem {
  /// Create a fresh, unpriced line item.
  pub fn new(sku: impl Into<String>, quantity: Decimal, uom: Uom) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      sku: sku.into(),
      quantity,
      uom,
      unit_price: None,
      line_price: None,
      available_uoms: vec![Uom::ea()],
      pricing: PricingState::Unpriced,
    }
  }

  /// SKU in matching form: trimmed and uppercased.
  pub fn normalized_sku(&self) -> String {
    normalize_sku(&self.sku)
  }

  pub fn is_priced(&self) -> bool {
    self.pricing == PricingState::Priced
  }

  /// Build a line item from a loosely-shaped UI payload entry.
  ///
  /// Accepts both `qty` and `quantity`, both `sku` and `itemNumber`.
  /// Returns None when no SKU survives trimming.
  pub fn from_wire(value: &Value) -> Option<Self> {
    let sku = value
      .get("sku")
      .or_else(|| value.get("itemNumber"))
      .and_then(Value::as_str)
      .map(str::trim)
      .unwrap_or("");
    if sku.is_empty() {
      return None;
    }

    let quantity = value
      .get("qty")
      .or_else(|| value.get("quantity"))
      .and_then(decimal_from_json)
      .filter(|q| *q >= Decimal::ONE)
      .unwrap_or(Decimal::ONE);

    let uom = value
      .get("uom")
      .and_then(Value::as_str)
      .map(Uom::new)
      .unwrap_or_else(Uom::ea);

    let mut line = Self::new(sku, quantity, uom);
    if let Some(id) = value.get("id").and_then(Value::as_str) {
      line.id = id.to_string();
    }
    Some(line)
  }
}

/// A line after request normalization, ready for a supplier body:
/// quantity coerced to >= 1, UOM defaulted, empty SKUs dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLine {
  pub id: String,
  pub sku: String,
  pub quantity: Decimal,
  pub uom: Uom,
}

/// Normalize requested lines for a supplier pricing/order body.
pub fn sanitize_lines(lines: &[LineItem]) -> Vec<RequestLine> {
  lines
    .iter()
    .filter_map(|line| {
      let sku = line.sku.trim().to_string();
      if sku.is_empty() {
        return None;
      }
      let quantity = if line.quantity >= Decimal::ONE {
        line.quantity
      } else {
        Decimal::ONE
      };
      Some(RequestLine {
        id: line.id.clone(),
        sku,
        quantity,
        uom: Uom::new(line.uom.as_str()),
      })
    })
    .collect()
}

/// Canonical SKU form used for all matching: trim + uppercase.
pub fn normalize_sku(raw: &str) -> String {
  raw.trim().to_uppercase()
}

/// Parse a JSON number or numeric string into a Decimal, exactly.
///
/// Goes through the number's string form rather than f64 so prices
/// like 12.50 stay 12.50.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
  match value {
    Value::Number(n) => n.to_string().parse().ok(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}
