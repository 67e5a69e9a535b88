//! Supplier API Adapters - One Wire Format per Supplier
//!
//! Each supplier module owns its auth flow, request bodies, and
//! response normalization end to end. Shared plumbing lives in
//! `http`; shared price-field extraction lives here. Nothing outside
//! this directory ever probes a raw supplier payload.

pub mod abc;
pub mod beacon;
pub mod http;
pub mod srs;

pub use abc::AbcAdapter;
pub use beacon::BeaconAdapter;
pub use http::SupplierHttp;
pub use srs::SrsAdapter;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::line_item::decimal_from_json;

/// Price field candidates across all supplier responses, checked in
/// order; the first positive numeric value wins.
pub(crate) const PRICE_FIELDS: [&str; 7] = [
  "unitPrice",
  "price",
  "unit_price",
  "unitPriceValue",
  "pricePerUnit",
  "listPrice",
  "salePrice",
];

/// First positive price among the candidate fields of one response
/// line, parsed exactly.
pub(crate) fn extract_price(line: &Value) -> Option<Decimal> {
  PRICE_FIELDS
    .iter()
    .filter_map(|field| line.get(*field).and_then(decimal_from_json))
    .find(|price| *price > Decimal::ZERO)
}

/// Decimal rendered as a JSON number (suppliers reject string
/// quantities). The string round trip keeps the digits exact.
pub(crate) fn decimal_to_json(value: Decimal) -> Value {
  serde_json::from_str(&value.to_string())
    .unwrap_or_else(|_| Value::String(value.to_string()))
}

/// Millisecond-epoch suffix for locally synthesized confirmations.
pub(crate) fn millis_suffix() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// Reclassify a token/login endpoint failure as an auth failure,
/// carrying the endpoint's status through.
pub(crate) fn as_auth_error(err: crate::domain::SupplierError) -> crate::domain::SupplierError {
  use crate::domain::SupplierError;
  match err {
    SupplierError::Api { supplier, status, message } => SupplierError::Auth {
      supplier,
      status: Some(status),
      detail: message,
    },
    other => other,
  }
}

/// Drop any query string from a configured auth URL; token endpoints
/// take their parameters in the body.
pub(crate) fn strip_query(url: &str) -> &str {
  url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;
  use serde_json::json;

  #[test]
  fn extract_price_takes_first_positive_candidate() {
    let line = json!({"unitPrice": 0, "price": "12.50", "listPrice": 99});
    assert_eq!(extract_price(&line), Some(dec!(12.50)));
  }

  #[test]
  fn extract_price_ignores_non_numeric_fields() {
    let line = json!({"unitPrice": "n/a", "salePrice": 3.25});
    assert_eq!(extract_price(&line), Some(dec!(3.25)));
    assert_eq!(extract_price(&json!({"unitPrice": null})), None);
  }

  #[test]
  fn decimal_renders_as_json_number() {
    assert_eq!(decimal_to_json(dec!(4)), json!(4));
    assert_eq!(decimal_to_json(dec!(12.5)), json!(12.5));
  }
}
