//! Search Cursor - Opaque Pagination Continuation
//!
//! Round-tripped by callers as JSON; encodes which ladder step to
//! resume and the last-seen row key (exclusive lower bound on the
//! newest-first scan).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The cached ladder steps a cursor can resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchStep {
  Recent,
  Sku,
  Fuzzy,
}

impl SearchStep {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Recent => "RECENT",
      Self::Sku => "SKU",
      Self::Fuzzy => "FUZZY",
    }
  }
}

/// Continuation token produced by the ladder and echoed back by the
/// caller. The row key stays a raw JSON value because different
/// supplier tables key by numeric `id` or string `sku`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCursor {
  pub step: SearchStep,
  pub id: Value,
}

impl SearchCursor {
  pub fn new(step: SearchStep, id: Value) -> Self {
    Self { step, id }
  }

  /// Parse a cursor from either a JSON object or a JSON string.
  /// Malformed cursors are treated as absent, not as errors.
  pub fn parse(raw: &Value) -> Option<Self> {
    match raw {
      Value::Object(_) => serde_json::from_value(raw.clone()).ok(),
      Value::String(s) => serde_json::from_str(s).ok(),
      _ => None,
    }
  }
}
