//! Typed Error Taxonomy - Supplier and Gateway Failures
//!
//! Every failure that can cross a component boundary carries a
//! structured HTTP status so callers never have to parse numbers
//! out of error strings. Per-line pricing failures are data
//! (`PricingState::Error`), not errors, and never appear here.

use thiserror::Error;

use super::supplier::SupplierKey;

/// Failures surfaced by the supplier adapters, the credential
/// resolver, and the gateway.
#[derive(Debug, Clone, Error)]
pub enum SupplierError {
  /// Unresolvable supplier, environment, or credential entry.
  #[error("configuration error: {0}")]
  Config(String),

  /// The caller sent a request the gateway cannot route.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  /// Supplier login failed or returned no usable session.
  #[error("{supplier} authentication failed: {detail}")]
  Auth {
    supplier: SupplierKey,
    /// Status reported by the supplier's auth endpoint, if any.
    status: Option<u16>,
    detail: String,
  },

  /// Non-2xx from a supplier during pricing, ordering, or search.
  /// The message prefers the supplier's own error field over the
  /// generic HTTP reason.
  #[error("{supplier} API error ({status}): {message}")]
  Api {
    supplier: SupplierKey,
    status: u16,
    message: String,
  },

  /// The supplier could not be reached at all.
  #[error("{supplier} unreachable: {detail}")]
  Transport {
    supplier: SupplierKey,
    detail: String,
  },
}

impl SupplierError {
  /// Map this error to the HTTP status the gateway surfaces.
  ///
  /// Supplier-reported statuses pass through verbatim when they are
  /// plausible client/server codes; anything else collapses to 500.
  pub fn status_code(&self) -> u16 {
    match self {
      Self::Config(_) | Self::InvalidRequest(_) => 400,
      Self::Auth { status, .. } => clamp_status(status.unwrap_or(500)),
      Self::Api { status, .. } => clamp_status(*status),
      Self::Transport { .. } => 500,
    }
  }
}

/// Keep supplier statuses inside [400, 599]; everything else is a 500.
fn clamp_status(status: u16) -> u16 {
  if (400..=599).contains(&status) {
    status
  } else {
    500
  }
}
