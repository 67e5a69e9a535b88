//! Supplier Port - Adapter Capability Interface
//!
//! The one trait every supplier backend implements: authenticate,
//! price, submit, and live-search. The gateway and the search ladder
//! only ever talk to this trait, never to a concrete wire format.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Environment, LineItem, Order, PricedRecord, SupplierError, SupplierKey};

/// Opaque proof of authentication against one supplier.
///
/// Fetched fresh for every pricing/order call; never cached,
/// refreshed, or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSession {
  /// OAuth2 bearer token (ABC, SRS).
  Bearer(String),
  /// Full joined `Set-Cookie` header value (BEACON).
  Cookie(String),
}

impl AuthSession {
  /// Session material as it appears in the login entry-point body.
  pub fn to_body(&self, environment: Environment) -> Value {
    match self {
      Self::Bearer(token) => serde_json::json!({
        "success": true,
        "access_token": token,
        "environment": environment.as_str(),
      }),
      Self::Cookie(cookies) => serde_json::json!({
        "success": true,
        "cookies": cookies,
        "environment": environment.as_str(),
      }),
    }
  }
}

/// A pricing call result: the supplier's raw payload for the entry
/// point contract, plus the canonical records for reconciliation.
#[derive(Debug, Clone)]
pub struct PricingOutcome {
  /// Raw supplier response body, passed through to the caller.
  pub raw: Value,
  /// The same payload normalized by the adapter that owns its shape.
  pub records: Vec<PricedRecord>,
  /// Environment the call was actually made against.
  pub environment: Environment,
}

/// Result of submitting an order to a supplier.
///
/// Two of three suppliers have no live order endpoint yet; their
/// adapters return `AcceptedLocally` so callers and tests can tell
/// "confirmed by supplier" from "accepted locally, integration
/// pending". Never collapse the stub into a bare success.
#[derive(Debug, Clone)]
pub enum OrderOutcome {
  /// The supplier's ordering API confirmed the order.
  Confirmed {
    confirmation: String,
    raw: Value,
    environment: Environment,
  },
  /// Locally synthesized confirmation; supplier not yet wired.
  AcceptedLocally {
    confirmation: String,
    environment: Environment,
  },
}

impl OrderOutcome {
  pub fn confirmation(&self) -> &str {
    match self {
      Self::Confirmed { confirmation, .. } => confirmation,
      Self::AcceptedLocally { confirmation, .. } => confirmation,
    }
  }

  pub fn is_stub(&self) -> bool {
    matches!(self, Self::AcceptedLocally { .. })
  }
}

/// The capability interface implemented per supplier.
///
/// Implementations own their wire format and auth flow end to end;
/// every method resolves credentials itself (master environment when
/// `env` is None) and obtains a fresh session where one is needed.
#[async_trait]
pub trait SupplierAdapter: Send + Sync + 'static {
  /// Which supplier this adapter serves.
  fn key(&self) -> SupplierKey;

  /// Perform the supplier-specific login flow.
  async fn authenticate(&self, env: Option<Environment>)
    -> Result<AuthSession, SupplierError>;

  /// Price the given lines. Lines are normalized (quantity >= 1,
  /// UOM defaulted, empty SKUs dropped) before the request is built.
  async fn get_pricing(
    &self,
    env: Option<Environment>,
    lines: &[LineItem],
  ) -> Result<PricingOutcome, SupplierError>;

  /// Submit an order. Adapters without a live order endpoint return
  /// `OrderOutcome::AcceptedLocally`, never a fake confirmation.
  async fn submit_order(
    &self,
    env: Option<Environment>,
    order: &Order,
  ) -> Result<OrderOutcome, SupplierError>;

  /// Live catalog search used only by the ladder's fallback; a
  /// simpler request shape than pricing/order. Returns raw rows.
  async fn search_live(
    &self,
    env: Option<Environment>,
    query: &str,
    page_size: usize,
  ) -> Result<Vec<Value>, SupplierError>;
}
