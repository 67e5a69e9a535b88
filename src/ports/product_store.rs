//! Product Store Port - Cached Product Index Interface
//!
//! The search ladder's view of the product cache: newest-first pages
//! filtered by supplier, with SKU-prefix and description-substring
//! variants, plus the one-row sample query used for field
//! auto-discovery. Rows stay raw JSON because every supplier's table
//! has its own columns.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::SupplierKey;

/// A product-cache failure, carrying the upstream status when one
/// exists so the ladder can refuse to retry client errors.
#[derive(Debug, Clone, Error)]
#[error("product store error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
pub struct StoreError {
  pub status: Option<u16>,
  pub message: String,
}

impl StoreError {
  pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
    }
  }

  /// 4xx-class errors fail fast; everything else is retryable.
  pub fn is_client_error(&self) -> bool {
    self.status.is_some_and(|s| (400..500).contains(&s))
  }
}

/// Cached product index queries.
///
/// All page queries are ordered by a monotonically decreasing primary
/// key (newest first); `before` is an exclusive upper bound on that
/// key for cursor resumption. Implementations fetch exactly `limit`
/// rows — the ladder asks for one extra itself to detect more pages.
#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
  /// Most-recent rows for a supplier, unfiltered by text.
  async fn recent(
    &self,
    supplier: SupplierKey,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError>;

  /// Rows whose resolved SKU columns start with `prefix`
  /// (case-insensitive).
  async fn by_sku_prefix(
    &self,
    supplier: SupplierKey,
    columns: &[String],
    prefix: &str,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError>;

  /// Rows whose resolved description columns contain `term`
  /// (case-insensitive substring).
  async fn by_description(
    &self,
    supplier: SupplierKey,
    columns: &[String],
    term: &str,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError>;

  /// One arbitrary row for the supplier, used to discover the
  /// actual stored column names. None when the table is empty.
  async fn sample_row(&self, supplier: SupplierKey) -> Result<Option<Value>, StoreError>;
}
