//! CRM Port - Draft Persistence and Document Upload
//!
//! The narrow interface the submission pipeline needs from the CRM
//! platform: create/update one custom order object, associate it to a
//! deal, upload a file, and flip the order's status. Nothing in the
//! core knows about CRM object schemas beyond these properties.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Order, OrderStatus};
use crate::ports::supplier::OrderOutcome;

/// The property bag written to the CRM order object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProperties {
  /// Human-facing order number (generated on create, kept on update).
  pub order_number: Option<String>,
  /// Full order JSON snapshot for draft restoration.
  pub payload_snapshot: String,
  pub status: String,
  pub total: Decimal,
  pub last_saved_at: DateTime<Utc>,
  /// Link to the confirmation document, once one exists.
  pub document_url: Option<String>,
}

/// CRM read/write surface consumed by the submission pipeline.
#[async_trait]
pub trait CrmStore: Send + Sync + 'static {
  /// Create a new order record associated to the deal; returns the
  /// new object id.
  async fn create_order_record(
    &self,
    props: &OrderProperties,
    deal_id: &str,
  ) -> anyhow::Result<String>;

  /// Update an existing order record's properties.
  async fn update_order_record(
    &self,
    order_id: &str,
    props: &OrderProperties,
  ) -> anyhow::Result<()>;

  /// Upload a file to the CRM file store; returns its URL.
  async fn upload_file(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<String>;

  /// Persist the final status and document reference for an order.
  async fn set_status(
    &self,
    order_id: &str,
    status: OrderStatus,
    document_ref: Option<&str>,
  ) -> anyhow::Result<()>;
}

/// Renders the confirmation document for a submitted order.
///
/// Deliberately synchronous and infallible in shape only: a renderer
/// failure degrades the pipeline to an inline-encoded fallback, it
/// never aborts a submission.
pub trait DocumentRenderer: Send + Sync + 'static {
  /// Produce the document bytes for the unified order plus its
  /// submission outcome.
  fn render(&self, order: &Order, outcome: &OrderOutcome) -> anyhow::Result<Vec<u8>>;

  /// MIME type of rendered documents, used for the inline fallback.
  fn content_type(&self) -> &'static str;

  /// File extension for uploaded documents.
  fn extension(&self) -> &'static str;
}
