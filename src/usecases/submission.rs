//! Order Submission Pipeline - Four Independently Fallible Stages
//!
//! Draft persist, supplier submission, confirmation document, final
//! status. Stages after the supplier call degrade rather than abort:
//! a failed document upload becomes an inline data URL, a failed
//! status write is logged with resume context. Nothing ever undoes a
//! supplier-confirmed order.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::{Environment, Order, OrderStatus, SupplierError};
use crate::ports::crm::{CrmStore, DocumentRenderer, OrderProperties};
use crate::ports::supplier::OrderOutcome;

use super::pricing::PricingService;
use super::AdapterMap;

/// One stage's failure, carried in the receipt instead of aborting.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
  pub stage: &'static str,
  pub detail: String,
}

/// What the caller gets back. Partial failure is visible here, never
/// rolled back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
  pub success: bool,
  pub message: String,
  pub confirmation_number: Option<String>,
  /// CRM order object id, when a draft was persisted.
  pub order_id: Option<String>,
  /// Uploaded document URL, or an inline data URL fallback.
  pub document_ref: Option<String>,
  /// True when the supplier integration is pending and the order was
  /// only accepted locally.
  pub accepted_locally: bool,
  pub stage_errors: Vec<StageError>,
}

pub struct SubmissionPipeline<C: CrmStore> {
  crm: Arc<C>,
  adapters: AdapterMap,
  pricing: PricingService,
  renderer: Arc<dyn DocumentRenderer>,
  metrics: Arc<MetricsRegistry>,
}

impl<C: CrmStore> SubmissionPipeline<C> {
  pub fn new(
    crm: Arc<C>,
    adapters: AdapterMap,
    renderer: Arc<dyn DocumentRenderer>,
    metrics: Arc<MetricsRegistry>,
  ) -> Self {
    let pricing = PricingService::new(adapters.clone());
    Self {
      crm,
      adapters,
      pricing,
      renderer,
      metrics,
    }
  }

  /// Run the pipeline for one order.
  #[instrument(skip(self, order), fields(supplier = order.supplier.as_str(), deal = deal_id))]
  pub async fn submit(
    &self,
    mut order: Order,
    deal_id: &str,
    environment: Option<Environment>,
  ) -> SubmissionReceipt {
    let mut stage_errors: Vec<StageError> = Vec::new();

    // Lines may arrive unpriced (draft restored from an old
    // snapshot); a dead supplier leaves them errored and the
    // pipeline continues so the failure stays visible.
    if order.items.iter().any(|line| !line.is_priced()) {
      let priced = self
        .pricing
        .price_lenient(order.supplier, environment, &order.items)
        .await;
      order.items = priced.lines;
    }

    if order.order_number.is_none() {
      order.order_number = Some(format!("ORD-{}", Utc::now().timestamp_millis()));
    }

    // Stage 1: persist the draft.
    let order_id = self.persist_draft(&order, deal_id, &mut stage_errors).await;
    if let Some(id) = &order_id {
      order.external_id = Some(id.clone());
    }

    // Stage 2: supplier submission. The only stage whose failure
    // fails the receipt.
    let outcome = match self.submit_to_supplier(&order, environment).await {
      Ok(outcome) => outcome,
      Err(err) => {
        error!(error = %err, "supplier submission failed");
        stage_errors.push(StageError { stage: "supplier", detail: err.to_string() });
        return SubmissionReceipt {
          success: false,
          message: format!("Order submission failed: {err}"),
          confirmation_number: None,
          order_id,
          document_ref: None,
          accepted_locally: false,
          stage_errors,
        };
      }
    };

    let status = match &outcome {
      OrderOutcome::Confirmed { .. } => OrderStatus::Placed,
      OrderOutcome::AcceptedLocally { .. } => OrderStatus::Submitted,
    };
    self
      .metrics
      .orders_submitted
      .with_label_values(&[
        order.supplier.as_str(),
        if outcome.is_stub() { "accepted_locally" } else { "confirmed" },
      ])
      .inc();

    // Stage 3: confirmation document, degrading to an inline
    // data URL when rendering or upload fails.
    let document_ref = self.document_ref(&order, &outcome, &mut stage_errors).await;

    // Stage 4: final status. A failure here is logged with resume
    // context; the supplier order stands either way.
    if let Some(id) = &order_id {
      if let Err(err) = self
        .crm
        .set_status(id, status, document_ref.as_deref())
        .await
      {
        warn!(
          order_id = id,
          status = status.as_str(),
          confirmation = outcome.confirmation(),
          error = %err,
          "final status update failed; order stands, resume manually"
        );
        stage_errors.push(StageError { stage: "finalize", detail: err.to_string() });
      }
    }

    let message = if outcome.is_stub() {
      "Order accepted; supplier integration pending".to_string()
    } else {
      "Order placed with supplier".to_string()
    };
    info!(
      confirmation = outcome.confirmation(),
      stages_degraded = stage_errors.len(),
      "order submission complete"
    );

    SubmissionReceipt {
      success: true,
      message,
      confirmation_number: Some(outcome.confirmation().to_string()),
      order_id,
      document_ref,
      accepted_locally: outcome.is_stub(),
      stage_errors,
    }
  }

  /// Stage 1. An update failure falls back to creating a fresh
  /// record; only a create failure leaves the draft unpersisted.
  async fn persist_draft(
    &self,
    order: &Order,
    deal_id: &str,
    stage_errors: &mut Vec<StageError>,
  ) -> Option<String> {
    let props = self.draft_properties(order);

    if let Some(existing) = &order.external_id {
      match self.crm.update_order_record(existing, &props).await {
        Ok(()) => return Some(existing.clone()),
        Err(err) => {
          warn!(order_id = existing, error = %err, "draft update failed; creating fresh record");
          stage_errors.push(StageError { stage: "draft-update", detail: err.to_string() });
        }
      }
    }

    match self.crm.create_order_record(&props, deal_id).await {
      Ok(id) => Some(id),
      Err(err) => {
        warn!(error = %err, "draft create failed; continuing without a CRM record");
        stage_errors.push(StageError { stage: "draft", detail: err.to_string() });
        None
      }
    }
  }

  fn draft_properties(&self, order: &Order) -> OrderProperties {
    OrderProperties {
      order_number: order.order_number.clone(),
      payload_snapshot: serde_json::to_string(order).unwrap_or_else(|_| "{}".to_string()),
      status: OrderStatus::Draft.as_str().to_string(),
      total: order.total(),
      last_saved_at: Utc::now(),
      document_url: None,
    }
  }

  async fn submit_to_supplier(
    &self,
    order: &Order,
    environment: Option<Environment>,
  ) -> Result<OrderOutcome, SupplierError> {
    let adapter = self.adapters.get(&order.supplier).ok_or_else(|| {
      SupplierError::Config(format!("no adapter wired for {}", order.supplier.as_str()))
    })?;
    adapter.submit_order(environment, order).await
  }

  /// Stage 3. Upload failure (or renderer failure) degrades to an
  /// inline base64 data URL so the confirmation is never lost.
  async fn document_ref(
    &self,
    order: &Order,
    outcome: &OrderOutcome,
    stage_errors: &mut Vec<StageError>,
  ) -> Option<String> {
    let bytes = match self.renderer.render(order, outcome) {
      Ok(bytes) => bytes,
      Err(err) => {
        warn!(error = %err, "document render failed; using minimal fallback");
        stage_errors.push(StageError { stage: "document-render", detail: err.to_string() });
        format!(
          "Order confirmation {} ({})\n",
          outcome.confirmation(),
          order.supplier.as_str()
        )
        .into_bytes()
      }
    };

    let file_name = format!(
      "confirmation-{}.{}",
      outcome.confirmation(),
      self.renderer.extension()
    );
    match self.crm.upload_file(&file_name, &bytes).await {
      Ok(url) => Some(url),
      Err(err) => {
        warn!(error = %err, "document upload failed; inlining as data URL");
        stage_errors.push(StageError { stage: "document-upload", detail: err.to_string() });
        Some(format!(
          "data:{};base64,{}",
          self.renderer.content_type(),
          BASE64.encode(&bytes)
        ))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inline_fallback_data_url_shape() {
    let encoded = BASE64.encode(b"ORDER CONFIRMATION");
    let url = format!("data:text/plain;base64,{encoded}");
    assert!(url.starts_with("data:text/plain;base64,"));
    assert_eq!(
      BASE64.decode(url.split(',').nth(1).unwrap()).unwrap(),
      b"ORDER CONFIRMATION"
    );
  }
}
