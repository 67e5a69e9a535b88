//! Confirmation Documents - Plain-Text Renderer
//!
//! Renders the uploaded confirmation as a plain-text summary:
//! supplier, confirmation number, line detail, total. The pipeline
//! degrades to an inline base64 data URL of the same bytes when the
//! CRM file store is unavailable, so the format doubles as the
//! fallback payload.

use anyhow::Result;
use chrono::Utc;

use crate::domain::Order;
use crate::ports::crm::DocumentRenderer;
use crate::ports::supplier::OrderOutcome;

pub struct TextConfirmationRenderer;

impl DocumentRenderer for TextConfirmationRenderer {
  fn render(&self, order: &Order, outcome: &OrderOutcome) -> Result<Vec<u8>> {
    let mut doc = String::new();
    doc.push_str("ORDER CONFIRMATION\n");
    doc.push_str("==================\n\n");
    doc.push_str(&format!("Supplier:      {}\n", order.supplier.as_str()));
    doc.push_str(&format!("Confirmation:  {}\n", outcome.confirmation()));
    if outcome.is_stub() {
      doc.push_str("State:         accepted locally (supplier integration pending)\n");
    }
    if let Some(number) = &order.order_number {
      doc.push_str(&format!("Order number:  {number}\n"));
    }
    doc.push_str(&format!("Generated:     {}\n\n", Utc::now().to_rfc3339()));

    doc.push_str("Lines\n-----\n");
    for line in &order.items {
      match (line.unit_price, line.line_price) {
        (Some(unit), Some(total)) => doc.push_str(&format!(
          "{:<20} {:>8} {:<6} @ {:>10}  = {:>12}\n",
          line.sku,
          line.quantity,
          line.uom.as_str(),
          unit,
          total
        )),
        _ => doc.push_str(&format!(
          "{:<20} {:>8} {:<6}   (unpriced)\n",
          line.sku,
          line.quantity,
          line.uom.as_str()
        )),
      }
    }
    doc.push_str(&format!("\nTotal: {}\n", order.total()));

    Ok(doc.into_bytes())
  }

  fn content_type(&self) -> &'static str {
    "text/plain"
  }

  fn extension(&self) -> &'static str {
    "txt"
  }
}
