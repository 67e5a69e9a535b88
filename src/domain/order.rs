//! Order Aggregate - Supplier, Lines, Delivery, Status
//!
//! The core only consumes and produces the line-item array and the
//! total; the rest of the aggregate is carried through the draft and
//! submission pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SupplierError;
use super::line_item::LineItem;
use super::supplier::SupplierKey;

/// Order lifecycle status persisted to the CRM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
  Draft,
  /// Accepted locally; supplier integration pending.
  Submitted,
  /// Confirmed by the supplier.
  Placed,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Draft => "Draft",
      Self::Submitted => "Submitted",
      Self::Placed => "Placed",
    }
  }
}

/// Delivery address captured by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub line1: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postal: Option<String>,
}

/// Delivery details captured by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
  pub date: Option<String>,
  pub service: Option<String>,
  pub time_code: Option<String>,
  pub instructions: Option<String>,
  pub contact_name: Option<String>,
  pub contact_email: Option<String>,
  pub contact_phone: Option<String>,
  #[serde(default)]
  pub address: Address,
}

/// A sales order being assembled, priced, and submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub supplier: SupplierKey,
  pub ticket: Option<String>,
  pub template: Option<String>,
  pub items: Vec<LineItem>,
  #[serde(default)]
  pub delivery: Delivery,
  pub status: OrderStatus,
  /// CRM object id once the draft has been persisted.
  pub external_id: Option<String>,
  /// Human-facing order number (ORD-<millis> when generated).
  pub order_number: Option<String>,
}

impl Order {
  pub fn new(supplier: SupplierKey, items: Vec<LineItem>) -> Self {
    Self {
      supplier,
      ticket: None,
      template: None,
      items,
      delivery: Delivery::default(),
      status: OrderStatus::Draft,
      external_id: None,
      order_number: None,
    }
  }

  /// Sum of priced lines. Unpriced/errored lines contribute zero.
  pub fn total(&self) -> Decimal {
    self.items
      .iter()
      .filter_map(|line| line.line_price)
      .sum()
  }

  /// Build an order from the loosely-shaped UI payload.
  ///
  /// The wizard sends `{ fullOrder: { fullOrderItems: [...] } }` (or
  /// `orderBody` on re-submission); either container is accepted.
  pub fn from_payload(supplier: SupplierKey, payload: &Value) -> Result<Self, SupplierError> {
    let container = payload
      .get("fullOrder")
      .or_else(|| payload.get("orderBody"))
      .unwrap_or(payload);

    let items = lines_from_container(container)?;
    let mut order = Self::new(supplier, items);

    order.ticket = string_field(container, "ticket");
    order.template = string_field(container, "template");
    order.order_number = string_field(container, "orderNumber")
      .or_else(|| string_field(container, "order_id"));
    order.external_id = string_field(container, "orderObjectId")
      .or_else(|| string_field(container, "selectedOrderId"));
    if let Some(delivery) = container.get("delivery") {
      order.delivery = serde_json::from_value(delivery.clone()).unwrap_or_default();
    }
    Ok(order)
  }
}

/// Extract the line-item array from a pricing/order payload.
pub fn lines_from_payload(payload: &Value) -> Result<Vec<LineItem>, SupplierError> {
  let container = payload
    .get("fullOrder")
    .or_else(|| payload.get("orderBody"))
    .unwrap_or(payload);
  lines_from_container(container)
}

fn lines_from_container(container: &Value) -> Result<Vec<LineItem>, SupplierError> {
  let raw_items = container
    .get("fullOrderItems")
    .or_else(|| container.get("lineItems"))
    .or_else(|| container.get("items"))
    .and_then(Value::as_array)
    .ok_or_else(|| {
      SupplierError::InvalidRequest("missing fullOrder with fullOrderItems".to_string())
    })?;

  let items: Vec<LineItem> = raw_items.iter().filter_map(LineItem::from_wire).collect();
  if items.is_empty() {
    return Err(SupplierError::InvalidRequest(
      "no valid line items in payload".to_string(),
    ));
  }
  Ok(items)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
  value
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}
