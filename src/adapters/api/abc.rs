//! ABC Supply Adapter - OAuth2 Basic + Live Ordering
//!
//! The only supplier with a live order endpoint. OAuth2
//! client-credentials with the pair in an HTTP Basic header, scoped
//! to the product/pricing/account/order APIs. A fresh token is
//! fetched for every operation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::{CredentialBundle, CredentialResolver, Secrets};
use crate::domain::line_item::decimal_from_json;
use crate::domain::{sanitize_lines, Environment, LineItem, Order, PricedRecord, SupplierError, SupplierKey, Uom};
use crate::ports::supplier::{AuthSession, OrderOutcome, PricingOutcome, SupplierAdapter};

use super::http::SupplierHttp;
use super::{as_auth_error, decimal_to_json, extract_price, millis_suffix, strip_query};

const TOKEN_SCOPE: &str = "product.read pricing.read location.read account.read order.write";
const PRICING_PURPOSE: &str = "estimating";

pub struct AbcAdapter {
  http: SupplierHttp,
  resolver: Arc<CredentialResolver>,
}

impl AbcAdapter {
  pub fn new(resolver: Arc<CredentialResolver>, timeout: Duration) -> Result<Self, SupplierError> {
    Ok(Self {
      http: SupplierHttp::new(SupplierKey::Abc, timeout)?,
      resolver,
    })
  }

  /// Client-credentials token fetch. The configured auth URL may
  /// carry a query string; token parameters go in the form body.
  async fn login(
    &self,
    env: Option<Environment>,
  ) -> Result<(AuthSession, CredentialBundle), SupplierError> {
    let bundle = self.resolver.resolve(SupplierKey::Abc, env)?;
    let (client_id, client_secret) = match &bundle.secrets {
      Secrets::OAuth { client_id, client_secret } => (client_id.clone(), client_secret.clone()),
      Secrets::Login { .. } => {
        return Err(SupplierError::Config(
          "ABC entry must carry an OAuth client pair".to_string(),
        ))
      }
    };
    if !bundle.secrets.is_complete() {
      return Err(SupplierError::Auth {
        supplier: SupplierKey::Abc,
        status: None,
        detail: "client credentials unresolved".to_string(),
      });
    }

    let token_url = strip_query(&bundle.entry.auth_url).to_string();
    let body = self
      .http
      .post_form(
        &token_url,
        &[("grant_type", "client_credentials"), ("scope", TOKEN_SCOPE)],
        Some((&client_id, &client_secret)),
      )
      .await
      .map_err(as_auth_error)?;

    let token = body
      .get("access_token")
      .and_then(Value::as_str)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| SupplierError::Auth {
        supplier: SupplierKey::Abc,
        status: None,
        detail: "token response carried no access_token".to_string(),
      })?;

    Ok((AuthSession::Bearer(token.to_string()), bundle))
  }

  fn bearer(session: &AuthSession) -> Vec<(&'static str, String)> {
    match session {
      AuthSession::Bearer(token) => vec![("Authorization", format!("Bearer {token}"))],
      AuthSession::Cookie(_) => Vec::new(),
    }
  }

  fn account(bundle: &CredentialBundle) -> Result<(String, String), SupplierError> {
    let branch = bundle.entry.branch_number.clone().ok_or_else(|| {
      SupplierError::Config("ABC entry has no branch_number".to_string())
    })?;
    let ship_to = bundle.entry.ship_to_number.clone().ok_or_else(|| {
      SupplierError::Config("ABC entry has no ship_to_number".to_string())
    })?;
    Ok((branch, ship_to))
  }
}

/// Canonical records out of an ABC pricing response (`lines` array,
/// line-level errors inline).
pub(crate) fn normalize_pricing(raw: &Value) -> Vec<PricedRecord> {
  let Some(lines) = raw.get("lines").and_then(Value::as_array) else {
    return Vec::new();
  };

  lines
    .iter()
    .filter_map(|line| {
      let sku = line
        .get("itemNumber")
        .or_else(|| line.get("sku"))
        .and_then(Value::as_str)?;
      let mut record = PricedRecord::new(sku);
      record.uom = line
        .get("uom")
        .or_else(|| line.get("unitOfMeasure"))
        .and_then(Value::as_str)
        .map(Uom::new);
      record.unit_price = extract_price(line);
      record.quantity = line
        .get("quantity")
        .or_else(|| line.get("qty"))
        .and_then(decimal_from_json);
      record.error = line
        .get("error")
        .or_else(|| line.get("errorMessage"))
        .or_else(|| line.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|m| !m.is_empty());
      record.available_uoms = alternate_uoms(line);
      Some(record)
    })
    .collect()
}

/// `alternateUoms` entries arrive either as bare strings or as
/// objects with a `uom` field.
fn alternate_uoms(line: &Value) -> Vec<Uom> {
  line
    .get("alternateUoms")
    .and_then(Value::as_array)
    .map(|entries| {
      entries
        .iter()
        .filter_map(|entry| {
          entry
            .as_str()
            .or_else(|| entry.get("uom").and_then(Value::as_str))
        })
        .map(Uom::new)
        .collect()
    })
    .unwrap_or_default()
}

#[async_trait]
impl SupplierAdapter for AbcAdapter {
  fn key(&self) -> SupplierKey {
    SupplierKey::Abc
  }

  async fn authenticate(&self, env: Option<Environment>) -> Result<AuthSession, SupplierError> {
    let (session, _) = self.login(env).await?;
    Ok(session)
  }

  async fn get_pricing(
    &self,
    env: Option<Environment>,
    lines: &[LineItem],
  ) -> Result<PricingOutcome, SupplierError> {
    let (session, bundle) = self.login(env).await?;
    let (branch, ship_to) = Self::account(&bundle)?;
    let request_lines = sanitize_lines(lines);

    let body = json!({
      "branchNumber": branch,
      "shipToNumber": ship_to,
      "requestId": Uuid::new_v4().to_string(),
      "purpose": PRICING_PURPOSE,
      "lines": request_lines
        .iter()
        .map(|line| json!({
          "id": line.id,
          "itemNumber": line.sku,
          "quantity": decimal_to_json(line.quantity),
          "uom": line.uom.as_str(),
        }))
        .collect::<Vec<_>>(),
    });

    let url = format!("{}/api/pricing/v2/prices", bundle.entry.api_base_url);
    let raw = self.http.post_json(&url, &body, &Self::bearer(&session)).await?;
    let records = normalize_pricing(&raw);

    Ok(PricingOutcome { raw, records, environment: bundle.environment })
  }

  async fn submit_order(
    &self,
    env: Option<Environment>,
    order: &Order,
  ) -> Result<OrderOutcome, SupplierError> {
    let (session, bundle) = self.login(env).await?;
    let (branch, ship_to) = Self::account(&bundle)?;
    let request_lines = sanitize_lines(&order.items);

    let body = json!({
      "branchNumber": branch,
      "shipToNumber": ship_to,
      "purchaseOrderNumber": order.order_number.clone()
        .or_else(|| order.ticket.clone())
        .unwrap_or_else(|| format!("ORD-{}", millis_suffix())),
      "lines": request_lines
        .iter()
        .map(|line| json!({
          "itemNumber": line.sku,
          "orderedQty": {
            "value": decimal_to_json(line.quantity),
            "uom": line.uom.as_str(),
          },
        }))
        .collect::<Vec<_>>(),
    });

    let url = format!("{}/api/order/v2/orders", bundle.entry.api_base_url);
    let raw = self.http.post_json(&url, &body, &Self::bearer(&session)).await?;

    let confirmation = raw
      .get("orderNumber")
      .or_else(|| raw.get("confirmationNumber"))
      .or_else(|| raw.get("id"))
      .and_then(Value::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| format!("ABC-{}", millis_suffix()));

    info!(confirmation = %confirmation, "ABC order confirmed");
    Ok(OrderOutcome::Confirmed { confirmation, raw, environment: bundle.environment })
  }

  async fn search_live(
    &self,
    env: Option<Environment>,
    query: &str,
    page_size: usize,
  ) -> Result<Vec<Value>, SupplierError> {
    let (session, bundle) = self.login(env).await?;
    let url = format!("{}/product/v1/items", bundle.entry.api_base_url);
    let raw = self
      .http
      .get_json(
        &url,
        &[
          ("itemsPerPage", page_size.to_string()),
          ("pageNumber", "1".to_string()),
          ("embed", "branches".to_string()),
          ("search", query.to_string()),
        ],
        &Self::bearer(&session),
      )
      .await?;

    Ok(
      raw
        .get("items")
        .or_else(|| raw.get("data"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default(),
    )
  }
}
