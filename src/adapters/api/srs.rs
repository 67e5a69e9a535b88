//! SRS Distribution Adapter - OAuth2 Form Credentials
//!
//! OAuth2 client-credentials with the pair in the form body (no
//! Basic header) and the catch-all `ALL` scope. Pricing responses
//! key lines by `itemCode` and sometimes additionally by a numeric
//! `productId`; both keys are kept for reconciliation. No live order
//! endpoint yet.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::{CredentialBundle, CredentialResolver, Secrets};
use crate::domain::line_item::decimal_from_json;
use crate::domain::{sanitize_lines, Environment, LineItem, Order, PricedRecord, SupplierError, SupplierKey, Uom};
use crate::ports::supplier::{AuthSession, OrderOutcome, PricingOutcome, SupplierAdapter};

use super::http::SupplierHttp;
use super::{as_auth_error, decimal_to_json, extract_price, millis_suffix, strip_query};

pub struct SrsAdapter {
  http: SupplierHttp,
  resolver: Arc<CredentialResolver>,
}

impl SrsAdapter {
  pub fn new(resolver: Arc<CredentialResolver>, timeout: Duration) -> Result<Self, SupplierError> {
    Ok(Self {
      http: SupplierHttp::new(SupplierKey::Srs, timeout)?,
      resolver,
    })
  }

  async fn login(
    &self,
    env: Option<Environment>,
  ) -> Result<(AuthSession, CredentialBundle), SupplierError> {
    let bundle = self.resolver.resolve(SupplierKey::Srs, env)?;
    let (client_id, client_secret) = match &bundle.secrets {
      Secrets::OAuth { client_id, client_secret } => (client_id.clone(), client_secret.clone()),
      Secrets::Login { .. } => {
        return Err(SupplierError::Config(
          "SRS entry must carry an OAuth client pair".to_string(),
        ))
      }
    };
    if !bundle.secrets.is_complete() {
      return Err(SupplierError::Auth {
        supplier: SupplierKey::Srs,
        status: None,
        detail: "client credentials unresolved".to_string(),
      });
    }

    let token_url = strip_query(&bundle.entry.auth_url).to_string();
    let body = self
      .http
      .post_form(
        &token_url,
        &[
          ("grant_type", "client_credentials"),
          ("client_id", &client_id),
          ("client_secret", &client_secret),
          ("scope", "ALL"),
        ],
        None,
      )
      .await
      .map_err(as_auth_error)?;

    let token = body
      .get("access_token")
      .and_then(Value::as_str)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| SupplierError::Auth {
        supplier: SupplierKey::Srs,
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
}

/// Canonical records out of an SRS price response. Lines live in
/// `productList`; `productId` can be numeric and becomes the
/// alternate key.
pub(crate) fn normalize_pricing(raw: &Value) -> Vec<PricedRecord> {
  let lines = raw
    .get("productList")
    .or_else(|| raw.get("products"))
    .or_else(|| raw.get("lines"))
    .and_then(Value::as_array);
  let Some(lines) = lines else {
    return Vec::new();
  };

  lines
    .iter()
    .filter_map(|line| {
      let item_code = line.get("itemCode").and_then(Value::as_str);
      let product_id = line.get("productId").map(stringify_key).filter(|s| !s.is_empty());
      let sku = item_code.map(str::to_string).or_else(|| product_id.clone())?;

      let mut record = PricedRecord::new(sku);
      record.alt_sku = match item_code {
        Some(_) => product_id,
        None => None,
      };
      record.uom = line.get("uom").and_then(Value::as_str).map(Uom::new);
      record.unit_price = extract_price(line);
      record.quantity = line.get("quantity").and_then(decimal_from_json);
      record.error = line
        .get("error")
        .or_else(|| line.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|m| !m.is_empty());
      Some(record)
    })
    .collect()
}

fn stringify_key(value: &Value) -> String {
  match value {
    Value::String(s) => s.trim().to_string(),
    Value::Number(n) => n.to_string(),
    _ => String::new(),
  }
}

#[async_trait]
impl SupplierAdapter for SrsAdapter {
  fn key(&self) -> SupplierKey {
    SupplierKey::Srs
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
    let request_lines = sanitize_lines(lines);

    let body = json!({
      "productList": request_lines
        .iter()
        .map(|line| json!({
          "itemCode": line.sku,
          "quantity": decimal_to_json(line.quantity),
          "uom": line.uom.as_str(),
        }))
        .collect::<Vec<_>>(),
    });

    let url = format!("{}/products/v2/price", bundle.entry.api_base_url);
    let raw = self.http.post_json(&url, &body, &Self::bearer(&session)).await?;
    let records = normalize_pricing(&raw);

    Ok(PricingOutcome { raw, records, environment: bundle.environment })
  }

  /// No live ordering API is wired yet; the order is accepted
  /// locally with a synthesized confirmation so the caller can tell
  /// the difference.
  async fn submit_order(
    &self,
    env: Option<Environment>,
    _order: &Order,
  ) -> Result<OrderOutcome, SupplierError> {
    let bundle = self.resolver.resolve(SupplierKey::Srs, env)?;
    let confirmation = format!("SRS-{}", millis_suffix());
    warn!(
      confirmation = %confirmation,
      "SRS order accepted locally; supplier ordering integration pending"
    );
    Ok(OrderOutcome::AcceptedLocally { confirmation, environment: bundle.environment })
  }

  async fn search_live(
    &self,
    env: Option<Environment>,
    query: &str,
    page_size: usize,
  ) -> Result<Vec<Value>, SupplierError> {
    let (session, bundle) = self.login(env).await?;
    let url = format!("{}/products/v2/catalog", bundle.entry.api_base_url);
    let raw = self
      .http
      .get_json(
        &url,
        &[
          ("q", query.to_string()),
          ("pageSize", page_size.to_string()),
        ],
        &Self::bearer(&session),
      )
      .await?;

    Ok(
      raw
        .get("products")
        .or_else(|| raw.get("items"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default(),
    )
  }
}
