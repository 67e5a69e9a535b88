//! Beacon Adapter - Cookie-Session Login
//!
//! The one session-based supplier: a JSON login yields Set-Cookie
//! headers that become the session, and pricing is a GET keyed by
//! comma-joined SKUs. The price response is a nested map
//! `priceInfo: { sku: { UOM: price } }` rather than a line array.
//! No live order endpoint yet.

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
use super::{as_auth_error, millis_suffix};

pub struct BeaconAdapter {
  http: SupplierHttp,
  resolver: Arc<CredentialResolver>,
}

impl BeaconAdapter {
  pub fn new(resolver: Arc<CredentialResolver>, timeout: Duration) -> Result<Self, SupplierError> {
    Ok(Self {
      http: SupplierHttp::new(SupplierKey::Beacon, timeout)?,
      resolver,
    })
  }

  async fn login(
    &self,
    env: Option<Environment>,
  ) -> Result<(AuthSession, CredentialBundle), SupplierError> {
    let bundle = self.resolver.resolve(SupplierKey::Beacon, env)?;
    let (username, password, api_site_id) = match &bundle.secrets {
      Secrets::Login { username, password, api_site_id } => {
        (username.clone(), password.clone(), api_site_id.clone())
      }
      Secrets::OAuth { .. } => {
        return Err(SupplierError::Config(
          "BEACON entry must carry a username/password pair".to_string(),
        ))
      }
    };
    if !bundle.secrets.is_complete() {
      return Err(SupplierError::Auth {
        supplier: SupplierKey::Beacon,
        status: None,
        detail: "login credentials unresolved".to_string(),
      });
    }

    let body = json!({
      "username": username,
      "password": password,
      "siteId": "homeSite",
      "persistentLoginType": "RememberMe",
      "userAgent": "desktop",
      "apiSiteId": api_site_id,
    });

    let (_, cookies) = self
      .http
      .post_json_with_cookies(&bundle.entry.auth_url, &body)
      .await
      .map_err(as_auth_error)?;

    if cookies.is_empty() {
      return Err(SupplierError::Auth {
        supplier: SupplierKey::Beacon,
        status: None,
        detail: "login response carried no session cookies".to_string(),
      });
    }

    Ok((AuthSession::Cookie(cookies), bundle))
  }

  fn cookie(session: &AuthSession) -> Vec<(&'static str, String)> {
    match session {
      AuthSession::Cookie(cookies) => vec![("Cookie", cookies.clone())],
      AuthSession::Bearer(_) => Vec::new(),
    }
  }
}

/// Canonical records out of Beacon's `priceInfo` map: one record per
/// (sku, UOM) entry whose value parses as a positive number.
pub(crate) fn normalize_pricing(raw: &Value) -> Vec<PricedRecord> {
  let Some(price_info) = raw.get("priceInfo").and_then(Value::as_object) else {
    return Vec::new();
  };

  let mut records = Vec::new();
  for (sku, per_uom) in price_info {
    match per_uom.as_object() {
      Some(uom_map) => {
        for (uom, price) in uom_map {
          let mut record = PricedRecord::new(sku.clone());
          record.uom = Some(Uom::new(uom));
          record.unit_price = decimal_from_json(price);
          record.available_uoms = uom_map.keys().map(|u| Uom::new(u)).collect();
          records.push(record);
        }
      }
      // A bare string value is the supplier's per-SKU error.
      None => {
        let mut record = PricedRecord::new(sku.clone());
        record.error = per_uom.as_str().map(str::to_string);
        records.push(record);
      }
    }
  }
  records
}

#[async_trait]
impl SupplierAdapter for BeaconAdapter {
  fn key(&self) -> SupplierKey {
    SupplierKey::Beacon
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
    let sku_ids = request_lines
      .iter()
      .map(|line| line.sku.as_str())
      .collect::<Vec<_>>()
      .join(",");

    let url = format!("{}/v1/rest/com/becn/pricing", bundle.entry.api_base_url);
    let raw = self
      .http
      .get_json(&url, &[("skuIds", sku_ids)], &Self::cookie(&session))
      .await?;
    let records = normalize_pricing(&raw);

    Ok(PricingOutcome { raw, records, environment: bundle.environment })
  }

  /// No live ordering API is wired yet; accepted locally with a
  /// synthesized confirmation.
  async fn submit_order(
    &self,
    env: Option<Environment>,
    _order: &Order,
  ) -> Result<OrderOutcome, SupplierError> {
    let bundle = self.resolver.resolve(SupplierKey::Beacon, env)?;
    let confirmation = format!("BEACON-{}", millis_suffix());
    warn!(
      confirmation = %confirmation,
      "BEACON order accepted locally; supplier ordering integration pending"
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
    let url = format!("{}/v1/rest/com/becn/products", bundle.entry.api_base_url);
    let raw = self
      .http
      .get_json(
        &url,
        &[
          ("search", query.to_string()),
          ("limit", page_size.to_string()),
        ],
        &Self::cookie(&session),
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

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn price_info_uom_maps_become_records() {
    let raw = json!({
      "priceInfo": {
        "50010": {"EA": 12.50, "BNDL": 35.87},
        "60022": {"SQ": "104.00"}
      }
    });

    let mut records = normalize_pricing(&raw);
    records.sort_by(|a, b| (a.sku.clone(), a.uom.clone().map(|u| u.as_str().to_string()))
      .cmp(&(b.sku.clone(), b.uom.clone().map(|u| u.as_str().to_string()))));

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].sku, "50010");
    assert_eq!(records[0].uom, Some(Uom::new("BNDL")));
    assert_eq!(records[0].unit_price, Some(dec!(35.87)));
    assert_eq!(records[1].available_uoms.len(), 2);
    assert_eq!(records[2].sku, "60022");
    assert_eq!(records[2].unit_price, Some(dec!(104.00)));
  }

  #[test]
  fn bare_string_entry_is_a_per_sku_error() {
    let raw = json!({"priceInfo": {"70001": "SKU not recognized"}});
    let records = normalize_pricing(&raw);
    assert_eq!(records[0].error.as_deref(), Some("SKU not recognized"));
    assert_eq!(records[0].unit_price, None);
  }
}
