//! CRM REST Client - Custom Order Objects and File Upload
//!
//! Talks to the CRM's v3-style REST surface: one custom object type
//! for sales orders (created associated to its deal), a file store
//! for confirmation documents, and property patches for status
//! transitions. Failures bubble as anyhow errors; the submission
//! pipeline decides which stages may degrade.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::OrderStatus;
use crate::ports::crm::{CrmStore, OrderProperties};

/// Association category for deal links on the custom order object.
const DEAL_ASSOCIATION_TYPE: u32 = 1;

pub struct CrmClient {
  http: Client,
  base_url: String,
  order_object: String,
  token: String,
}

impl CrmClient {
  pub fn new(
    base_url: impl Into<String>,
    order_object: impl Into<String>,
    token: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .context("Failed to build CRM HTTP client")?;
    Ok(Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      order_object: order_object.into(),
      token: token.into(),
    })
  }

  fn objects_url(&self) -> String {
    format!("{}/crm/v3/objects/{}", self.base_url, self.order_object)
  }

  fn properties_body(props: &OrderProperties) -> Value {
    json!({
      "properties": {
        "order_number": props.order_number,
        "payload_snapshot": props.payload_snapshot,
        "status": props.status,
        "total": props.total.to_string(),
        "last_saved_at": props.last_saved_at.to_rfc3339(),
        "document_url": props.document_url,
      }
    })
  }

  async fn expect_json(response: reqwest::Response, what: &str) -> Result<Value> {
    let status = response.status();
    let body = response
      .text()
      .await
      .with_context(|| format!("Failed to read CRM response for {what}"))?;
    ensure!(
      status.is_success(),
      "CRM {} failed ({}): {}",
      what,
      status,
      body.chars().take(300).collect::<String>()
    );
    serde_json::from_str(&body).with_context(|| format!("Invalid CRM JSON for {what}"))
  }
}

#[async_trait]
impl CrmStore for CrmClient {
  async fn create_order_record(&self, props: &OrderProperties, deal_id: &str) -> Result<String> {
    let mut body = Self::properties_body(props);
    if !deal_id.is_empty() {
      body["associations"] = json!([{
        "to": {"id": deal_id},
        "types": [{
          "associationCategory": "USER_DEFINED",
          "associationTypeId": DEAL_ASSOCIATION_TYPE,
        }]
      }]);
    }

    let response = self
      .http
      .post(self.objects_url())
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await
      .context("CRM create request failed")?;

    let parsed = Self::expect_json(response, "order record create").await?;
    let id = parsed
      .get("id")
      .and_then(Value::as_str)
      .context("CRM create response carried no id")?;
    debug!(order_id = id, "CRM order record created");
    Ok(id.to_string())
  }

  async fn update_order_record(&self, order_id: &str, props: &OrderProperties) -> Result<()> {
    let response = self
      .http
      .patch(format!("{}/{}", self.objects_url(), order_id))
      .bearer_auth(&self.token)
      .json(&Self::properties_body(props))
      .send()
      .await
      .context("CRM update request failed")?;

    Self::expect_json(response, "order record update").await?;
    Ok(())
  }

  async fn upload_file(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
    let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
    let form = Form::new()
      .part("file", part)
      .text("folderPath", "order-confirmations")
      .text(
        "options",
        json!({"access": "PRIVATE", "overwrite": false}).to_string(),
      );

    let response = self
      .http
      .post(format!("{}/files/v3/files", self.base_url))
      .bearer_auth(&self.token)
      .multipart(form)
      .send()
      .await
      .context("CRM file upload request failed")?;

    let parsed = Self::expect_json(response, "file upload").await?;
    parsed
      .get("url")
      .and_then(Value::as_str)
      .map(str::to_string)
      .context("CRM upload response carried no url")
  }

  async fn set_status(
    &self,
    order_id: &str,
    status: OrderStatus,
    document_ref: Option<&str>,
  ) -> Result<()> {
    let mut properties = json!({"status": status.as_str()});
    if let Some(doc) = document_ref {
      properties["document_url"] = Value::String(doc.to_string());
    }

    let response = self
      .http
      .patch(format!("{}/{}", self.objects_url(), order_id))
      .bearer_auth(&self.token)
      .json(&json!({"properties": properties}))
      .send()
      .await
      .context("CRM status update request failed")?;

    Self::expect_json(response, "status update").await?;
    Ok(())
  }
}
