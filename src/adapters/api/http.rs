//! Supplier HTTP Plumbing - Shared reqwest Wrapper
//!
//! One thin client per supplier adapter: typed status-code errors,
//! JSON error-body extraction, Set-Cookie capture for session
//! suppliers. No retries here; retry policy belongs to the search
//! ladder alone.

use std::time::Duration;

use reqwest::header::SET_COOKIE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::domain::{SupplierError, SupplierKey};

/// HTTP client bound to one supplier, so every error it produces
/// already names its origin.
pub struct SupplierHttp {
  http: Client,
  supplier: SupplierKey,
}

impl SupplierHttp {
  pub fn new(supplier: SupplierKey, timeout: Duration) -> Result<Self, SupplierError> {
    let http = Client::builder()
      .timeout(timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| SupplierError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { http, supplier })
  }

  /// POST an application/x-www-form-urlencoded body, optionally with
  /// HTTP Basic credentials (OAuth token endpoints).
  pub async fn post_form(
    &self,
    url: &str,
    form: &[(&str, &str)],
    basic: Option<(&str, &str)>,
  ) -> Result<Value, SupplierError> {
    let mut request = self.http.post(url).form(form);
    if let Some((user, pass)) = basic {
      request = request.basic_auth(user, Some(pass));
    }
    self.send_json(request, "POST", url).await
  }

  /// POST a JSON body with extra headers (bearer tokens, cookies).
  pub async fn post_json(
    &self,
    url: &str,
    body: &Value,
    headers: &[(&str, String)],
  ) -> Result<Value, SupplierError> {
    let mut request = self.http.post(url).json(body);
    for (name, value) in headers {
      request = request.header(*name, value);
    }
    self.send_json(request, "POST", url).await
  }

  /// POST a JSON body and also capture the response's Set-Cookie
  /// values (session logins). Cookies are the name=value segments,
  /// joined with "; " in header order.
  pub async fn post_json_with_cookies(
    &self,
    url: &str,
    body: &Value,
  ) -> Result<(Value, String), SupplierError> {
    let request = self.http.post(url).json(body);
    let response = self.send(request, "POST", url).await?;

    let cookies: Vec<String> = response
      .headers()
      .get_all(SET_COOKIE)
      .iter()
      .filter_map(|v| v.to_str().ok())
      .filter_map(|v| v.split(';').next())
      .map(str::to_string)
      .collect();

    let parsed = self.parse_body(response).await?;
    Ok((parsed, cookies.join("; ")))
  }

  /// GET with a query string and extra headers.
  pub async fn get_json(
    &self,
    url: &str,
    query: &[(&str, String)],
    headers: &[(&str, String)],
  ) -> Result<Value, SupplierError> {
    let mut request = self.http.get(url).query(query);
    for (name, value) in headers {
      request = request.header(*name, value);
    }
    self.send_json(request, "GET", url).await
  }

  async fn send_json(
    &self,
    request: RequestBuilder,
    method: &str,
    url: &str,
  ) -> Result<Value, SupplierError> {
    let response = self.send(request, method, url).await?;
    self.parse_body(response).await
  }

  async fn send(
    &self,
    request: RequestBuilder,
    method: &str,
    url: &str,
  ) -> Result<Response, SupplierError> {
    debug!(supplier = self.supplier.as_str(), method, url, "supplier request");
    request.send().await.map_err(|e| SupplierError::Transport {
      supplier: self.supplier,
      detail: e.to_string(),
    })
  }

  /// Turn a response into JSON, or into a typed error carrying the
  /// supplier's own message when the status is non-2xx.
  async fn parse_body(&self, response: Response) -> Result<Value, SupplierError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| SupplierError::Transport {
      supplier: self.supplier,
      detail: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
      return Err(SupplierError::Api {
        supplier: self.supplier,
        status: status.as_u16(),
        message: error_message(&text, status),
      });
    }

    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| SupplierError::Transport {
      supplier: self.supplier,
      detail: format!("invalid JSON from supplier: {e}"),
    })
  }
}

/// Prefer the supplier's own error field over the bare HTTP reason.
fn error_message(body: &str, status: StatusCode) -> String {
  if let Ok(parsed) = serde_json::from_str::<Value>(body) {
    for key in ["error_description", "message", "error", "detail"] {
      if let Some(text) = parsed.get(key).and_then(Value::as_str) {
        if !text.trim().is_empty() {
          return text.trim().to_string();
        }
      }
    }
  }
  let trimmed = body.trim();
  if trimmed.is_empty() {
    status.canonical_reason().unwrap_or("request failed").to_string()
  } else {
    let mut message: String = trimmed.chars().take(300).collect();
    if message.len() < trimmed.len() {
      message.push_str("...");
    }
    message
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_message_prefers_supplier_fields() {
    let body = r#"{"error": "invalid_client", "hint": "check id"}"#;
    assert_eq!(
      error_message(body, StatusCode::UNAUTHORIZED),
      "invalid_client"
    );
    let body = r#"{"message": "Item not orderable"}"#;
    assert_eq!(
      error_message(body, StatusCode::UNPROCESSABLE_ENTITY),
      "Item not orderable"
    );
  }

  #[test]
  fn error_message_falls_back_to_body_then_reason() {
    assert_eq!(
      error_message("plain text failure", StatusCode::BAD_GATEWAY),
      "plain text failure"
    );
    assert_eq!(
      error_message("", StatusCode::SERVICE_UNAVAILABLE),
      "Service Unavailable"
    );
  }
}
