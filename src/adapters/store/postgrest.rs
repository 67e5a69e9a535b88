//! PostgREST Product Index - Row Store over HTTP
//!
//! One product table for all suppliers with a `supplier`
//! discriminator column; pages are keyed newest-first by the numeric
//! primary key. Filters are PostgREST query operators (`eq.`, `lt.`,
//! `ilike.`, `or=(...)`). The ladder retries; this adapter does not.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::SupplierKey;
use crate::ports::product_store::{ProductStore, StoreError};

pub struct PostgrestStore {
  http: Client,
  base_url: String,
  table: String,
  api_key: String,
}

impl PostgrestStore {
  pub fn new(
    base_url: impl Into<String>,
    table: impl Into<String>,
    api_key: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, StoreError> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| StoreError::new(None, format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      table: table.into(),
      api_key: api_key.into(),
    })
  }

  async fn fetch(&self, query: Vec<(String, String)>) -> Result<Vec<Value>, StoreError> {
    let url = format!("{}/{}", self.base_url, self.table);
    debug!(url = %url, params = query.len(), "product store query");

    let response = self
      .http
      .get(&url)
      .query(&query)
      .header("apikey", &self.api_key)
      .header("Authorization", format!("Bearer {}", self.api_key))
      .header("Accept", "application/json")
      .send()
      .await
      .map_err(|e| StoreError::new(None, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let mut message: String = body.trim().chars().take(300).collect();
      if message.is_empty() {
        message = status.canonical_reason().unwrap_or("store request failed").to_string();
      }
      return Err(StoreError::new(Some(status.as_u16()), message));
    }

    response
      .json::<Vec<Value>>()
      .await
      .map_err(|e| StoreError::new(None, format!("invalid JSON from store: {e}")))
  }

  fn base_query(
    &self,
    supplier: SupplierKey,
    before: Option<&Value>,
    limit: usize,
  ) -> Vec<(String, String)> {
    let mut query = vec![
      ("select".to_string(), "*".to_string()),
      ("supplier".to_string(), format!("eq.{}", supplier.filter_str())),
      ("order".to_string(), "id.desc".to_string()),
      ("limit".to_string(), limit.to_string()),
    ];
    if let Some(id) = before.map(render_key).filter(|k| !k.is_empty()) {
      query.push(("id".to_string(), format!("lt.{id}")));
    }
    query
  }
}

/// Cursor keys arrive as JSON numbers or strings.
fn render_key(value: &Value) -> String {
  match value {
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.trim().to_string(),
    _ => String::new(),
  }
}

/// Make a user term safe inside a PostgREST `or=(...)` pattern:
/// literal pattern metacharacters are escaped and the `or` grammar's
/// own delimiters dropped.
fn escape_pattern(term: &str) -> String {
  term
    .chars()
    .filter(|c| !matches!(c, ',' | '(' | ')'))
    .flat_map(|c| match c {
      '%' | '_' | '\\' => vec!['\\', c],
      _ => vec![c],
    })
    .collect()
}

/// `or=(col.ilike.pattern,...)` disjunction over the resolved
/// columns.
fn or_filter(columns: &[String], pattern: &str) -> String {
  let clauses: Vec<String> = columns
    .iter()
    .map(|column| format!("{column}.ilike.{pattern}"))
    .collect();
  format!("({})", clauses.join(","))
}

#[async_trait]
impl ProductStore for PostgrestStore {
  async fn recent(
    &self,
    supplier: SupplierKey,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError> {
    self.fetch(self.base_query(supplier, before, limit)).await
  }

  async fn by_sku_prefix(
    &self,
    supplier: SupplierKey,
    columns: &[String],
    prefix: &str,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError> {
    if columns.is_empty() {
      return Ok(Vec::new());
    }
    let pattern = format!("{}*", escape_pattern(prefix));
    let mut query = self.base_query(supplier, before, limit);
    query.push(("or".to_string(), or_filter(columns, &pattern)));
    self.fetch(query).await
  }

  async fn by_description(
    &self,
    supplier: SupplierKey,
    columns: &[String],
    term: &str,
    before: Option<&Value>,
    limit: usize,
  ) -> Result<Vec<Value>, StoreError> {
    if columns.is_empty() {
      return Ok(Vec::new());
    }
    let pattern = format!("*{}*", escape_pattern(term));
    let mut query = self.base_query(supplier, before, limit);
    query.push(("or".to_string(), or_filter(columns, &pattern)));
    self.fetch(query).await
  }

  async fn sample_row(&self, supplier: SupplierKey) -> Result<Option<Value>, StoreError> {
    let rows = self.fetch(self.base_query(supplier, None, 1)).await?;
    Ok(rows.into_iter().next())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn pattern_escaping_neutralizes_metacharacters() {
    assert_eq!(escape_pattern("50%_off"), "50\\%\\_off");
    assert_eq!(escape_pattern("a,b(c)"), "abc");
  }

  #[test]
  fn or_filter_spans_all_columns() {
    let cols = vec!["sku".to_string(), "item_number".to_string()];
    assert_eq!(
      or_filter(&cols, "GAF*"),
      "(sku.ilike.GAF*,item_number.ilike.GAF*)"
    );
  }

  #[test]
  fn cursor_keys_render_for_numbers_and_strings() {
    assert_eq!(render_key(&json!(42)), "42");
    assert_eq!(render_key(&json!(" 42 ")), "42");
    assert_eq!(render_key(&json!(null)), "");
  }
}
