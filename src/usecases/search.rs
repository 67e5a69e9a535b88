//! Product Search Ladder - Cached Steps with Live Fallback
//!
//! Serves typeahead product search from the cached index in three
//! steps (RECENT for short queries, SKU prefix, FUZZY description),
//! resuming any step from a cursor. Zero cached hits fall through to
//! the supplier's live catalog; store failures retry with backoff
//! and finally degrade to an empty-but-successful result. This
//! surface never hard-fails a caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::config::SearchConfig;
use crate::domain::{Environment, SearchCursor, SearchStep, SupplierKey};
use crate::ports::product_store::{ProductStore, StoreError};

use super::AdapterMap;

/// Provenance tag on cached rows.
const SOURCE_CACHE: &str = "cached";
/// Provenance tag on live-fallback rows.
const SOURCE_LIVE: &str = "live";
/// Step label when every attempt failed and the result degraded.
const STEP_FALLBACK: &str = "FALLBACK";
/// Step label when the live catalog served the result.
const STEP_LIVE_FALLBACK: &str = "LIVE_FALLBACK";
/// Step label when both cached steps contributed to a merged page.
const STEP_SKU_FUZZY: &str = "SKU+FUZZY";

/// Retry schedule for whole-ladder invocations. 4xx store errors are
/// never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub initial_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      initial_delay: Duration::from_millis(500),
      max_delay: Duration::from_secs(5),
    }
  }
}

impl RetryPolicy {
  fn delay_for(&self, attempt: u32) -> Duration {
    let doubled = self
      .initial_delay
      .saturating_mul(2u32.saturating_pow(attempt));
    doubled.min(self.max_delay)
  }
}

/// Resolved column names per (supplier, field kind), discovered once
/// from a sample row and cached. Injected so tests can reset it.
#[derive(Default)]
pub struct FieldCache {
  resolved: Mutex<HashMap<(SupplierKey, FieldKind), Vec<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FieldKind {
  Sku,
  Description,
}

impl FieldCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drop all cached resolutions (tests, schema migrations).
  pub async fn reset(&self) {
    self.resolved.lock().await.clear();
  }
}

/// One search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
  pub supplier: SupplierKey,
  pub environment: Option<Environment>,
  pub query: String,
  pub page_size: Option<u32>,
  pub cursor: Option<Value>,
}

/// Search result; `success` is true even for degraded fallbacks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
  pub success: bool,
  pub items: Vec<Value>,
  pub source_step: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_cursor: Option<SearchCursor>,
  pub fallback: bool,
  pub meta: SearchMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
  pub supplier: String,
  pub query: String,
  pub page_size: usize,
  pub duration_ms: u64,
  pub timestamp: String,
  pub fallback: bool,
}

/// Outcome of one un-retried ladder pass. `fallback` marks results
/// served outside the cached index (live catalog or degraded empty).
struct LadderOutcome {
  items: Vec<Value>,
  source_step: String,
  next_cursor: Option<SearchCursor>,
  fallback: bool,
}

pub struct SearchLadder<S: ProductStore> {
  store: Arc<S>,
  adapters: AdapterMap,
  fields: Arc<FieldCache>,
  retry: RetryPolicy,
  config: SearchConfig,
  metrics: Arc<MetricsRegistry>,
}

impl<S: ProductStore> SearchLadder<S> {
  pub fn new(
    store: Arc<S>,
    adapters: AdapterMap,
    fields: Arc<FieldCache>,
    retry: RetryPolicy,
    config: SearchConfig,
    metrics: Arc<MetricsRegistry>,
  ) -> Self {
    Self {
      store,
      adapters,
      fields,
      retry,
      config,
      metrics,
    }
  }

  /// Run one search, retrying store failures with exponential
  /// backoff and degrading to an empty successful result when every
  /// attempt fails.
  #[instrument(skip(self, request), fields(supplier = request.supplier.as_str(), query = %request.query))]
  pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
    let started = std::time::Instant::now();
    let page_size = self.page_size(request);

    let mut outcome: Option<LadderOutcome> = None;
    for attempt in 0..=self.retry.max_retries {
      if attempt > 0 {
        let delay = self.retry.delay_for(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying search");
        sleep(delay).await;
      }

      match self.run_ladder(request, page_size).await {
        Ok(result) => {
          outcome = Some(result);
          break;
        }
        Err(err) if err.is_client_error() => {
          warn!(error = %err, "store rejected search; not retrying");
          break;
        }
        Err(err) => {
          warn!(error = %err, attempt, "search attempt failed");
        }
      }
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    match outcome {
      Some(outcome) => {
        self
          .metrics
          .search_requests
          .with_label_values(&[request.supplier.as_str(), &outcome.source_step])
          .inc();
        self
          .metrics
          .search_duration_ms
          .with_label_values(&[request.supplier.as_str()])
          .observe(duration_ms as f64);
        let fallback = outcome.fallback;
        self.respond(request, page_size, outcome, duration_ms, fallback)
      }
      None => {
        self
          .metrics
          .search_fallbacks
          .with_label_values(&[request.supplier.as_str()])
          .inc();
        let degraded = LadderOutcome {
          items: Vec::new(),
          source_step: STEP_FALLBACK.to_string(),
          next_cursor: None,
          fallback: true,
        };
        self.respond(request, page_size, degraded, duration_ms, true)
      }
    }
  }

  fn respond(
    &self,
    request: &SearchRequest,
    page_size: usize,
    outcome: LadderOutcome,
    duration_ms: u64,
    fallback: bool,
  ) -> SearchResponse {
    SearchResponse {
      success: true,
      items: outcome.items,
      source_step: outcome.source_step,
      next_cursor: outcome.next_cursor,
      fallback,
      meta: SearchMeta {
        supplier: request.supplier.as_str().to_string(),
        query: request.query.trim().to_string(),
        page_size,
        duration_ms,
        timestamp: Utc::now().to_rfc3339(),
        fallback,
      },
    }
  }

  fn page_size(&self, request: &SearchRequest) -> usize {
    let requested = request
      .page_size
      .unwrap_or(self.config.default_page_size)
      .max(1);
    requested.min(self.config.max_page_size) as usize
  }

  /// One un-retried pass over the ladder.
  async fn run_ladder(
    &self,
    request: &SearchRequest,
    page_size: usize,
  ) -> Result<LadderOutcome, StoreError> {
    let supplier = request.supplier;
    let term = request.query.trim().to_string();
    let cursor = request.cursor.as_ref().and_then(SearchCursor::parse);

    // A cursor resumes its exact step; no merging across steps.
    if let Some(cursor) = cursor {
      let outcome = self
        .run_step(supplier, cursor.step, &term, Some(&cursor.id), page_size)
        .await?;
      return self.with_live_fallback(request, outcome).await;
    }

    if term.chars().count() < 2 {
      let outcome = self
        .run_step(supplier, SearchStep::Recent, &term, None, page_size)
        .await?;
      return self.with_live_fallback(request, outcome).await;
    }

    // SKU prefix first; a strong exact-prefix page short-circuits
    // the fuzzy step entirely.
    let sku = self
      .run_step(supplier, SearchStep::Sku, &term, None, page_size)
      .await?;
    let strong = page_size.min(self.config.strong_match_threshold as usize);
    if sku.items.len() >= strong {
      return Ok(sku);
    }

    let fuzzy = self
      .run_step(supplier, SearchStep::Fuzzy, &term, None, page_size)
      .await?;
    let merged = merge_steps(sku, fuzzy, page_size);
    self.with_live_fallback(request, merged).await
  }

  /// Fetch one page for one step. Requests one row beyond the page
  /// to detect whether a continuation cursor is warranted.
  async fn run_step(
    &self,
    supplier: SupplierKey,
    step: SearchStep,
    term: &str,
    before: Option<&Value>,
    page_size: usize,
  ) -> Result<LadderOutcome, StoreError> {
    let fetch = page_size + 1;
    let rows = match step {
      SearchStep::Recent => self.store.recent(supplier, before, fetch).await?,
      SearchStep::Sku => {
        let columns = self.resolve_fields(supplier, FieldKind::Sku).await?;
        if columns.is_empty() {
          Vec::new()
        } else {
          self
            .store
            .by_sku_prefix(supplier, &columns, term, before, fetch)
            .await?
        }
      }
      SearchStep::Fuzzy => {
        let columns = self.resolve_fields(supplier, FieldKind::Description).await?;
        if columns.is_empty() {
          Vec::new()
        } else {
          self
            .store
            .by_description(supplier, &columns, term, before, fetch)
            .await?
        }
      }
    };

    let has_more = rows.len() > page_size;
    let mut items: Vec<Value> = rows.into_iter().take(page_size).collect();
    for item in &mut items {
      tag_item(item, SOURCE_CACHE, 0);
    }

    let next_cursor = if has_more {
      items
        .last()
        .and_then(|item| item.get("id"))
        .cloned()
        .map(|id| SearchCursor::new(step, id))
    } else {
      None
    };

    Ok(LadderOutcome {
      items,
      source_step: step.as_str().to_string(),
      next_cursor,
      fallback: false,
    })
  }

  /// Zero cached items triggers the supplier's live catalog, even
  /// for the empty-query RECENT step. Live failures are swallowed;
  /// the cached outcome stands.
  async fn with_live_fallback(
    &self,
    request: &SearchRequest,
    outcome: LadderOutcome,
  ) -> Result<LadderOutcome, StoreError> {
    if !outcome.items.is_empty() {
      return Ok(outcome);
    }
    let Some(adapter) = self.adapters.get(&request.supplier) else {
      return Ok(outcome);
    };

    let live = adapter
      .search_live(
        request.environment,
        request.query.trim(),
        self.config.live_page_size as usize,
      )
      .await;

    match live {
      Ok(mut items) => {
        for item in &mut items {
          tag_item(item, SOURCE_LIVE, 1);
        }
        debug!(count = items.len(), "live catalog fallback served");
        Ok(LadderOutcome {
          items,
          source_step: STEP_LIVE_FALLBACK.to_string(),
          next_cursor: None,
          fallback: true,
        })
      }
      Err(err) => {
        warn!(error = %err, "live catalog fallback failed");
        Ok(outcome)
      }
    }
  }

  /// Resolve loose configured field names against the supplier's
  /// actual columns, caching the answer.
  async fn resolve_fields(
    &self,
    supplier: SupplierKey,
    kind: FieldKind,
  ) -> Result<Vec<String>, StoreError> {
    if let Some(columns) = self.fields.resolved.lock().await.get(&(supplier, kind)) {
      return Ok(columns.clone());
    }

    let sample = self.store.sample_row(supplier).await?;
    let candidates = match kind {
      FieldKind::Sku => &self.config.sku_fields,
      FieldKind::Description => &self.config.description_fields,
    };
    let resolved = match sample.as_ref().and_then(Value::as_object) {
      Some(row) => resolve_columns(row.keys(), candidates, kind),
      None => Vec::new(),
    };

    debug!(
      supplier = supplier.as_str(),
      kind = ?kind,
      columns = ?resolved,
      "resolved search columns"
    );
    self
      .fields
      .resolved
      .lock()
      .await
      .insert((supplier, kind), resolved.clone());
    Ok(resolved)
  }
}

/// Match configured candidates against actual column names on their
/// alphanumeric-normalized forms. Description candidates that match
/// nothing fall back to a name heuristic; SKU candidates do not.
fn resolve_columns<'a>(
  columns: impl Iterator<Item = &'a String> + Clone,
  candidates: &[String],
  kind: FieldKind,
) -> Vec<String> {
  let mut resolved: Vec<String> = Vec::new();
  for candidate in candidates {
    let normalized = normalize_field(candidate);
    if let Some(actual) = columns
      .clone()
      .find(|column| normalize_field(column) == normalized)
    {
      if !resolved.contains(actual) {
        resolved.push(actual.clone());
      }
    }
  }

  if resolved.is_empty() && kind == FieldKind::Description {
    for column in columns {
      let normalized = normalize_field(column);
      if ["description", "family", "name", "title"]
        .iter()
        .any(|hint| normalized.contains(hint))
      {
        resolved.push(column.clone());
      }
    }
  }
  resolved
}

/// Lowercased alphanumerics only, so `item_number` matches
/// `itemNumber`.
fn normalize_field(name: &str) -> String {
  name
    .chars()
    .filter(|c| c.is_ascii_alphanumeric())
    .collect::<String>()
    .to_lowercase()
}

/// Merge SKU hits ahead of fuzzy hits, deduplicating by row id, and
/// cap at the page size. A page both steps fed is labelled SKU+FUZZY;
/// a page only one step fed keeps that step's label. The SKU step's
/// cursor wins when both pages have more.
fn merge_steps(sku: LadderOutcome, fuzzy: LadderOutcome, page_size: usize) -> LadderOutcome {
  let sku_hit = !sku.items.is_empty();
  let fuzzy_hit = !fuzzy.items.is_empty();

  let mut seen: HashSet<String> = HashSet::new();
  let mut items = Vec::new();

  for item in sku.items.into_iter().chain(fuzzy.items) {
    let key = item
      .get("id")
      .map(Value::to_string)
      .unwrap_or_else(|| item.to_string());
    if seen.insert(key) {
      items.push(item);
    }
    if items.len() == page_size {
      break;
    }
  }

  let source_step = match (sku_hit, fuzzy_hit) {
    (true, true) => STEP_SKU_FUZZY.to_string(),
    (false, true) => SearchStep::Fuzzy.as_str().to_string(),
    _ => SearchStep::Sku.as_str().to_string(),
  };

  LadderOutcome {
    items,
    source_step,
    next_cursor: sku.next_cursor.or(fuzzy.next_cursor),
    fallback: false,
  }
}

/// Stamp provenance onto a result row. Live rows carry the higher
/// priority so they sort ahead of cached rows when a caller merges
/// pages client-side.
fn tag_item(item: &mut Value, source: &str, priority: i64) {
  if let Some(object) = item.as_object_mut() {
    object.insert("_source".to_string(), json!(source));
    object.insert("_priority".to_string(), json!(priority));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn outcome(items: Vec<Value>, step: SearchStep, cursor: Option<SearchCursor>) -> LadderOutcome {
    LadderOutcome {
      items,
      source_step: step.as_str().to_string(),
      next_cursor: cursor,
      fallback: false,
    }
  }

  #[test]
  fn field_resolution_is_normalization_insensitive() {
    let columns = vec![
      "id".to_string(),
      "item_number".to_string(),
      "product_description".to_string(),
    ];
    let resolved = resolve_columns(
      columns.iter(),
      &["itemNumber".to_string()],
      FieldKind::Sku,
    );
    assert_eq!(resolved, vec!["item_number".to_string()]);
  }

  #[test]
  fn unresolved_sku_fields_stay_empty_but_descriptions_use_heuristic() {
    let columns = vec!["id".to_string(), "family_text".to_string()];
    let sku = resolve_columns(columns.iter(), &["sku".to_string()], FieldKind::Sku);
    assert!(sku.is_empty());

    let desc = resolve_columns(
      columns.iter(),
      &["productDescription".to_string()],
      FieldKind::Description,
    );
    assert_eq!(desc, vec!["family_text".to_string()]);
  }

  #[test]
  fn merge_prefers_sku_and_dedups_by_id() {
    let sku_items = vec![json!({"id": 3, "sku": "A"}), json!({"id": 2, "sku": "B"})];
    let fuzzy_items = vec![json!({"id": 2, "sku": "B"}), json!({"id": 1, "sku": "C"})];
    let merged = merge_steps(
      outcome(sku_items, SearchStep::Sku, None),
      outcome(fuzzy_items, SearchStep::Fuzzy, None),
      25,
    );
    assert_eq!(merged.items.len(), 3);
    assert_eq!(merged.items[0]["id"], json!(3));
    assert_eq!(merged.source_step, "SKU+FUZZY");
  }

  #[test]
  fn merge_labels_follow_contributing_steps() {
    let fuzzy_only = merge_steps(
      outcome(vec![], SearchStep::Sku, None),
      outcome(vec![json!({"id": 7})], SearchStep::Fuzzy, None),
      25,
    );
    assert_eq!(fuzzy_only.source_step, "FUZZY");

    let sku_only = merge_steps(
      outcome(vec![json!({"id": 8})], SearchStep::Sku, None),
      outcome(vec![], SearchStep::Fuzzy, None),
      25,
    );
    assert_eq!(sku_only.source_step, "SKU");

    let empty = merge_steps(
      outcome(vec![], SearchStep::Sku, None),
      outcome(vec![], SearchStep::Fuzzy, None),
      25,
    );
    assert_eq!(empty.source_step, "SKU");
  }

  #[test]
  fn merge_caps_at_page_size() {
    let sku_items = (0..20).map(|i| json!({"id": 100 - i})).collect();
    let fuzzy_items = (0..20).map(|i| json!({"id": 50 - i})).collect();
    let merged = merge_steps(
      outcome(sku_items, SearchStep::Sku, None),
      outcome(fuzzy_items, SearchStep::Fuzzy, None),
      25,
    );
    assert_eq!(merged.items.len(), 25);
  }

  #[test]
  fn retry_delays_double_and_cap() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_millis(500));
    assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(5), Duration::from_secs(5));
  }

  #[test]
  fn tagging_stamps_source_and_priority() {
    let mut item = json!({"id": 1});
    tag_item(&mut item, SOURCE_LIVE, 1);
    assert_eq!(item["_source"], json!("live"));
    assert_eq!(item["_priority"], json!(1));
  }
}
