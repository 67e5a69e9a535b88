//! REST Surface - Inbound API Server
//!
//! axum 0.7 router for the three entry points (supplier dispatch,
//! product search, order submission) plus liveness, readiness, and
//! Prometheus metrics. Handlers translate wire shapes and statuses;
//! all behavior lives in the usecases layer.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::crm::CrmClient;
use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::adapters::store::PostgrestStore;
use crate::domain::{Environment, Order, SupplierKey};
use crate::usecases::{
  DispatchRequest, SearchLadder, SearchRequest, SubmissionPipeline, SupplierGateway,
};

/// Everything the handlers need, shared across requests.
#[derive(Clone)]
pub struct AppState {
  pub gateway: Arc<SupplierGateway>,
  pub ladder: Arc<SearchLadder<PostgrestStore>>,
  pub pipeline: Arc<SubmissionPipeline<CrmClient>>,
  pub metrics: Arc<MetricsRegistry>,
  pub health: HealthState,
  /// Expose `/metrics` only when enabled in config.
  pub metrics_enabled: bool,
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
  let mut router = Router::new()
    .route("/api/supplier/dispatch", post(dispatch))
    .route("/api/products/search", get(search))
    .route("/api/orders/submit", post(submit))
    .route("/live", get(liveness))
    .route("/ready", get(readiness));
  if state.metrics_enabled {
    router = router.route("/metrics", get(metrics));
  }
  router.with_state(state)
}

/// Serve the router until shutdown is signalled.
pub async fn serve(
  state: AppState,
  bind_address: &str,
  mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
  let app = router(state);
  let listener = tokio::net::TcpListener::bind(bind_address).await?;
  info!(address = bind_address, "API server started");

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      let _ = shutdown_rx.recv().await;
    })
    .await?;
  Ok(())
}

#[derive(Debug, Deserialize)]
struct DispatchBody {
  #[serde(alias = "supplierKey", alias = "supplier_key")]
  supplier: String,
  #[serde(default, alias = "env")]
  environment: Option<String>,
  action: String,
  #[serde(default)]
  payload: Value,
}

async fn dispatch(
  State(state): State<AppState>,
  Json(body): Json<DispatchBody>,
) -> impl IntoResponse {
  let response = state
    .gateway
    .dispatch(DispatchRequest {
      supplier_key: body.supplier,
      environment: body.environment,
      action: body.action,
      payload: body.payload,
    })
    .await;

  let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  (status, Json(response.body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
  supplier: String,
  #[serde(default)]
  q: Option<String>,
  #[serde(default)]
  page_size: Option<u32>,
  #[serde(default)]
  cursor: Option<String>,
  #[serde(default, alias = "env")]
  environment: Option<String>,
}

async fn search(
  State(state): State<AppState>,
  Query(params): Query<SearchParams>,
) -> impl IntoResponse {
  let Ok(supplier) = params.supplier.parse::<SupplierKey>() else {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({"success": false, "error": "unknown supplier"})),
    );
  };
  let environment = match parse_environment(params.environment.as_deref()) {
    Ok(environment) => environment,
    Err(response) => return response,
  };

  let request = SearchRequest {
    supplier,
    environment,
    query: params.q.unwrap_or_default(),
    page_size: params.page_size,
    cursor: params.cursor.map(Value::String),
  };

  let response = state.ladder.search(&request).await;
  (
    StatusCode::OK,
    Json(serde_json::to_value(&response).unwrap_or_else(|_| json!({"success": false}))),
  )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
  supplier: String,
  #[serde(default, alias = "deal_id")]
  deal_id: Option<String>,
  #[serde(default, alias = "env")]
  environment: Option<String>,
  #[serde(flatten)]
  payload: Value,
}

async fn submit(
  State(state): State<AppState>,
  Json(body): Json<SubmitBody>,
) -> impl IntoResponse {
  let Ok(supplier) = body.supplier.parse::<SupplierKey>() else {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({"success": false, "error": "unknown supplier"})),
    );
  };
  let environment = match parse_environment(body.environment.as_deref()) {
    Ok(environment) => environment,
    Err(response) => return response,
  };
  let order = match Order::from_payload(supplier, &body.payload) {
    Ok(order) => order,
    Err(err) => {
      return (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": err.to_string()})),
      )
    }
  };

  let receipt = state
    .pipeline
    .submit(order, body.deal_id.as_deref().unwrap_or(""), environment)
    .await;
  (
    StatusCode::OK,
    Json(serde_json::to_value(&receipt).unwrap_or_else(|_| json!({"success": false}))),
  )
}

fn parse_environment(
  raw: Option<&str>,
) -> Result<Option<Environment>, (StatusCode, Json<Value>)> {
  match raw {
    None => Ok(None),
    Some(value) => value.parse::<Environment>().map(Some).map_err(|err| {
      (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": err.to_string()})),
      )
    }),
  }
}

async fn liveness() -> impl IntoResponse {
  (StatusCode::OK, "OK")
}

async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
  if state.health.is_ready() {
    (StatusCode::OK, "READY")
  } else {
    (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
  }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
  state.metrics.render()
}
