//! Supplier Bridge — Entry Point
//!
//! Initializes configuration, logging, the supplier adapters, and
//! the API server. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build credential resolver (secrets stay in env vars)
//! 4. Build supplier adapters (ABC, SRS, BEACON)
//! 5. Build product store + CRM clients
//! 6. Assemble gateway, search ladder, submission pipeline
//! 7. Serve the API until SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

use supplier_bridge::adapters::api::{AbcAdapter, BeaconAdapter, SrsAdapter};
use supplier_bridge::adapters::crm::{CrmClient, TextConfirmationRenderer};
use supplier_bridge::adapters::metrics::{HealthState, MetricsRegistry};
use supplier_bridge::adapters::rest::{self, AppState};
use supplier_bridge::adapters::store::PostgrestStore;
use supplier_bridge::config::{self, CredentialResolver};
use supplier_bridge::domain::{Environment, SupplierKey};
use supplier_bridge::ports::supplier::SupplierAdapter;
use supplier_bridge::usecases::{
  AdapterMap, FieldCache, RetryPolicy, SearchLadder, SubmissionPipeline, SupplierGateway,
};

#[tokio::main]
async fn main() -> Result<()> {
  // ── 1. Load configuration from config.toml ──────────────
  let config = config::loader::load_config("config.toml")
    .context("Failed to load configuration")?;

  // ── 2. Initialize structured JSON logging ───────────────
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
    )
    .json()
    .init();

  info!(
    name = %config.service.name,
    version = env!("CARGO_PKG_VERSION"),
    environment = %config.service.environment,
    "Starting supplier bridge"
  );

  let timeout = Duration::from_secs(config.http.timeout_seconds);
  let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

  // ── 3. Credential resolver (secrets stay in env vars) ───
  let resolver = Arc::new(CredentialResolver::new(&config)?);

  // ── 4. Supplier adapters ────────────────────────────────
  let mut adapters: AdapterMap = HashMap::new();
  adapters.insert(
    SupplierKey::Abc,
    Arc::new(AbcAdapter::new(Arc::clone(&resolver), timeout)?) as Arc<dyn SupplierAdapter>,
  );
  adapters.insert(
    SupplierKey::Srs,
    Arc::new(SrsAdapter::new(Arc::clone(&resolver), timeout)?) as Arc<dyn SupplierAdapter>,
  );
  adapters.insert(
    SupplierKey::Beacon,
    Arc::new(BeaconAdapter::new(Arc::clone(&resolver), timeout)?) as Arc<dyn SupplierAdapter>,
  );

  // ── 5. Product store + CRM clients ──────────────────────
  let store_key = std::env::var(&config.store.api_key_env).unwrap_or_default();
  let store = Arc::new(PostgrestStore::new(
    &config.store.base_url,
    &config.store.table,
    store_key,
    timeout,
  )?);

  let crm_token = std::env::var(&config.crm.token_env).unwrap_or_default();
  let crm = Arc::new(CrmClient::new(
    &config.crm.base_url,
    &config.crm.order_object,
    crm_token,
    timeout,
  )?);

  // ── 6. Usecases ─────────────────────────────────────────
  let metrics = Arc::new(MetricsRegistry::new()?);
  let default_environment = config.service.environment.parse::<Environment>()?;

  let gateway = Arc::new(SupplierGateway::new(
    adapters.clone(),
    default_environment,
    Arc::clone(&metrics),
  ));
  let ladder = Arc::new(SearchLadder::new(
    store,
    adapters.clone(),
    Arc::new(FieldCache::new()),
    RetryPolicy::default(),
    config.search.clone(),
    Arc::clone(&metrics),
  ));
  let pipeline = Arc::new(SubmissionPipeline::new(
    crm,
    adapters,
    Arc::new(TextConfirmationRenderer),
    Arc::clone(&metrics),
  ));

  let health = HealthState::new();
  health.mark_ready();

  // ── 7. Serve until SIGINT ───────────────────────────────
  let state = AppState {
    gateway,
    ladder,
    pipeline,
    metrics,
    health: health.clone(),
    metrics_enabled: config.metrics.enabled,
  };
  let bind_address = config.service.bind_address.clone();
  let server_rx = shutdown_tx.subscribe();
  let server = tokio::spawn(async move { rest::serve(state, &bind_address, server_rx).await });

  signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
  info!("SIGINT received, initiating graceful shutdown");

  let _ = shutdown_tx.send(());
  let _ = tokio::time::timeout(Duration::from_secs(10), server).await;

  info!("Shutdown complete");
  Ok(())
}
