//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Endpoint
//! URLs, account numbers, and search tuning live here; credential
//! SECRETS never do. Config names the environment variables that
//! hold them and the credential resolver reads those at call time.

pub mod credentials;
pub mod loader;

use serde::Deserialize;

pub use credentials::{CredentialBundle, CredentialResolver, Secrets};

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the HTTP surface starts accepting requests.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and runtime defaults.
  pub service: ServiceConfig,
  /// Per-supplier, per-environment endpoint and account settings.
  pub suppliers: SuppliersConfig,
  /// Search ladder tuning.
  #[serde(default)]
  pub search: SearchConfig,
  /// Cached product index (REST row store) settings.
  pub store: StoreConfig,
  /// CRM order-record persistence settings.
  pub crm: CrmConfig,
  /// Outbound HTTP client settings.
  #[serde(default)]
  pub http: HttpConfig,
  /// Metrics export settings.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// API server bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  /// Default supplier environment when a request names none
  /// ("prod" or "sandbox").
  #[serde(default = "default_environment")]
  pub environment: String,
}

/// All three supplier integrations.
///
/// Every supplier must carry a production entry; sandbox entries are
/// optional and requests targeting a missing one are rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct SuppliersConfig {
  pub abc: SupplierEnvs,
  pub srs: SupplierEnvs,
  pub beacon: SupplierEnvs,
}

/// Environment pair for one supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierEnvs {
  pub prod: SupplierEntry,
  pub sandbox: Option<SupplierEntry>,
}

/// One supplier endpoint set.
///
/// `*_env` fields name the environment variables holding the actual
/// secrets. OAuth suppliers set the client pair; session-login
/// suppliers set the username/password pair.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierEntry {
  /// Token or login endpoint.
  pub auth_url: String,
  /// Base URL for pricing, order, and catalog calls.
  pub api_base_url: String,
  /// Env var holding the OAuth client ID.
  pub client_id_env: Option<String>,
  /// Env var holding the OAuth client secret.
  pub client_secret_env: Option<String>,
  /// Env var holding the login username.
  pub username_env: Option<String>,
  /// Env var holding the login password.
  pub password_env: Option<String>,
  /// Site identifier sent with session logins.
  pub api_site_id: Option<String>,
  /// Branch the account prices against.
  pub branch_number: Option<String>,
  /// Ship-to account number for pricing and orders.
  pub ship_to_number: Option<String>,
}

/// Search ladder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
  /// Page size when the request does not set one.
  #[serde(default = "default_page_size")]
  pub default_page_size: u32,
  /// Hard ceiling on any requested page size.
  #[serde(default = "default_max_page_size")]
  pub max_page_size: u32,
  /// Exact-prefix hits at or above which later steps are skipped.
  #[serde(default = "default_strong_match")]
  pub strong_match_threshold: u32,
  /// Live supplier catalog fallback page size.
  #[serde(default = "default_live_page_size")]
  pub live_page_size: u32,
  /// Loose SKU column names, resolved against each supplier's actual
  /// table columns at first use.
  #[serde(default = "default_sku_fields")]
  pub sku_fields: Vec<String>,
  /// Loose description column names, same resolution.
  #[serde(default = "default_description_fields")]
  pub description_fields: Vec<String>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      default_page_size: default_page_size(),
      max_page_size: default_max_page_size(),
      strong_match_threshold: default_strong_match(),
      live_page_size: default_live_page_size(),
      sku_fields: default_sku_fields(),
      description_fields: default_description_fields(),
    }
  }
}

/// Cached product index configuration.
///
/// The index is a PostgREST-style row store; one table per
/// deployment with a `supplier` discriminator column.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// REST base URL of the row store.
  pub base_url: String,
  /// Product table name.
  #[serde(default = "default_store_table")]
  pub table: String,
  /// Env var holding the store API key.
  #[serde(default = "default_store_key_env")]
  pub api_key_env: String,
}

/// CRM persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmConfig {
  /// CRM REST base URL.
  pub base_url: String,
  /// Custom object type for sales order records.
  pub order_object: String,
  /// Env var holding the CRM access token.
  #[serde(default = "default_crm_token_env")]
  pub token_env: String,
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self { timeout_seconds: default_timeout() }
  }
}

/// Metrics export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable the Prometheus `/metrics` endpoint.
  #[serde(default = "default_true")]
  pub enabled: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self { enabled: default_true() }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_environment() -> String {
  "prod".to_string()
}

fn default_true() -> bool {
  true
}

fn default_page_size() -> u32 {
  25
}

fn default_max_page_size() -> u32 {
  100
}

fn default_strong_match() -> u32 {
  20
}

fn default_live_page_size() -> u32 {
  25
}

fn default_sku_fields() -> Vec<String> {
  ["sku", "itemNumber", "itemCode", "productId"]
    .map(String::from)
    .to_vec()
}

fn default_description_fields() -> Vec<String> {
  ["description", "productDescription", "name", "family"]
    .map(String::from)
    .to_vec()
}

fn default_store_table() -> String {
  "products".to_string()
}

fn default_store_key_env() -> String {
  "PRODUCT_STORE_KEY".to_string()
}

fn default_crm_token_env() -> String {
  "CRM_ACCESS_TOKEN".to_string()
}

fn default_timeout() -> u64 {
  30
}
