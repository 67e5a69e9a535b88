//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, SupplierEntry};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    service = %config.service.name,
    environment = %config.service.environment,
    bind = %config.service.bind_address,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service.name must not be empty"
  );
  anyhow::ensure!(
    matches!(config.service.environment.as_str(), "prod" | "production" | "sandbox"),
    "service.environment must be 'prod' or 'sandbox', got '{}'",
    config.service.environment
  );

  validate_supplier("abc", &config.suppliers.abc.prod, true)?;
  validate_supplier("srs", &config.suppliers.srs.prod, true)?;
  validate_supplier("beacon", &config.suppliers.beacon.prod, false)?;
  if let Some(entry) = &config.suppliers.abc.sandbox {
    validate_supplier("abc sandbox", entry, true)?;
  }
  if let Some(entry) = &config.suppliers.srs.sandbox {
    validate_supplier("srs sandbox", entry, true)?;
  }
  if let Some(entry) = &config.suppliers.beacon.sandbox {
    validate_supplier("beacon sandbox", entry, false)?;
  }

  // Search validation
  anyhow::ensure!(
    config.search.default_page_size > 0
      && config.search.default_page_size <= config.search.max_page_size,
    "search.default_page_size must be in (0, {}], got {}",
    config.search.max_page_size,
    config.search.default_page_size
  );
  anyhow::ensure!(
    config.search.max_page_size <= 100,
    "search.max_page_size must not exceed 100, got {}",
    config.search.max_page_size
  );
  anyhow::ensure!(
    config.search.strong_match_threshold > 0,
    "search.strong_match_threshold must be positive"
  );

  // Store and CRM validation
  anyhow::ensure!(
    !config.store.base_url.is_empty(),
    "store.base_url must not be empty"
  );
  anyhow::ensure!(
    !config.store.table.is_empty(),
    "store.table must not be empty"
  );
  anyhow::ensure!(
    !config.crm.base_url.is_empty(),
    "crm.base_url must not be empty"
  );
  anyhow::ensure!(
    !config.crm.order_object.is_empty(),
    "crm.order_object must not be empty"
  );

  anyhow::ensure!(
    config.http.timeout_seconds > 0,
    "http.timeout_seconds must be positive"
  );

  Ok(())
}

/// Validate one supplier endpoint set.
///
/// OAuth suppliers must name a client ID/secret env pair; session
/// suppliers must name username/password env vars plus a site
/// identifier.
fn validate_supplier(label: &str, entry: &SupplierEntry, oauth: bool) -> Result<()> {
  anyhow::ensure!(
    !entry.auth_url.is_empty(),
    "supplier {} has empty auth_url",
    label
  );
  anyhow::ensure!(
    !entry.api_base_url.is_empty(),
    "supplier {} has empty api_base_url",
    label
  );
  if oauth {
    anyhow::ensure!(
      entry.client_id_env.is_some() && entry.client_secret_env.is_some(),
      "supplier {} needs client_id_env and client_secret_env",
      label
    );
  } else {
    anyhow::ensure!(
      entry.username_env.is_some() && entry.password_env.is_some(),
      "supplier {} needs username_env and password_env",
      label
    );
    anyhow::ensure!(
      entry.api_site_id.is_some(),
      "supplier {} needs api_site_id",
      label
    );
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base_toml() -> String {
    r#"
[service]
name = "supplier-bridge"

[suppliers.abc.prod]
auth_url = "https://auth.abc.example/oauth/token"
api_base_url = "https://api.abc.example"
client_id_env = "ABC_CLIENT_ID"
client_secret_env = "ABC_CLIENT_SECRET"
branch_number = "461"
ship_to_number = "2063975-2"

[suppliers.srs.prod]
auth_url = "https://auth.srs.example/token"
api_base_url = "https://api.srs.example"
client_id_env = "SRS_CLIENT_ID"
client_secret_env = "SRS_CLIENT_SECRET"

[suppliers.beacon.prod]
auth_url = "https://beacon.example/v1/rest/account/login"
api_base_url = "https://beacon.example"
username_env = "BEACON_USERNAME"
password_env = "BEACON_PASSWORD"
api_site_id = "homeSite"

[store]
base_url = "https://rows.example/rest/v1"

[crm]
base_url = "https://crm.example"
order_object = "sales_orders"
"#
    .to_string()
  }

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_parses_with_defaults() {
    let config: AppConfig = toml::from_str(&base_toml()).unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.service.environment, "prod");
    assert_eq!(config.search.default_page_size, 25);
    assert_eq!(config.search.max_page_size, 100);
    assert_eq!(config.store.table, "products");
    assert!(config.metrics.enabled);
  }

  #[test]
  fn test_oauth_supplier_missing_secret_env_rejected() {
    let toml_str = base_toml().replace("client_secret_env = \"ABC_CLIENT_SECRET\"\n", "");
    let config: AppConfig = toml::from_str(&toml_str).unwrap();
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("client_secret_env"));
  }

  #[test]
  fn test_session_supplier_missing_site_id_rejected() {
    let toml_str = base_toml().replace("api_site_id = \"homeSite\"\n", "");
    let config: AppConfig = toml::from_str(&toml_str).unwrap();
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("api_site_id"));
  }

  #[test]
  fn test_bad_environment_rejected() {
    let toml_str = base_toml().replace(
      "name = \"supplier-bridge\"",
      "name = \"supplier-bridge\"\nenvironment = \"staging\"",
    );
    let config: AppConfig = toml::from_str(&toml_str).unwrap();
    assert!(validate_config(&config).is_err());
  }
}
