//! Credential Resolver - Per-Supplier, Per-Environment Secrets
//!
//! Maps a (supplier, environment) pair onto its endpoint entry and
//! reads the secrets out of the environment variables the entry
//! names. Secrets are resolved at call time, never cached, and never
//! logged.

use tracing::warn;

use crate::domain::{Environment, SupplierError, SupplierKey};

use super::{AppConfig, SupplierEntry};

/// Resolved credentials for one supplier call.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
  /// Endpoint set the call should target.
  pub entry: SupplierEntry,
  /// Environment the entry belongs to.
  pub environment: Environment,
  /// The actual secret material.
  pub secrets: Secrets,
}

/// Secret material per auth scheme.
#[derive(Debug, Clone)]
pub enum Secrets {
  /// OAuth2 client-credentials pair.
  OAuth { client_id: String, client_secret: String },
  /// Username/password session login.
  Login { username: String, password: String, api_site_id: String },
}

impl Secrets {
  /// True when every secret field resolved to a non-empty value.
  /// Adapters call this before touching the network.
  pub fn is_complete(&self) -> bool {
    match self {
      Secrets::OAuth { client_id, client_secret } => {
        !client_id.is_empty() && !client_secret.is_empty()
      }
      Secrets::Login { username, password, .. } => {
        !username.is_empty() && !password.is_empty()
      }
    }
  }
}

/// Resolves supplier credentials from configuration plus process
/// environment.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
  suppliers: super::SuppliersConfig,
  default_environment: Environment,
}

impl CredentialResolver {
  pub fn new(config: &AppConfig) -> Result<Self, SupplierError> {
    let default_environment = config
      .service
      .environment
      .parse::<Environment>()
      .map_err(|_| {
        SupplierError::Config(format!(
          "unknown default environment '{}'",
          config.service.environment
        ))
      })?;
    Ok(Self {
      suppliers: config.suppliers.clone(),
      default_environment,
    })
  }

  /// Resolve the entry and secrets for one call.
  ///
  /// Falls back to the service-wide default environment when the
  /// request names none. A request for a sandbox the supplier does
  /// not configure is a `Config` error, not a silent prod fallback.
  pub fn resolve(
    &self,
    supplier: SupplierKey,
    environment: Option<Environment>,
  ) -> Result<CredentialBundle, SupplierError> {
    let environment = environment.unwrap_or(self.default_environment);
    let envs = match supplier {
      SupplierKey::Abc => &self.suppliers.abc,
      SupplierKey::Srs => &self.suppliers.srs,
      SupplierKey::Beacon => &self.suppliers.beacon,
    };
    let entry = match environment {
      Environment::Prod => &envs.prod,
      Environment::Sandbox => envs.sandbox.as_ref().ok_or_else(|| {
        SupplierError::Config(format!(
          "{} has no sandbox environment configured",
          supplier.as_str()
        ))
      })?,
    };

    let secrets = Self::read_secrets(supplier, entry)?;
    Ok(CredentialBundle { entry: entry.clone(), environment, secrets })
  }

  fn read_secrets(
    supplier: SupplierKey,
    entry: &SupplierEntry,
  ) -> Result<Secrets, SupplierError> {
    match (&entry.client_id_env, &entry.client_secret_env) {
      (Some(id_var), Some(secret_var)) => {
        let client_id = read_env(supplier, id_var)?;
        let client_secret = read_env(supplier, secret_var)?;
        Ok(Secrets::OAuth { client_id, client_secret })
      }
      _ => {
        let user_var = entry.username_env.as_ref().ok_or_else(|| {
          SupplierError::Config(format!(
            "{} entry names neither an OAuth pair nor a login pair",
            supplier.as_str()
          ))
        })?;
        let pass_var = entry.password_env.as_ref().ok_or_else(|| {
          SupplierError::Config(format!(
            "{} entry has username_env but no password_env",
            supplier.as_str()
          ))
        })?;
        let username = read_env(supplier, user_var)?;
        let password = read_env(supplier, pass_var)?;
        let api_site_id = entry.api_site_id.clone().ok_or_else(|| {
          SupplierError::Config(format!("{} entry has no api_site_id", supplier.as_str()))
        })?;
        Ok(Secrets::Login { username, password, api_site_id })
      }
    }
  }
}

/// Read one secret env var. A missing or empty variable resolves to
/// an empty string with a warning naming the variable, never any
/// value; adapters reject empty secrets before any network call.
fn read_env(supplier: SupplierKey, var: &str) -> Result<String, SupplierError> {
  match std::env::var(var) {
    Ok(value) if !value.is_empty() => Ok(value),
    _ => {
      warn!(supplier = supplier.as_str(), var = var, "credential env var missing or empty");
      Ok(String::new())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{SupplierEnvs, SuppliersConfig};

  fn entry(id_env: Option<&str>, secret_env: Option<&str>) -> SupplierEntry {
    SupplierEntry {
      auth_url: "https://auth.example/token".into(),
      api_base_url: "https://api.example".into(),
      client_id_env: id_env.map(String::from),
      client_secret_env: secret_env.map(String::from),
      username_env: None,
      password_env: None,
      api_site_id: None,
      branch_number: None,
      ship_to_number: None,
    }
  }

  fn resolver(id_env: &str, secret_env: &str) -> CredentialResolver {
    let envs = || SupplierEnvs {
      prod: entry(Some(id_env), Some(secret_env)),
      sandbox: None,
    };
    CredentialResolver {
      suppliers: SuppliersConfig { abc: envs(), srs: envs(), beacon: envs() },
      default_environment: Environment::Prod,
    }
  }

  #[test]
  fn test_missing_sandbox_is_config_error() {
    let r = resolver("UNUSED_A", "UNUSED_B");
    let err = r
      .resolve(SupplierKey::Abc, Some(Environment::Sandbox))
      .unwrap_err();
    assert!(matches!(err, SupplierError::Config(_)));
    assert_eq!(err.status_code(), 400);
  }

  #[test]
  fn test_missing_env_var_resolves_empty_with_warning() {
    let r = resolver("TEST_CRED_ABSENT_ID", "TEST_CRED_ABSENT_SECRET");
    let bundle = r.resolve(SupplierKey::Srs, None).unwrap();
    assert!(!bundle.secrets.is_complete());
  }

  #[test]
  fn test_default_environment_applies_when_unset() {
    std::env::set_var("TEST_CRED_PRESENT_ID", "id");
    std::env::set_var("TEST_CRED_PRESENT_SECRET", "secret");
    let r = resolver("TEST_CRED_PRESENT_ID", "TEST_CRED_PRESENT_SECRET");
    let bundle = r.resolve(SupplierKey::Abc, None).unwrap();
    assert_eq!(bundle.environment, Environment::Prod);
    match bundle.secrets {
      Secrets::OAuth { client_id, client_secret } => {
        assert_eq!(client_id, "id");
        assert_eq!(client_secret, "secret");
      }
      _ => panic!("expected OAuth secrets"),
    }
  }
}
