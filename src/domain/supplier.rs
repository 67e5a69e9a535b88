//! Supplier Identity - Closed Key, Environment, and Action Enums
//!
//! The fixed set of three building-materials suppliers and the
//! actions the gateway routes. Unknown keys are rejected at parse
//! time, before any adapter is touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SupplierError;

/// The three supported suppliers. Closed on purpose: the system
/// serves a single organization's fixed supplier set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupplierKey {
  /// ABC Supply — OAuth2 client-credentials via HTTP Basic.
  Abc,
  /// SRS Distribution — OAuth2 client-credentials via form body.
  Srs,
  /// Beacon Building Products — username/password cookie session.
  Beacon,
}

impl SupplierKey {
  /// All known suppliers, for listing in error messages.
  pub const ALL: [SupplierKey; 3] = [Self::Abc, Self::Srs, Self::Beacon];

  /// Canonical uppercase name used in logs and responses.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Abc => "ABC",
      Self::Srs => "SRS",
      Self::Beacon => "BEACON",
    }
  }

  /// Lowercase form used as the product-cache row filter.
  pub fn filter_str(&self) -> &'static str {
    match self {
      Self::Abc => "abc",
      Self::Srs => "srs",
      Self::Beacon => "beacon",
    }
  }
}

impl fmt::Display for SupplierKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SupplierKey {
  type Err = SupplierError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw.trim().to_uppercase().as_str() {
      "ABC" => Ok(Self::Abc),
      "SRS" => Ok(Self::Srs),
      "BEACON" => Ok(Self::Beacon),
      other => Err(SupplierError::InvalidRequest(format!(
        "unknown supplier '{other}'; available: ABC, SRS, BEACON"
      ))),
    }
  }
}

/// Supplier environment. When a request omits it, the credential
/// resolver falls back to the process-wide master environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  Sandbox,
  Prod,
}

impl Environment {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Sandbox => "sandbox",
      Self::Prod => "prod",
    }
  }
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Environment {
  type Err = SupplierError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw.trim().to_lowercase().as_str() {
      "sandbox" => Ok(Self::Sandbox),
      "prod" | "production" => Ok(Self::Prod),
      other => Err(SupplierError::InvalidRequest(format!(
        "unknown environment '{other}'; expected sandbox or prod"
      ))),
    }
  }
}

/// The actions the gateway routes to an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
  Login,
  GetPricing,
  Order,
}

impl Action {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Login => "login",
      Self::GetPricing => "getPricing",
      Self::Order => "order",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Action {
  type Err = SupplierError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw.trim().to_lowercase().as_str() {
      "login" => Ok(Self::Login),
      "getpricing" => Ok(Self::GetPricing),
      "order" => Ok(Self::Order),
      other => Err(SupplierError::InvalidRequest(format!(
        "unknown action '{other}'; available: login, getPricing, order"
      ))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn supplier_parse_is_case_insensitive() {
    assert_eq!("abc".parse::<SupplierKey>().unwrap(), SupplierKey::Abc);
    assert_eq!(" Beacon ".parse::<SupplierKey>().unwrap(), SupplierKey::Beacon);
  }

  #[test]
  fn unknown_supplier_is_invalid_request() {
    let err = "XYZ".parse::<SupplierKey>().unwrap_err();
    assert_eq!(err.status_code(), 400);
  }

  #[test]
  fn action_accepts_camel_case() {
    assert_eq!("getPricing".parse::<Action>().unwrap(), Action::GetPricing);
    assert_eq!("LOGIN".parse::<Action>().unwrap(), Action::Login);
  }
}
