//! Health State - Liveness and Readiness Probes
//!
//! Shared state behind the `/live` and `/ready` endpoints on the API
//! server. Liveness is the process itself; readiness flips on once
//! configuration is loaded and all adapters are wired.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
  ready: Arc<AtomicBool>,
}

impl HealthState {
  /// Create a new health state (not ready until wiring completes).
  pub fn new() -> Self {
    Self {
      ready: Arc::new(AtomicBool::new(false)),
    }
  }

  /// Mark the service ready to serve traffic.
  pub fn mark_ready(&self) {
    self.ready.store(true, Ordering::Relaxed);
  }

  pub fn is_ready(&self) -> bool {
    self.ready.load(Ordering::Relaxed)
  }
}

impl Default for HealthState {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn readiness_flips_once_marked() {
    let health = HealthState::new();
    assert!(!health.is_ready());
    health.mark_ready();
    assert!(health.is_ready());
    assert!(health.clone().is_ready());
  }
}
