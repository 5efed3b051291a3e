//! Structured error types for the health engine.
//!
//! Input-shape problems never become errors (the validator filters them);
//! the only fallible step is merged-config validation, and the orchestrator
//! resolves that into the degraded report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },
}

impl EngineError {
  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}
