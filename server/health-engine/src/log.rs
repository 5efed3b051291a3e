//! Level-gated diagnostic logging facade.
//!
//! Components log through `DiagLog` instead of calling `tracing` directly so
//! the merged per-call config controls verbosity. The binary installs a
//! `tracing_subscriber` writing to stderr; stdout stays a clean JSON stream.

use serde::Deserialize;

/// Diagnostic log level, ordered from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Off,
  Error,
  Warn,
  Info,
  Debug,
}

/// Facade over the `tracing` macros, gated by the configured level.
#[derive(Debug, Clone, Copy)]
pub struct DiagLog {
  level: LogLevel,
}

impl DiagLog {
  pub fn new(level: LogLevel) -> Self {
    Self { level }
  }

  pub fn enabled(&self, at: LogLevel) -> bool {
    at != LogLevel::Off && at <= self.level
  }

  pub fn error(&self, msg: &str) {
    if self.enabled(LogLevel::Error) {
      tracing::error!(target: "health_engine", "{msg}");
    }
  }

  pub fn warn(&self, msg: &str) {
    if self.enabled(LogLevel::Warn) {
      tracing::warn!(target: "health_engine", "{msg}");
    }
  }

  pub fn info(&self, msg: &str) {
    if self.enabled(LogLevel::Info) {
      tracing::info!(target: "health_engine", "{msg}");
    }
  }

  pub fn debug(&self, msg: &str) {
    if self.enabled(LogLevel::Debug) {
      tracing::debug!(target: "health_engine", "{msg}");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn levels_order_from_silent_to_verbose() {
    assert!(LogLevel::Off < LogLevel::Error);
    assert!(LogLevel::Error < LogLevel::Warn);
    assert!(LogLevel::Warn < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Debug);
  }

  #[test]
  fn gating_respects_configured_level() {
    let log = DiagLog::new(LogLevel::Warn);
    assert!(log.enabled(LogLevel::Error));
    assert!(log.enabled(LogLevel::Warn));
    assert!(!log.enabled(LogLevel::Info));
    assert!(!log.enabled(LogLevel::Debug));
  }

  #[test]
  fn off_silences_everything() {
    let log = DiagLog::new(LogLevel::Off);
    assert!(!log.enabled(LogLevel::Error));
    assert!(!log.enabled(LogLevel::Off));
  }
}
