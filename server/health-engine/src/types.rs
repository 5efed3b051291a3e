//! Core types for the health engine (JSON contracts + internal models).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConfigOverrides;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// One inbound request line from stdin. The data fields stay raw `Value`s:
/// the host sends whatever its telemetry layer produced, and the validator
/// is the component that decides what survives. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthRequest {
  #[serde(default)]
  pub entries: Value,
  #[serde(default)]
  pub history: Value,
  #[serde(default)]
  pub maintenance: Value,
  #[serde(default)]
  pub config: Option<ConfigOverrides>,
}

// ---------------------------------------------------------------------------
// Severity (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Ok,
  Warn,
  Crit,
  Unknown,
}

impl Severity {
  /// Map an arbitrary severity tag onto the canonical set. Total function:
  /// anything outside {ok, warn, crit} (after trim + lowercase) is Unknown.
  pub fn from_raw(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "ok" => Self::Ok,
      "warn" => Self::Warn,
      "crit" => Self::Crit,
      _ => Self::Unknown,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Ok => "ok",
      Self::Warn => "warn",
      Self::Crit => "crit",
      Self::Unknown => "unknown",
    }
  }
}

// ---------------------------------------------------------------------------
// Internal validated models
// ---------------------------------------------------------------------------

/// One time-series sample: epoch-ms timestamp and reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
  pub t: i64,
  pub v: f64,
}

/// A discrete fault flag from onboard diagnostics.
#[derive(Debug, Clone)]
pub struct DtcEntry {
  pub key: String,
  pub title: String,
  pub severity: Severity,
  pub category: String,
  pub timestamp_ms: Option<i64>,
  pub code: String,
}

/// A continuously sampled sensor metric with a recent time series. Gaps and
/// jitter in the series are expected; only time-ascending order is assumed.
#[derive(Debug, Clone)]
pub struct LiveEntry {
  pub key: String,
  pub title: String,
  pub severity: Severity,
  pub category: String,
  pub timestamp_ms: Option<i64>,
  pub value: Option<f64>,
  pub unit: String,
  pub series: Vec<Sample>,
}

/// A validated diagnostic observation. Unknown kinds are rejected during
/// validation; every calculator matches exhaustively on the two variants.
#[derive(Debug, Clone)]
pub enum Entry {
  Dtc(DtcEntry),
  Live(LiveEntry),
}

impl Entry {
  pub fn timestamp_ms(&self) -> Option<i64> {
    match self {
      Self::Dtc(d) => d.timestamp_ms,
      Self::Live(l) => l.timestamp_ms,
    }
  }
}

/// Aggregate behavioral record. All fields are sanitized on ingestion:
/// ratios clamped to 0..1, trend to -1..1, counts floored at 0.
#[derive(Debug, Clone, Default)]
pub struct History {
  pub clean_session_streak: u32,
  pub recent_session_count: u32,
  pub uptime_ratio: f64,
  pub sensor_coverage: f64,
  pub harsh_event_count: u32,
  pub efficiency_trend: f64,
  pub dtc_history_days: u32,
}

/// A pending or deferred service item.
#[derive(Debug, Clone)]
pub struct MaintenanceItem {
  pub label: String,
  pub severity: Severity,
  pub overdue_days: u32,
  pub category: String,
  pub estimated_cost: f64,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit, camelCase for the dashboard)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorKind {
  Dtc,
  Live,
  Maintenance,
  Driving,
  Bonus,
}

/// A labeled, signed piece of the score delta from 100. Penalties carry
/// negative deltas, bonuses positive ones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
  pub label: String,
  pub kind: ContributorKind,
  pub severity: Severity,
  pub delta: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit: Option<String>,
  pub volatile: bool,
  pub sustained: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub overdue_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyBreakdown {
  pub dtc: f64,
  pub live: f64,
  pub maintenance: f64,
  pub driving: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusBreakdown {
  pub recovery_bonus: f64,
  pub efficiency_bonus: f64,
}

/// Capped penalty and bonus subtotals by category.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
  pub penalties: PenaltyBreakdown,
  pub bonuses: BonusBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecPriority {
  High,
  Medium,
  Low,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
  pub priority: RecPriority,
  pub action: String,
  pub rationale: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheUtilization {
  /// Cumulative engine-lifetime volatility cache counters.
  pub hits: u64,
  pub misses: u64,
  /// Hit ratio for this call's lookups only (0 when none were made).
  pub hit_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
  pub total_entries: usize,
  pub valid_entries: usize,
  pub discarded_entries: usize,
  /// True when the entries input was not an array at all.
  pub malformed_entries_input: bool,
  pub maintenance_items: usize,
  pub discarded_maintenance: usize,
  pub elapsed_ms: f64,
  pub cache_utilization: CacheUtilization,
  pub band_color: String,
  pub band_priority: u8,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// The full scoring result. Field names are the de facto contract the
/// dashboard renders; keep them stable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
  pub score: u8,
  pub confidence: u8,
  pub contributors: Vec<Contributor>,
  pub band: String,
  pub breakdown: Breakdown,
  pub recommendations: Vec<Recommendation>,
  pub metadata: ReportMetadata,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for input lines that are not valid JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
    }
  }
}
