//! Validate and repair untrusted inputs into canonical models.
//!
//! This module filters; it never fails. Malformed elements are discarded and
//! counted, numeric fields are clamped to their valid ranges, and a non-array
//! entries input yields an empty valid set plus a marker for metadata.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::log::DiagLog;
use crate::types::{DtcEntry, Entry, History, LiveEntry, MaintenanceItem, Sample, Severity};

/// Outcome of input validation, with discard diagnostics for metadata.
#[derive(Debug, Clone, Default)]
pub struct ValidatedInput {
  pub entries: Vec<Entry>,
  pub history: History,
  pub maintenance: Vec<MaintenanceItem>,
  pub total_entries: usize,
  pub discarded_entries: usize,
  pub malformed_entries_input: bool,
  pub discarded_maintenance: usize,
}

/// Filter raw entries/maintenance and sanitize history.
pub fn validate(
  entries: &Value,
  history: &Value,
  maintenance: &Value,
  config: &EngineConfig,
  log: &DiagLog,
) -> ValidatedInput {
  let mut out = ValidatedInput {
    history: sanitize_history(history),
    ..ValidatedInput::default()
  };

  match entries.as_array() {
    Some(raw_entries) => {
      out.total_entries = raw_entries.len();
      for raw in raw_entries {
        match parse_entry(raw, config.coerce_invalid_samples, log) {
          Some(entry) => out.entries.push(entry),
          None => out.discarded_entries += 1,
        }
      }
    }
    None => {
      out.malformed_entries_input = !entries.is_null();
      if out.malformed_entries_input {
        log.warn("entries input is not an array; scoring with no entries");
      }
    }
  }
  if out.discarded_entries > 0 {
    log.warn(&format!(
      "discarded {} malformed diagnostic entries",
      out.discarded_entries
    ));
  }

  if let Some(raw_items) = maintenance.as_array() {
    for raw in raw_items {
      match parse_maintenance_item(raw) {
        Some(item) => out.maintenance.push(item),
        None => out.discarded_maintenance += 1,
      }
    }
  }
  if out.discarded_maintenance > 0 {
    log.warn(&format!(
      "discarded {} malformed maintenance items",
      out.discarded_maintenance
    ));
  }

  out
}

/// Parse one raw entry. Structural requirements: an object, `kind` in
/// {DTC, LIVE} (case-insensitive), and a LIVE `series`, when present, must
/// be an array. Everything else is repaired with defaults.
fn parse_entry(raw: &Value, coerce_samples: bool, log: &DiagLog) -> Option<Entry> {
  let obj = raw.as_object()?;
  let kind = obj
    .get("kind")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .trim()
    .to_ascii_uppercase();

  let key = first_str(obj, &["id", "key"]);
  let title = str_field(obj, "title");
  let severity = Severity::from_raw(&str_field(obj, "severity"));
  let category = str_field(obj, "category").trim().to_ascii_lowercase();
  let timestamp_ms = num_field(obj, "timestamp").map(|t| t as i64);

  match kind.as_str() {
    "DTC" => Some(Entry::Dtc(DtcEntry {
      key,
      title,
      severity,
      category,
      timestamp_ms,
      code: str_field(obj, "code"),
    })),
    "LIVE" => {
      let series = match obj.get("series") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw_series) => parse_series(raw_series, coerce_samples, log)?,
      };
      Some(Entry::Live(LiveEntry {
        key,
        title,
        severity,
        category,
        timestamp_ms,
        value: num_field(obj, "value"),
        unit: str_field(obj, "unit"),
        series,
      }))
    }
    _ => None,
  }
}

/// A present series must be an array; a non-array series invalidates the
/// whole entry. Samples with an unreadable value are coerced to 0.0 (keeps
/// index alignment) or dropped, per config.
fn parse_series(raw: &Value, coerce_samples: bool, log: &DiagLog) -> Option<Vec<Sample>> {
  let raw_samples = raw.as_array()?;
  let mut series = Vec::with_capacity(raw_samples.len());
  let mut coerced = 0usize;

  for raw_sample in raw_samples {
    let obj = match raw_sample.as_object() {
      Some(o) => o,
      None => continue,
    };
    let t = match num_field(obj, "t") {
      Some(t) => t as i64,
      None => continue,
    };
    match num_field(obj, "v") {
      Some(v) => series.push(Sample { t, v }),
      None if coerce_samples => {
        coerced += 1;
        series.push(Sample { t, v: 0.0 });
      }
      None => {}
    }
  }

  if coerced > 0 {
    log.debug(&format!("coerced {} invalid series samples to 0", coerced));
  }
  Some(series)
}

/// Any JSON object qualifies; missing fields take defaults.
fn parse_maintenance_item(raw: &Value) -> Option<MaintenanceItem> {
  let obj = raw.as_object()?;
  Some(MaintenanceItem {
    label: str_field(obj, "label"),
    severity: Severity::from_raw(&str_field(obj, "severity")),
    overdue_days: count_field(obj, "overdueDays"),
    category: str_field(obj, "category").trim().to_ascii_lowercase(),
    estimated_cost: num_field(obj, "estimatedCost").unwrap_or(0.0).max(0.0),
  })
}

/// Clamp every history field into its valid range. A non-object history is
/// treated as empty. Raw values are never trusted.
pub fn sanitize_history(raw: &Value) -> History {
  let obj = match raw.as_object() {
    Some(o) => o,
    None => return History::default(),
  };
  History {
    clean_session_streak: count_field(obj, "cleanSessionStreak"),
    recent_session_count: count_field(obj, "recentSessionCount"),
    uptime_ratio: ratio_field(obj, "uptimeRatio"),
    sensor_coverage: ratio_field(obj, "sensorCoverage"),
    harsh_event_count: count_field(obj, "harshEventCount"),
    efficiency_trend: num_field(obj, "efficiencyTrend")
      .unwrap_or(0.0)
      .clamp(-1.0, 1.0),
    dtc_history_days: count_field(obj, "dtcHistoryDays"),
  }
}

type JsonObject = serde_json::Map<String, Value>;

fn num_field(obj: &JsonObject, key: &str) -> Option<f64> {
  obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn str_field(obj: &JsonObject, key: &str) -> String {
  obj
    .get(key)
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string()
}

fn first_str(obj: &JsonObject, keys: &[&str]) -> String {
  for key in keys {
    if let Some(s) = obj.get(*key).and_then(Value::as_str) {
      if !s.is_empty() {
        return s.to_string();
      }
    }
  }
  String::new()
}

/// Non-negative integer: floored, floor-clamped at 0.
fn count_field(obj: &JsonObject, key: &str) -> u32 {
  num_field(obj, key).map(|v| v.floor().max(0.0) as u32).unwrap_or(0)
}

fn ratio_field(obj: &JsonObject, key: &str) -> f64 {
  num_field(obj, key).unwrap_or(0.0).clamp(0.0, 1.0)
}
