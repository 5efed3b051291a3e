//! Confidence estimation: how much the headline score should be trusted,
//! blended from data-completeness signals.

use crate::config::ConfidenceConfig;
use crate::types::{Entry, History};

const MS_PER_DAY: f64 = 86_400_000.0;

/// 0-100 trust score for the headline health score.
///
/// `now_ms` is the caller's wall clock (epoch ms), injected so tests can pin
/// the recency factor.
pub fn confidence_score(
  entries: &[Entry],
  history: &History,
  maintenance_present: bool,
  now_ms: i64,
  config: &ConfidenceConfig,
) -> u8 {
  let w = &config.weights;

  let sessions =
    (history.recent_session_count as f64 / config.session_target.max(1) as f64).min(1.0);
  let dtc_history =
    (history.dtc_history_days as f64 / config.dtc_history_target_days.max(1) as f64).min(1.0);
  let maintenance = if maintenance_present { 1.0 } else { 0.0 };
  let recency = recency_factor(entries, now_ms, config.max_entry_age_days);

  let blended = w.uptime * history.uptime_ratio
    + w.coverage * history.sensor_coverage
    + w.sessions * sessions
    + w.dtc_history * dtc_history
    + w.maintenance * maintenance
    + w.recency * recency;

  (blended * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Mean age of timestamped entries versus the max-age threshold, linearly
/// reduced toward 0 and floored there. With no timestamped entries the
/// factor is 0.5: freshness is simply unknown.
fn recency_factor(entries: &[Entry], now_ms: i64, max_age_days: f64) -> f64 {
  let ages: Vec<f64> = entries
    .iter()
    .filter_map(Entry::timestamp_ms)
    .map(|ts| ((now_ms - ts) as f64 / MS_PER_DAY).max(0.0))
    .collect();
  if ages.is_empty() {
    return 0.5;
  }
  if max_age_days <= 0.0 {
    return 0.0;
  }
  let mean_age = ages.iter().sum::<f64>() / ages.len() as f64;
  (1.0 - mean_age / max_age_days).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{DtcEntry, Severity};

  const NOW_MS: i64 = 1_700_000_000_000;

  fn dtc_at(age_days: f64) -> Entry {
    Entry::Dtc(DtcEntry {
      key: "p0420".to_string(),
      title: String::new(),
      severity: Severity::Warn,
      category: String::new(),
      timestamp_ms: Some(NOW_MS - (age_days * MS_PER_DAY) as i64),
      code: "P0420".to_string(),
    })
  }

  #[test]
  fn full_signals_score_near_one_hundred() {
    let config = ConfidenceConfig::default();
    let history = History {
      uptime_ratio: 1.0,
      sensor_coverage: 1.0,
      recent_session_count: 5,
      dtc_history_days: 90,
      ..History::default()
    };
    let entries = vec![dtc_at(0.0)];
    let score = confidence_score(&entries, &history, true, NOW_MS, &config);
    assert_eq!(score, 100);
  }

  #[test]
  fn empty_inputs_score_only_the_neutral_recency() {
    let config = ConfidenceConfig::default();
    let score = confidence_score(&[], &History::default(), false, NOW_MS, &config);
    // Only the unknown-freshness recency half-credit: 0.10 * 0.5.
    assert_eq!(score, 5);
  }

  #[test]
  fn session_and_history_signals_saturate_at_target() {
    let config = ConfidenceConfig::default();
    let at_target = History {
      recent_session_count: 5,
      ..History::default()
    };
    let over_target = History {
      recent_session_count: 50,
      ..History::default()
    };
    let a = confidence_score(&[], &at_target, false, NOW_MS, &config);
    let b = confidence_score(&[], &over_target, false, NOW_MS, &config);
    assert_eq!(a, b);
  }

  #[test]
  fn stale_entries_erode_the_recency_factor() {
    let config = ConfidenceConfig::default();
    let history = History::default();
    let fresh = confidence_score(&[dtc_at(0.0)], &history, false, NOW_MS, &config);
    let aging = confidence_score(&[dtc_at(15.0)], &history, false, NOW_MS, &config);
    let stale = confidence_score(&[dtc_at(90.0)], &history, false, NOW_MS, &config);
    assert!(fresh > aging);
    assert!(aging > stale);
    // Past the max age the factor floors at 0.
    assert_eq!(stale, 0);
  }

  #[test]
  fn future_timestamps_read_as_age_zero() {
    let config = ConfidenceConfig::default();
    let history = History::default();
    let future = confidence_score(&[dtc_at(-5.0)], &history, false, NOW_MS, &config);
    let fresh = confidence_score(&[dtc_at(0.0)], &history, false, NOW_MS, &config);
    assert_eq!(future, fresh);
  }
}
