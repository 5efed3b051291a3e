//! Category penalty calculators: DTC, live metrics, maintenance, driving.
//!
//! Each calculator independently converts one input category into a capped
//! penalty subtotal plus labeled contributors. Caps bound the subtotal;
//! contributor deltas keep raw per-item magnitudes so ranking still
//! discriminates past the cap.

use crate::config::{DrivingConfig, DtcConfig, LiveConfig, MaintenanceConfig, VolatilityConfig};
use crate::log::DiagLog;
use crate::types::{
  Contributor, ContributorKind, DtcEntry, Entry, History, LiveEntry, MaintenanceItem, Sample,
  Severity,
};
use crate::volatility::{self, VolatilityCache};

/// Capped subtotal plus the contributors that produced it.
#[derive(Debug, Clone, Default)]
pub struct CategoryPenalty {
  pub total: f64,
  pub contributors: Vec<Contributor>,
}

// ---------------------------------------------------------------------------
// DTC
// ---------------------------------------------------------------------------

/// Per entry: severity base x category weight, rounded to an integer.
/// Every DTC entry yields a contributor; the subtotal is capped, so faults
/// beyond the cap cannot push the DTC share further.
pub fn dtc_penalties(entries: &[Entry], config: &DtcConfig) -> CategoryPenalty {
  let mut out = CategoryPenalty::default();
  let mut raw_total = 0.0;

  for entry in entries {
    let dtc = match entry {
      Entry::Dtc(d) => d,
      Entry::Live(_) => continue,
    };
    let weight = config
      .category_weights
      .get(dtc.category.as_str())
      .copied()
      .unwrap_or(1.0);
    let penalty = (config.base.for_severity(dtc.severity) * weight).round();
    raw_total += penalty;
    out.contributors.push(Contributor {
      label: dtc_label(dtc),
      kind: ContributorKind::Dtc,
      severity: dtc.severity,
      delta: -penalty,
      value: None,
      unit: None,
      volatile: false,
      sustained: false,
      overdue_days: None,
    });
  }

  out.total = raw_total.min(config.cap);
  out
}

fn dtc_label(dtc: &DtcEntry) -> String {
  if !dtc.title.is_empty() {
    dtc.title.clone()
  } else if !dtc.code.is_empty() {
    dtc.code.clone()
  } else {
    dtc.key.clone()
  }
}

// ---------------------------------------------------------------------------
// Live metrics
// ---------------------------------------------------------------------------

/// Only non-ok severities participate. Volatility above the threshold adds
/// a fixed surcharge; a sustained out-of-range level multiplies the penalty.
pub fn live_penalties(
  entries: &[Entry],
  config: &LiveConfig,
  vol_config: &VolatilityConfig,
  cache: &mut VolatilityCache,
  log: &DiagLog,
) -> CategoryPenalty {
  let mut out = CategoryPenalty::default();
  let mut raw_total = 0.0;

  for entry in entries {
    let live = match entry {
      Entry::Live(l) => l,
      Entry::Dtc(_) => continue,
    };
    if live.severity == Severity::Ok {
      continue;
    }

    let mut penalty = config.base.for_severity(live.severity);

    let vol = if live.series.is_empty() {
      0.0
    } else {
      volatility::volatility_score_cached(&live.series, vol_config, cache, log)
    };
    let volatile = vol > config.volatility_threshold;
    if volatile {
      penalty += config.volatility_penalty;
    }

    let sustained = is_sustained(&live.series, config);
    if sustained {
      penalty *= config.sustained_multiplier;
    }

    raw_total += penalty;
    out.contributors.push(Contributor {
      label: live_label(live),
      kind: ContributorKind::Live,
      severity: live.severity,
      delta: -penalty,
      value: live.value,
      unit: if live.unit.is_empty() {
        None
      } else {
        Some(live.unit.clone())
      },
      volatile,
      sustained,
      overdue_days: None,
    });
  }

  out.total = raw_total.min(config.cap);
  out
}

fn live_label(live: &LiveEntry) -> String {
  if !live.title.is_empty() {
    live.title.clone()
  } else {
    live.key.clone()
  }
}

/// A sustained issue holds a stable out-of-range level instead of spiking:
/// low mean absolute deviation relative to the local mean over the trailing
/// window. Zero-mean windows read as relative deviation 0.
fn is_sustained(series: &[Sample], config: &LiveConfig) -> bool {
  if series.len() < config.sustained_min_samples {
    return false;
  }
  let start = series.len().saturating_sub(config.sustained_window);
  let values: Vec<f64> = series[start..]
    .iter()
    .map(|s| if s.v.is_finite() { s.v } else { 0.0 })
    .collect();

  let mean = values.iter().sum::<f64>() / values.len() as f64;
  let mad = values.iter().map(|v| (v - mean).abs()).sum::<f64>() / values.len() as f64;
  let relative = if mean.abs() < f64::EPSILON {
    0.0
  } else {
    mad / mean.abs()
  };
  relative < config.sustained_tightness
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

/// Severity base, plus a step-function overdue surcharge (highest matching
/// step), scaled by an estimated-cost multiplier.
pub fn maintenance_penalties(
  items: &[MaintenanceItem],
  config: &MaintenanceConfig,
) -> CategoryPenalty {
  let mut out = CategoryPenalty::default();
  let mut raw_total = 0.0;

  for item in items {
    let base = config.base.for_severity(item.severity);
    let surcharge = if item.overdue_days >= config.overdue_severe_days {
      3.0
    } else if item.overdue_days >= config.overdue_moderate_days {
      2.0
    } else if item.overdue_days >= config.overdue_minor_days {
      1.0
    } else {
      0.0
    };
    let multiplier = if item.estimated_cost >= config.high_cost {
      config.high_cost_multiplier
    } else if item.estimated_cost >= config.medium_cost {
      config.medium_cost_multiplier
    } else {
      1.0
    };
    let penalty = ((base + surcharge) * multiplier).round();

    raw_total += penalty;
    out.contributors.push(Contributor {
      label: maintenance_label(item),
      kind: ContributorKind::Maintenance,
      severity: item.severity,
      delta: -penalty,
      value: None,
      unit: None,
      volatile: false,
      sustained: false,
      overdue_days: Some(item.overdue_days),
    });
  }

  out.total = raw_total.min(config.cap);
  out
}

fn maintenance_label(item: &MaintenanceItem) -> String {
  if !item.label.is_empty() {
    item.label.clone()
  } else if !item.category.is_empty() {
    item.category.clone()
  } else {
    "maintenance item".to_string()
  }
}

// ---------------------------------------------------------------------------
// Driving behavior
// ---------------------------------------------------------------------------

/// Two independent checks against the driving history, each proportional
/// and individually capped, then capped again as a pair.
pub fn driving_penalties(history: &History, config: &DrivingConfig) -> CategoryPenalty {
  let mut out = CategoryPenalty::default();
  let mut total = 0.0;

  if history.harsh_event_count > config.harsh_event_threshold {
    let excess = (history.harsh_event_count - config.harsh_event_threshold) as f64;
    let penalty = (excess * config.harsh_event_penalty).min(config.harsh_cap);
    if penalty > 0.0 {
      total += penalty;
      out.contributors.push(driving_contributor("harsh driving events", penalty));
    }
  }

  if history.efficiency_trend < config.efficiency_trend_threshold {
    let penalty =
      (history.efficiency_trend.abs() * config.efficiency_scale).min(config.efficiency_cap);
    if penalty > 0.0 {
      total += penalty;
      out.contributors.push(driving_contributor("declining fuel efficiency", penalty));
    }
  }

  out.total = total.min(config.cap);
  out
}

fn driving_contributor(label: &str, penalty: f64) -> Contributor {
  Contributor {
    label: label.to_string(),
    kind: ContributorKind::Driving,
    severity: Severity::Warn,
    delta: -penalty,
    value: None,
    unit: None,
    volatile: false,
    sustained: false,
    overdue_days: None,
  }
}
