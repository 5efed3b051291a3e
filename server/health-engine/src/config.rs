//! Engine configuration: immutable defaults plus typed per-call overrides.
//!
//! Defaults live in the `Default` impls and are never mutated; a caller's
//! `ConfigOverrides` (all-`Option` mirror of the tree) is merged over a clone
//! per invocation. Maps merge key-wise (override wins per key); the band
//! table replaces atomically, array semantics.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::log::LogLevel;
use crate::types::Severity;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Base penalty per normalized severity tier.
#[derive(Debug, Clone, Copy)]
pub struct SeverityPenalties {
  pub ok: f64,
  pub warn: f64,
  pub crit: f64,
  pub unknown: f64,
}

impl SeverityPenalties {
  pub fn for_severity(&self, severity: Severity) -> f64 {
    match severity {
      Severity::Ok => self.ok,
      Severity::Warn => self.warn,
      Severity::Crit => self.crit,
      Severity::Unknown => self.unknown,
    }
  }
}

/// DTC penalty tuning.
#[derive(Debug, Clone)]
pub struct DtcConfig {
  pub base: SeverityPenalties,
  /// Multiplier per entry category (lowercase keys); unlisted categories
  /// weigh 1.0.
  pub category_weights: BTreeMap<String, f64>,
  /// Hard cap on the DTC-attributable subtotal.
  pub cap: f64,
}

impl Default for DtcConfig {
  fn default() -> Self {
    let mut category_weights = BTreeMap::new();
    category_weights.insert("safety".to_string(), 1.5);
    category_weights.insert("powertrain".to_string(), 1.3);
    category_weights.insert("emissions".to_string(), 1.1);
    category_weights.insert("comfort".to_string(), 0.8);
    Self {
      base: SeverityPenalties {
        ok: 0.0,
        warn: 6.0,
        crit: 18.0,
        unknown: 2.0,
      },
      category_weights,
      cap: 40.0,
    }
  }
}

/// Live-metric penalty tuning.
#[derive(Debug, Clone)]
pub struct LiveConfig {
  pub base: SeverityPenalties,
  /// Volatility score above this adds `volatility_penalty` and flags the
  /// contributor as volatile.
  pub volatility_threshold: f64,
  pub volatility_penalty: f64,
  /// Trailing samples inspected for sustained-issue detection.
  pub sustained_window: usize,
  /// Minimum samples required before sustained detection applies.
  pub sustained_min_samples: usize,
  /// Relative mean absolute deviation below this counts as sustained.
  pub sustained_tightness: f64,
  pub sustained_multiplier: f64,
  pub cap: f64,
}

impl Default for LiveConfig {
  fn default() -> Self {
    Self {
      base: SeverityPenalties {
        ok: 0.0,
        warn: 5.0,
        crit: 12.0,
        unknown: 2.0,
      },
      volatility_threshold: 4.0,
      volatility_penalty: 3.0,
      sustained_window: 8,
      sustained_min_samples: 6,
      sustained_tightness: 0.08,
      sustained_multiplier: 1.5,
      cap: 30.0,
    }
  }
}

/// Maintenance penalty tuning.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
  pub base: SeverityPenalties,
  /// Overdue surcharge steps: the highest matching step applies.
  pub overdue_minor_days: u32,
  pub overdue_moderate_days: u32,
  pub overdue_severe_days: u32,
  /// Estimated-cost thresholds and their penalty multipliers.
  pub medium_cost: f64,
  pub high_cost: f64,
  pub medium_cost_multiplier: f64,
  pub high_cost_multiplier: f64,
  pub cap: f64,
}

impl Default for MaintenanceConfig {
  fn default() -> Self {
    Self {
      base: SeverityPenalties {
        ok: 0.0,
        warn: 4.0,
        crit: 10.0,
        unknown: 2.0,
      },
      overdue_minor_days: 30,
      overdue_moderate_days: 90,
      overdue_severe_days: 180,
      medium_cost: 150.0,
      high_cost: 400.0,
      medium_cost_multiplier: 1.2,
      high_cost_multiplier: 1.5,
      cap: 25.0,
    }
  }
}

/// Driving behavior penalty tuning.
#[derive(Debug, Clone)]
pub struct DrivingConfig {
  /// Harsh events above this contribute, proportional to the excess.
  pub harsh_event_threshold: u32,
  pub harsh_event_penalty: f64,
  pub harsh_cap: f64,
  /// Efficiency trend below this contributes, proportional to magnitude.
  pub efficiency_trend_threshold: f64,
  pub efficiency_scale: f64,
  pub efficiency_cap: f64,
  pub cap: f64,
}

impl Default for DrivingConfig {
  fn default() -> Self {
    Self {
      harsh_event_threshold: 5,
      harsh_event_penalty: 0.5,
      harsh_cap: 5.0,
      efficiency_trend_threshold: -0.15,
      efficiency_scale: 10.0,
      efficiency_cap: 3.0,
      cap: 8.0,
    }
  }
}

/// Additive bonus tuning. Bonuses are never negative.
#[derive(Debug, Clone)]
pub struct BonusConfig {
  pub recovery_rate: f64,
  pub recovery_cap: f64,
  /// Efficiency trend above this earns the flat bonus.
  pub efficiency_threshold: f64,
  pub efficiency_bonus: f64,
}

impl Default for BonusConfig {
  fn default() -> Self {
    Self {
      recovery_rate: 1.0,
      recovery_cap: 5.0,
      efficiency_threshold: 0.1,
      efficiency_bonus: 2.0,
    }
  }
}

/// Confidence sub-weights; intended to sum to 1, not enforced.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceWeights {
  pub uptime: f64,
  pub coverage: f64,
  pub sessions: f64,
  pub dtc_history: f64,
  pub maintenance: f64,
  pub recency: f64,
}

impl Default for ConfidenceWeights {
  fn default() -> Self {
    Self {
      uptime: 0.25,
      coverage: 0.25,
      sessions: 0.15,
      dtc_history: 0.15,
      maintenance: 0.10,
      recency: 0.10,
    }
  }
}

/// Confidence estimation tuning.
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
  pub weights: ConfidenceWeights,
  /// Recent-session count treated as full signal.
  pub session_target: u32,
  /// DTC history depth (days) treated as full signal.
  pub dtc_history_target_days: u32,
  /// Mean entry age at which the recency factor reaches 0.
  pub max_entry_age_days: f64,
}

impl Default for ConfidenceConfig {
  fn default() -> Self {
    Self {
      weights: ConfidenceWeights::default(),
      session_target: 5,
      dtc_history_target_days: 90,
      max_entry_age_days: 30.0,
    }
  }
}

/// Volatility analysis and memo cache tuning.
#[derive(Debug, Clone)]
pub struct VolatilityConfig {
  /// Series shorter than this score 0: not enough signal.
  pub min_series_len: usize,
  /// Most recent samples considered.
  pub sample_size: usize,
  pub cache_enabled: bool,
  pub cache_ttl_ms: u64,
  pub cache_max_entries: usize,
}

impl Default for VolatilityConfig {
  fn default() -> Self {
    Self {
      min_series_len: 5,
      sample_size: 20,
      cache_enabled: true,
      cache_ttl_ms: 60_000,
      cache_max_entries: 128,
    }
  }
}

/// One named severity band. Classification walks bands in descending `min`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandDef {
  pub name: String,
  pub min: f64,
  pub color: String,
  pub priority: u8,
}

impl BandDef {
  fn new(name: &str, min: f64, color: &str, priority: u8) -> Self {
    Self {
      name: name.to_string(),
      min,
      color: color.to_string(),
      priority,
    }
  }
}

/// Recommendation output tuning.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
  /// Top-K contributors that get advisory text.
  pub limit: usize,
}

impl Default for RecommendationConfig {
  fn default() -> Self {
    Self { limit: 3 }
  }
}

/// Full engine configuration. `Default` is the immutable baseline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub dtc: DtcConfig,
  pub live: LiveConfig,
  pub maintenance: MaintenanceConfig,
  pub driving: DrivingConfig,
  pub bonus: BonusConfig,
  pub confidence: ConfidenceConfig,
  pub volatility: VolatilityConfig,
  pub bands: Vec<BandDef>,
  pub recommendations: RecommendationConfig,
  /// Top-N contributors returned in the report.
  pub contributor_limit: usize,
  /// Non-numeric series samples become 0.0 (keeps index alignment) instead
  /// of being dropped. Logged at debug when it fires.
  pub coerce_invalid_samples: bool,
  pub log_level: LogLevel,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      dtc: DtcConfig::default(),
      live: LiveConfig::default(),
      maintenance: MaintenanceConfig::default(),
      driving: DrivingConfig::default(),
      bonus: BonusConfig::default(),
      confidence: ConfidenceConfig::default(),
      volatility: VolatilityConfig::default(),
      bands: vec![
        BandDef::new("excellent", 90.0, "green", 0),
        BandDef::new("good", 75.0, "blue", 1),
        BandDef::new("watch", 60.0, "amber", 2),
        BandDef::new("action", 0.0, "red", 3),
      ],
      recommendations: RecommendationConfig::default(),
      contributor_limit: 4,
      coerce_invalid_samples: true,
      log_level: LogLevel::Warn,
    }
  }
}

impl EngineConfig {
  /// A new config with `overrides` merged over this one. Neither input is
  /// mutated.
  pub fn merged(&self, overrides: Option<&ConfigOverrides>) -> EngineConfig {
    let mut config = self.clone();
    if let Some(ov) = overrides {
      ov.apply(&mut config);
    }
    config
  }

  /// Sanity-check a merged config before scoring runs against it.
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.bands.is_empty() {
      return Err(EngineError::config("bands", "must define at least one band"));
    }
    if self.volatility.sample_size < 2 {
      return Err(EngineError::config(
        "volatility.sampleSize",
        "must be at least 2",
      ));
    }
    let caps = [
      ("dtc.cap", self.dtc.cap),
      ("live.cap", self.live.cap),
      ("maintenance.cap", self.maintenance.cap),
      ("driving.cap", self.driving.cap),
    ];
    for (field, cap) in caps {
      if !cap.is_finite() || cap < 0.0 {
        return Err(EngineError::config(field, "must be non-negative"));
      }
    }
    Ok(())
  }
}

// ---------------------------------------------------------------------------
// Overrides (all-Option mirror of the tree; one apply per section)
// ---------------------------------------------------------------------------

fn set<T: Copy>(dst: &mut T, src: Option<T>) {
  if let Some(v) = src {
    *dst = v;
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeverityPenaltyOverrides {
  pub ok: Option<f64>,
  pub warn: Option<f64>,
  pub crit: Option<f64>,
  pub unknown: Option<f64>,
}

impl SeverityPenaltyOverrides {
  fn apply(&self, base: &mut SeverityPenalties) {
    set(&mut base.ok, self.ok);
    set(&mut base.warn, self.warn);
    set(&mut base.crit, self.crit);
    set(&mut base.unknown, self.unknown);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DtcOverrides {
  pub base: Option<SeverityPenaltyOverrides>,
  pub category_weights: Option<BTreeMap<String, f64>>,
  pub cap: Option<f64>,
}

impl DtcOverrides {
  fn apply(&self, config: &mut DtcConfig) {
    if let Some(base) = &self.base {
      base.apply(&mut config.base);
    }
    if let Some(weights) = &self.category_weights {
      // Key-wise merge: override wins per category, defaults otherwise.
      for (category, weight) in weights {
        config.category_weights.insert(category.clone(), *weight);
      }
    }
    set(&mut config.cap, self.cap);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveOverrides {
  pub base: Option<SeverityPenaltyOverrides>,
  pub volatility_threshold: Option<f64>,
  pub volatility_penalty: Option<f64>,
  pub sustained_window: Option<usize>,
  pub sustained_min_samples: Option<usize>,
  pub sustained_tightness: Option<f64>,
  pub sustained_multiplier: Option<f64>,
  pub cap: Option<f64>,
}

impl LiveOverrides {
  fn apply(&self, config: &mut LiveConfig) {
    if let Some(base) = &self.base {
      base.apply(&mut config.base);
    }
    set(&mut config.volatility_threshold, self.volatility_threshold);
    set(&mut config.volatility_penalty, self.volatility_penalty);
    set(&mut config.sustained_window, self.sustained_window);
    set(&mut config.sustained_min_samples, self.sustained_min_samples);
    set(&mut config.sustained_tightness, self.sustained_tightness);
    set(&mut config.sustained_multiplier, self.sustained_multiplier);
    set(&mut config.cap, self.cap);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceOverrides {
  pub base: Option<SeverityPenaltyOverrides>,
  pub overdue_minor_days: Option<u32>,
  pub overdue_moderate_days: Option<u32>,
  pub overdue_severe_days: Option<u32>,
  pub medium_cost: Option<f64>,
  pub high_cost: Option<f64>,
  pub medium_cost_multiplier: Option<f64>,
  pub high_cost_multiplier: Option<f64>,
  pub cap: Option<f64>,
}

impl MaintenanceOverrides {
  fn apply(&self, config: &mut MaintenanceConfig) {
    if let Some(base) = &self.base {
      base.apply(&mut config.base);
    }
    set(&mut config.overdue_minor_days, self.overdue_minor_days);
    set(&mut config.overdue_moderate_days, self.overdue_moderate_days);
    set(&mut config.overdue_severe_days, self.overdue_severe_days);
    set(&mut config.medium_cost, self.medium_cost);
    set(&mut config.high_cost, self.high_cost);
    set(&mut config.medium_cost_multiplier, self.medium_cost_multiplier);
    set(&mut config.high_cost_multiplier, self.high_cost_multiplier);
    set(&mut config.cap, self.cap);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrivingOverrides {
  pub harsh_event_threshold: Option<u32>,
  pub harsh_event_penalty: Option<f64>,
  pub harsh_cap: Option<f64>,
  pub efficiency_trend_threshold: Option<f64>,
  pub efficiency_scale: Option<f64>,
  pub efficiency_cap: Option<f64>,
  pub cap: Option<f64>,
}

impl DrivingOverrides {
  fn apply(&self, config: &mut DrivingConfig) {
    set(&mut config.harsh_event_threshold, self.harsh_event_threshold);
    set(&mut config.harsh_event_penalty, self.harsh_event_penalty);
    set(&mut config.harsh_cap, self.harsh_cap);
    set(
      &mut config.efficiency_trend_threshold,
      self.efficiency_trend_threshold,
    );
    set(&mut config.efficiency_scale, self.efficiency_scale);
    set(&mut config.efficiency_cap, self.efficiency_cap);
    set(&mut config.cap, self.cap);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BonusOverrides {
  pub recovery_rate: Option<f64>,
  pub recovery_cap: Option<f64>,
  pub efficiency_threshold: Option<f64>,
  pub efficiency_bonus: Option<f64>,
}

impl BonusOverrides {
  fn apply(&self, config: &mut BonusConfig) {
    set(&mut config.recovery_rate, self.recovery_rate);
    set(&mut config.recovery_cap, self.recovery_cap);
    set(&mut config.efficiency_threshold, self.efficiency_threshold);
    set(&mut config.efficiency_bonus, self.efficiency_bonus);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfidenceWeightOverrides {
  pub uptime: Option<f64>,
  pub coverage: Option<f64>,
  pub sessions: Option<f64>,
  pub dtc_history: Option<f64>,
  pub maintenance: Option<f64>,
  pub recency: Option<f64>,
}

impl ConfidenceWeightOverrides {
  fn apply(&self, weights: &mut ConfidenceWeights) {
    set(&mut weights.uptime, self.uptime);
    set(&mut weights.coverage, self.coverage);
    set(&mut weights.sessions, self.sessions);
    set(&mut weights.dtc_history, self.dtc_history);
    set(&mut weights.maintenance, self.maintenance);
    set(&mut weights.recency, self.recency);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfidenceOverrides {
  pub weights: Option<ConfidenceWeightOverrides>,
  pub session_target: Option<u32>,
  pub dtc_history_target_days: Option<u32>,
  pub max_entry_age_days: Option<f64>,
}

impl ConfidenceOverrides {
  fn apply(&self, config: &mut ConfidenceConfig) {
    if let Some(weights) = &self.weights {
      weights.apply(&mut config.weights);
    }
    set(&mut config.session_target, self.session_target);
    set(
      &mut config.dtc_history_target_days,
      self.dtc_history_target_days,
    );
    set(&mut config.max_entry_age_days, self.max_entry_age_days);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolatilityOverrides {
  pub min_series_len: Option<usize>,
  pub sample_size: Option<usize>,
  pub cache_enabled: Option<bool>,
  pub cache_ttl_ms: Option<u64>,
  pub cache_max_entries: Option<usize>,
}

impl VolatilityOverrides {
  fn apply(&self, config: &mut VolatilityConfig) {
    set(&mut config.min_series_len, self.min_series_len);
    set(&mut config.sample_size, self.sample_size);
    set(&mut config.cache_enabled, self.cache_enabled);
    set(&mut config.cache_ttl_ms, self.cache_ttl_ms);
    set(&mut config.cache_max_entries, self.cache_max_entries);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationOverrides {
  pub limit: Option<usize>,
}

impl RecommendationOverrides {
  fn apply(&self, config: &mut RecommendationConfig) {
    set(&mut config.limit, self.limit);
  }
}

/// Caller-supplied partial configuration. Deserializes straight from the
/// request's `config` field; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverrides {
  pub dtc: Option<DtcOverrides>,
  pub live: Option<LiveOverrides>,
  pub maintenance: Option<MaintenanceOverrides>,
  pub driving: Option<DrivingOverrides>,
  pub bonus: Option<BonusOverrides>,
  pub confidence: Option<ConfidenceOverrides>,
  pub volatility: Option<VolatilityOverrides>,
  /// Full band table replacement (array semantics: atomic, never merged).
  pub bands: Option<Vec<BandDef>>,
  pub recommendations: Option<RecommendationOverrides>,
  pub contributor_limit: Option<usize>,
  pub coerce_invalid_samples: Option<bool>,
  pub log_level: Option<LogLevel>,
}

impl ConfigOverrides {
  fn apply(&self, config: &mut EngineConfig) {
    if let Some(dtc) = &self.dtc {
      dtc.apply(&mut config.dtc);
    }
    if let Some(live) = &self.live {
      live.apply(&mut config.live);
    }
    if let Some(maintenance) = &self.maintenance {
      maintenance.apply(&mut config.maintenance);
    }
    if let Some(driving) = &self.driving {
      driving.apply(&mut config.driving);
    }
    if let Some(bonus) = &self.bonus {
      bonus.apply(&mut config.bonus);
    }
    if let Some(confidence) = &self.confidence {
      confidence.apply(&mut config.confidence);
    }
    if let Some(volatility) = &self.volatility {
      volatility.apply(&mut config.volatility);
    }
    if let Some(bands) = &self.bands {
      config.bands = bands.clone();
    }
    if let Some(recommendations) = &self.recommendations {
      recommendations.apply(&mut config.recommendations);
    }
    set(&mut config.contributor_limit, self.contributor_limit);
    set(&mut config.coerce_invalid_samples, self.coerce_invalid_samples);
    set(&mut config.log_level, self.log_level);
  }
}
