//! Engine orchestrator: compose the pipeline, own the shared state, and
//! never let a scoring failure reach the caller.

use std::cmp::Ordering;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use crate::config::{ConfigOverrides, EngineConfig};
use crate::confidence;
use crate::error::EngineError;
use crate::log::DiagLog;
use crate::penalties;
use crate::recommend;
use crate::score;
use crate::types::*;
use crate::validate;
use crate::volatility::VolatilityCache;

/// Cumulative engine-lifetime counters for external benchmarking.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfStats {
  pub calls: u64,
  pub total_ms: f64,
}

/// The health scoring engine. Owns the volatility cache and perf counters;
/// all per-call state is local, so one engine per tenant (or an external
/// mutex) makes concurrent use safe. There are no global caches.
pub struct HealthEngine {
  config: EngineConfig,
  cache: VolatilityCache,
  perf: PerfStats,
}

impl HealthEngine {
  pub fn new(config: EngineConfig) -> Self {
    Self {
      config,
      cache: VolatilityCache::new(),
      perf: PerfStats::default(),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(EngineConfig::default())
  }

  /// Score one snapshot of vehicle data.
  ///
  /// Never fails: input-shape problems are filtered by validation, and any
  /// internal error degrades into the fixed fallback report (score 50,
  /// confidence 0, band "unknown") with the message in metadata. The
  /// optional `overrides` merge over the engine's base config for this call
  /// only.
  pub fn compute(
    &mut self,
    entries: &Value,
    history: &Value,
    maintenance: &Value,
    overrides: Option<&ConfigOverrides>,
  ) -> HealthReport {
    let started = Instant::now();
    let report = match self.compute_inner(entries, history, maintenance, overrides, started) {
      Ok(report) => report,
      Err(err) => self.degraded_report(&err, started),
    };
    self.perf.calls += 1;
    self.perf.total_ms += report.metadata.elapsed_ms;
    report
  }

  /// Reset all cross-call state: the volatility cache and perf counters.
  pub fn clear_caches(&mut self) {
    self.cache.clear();
    self.perf = PerfStats::default();
  }

  pub fn perf_stats(&self) -> PerfStats {
    self.perf
  }

  fn compute_inner(
    &mut self,
    entries: &Value,
    history: &Value,
    maintenance: &Value,
    overrides: Option<&ConfigOverrides>,
    started: Instant,
  ) -> Result<HealthReport, EngineError> {
    let config = self.config.merged(overrides);
    config.validate()?;
    let log = DiagLog::new(config.log_level);

    let input = validate::validate(entries, history, maintenance, &config, &log);

    let hits_before = self.cache.hits();
    let misses_before = self.cache.misses();

    let dtc = penalties::dtc_penalties(&input.entries, &config.dtc);
    let live = penalties::live_penalties(
      &input.entries,
      &config.live,
      &config.volatility,
      &mut self.cache,
      &log,
    );
    let maintenance_result =
      penalties::maintenance_penalties(&input.maintenance, &config.maintenance);
    let driving = penalties::driving_penalties(&input.history, &config.driving);

    let bonuses = score::compute_bonuses(&input.history, &config.bonus);
    let total_penalties =
      dtc.total + live.total + maintenance_result.total + driving.total;
    let final_score = score::final_score(total_penalties, bonuses.total());

    let band = score::classify_band(final_score, &config.bands)
      .ok_or_else(|| EngineError::config("bands", "no band matched the score"))?
      .clone();

    let now_ms = Utc::now().timestamp_millis();
    let confidence = confidence::confidence_score(
      &input.entries,
      &input.history,
      !input.maintenance.is_empty(),
      now_ms,
      &config.confidence,
    );

    // Every contributor across categories; bonuses ride along with
    // positive deltas.
    let mut contributors: Vec<Contributor> = Vec::new();
    contributors.extend(dtc.contributors.iter().cloned());
    contributors.extend(live.contributors.iter().cloned());
    contributors.extend(maintenance_result.contributors.iter().cloned());
    contributors.extend(driving.contributors.iter().cloned());
    contributors.extend(score::bonus_contributors(&bonuses));

    let recommendations = recommend::recommendations(&contributors, &config.recommendations);

    // Top contributors by absolute impact; label ascending on ties keeps
    // the output deterministic.
    contributors.sort_by(|a, b| {
      b.delta
        .abs()
        .partial_cmp(&a.delta.abs())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.label.cmp(&b.label))
    });
    contributors.truncate(config.contributor_limit);

    let hits = self.cache.hits();
    let misses = self.cache.misses();
    let lookups = (hits - hits_before) + (misses - misses_before);
    let hit_ratio = if lookups == 0 {
      0.0
    } else {
      round2((hits - hits_before) as f64 / lookups as f64)
    };

    Ok(HealthReport {
      score: final_score,
      confidence,
      contributors,
      band: band.name.clone(),
      breakdown: Breakdown {
        penalties: PenaltyBreakdown {
          dtc: dtc.total,
          live: live.total,
          maintenance: maintenance_result.total,
          driving: driving.total,
        },
        bonuses: BonusBreakdown {
          recovery_bonus: bonuses.recovery,
          efficiency_bonus: bonuses.efficiency,
        },
      },
      recommendations,
      metadata: ReportMetadata {
        total_entries: input.total_entries,
        valid_entries: input.entries.len(),
        discarded_entries: input.discarded_entries,
        malformed_entries_input: input.malformed_entries_input,
        maintenance_items: input.maintenance.len(),
        discarded_maintenance: input.discarded_maintenance,
        elapsed_ms: elapsed_ms(started),
        cache_utilization: CacheUtilization {
          hits,
          misses,
          hit_ratio,
        },
        band_color: band.color,
        band_priority: band.priority,
        error: None,
      },
    })
  }

  /// The fixed fallback: a dashboard must always receive a renderable
  /// result, even when scoring itself cannot run.
  fn degraded_report(&self, err: &EngineError, started: Instant) -> HealthReport {
    DiagLog::new(self.config.log_level)
      .error(&format!("health scoring degraded: {err}"));
    HealthReport {
      score: 50,
      confidence: 0,
      contributors: Vec::new(),
      band: "unknown".to_string(),
      breakdown: Breakdown::default(),
      recommendations: vec![Recommendation {
        priority: RecPriority::High,
        action: "Review diagnostic data inputs".to_string(),
        rationale: "Health scoring failed and returned a fallback result".to_string(),
      }],
      metadata: ReportMetadata {
        total_entries: 0,
        valid_entries: 0,
        discarded_entries: 0,
        malformed_entries_input: false,
        maintenance_items: 0,
        discarded_maintenance: 0,
        elapsed_ms: elapsed_ms(started),
        cache_utilization: CacheUtilization {
          hits: self.cache.hits(),
          misses: self.cache.misses(),
          hit_ratio: 0.0,
        },
        band_color: "gray".to_string(),
        band_priority: 4,
        error: Some(err.to_string()),
      },
    }
  }
}

fn elapsed_ms(started: Instant) -> f64 {
  let ms = started.elapsed().as_secs_f64() * 1000.0;
  (ms * 1000.0).round() / 1000.0
}

fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}
