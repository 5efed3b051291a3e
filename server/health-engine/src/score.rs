//! Bonuses, band classification, and the final score arithmetic.

use std::cmp::Ordering;

use crate::config::{BandDef, BonusConfig};
use crate::types::{Contributor, ContributorKind, History, Severity};

/// Additive score bonuses; each is independently computed and never
/// negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bonuses {
  pub recovery: f64,
  pub efficiency: f64,
}

impl Bonuses {
  pub fn total(&self) -> f64 {
    self.recovery + self.efficiency
  }
}

/// Recovery streak earns per-session credit up to a cap; an improving
/// efficiency trend earns a flat bonus.
pub fn compute_bonuses(history: &History, config: &BonusConfig) -> Bonuses {
  let recovery =
    (history.clean_session_streak as f64 * config.recovery_rate).min(config.recovery_cap);
  let efficiency = if history.efficiency_trend > config.efficiency_threshold {
    config.efficiency_bonus
  } else {
    0.0
  };
  Bonuses {
    recovery,
    efficiency,
  }
}

/// Contributor records for non-zero bonuses, sign-flipped to positive
/// deltas so they rank alongside penalties by magnitude.
pub fn bonus_contributors(bonuses: &Bonuses) -> Vec<Contributor> {
  let mut out = Vec::new();
  if bonuses.recovery > 0.0 {
    out.push(bonus_contributor("clean session streak", bonuses.recovery));
  }
  if bonuses.efficiency > 0.0 {
    out.push(bonus_contributor(
      "improving fuel efficiency",
      bonuses.efficiency,
    ));
  }
  out
}

fn bonus_contributor(label: &str, delta: f64) -> Contributor {
  Contributor {
    label: label.to_string(),
    kind: ContributorKind::Bonus,
    severity: Severity::Ok,
    delta,
    value: None,
    unit: None,
    volatile: false,
    sustained: false,
    overdue_days: None,
  }
}

/// Final 0-100 integer score.
pub fn final_score(total_penalties: f64, total_bonuses: f64) -> u8 {
  (100.0 - total_penalties + total_bonuses)
    .clamp(0.0, 100.0)
    .round() as u8
}

/// Descending-threshold band lookup: the first band whose `min` the score
/// meets wins. Falls back to the lowest band, so any non-empty table makes
/// this total.
pub fn classify_band(score: u8, bands: &[BandDef]) -> Option<&BandDef> {
  let mut ordered: Vec<&BandDef> = bands.iter().collect();
  ordered.sort_by(|a, b| b.min.partial_cmp(&a.min).unwrap_or(Ordering::Equal));
  let score = f64::from(score);
  ordered
    .iter()
    .find(|band| score >= band.min)
    .copied()
    .or_else(|| ordered.last().copied())
}
