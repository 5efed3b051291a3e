//! Recommendation generation: rank the contributors that cost the most and
//! emit short advisory text for each.

use std::cmp::Ordering;

use crate::config::RecommendationConfig;
use crate::types::{Contributor, ContributorKind, RecPriority, Recommendation, Severity};

/// Rank non-bonus contributors by absolute penalty magnitude (label
/// ascending on ties, for determinism) and phrase the top K.
pub fn recommendations(
  contributors: &[Contributor],
  config: &RecommendationConfig,
) -> Vec<Recommendation> {
  let mut ranked: Vec<&Contributor> = contributors
    .iter()
    .filter(|c| c.kind != ContributorKind::Bonus && c.delta != 0.0)
    .collect();
  ranked.sort_by(|a, b| {
    b.delta
      .abs()
      .partial_cmp(&a.delta.abs())
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.label.cmp(&b.label))
  });

  ranked
    .into_iter()
    .take(config.limit)
    .map(phrase)
    .collect()
}

fn phrase(c: &Contributor) -> Recommendation {
  let priority = match (c.kind, c.severity) {
    (_, Severity::Crit) => RecPriority::High,
    (ContributorKind::Driving, _) => RecPriority::Low,
    _ => RecPriority::Medium,
  };

  let (action, rationale) = match c.kind {
    ContributorKind::Dtc => (
      format!("Diagnose and repair: {}", c.label),
      "An active trouble code is lowering the health score".to_string(),
    ),
    ContributorKind::Live => {
      let rationale = if c.sustained {
        "The reading is holding at an abnormal level rather than spiking".to_string()
      } else if c.volatile {
        "The reading is fluctuating erratically".to_string()
      } else {
        "The reading is outside its normal range".to_string()
      };
      (format!("Monitor and stabilize: {}", c.label), rationale)
    }
    ContributorKind::Maintenance => {
      let rationale = match c.overdue_days {
        Some(days) if days > 0 => {
          format!("Overdue by {} days; deferral compounds the risk", days)
        }
        _ => "Deferred service is lowering the health score".to_string(),
      };
      (format!("Schedule maintenance: {}", c.label), rationale)
    }
    ContributorKind::Driving => (
      format!("Review driving patterns: {}", c.label),
      "Recent driving behavior is wearing the vehicle faster".to_string(),
    ),
    // Bonuses are filtered out above; kept total for direct callers.
    ContributorKind::Bonus => (
      format!("Keep it up: {}", c.label),
      "A positive habit is raising the health score".to_string(),
    ),
  };

  Recommendation {
    priority,
    action,
    rationale,
  }
}
