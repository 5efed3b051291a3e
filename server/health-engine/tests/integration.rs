//! Integration tests for the health engine: end-to-end scoring scenarios
//! through the same JSON contract the app server uses.

use health_engine::types::RecPriority;
use health_engine::{HealthEngine, HealthRequest};

fn request(json: &str) -> HealthRequest {
  serde_json::from_str(json).unwrap()
}

fn compute(engine: &mut HealthEngine, req: &HealthRequest) -> health_engine::HealthReport {
  engine.compute(&req.entries, &req.history, &req.maintenance, req.config.as_ref())
}

#[test]
fn all_clean_vehicle_lands_in_the_top_band() {
  let req = request(
    r#"{
    "entries": [],
    "history": {
      "uptimeRatio": 1.0,
      "sensorCoverage": 1.0,
      "recentSessionCount": 5,
      "cleanSessionStreak": 4
    },
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  assert!(report.score >= 90, "clean vehicle scored {}", report.score);
  assert_eq!(report.band, "excellent");

  // No penalties anywhere; the recovery streak shows up as a bonus.
  assert_eq!(report.breakdown.penalties.dtc, 0.0);
  assert_eq!(report.breakdown.penalties.live, 0.0);
  assert_eq!(report.breakdown.penalties.maintenance, 0.0);
  assert_eq!(report.breakdown.penalties.driving, 0.0);
  assert_eq!(report.breakdown.bonuses.recovery_bonus, 4.0);

  assert!(report.recommendations.is_empty());
  assert!(report.metadata.error.is_none());
}

#[test]
fn critical_dtc_with_sustained_overheating_demands_action() {
  // One crit powertrain DTC (18 x 1.3 = 23) plus a coolant metric holding
  // tightly above its threshold (12 x 1.5 sustained = 18): 41 penalty
  // points drop the score to 59, below the watch band.
  let req = request(
    r#"{
    "entries": [
      {
        "kind": "DTC",
        "id": "p0217",
        "title": "Engine overtemperature condition",
        "code": "P0217",
        "severity": "crit",
        "category": "powertrain"
      },
      {
        "kind": "LIVE",
        "id": "coolantTempC",
        "title": "Coolant temperature",
        "severity": "crit",
        "category": "powertrain",
        "value": 112.2,
        "unit": "degC",
        "series": [
          {"t": 1000, "v": 112.0},
          {"t": 2000, "v": 112.4},
          {"t": 3000, "v": 111.8},
          {"t": 4000, "v": 112.1},
          {"t": 5000, "v": 112.3},
          {"t": 6000, "v": 111.9},
          {"t": 7000, "v": 112.2},
          {"t": 8000, "v": 112.0}
        ]
      }
    ],
    "history": {},
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  assert_eq!(report.score, 59);
  assert_eq!(report.band, "action");

  let live = report
    .contributors
    .iter()
    .find(|c| c.label == "Coolant temperature")
    .expect("live contributor present");
  assert!(live.sustained);
  assert_eq!(live.value, Some(112.2));

  assert!(report
    .recommendations
    .iter()
    .any(|r| r.priority == RecPriority::High));
  assert!(report
    .recommendations
    .iter()
    .any(|r| r.rationale.contains("holding at an abnormal level")));
}

#[test]
fn malformed_maintenance_items_are_skipped_not_fatal() {
  let req = request(
    r#"{
    "entries": [],
    "history": {},
    "maintenance": [null, {"label": "x"}, 42]
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  assert_eq!(report.metadata.maintenance_items, 1);
  assert_eq!(report.metadata.discarded_maintenance, 2);
  // The surviving item has unknown severity: base penalty 2.
  assert_eq!(report.breakdown.penalties.maintenance, 2.0);
  assert!(report.metadata.error.is_none());
}

#[test]
fn non_array_entries_input_filters_instead_of_degrading() {
  let req = request(
    r#"{
    "entries": "not an array",
    "history": {},
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  // Validator-level recovery: empty valid set, flagged in metadata, and
  // distinctly not the hard degraded-50 fallback.
  assert!(report.metadata.malformed_entries_input);
  assert_eq!(report.metadata.valid_entries, 0);
  assert!(report.metadata.error.is_none());
  assert_ne!(report.band, "unknown");
  assert_eq!(report.score, 100);
}

#[test]
fn band_thresholds_match_the_default_table() {
  // Two warn comfort DTCs: 2 x round(6 x 0.8) = 10 penalty points -> 90.
  let at_ninety = request(
    r#"{
    "entries": [
      {"kind": "DTC", "id": "b1", "severity": "warn", "category": "comfort"},
      {"kind": "DTC", "id": "b2", "severity": "warn", "category": "comfort"}
    ],
    "history": {},
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &at_ninety);
  assert_eq!(report.score, 90);
  assert_eq!(report.band, "excellent");
  assert_eq!(report.metadata.band_color, "green");
  assert_eq!(report.metadata.band_priority, 0);

  // One crit safety DTC: 27 penalty points -> 73, inside watch.
  let at_watch = request(
    r#"{
    "entries": [
      {"kind": "DTC", "id": "p0001", "severity": "crit", "category": "safety"}
    ],
    "history": {},
    "maintenance": []
  }"#,
  );
  let report = compute(&mut engine, &at_watch);
  assert_eq!(report.score, 73);
  assert_eq!(report.band, "watch");
}

#[test]
fn identical_inputs_produce_identical_results_across_engines() {
  let json = r#"{
    "entries": [
      {"kind": "DTC", "id": "p0420", "severity": "warn", "category": "emissions"},
      {
        "kind": "LIVE", "id": "battV", "severity": "warn", "value": 11.2, "unit": "V",
        "series": [
          {"t": 1, "v": 11.0}, {"t": 2, "v": 12.9}, {"t": 3, "v": 11.1},
          {"t": 4, "v": 13.0}, {"t": 5, "v": 11.2}, {"t": 6, "v": 12.8}
        ]
      }
    ],
    "history": {"uptimeRatio": 0.8, "harshEventCount": 9},
    "maintenance": [{"label": "oil change", "severity": "warn", "overdueDays": 45}]
  }"#;
  let req = request(json);

  let mut engine1 = HealthEngine::with_defaults();
  let mut engine2 = HealthEngine::with_defaults();
  let a = compute(&mut engine1, &req);
  let b = compute(&mut engine2, &req);

  assert_eq!(a.score, b.score);
  assert_eq!(a.band, b.band);
  assert_eq!(
    serde_json::to_string(&a.contributors).unwrap(),
    serde_json::to_string(&b.contributors).unwrap()
  );
  assert_eq!(
    serde_json::to_string(&a.recommendations).unwrap(),
    serde_json::to_string(&b.recommendations).unwrap()
  );
}

#[test]
fn repeat_calls_are_idempotent_and_hit_the_volatility_cache() {
  let req = request(
    r#"{
    "entries": [{
      "kind": "LIVE", "id": "coolantTempC", "severity": "warn", "value": 104.0,
      "series": [
        {"t": 1, "v": 101.0}, {"t": 2, "v": 103.0}, {"t": 3, "v": 102.0},
        {"t": 4, "v": 105.0}, {"t": 5, "v": 104.0}, {"t": 6, "v": 104.0}
      ]
    }],
    "history": {},
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let first = compute(&mut engine, &req);
  let second = compute(&mut engine, &req);

  assert_eq!(first.score, second.score);
  assert_eq!(first.band, second.band);
  assert_eq!(
    serde_json::to_string(&first.contributors).unwrap(),
    serde_json::to_string(&second.contributors).unwrap()
  );

  // First call misses, second is served from cache.
  assert_eq!(first.metadata.cache_utilization.hits, 0);
  assert_eq!(second.metadata.cache_utilization.hits, 1);
  assert_eq!(second.metadata.cache_utilization.hit_ratio, 1.0);

  // After an explicit clear the same input misses again.
  engine.clear_caches();
  let third = compute(&mut engine, &req);
  assert_eq!(third.metadata.cache_utilization.hits, 0);
  assert_eq!(third.score, first.score);
}

#[test]
fn adding_crit_dtcs_is_monotone_until_the_cap() {
  let mut engine = HealthEngine::with_defaults();
  let mut scores = Vec::new();
  for n in 1..=5 {
    let entries: Vec<String> = (0..n)
      .map(|i| {
        format!(
          r#"{{"kind": "DTC", "id": "p{:04}", "severity": "crit", "category": "safety"}}"#,
          i
        )
      })
      .collect();
    let json = format!(
      r#"{{"entries": [{}], "history": {{}}, "maintenance": []}}"#,
      entries.join(",")
    );
    let req = request(&json);
    scores.push(compute(&mut engine, &req).score);
  }

  for pair in scores.windows(2) {
    assert!(pair[1] <= pair[0], "score must never rise with more crit DTCs");
  }
  // Cap reached at two faults; further ones change nothing.
  assert_eq!(scores[1], scores[2]);
  assert_eq!(scores[2], scores[4]);
}

#[test]
fn config_overrides_reshape_a_single_call() {
  let req = request(
    r#"{
    "entries": [
      {"kind": "DTC", "id": "p0301", "severity": "crit", "category": "safety"}
    ],
    "history": {},
    "maintenance": [],
    "config": {
      "dtc": {"base": {"crit": 2.0}},
      "bands": [
        {"name": "pass", "min": 50.0, "color": "green", "priority": 0},
        {"name": "fail", "min": 0.0, "color": "red", "priority": 1}
      ]
    }
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  // round(2 x 1.5) = 3 penalty points under the override.
  assert_eq!(report.score, 97);
  assert_eq!(report.band, "pass");
  assert_eq!(report.metadata.band_color, "green");
}

#[test]
fn empty_band_override_degrades_to_the_fallback_report() {
  let req = request(
    r#"{
    "entries": [],
    "history": {},
    "maintenance": [],
    "config": {"bands": []}
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  assert_eq!(report.score, 50);
  assert_eq!(report.confidence, 0);
  assert_eq!(report.band, "unknown");
  assert!(report.contributors.is_empty());
  assert_eq!(report.recommendations.len(), 1);
  assert_eq!(report.recommendations[0].priority, RecPriority::High);
  assert!(report.metadata.error.is_some());
}

#[test]
fn driving_history_penalties_flow_into_the_report() {
  let req = request(
    r#"{
    "entries": [],
    "history": {"harshEventCount": 15, "efficiencyTrend": -0.4},
    "maintenance": []
  }"#,
  );
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);

  // Harsh: (15 - 5) x 0.5 = 5 (at its cap). Efficiency: 0.4 x 10 capped at 3.
  assert_eq!(report.breakdown.penalties.driving, 8.0);
  assert_eq!(report.score, 92);
  assert!(report
    .recommendations
    .iter()
    .any(|r| r.action.contains("Review driving patterns")));
}

#[test]
fn report_json_uses_the_dashboard_field_names() {
  let req = request(r#"{"entries": [], "history": {"cleanSessionStreak": 2}, "maintenance": []}"#);
  let mut engine = HealthEngine::with_defaults();
  let report = compute(&mut engine, &req);
  let json = serde_json::to_value(&report).unwrap();

  assert!(json["breakdown"]["bonuses"].get("recoveryBonus").is_some());
  assert!(json["metadata"].get("cacheUtilization").is_some());
  assert!(json["metadata"].get("elapsedMs").is_some());
  assert!(json["metadata"].get("bandColor").is_some());
}
