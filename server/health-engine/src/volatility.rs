//! Volatility analysis: a bounded 0-10 measure of how erratically a metric's
//! recent samples vary, after IQR outlier trimming. Memoized per engine with
//! a size-bounded TTL cache.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::config::VolatilityConfig;
use crate::log::DiagLog;
use crate::types::Sample;

/// Compute the volatility score for a series, no cache involved.
///
/// Coefficient of variation of the outlier-trimmed trailing window, clamped
/// to [0, 10]. Short series score 0: not enough signal. Non-finite sample
/// values count as 0.0 to keep index alignment with the raw series.
pub fn volatility_score(series: &[Sample], config: &VolatilityConfig) -> f64 {
  if series.len() < config.min_series_len {
    return 0.0;
  }

  let start = series.len().saturating_sub(config.sample_size);
  let values: Vec<f64> = series[start..]
    .iter()
    .map(|s| if s.v.is_finite() { s.v } else { 0.0 })
    .collect();

  // Positional quartiles over the sorted window.
  let mut sorted = values.clone();
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
  let q1 = sorted[sorted.len() / 4];
  let q3 = sorted[sorted.len() * 3 / 4];
  let iqr = q3 - q1;
  let lo = q1 - 1.5 * iqr;
  let hi = q3 + 1.5 * iqr;

  let trimmed: Vec<f64> = values
    .into_iter()
    .filter(|v| *v >= lo && *v <= hi)
    .collect();
  if trimmed.len() < 2 {
    return 0.0;
  }

  let mean = trimmed.iter().sum::<f64>() / trimmed.len() as f64;
  let variance =
    trimmed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / trimmed.len() as f64;
  let std_dev = variance.sqrt();

  // Coefficient of variation; raw std dev when the mean carries no scale.
  let cv = if mean.abs() < f64::EPSILON {
    std_dev
  } else {
    std_dev / mean.abs()
  };
  cv.clamp(0.0, 10.0)
}

// ---------------------------------------------------------------------------
// Memoization
// ---------------------------------------------------------------------------

/// Coarse memo key: series length, bit patterns of the last 3 raw values,
/// and the config knobs that change the result. Two series with the same
/// length/tail/config collide on purpose; an accepted approximation for a
/// display heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VolKey {
  len: usize,
  tail: [u64; 3],
  sample_size: usize,
  min_series_len: usize,
}

impl VolKey {
  fn for_series(series: &[Sample], config: &VolatilityConfig) -> Self {
    let mut tail = [0u64; 3];
    for (i, sample) in series.iter().rev().take(3).enumerate() {
      tail[i] = sample.v.to_bits();
    }
    Self {
      len: series.len(),
      tail,
      sample_size: config.sample_size,
      min_series_len: config.min_series_len,
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct CacheSlot {
  value: f64,
  inserted_at: Instant,
}

/// Size-bounded TTL memo cache for volatility scores. Eviction removes the
/// oldest-inserted key first, best effort; not strictly LRU.
#[derive(Debug, Default)]
pub struct VolatilityCache {
  slots: HashMap<VolKey, CacheSlot>,
  order: VecDeque<VolKey>,
  hits: u64,
  misses: u64,
}

impl VolatilityCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn hits(&self) -> u64 {
    self.hits
  }

  pub fn misses(&self) -> u64 {
    self.misses
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  pub fn clear(&mut self) {
    self.slots.clear();
    self.order.clear();
    self.hits = 0;
    self.misses = 0;
  }

  fn get(&self, key: &VolKey, ttl: Duration) -> Option<f64> {
    match self.slots.get(key) {
      Some(slot) if slot.inserted_at.elapsed() < ttl => Some(slot.value),
      _ => None,
    }
  }

  fn insert(&mut self, key: VolKey, value: f64, max_entries: usize) {
    if !self.slots.contains_key(&key) {
      while self.slots.len() >= max_entries.max(1) {
        match self.order.pop_front() {
          Some(oldest) => {
            self.slots.remove(&oldest);
          }
          None => break,
        }
      }
      self.order.push_back(key);
    }
    self.slots.insert(
      key,
      CacheSlot {
        value,
        inserted_at: Instant::now(),
      },
    );
  }
}

/// Volatility with memoization. Falls through to the pure computation when
/// caching is disabled; hit/miss counters feed report metadata.
pub fn volatility_score_cached(
  series: &[Sample],
  config: &VolatilityConfig,
  cache: &mut VolatilityCache,
  log: &DiagLog,
) -> f64 {
  if !config.cache_enabled {
    return volatility_score(series, config);
  }

  let key = VolKey::for_series(series, config);
  let ttl = Duration::from_millis(config.cache_ttl_ms);
  if let Some(hit) = cache.get(&key, ttl) {
    cache.hits += 1;
    return hit;
  }

  cache.misses += 1;
  let score = volatility_score(series, config);
  cache.insert(key, score, config.cache_max_entries);
  log.debug(&format!(
    "volatility cache miss (series len {}, cached {})",
    series.len(),
    cache.len()
  ));
  score
}
