//! Vehicle Health Scoring Engine — deterministic, rule-based.
//!
//! Ingests diagnostic trouble codes, live sensor time-series, maintenance
//! records, and driving history; derives a 0-100 health score with a
//! confidence level, ranked contributors, a severity band, and prioritized
//! recommendations. Inputs arrive as untrusted JSON and are filtered, never
//! rejected; scoring never fails, it degrades.
//!
//! No AI, no DB, no network; pure computation + a per-engine memo cache.

pub mod config;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod log;
pub mod penalties;
pub mod recommend;
pub mod score;
pub mod types;
pub mod validate;
pub mod volatility;

pub use config::{ConfigOverrides, EngineConfig};
pub use engine::{HealthEngine, PerfStats};
pub use error::EngineError;
pub use types::{HealthReport, HealthRequest};
