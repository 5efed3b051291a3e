//! Binary entrypoint: read JSON lines from stdin, write JSON lines to stdout.
//!
//! Each input line is a HealthRequest {entries, history, maintenance, config}.
//! Output lines are either:
//! - A HealthReport (scoring never fails; a degraded report is still a report)
//! - An ErrorOutput (when the line is not valid JSON)
//!
//! Diagnostics go to stderr via tracing; stdout stays a clean JSON stream.

use health_engine::types::ErrorOutput;
use health_engine::{HealthEngine, HealthRequest};
use std::io::{self, BufRead, Write};

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  let mut engine = HealthEngine::with_defaults();

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "health-engine: read error: {}", e);
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    // Parse the request envelope; the data fields stay raw for validation.
    let request: HealthRequest = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    let report = engine.compute(
      &request.entries,
      &request.history,
      &request.maintenance,
      request.config.as_ref(),
    );
    let _ = serde_json::to_writer(&mut out, &report);
    let _ = writeln!(out);
    let _ = out.flush();
  }

  let _ = out.flush();
}
