//! Node-side metrics
//!
//! Recorded through the `metrics` facade; the server binary installs a
//! Prometheus recorder and renders it at `GET /metrics`.

use crate::engine::MatchMode;
use std::time::Duration;

/// Record one matching engine run
pub fn record_match(mode: MatchMode, lines: usize, matches: usize, duration: Duration) {
    metrics::histogram!(
        "shardgrep_match_duration_seconds",
        "mode" => mode.as_str(),
    )
    .record(duration.as_secs_f64());

    metrics::counter!("shardgrep_lines_scanned_total").increment(lines as u64);
    metrics::counter!("shardgrep_lines_matched_total").increment(matches as u64);
}

/// Record a `/process` request outcome
pub fn record_process_request(status: &str, duration: Duration) {
    metrics::counter!(
        "shardgrep_process_requests_total",
        "status" => status.to_string(),
    )
    .increment(1);

    metrics::histogram!("shardgrep_process_duration_seconds").record(duration.as_secs_f64());
}
