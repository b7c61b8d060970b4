//! Coordinator-side metrics
//!
//! - Node call duration and outcome by error type
//! - Per-shard quorum decisions
//! - Completed and failed greps
//!
//! Without an installed recorder these calls are no-ops, which is the normal
//! case for the one-shot client.

use std::time::{Duration, Instant};

/// Record node call duration
pub fn record_node_call_duration(target_node: &str, duration: Duration) {
    metrics::histogram!(
        "shardgrep_node_call_duration_seconds",
        "target_node" => target_node.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record node call success
pub fn record_node_call_success(target_node: &str) {
    metrics::counter!(
        "shardgrep_node_calls_total",
        "target_node" => target_node.to_string(),
        "status" => "ok",
    )
    .increment(1);
}

/// Record node call error
pub fn record_node_call_error(target_node: &str, error_type: &str) {
    metrics::counter!(
        "shardgrep_node_calls_total",
        "target_node" => target_node.to_string(),
        "status" => "error",
    )
    .increment(1);

    metrics::counter!(
        "shardgrep_node_call_errors_total",
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Record the quorum decision for one shard
pub fn record_quorum_decision(accepted: bool, successes: usize) {
    let status = if accepted { "accepted" } else { "rejected" };
    metrics::counter!(
        "shardgrep_shard_quorum_total",
        "status" => status,
    )
    .increment(1);

    metrics::histogram!("shardgrep_shard_successful_nodes").record(successes as f64);
}

/// Record a completed distributed grep
pub fn record_grep(shards: usize, matches: usize, duration: Duration) {
    metrics::histogram!("shardgrep_grep_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("shardgrep_shards_total").increment(shards as u64);
    metrics::counter!("shardgrep_matches_total").increment(matches as u64);
}

/// Record a distributed grep that ended in an error
pub fn record_grep_failure(error_type: &str) {
    metrics::counter!(
        "shardgrep_grep_failures_total",
        "error_type" => error_type.to_string(),
    )
    .increment(1);
}

/// Guard for timing node calls.
///
/// A timer dropped before `success` or `error` belongs to a call cut off by
/// the shard deadline and is recorded as a timeout.
pub struct NodeCallTimer {
    target_node: String,
    start: Instant,
    finished: bool,
}

impl NodeCallTimer {
    /// Start timing a call to `target_node`
    pub fn new(target_node: &str) -> Self {
        Self {
            target_node: target_node.to_string(),
            start: Instant::now(),
            finished: false,
        }
    }

    /// Record success and duration
    pub fn success(mut self) {
        record_node_call_duration(&self.target_node, self.start.elapsed());
        record_node_call_success(&self.target_node);
        self.finished = true;
    }

    /// Record error and duration
    pub fn error(mut self, error_type: &str) {
        self.finish_with_error(error_type);
    }

    fn finish_with_error(&mut self, error_type: &str) {
        record_node_call_duration(&self.target_node, self.start.elapsed());
        record_node_call_error(&self.target_node, error_type);
        self.finished = true;
    }
}

impl Drop for NodeCallTimer {
    fn drop(&mut self) {
        if !self.finished {
            self.finish_with_error("timeout");
        }
    }
}
