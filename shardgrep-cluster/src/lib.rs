//! shardgrep Cluster - client-side coordination of a distributed grep
//!
//! Splits the input into round-robin shards, broadcasts every shard to every
//! node, accepts a shard once a quorum of nodes answered, and merges the
//! accepted results back into input order.
//!
//! # Architecture
//!
//! - **Client**: `NodeTransport` seam plus the reqwest-backed `NodeClient`
//! - **Federation**: sharder, quorum fan-out coordinator and order-restoring merger
//! - **Metrics**: node call latency and quorum decision counters
//!
//! Nodes are stateless and interchangeable; the node set is a static list
//! passed per invocation.

pub mod client;
pub mod error;
pub mod federation;
pub mod metrics;

pub use client::{normalize_node_addr, NodeClient, NodeTransport};
pub use error::{ClusterError, NodeError, Result};
pub use federation::{
    effective_quorum, effective_shard_count, restore_order, shard_lines, AcceptedShard,
    DistributedGrep, NodeFailure, QuorumTally, ShardOutcome, DEFAULT_TIMEOUT,
};

use shardgrep::MatchMode;
use std::time::Duration;

/// One-shot distributed grep over `nodes` using the HTTP transport.
///
/// See [`DistributedGrep::grep`] for the meaning of the zero defaults.
pub async fn grep(
    pattern: &str,
    lines: &[String],
    mode: MatchMode,
    shard_count: usize,
    quorum: usize,
    timeout: Duration,
    nodes: &[String],
) -> Result<Vec<String>> {
    DistributedGrep::new(nodes.to_vec(), timeout)?
        .grep(pattern, lines, mode, shard_count, quorum)
        .await
}
