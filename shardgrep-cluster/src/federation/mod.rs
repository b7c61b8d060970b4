//! Quorum-gated fan-out of replicated shards
//!
//! Every shard is sent, unmodified, to every node. A shard is accepted once
//! at least `quorum` nodes answered successfully, and one of those answers
//! (the first to arrive) becomes the shard's result.
//!
//! # Architecture
//!
//! ```text
//! lines → Sharder → [Shard 0, Shard 1, ...] → Merger → ordered matches
//!                        ↓ (one shard at a time)
//!              broadcast to all nodes, shared deadline
//!                        ↓
//!              drain every call, count successes
//!                        ↓
//!              successes < quorum → abort with QuorumError
//! ```
//!
//! Quorum is a reliability gate, not a consistency check: the answers of the
//! successful nodes are never compared with each other.
//!
//! # Example
//!
//! ```no_run
//! use shardgrep::MatchMode;
//! use shardgrep_cluster::federation::DistributedGrep;
//! use std::time::Duration;
//!
//! # async fn run() -> shardgrep_cluster::Result<()> {
//! let lines = vec!["apple".to_string(), "banana".to_string(), "apple pie".to_string()];
//! let nodes = vec!["10.0.0.1:8081".to_string(), "10.0.0.2:8081".to_string()];
//!
//! let grep = DistributedGrep::new(nodes, Duration::from_secs(5))?;
//! let matches = grep.grep("apple", &lines, MatchMode::Substring, 2, 1).await?;
//! assert_eq!(matches, vec!["apple", "apple pie"]);
//! # Ok(())
//! # }
//! ```

mod merger;
mod sharder;

pub use merger::restore_order;
pub use sharder::{effective_quorum, effective_shard_count, shard_lines};

use crate::client::{normalize_node_addr, NodeClient, NodeTransport};
use crate::error::{ClusterError, NodeError, Result};
use crate::metrics;
use futures::stream::{FuturesUnordered, StreamExt};
use shardgrep::api::ProcessRequest;
use shardgrep::config::ClusterConfig;
use shardgrep::engine::{CompiledPattern, MatchMode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-shard deadline used when none (or zero) is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Details of a failed node call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    /// Node that was called
    pub node: String,
    /// Error message
    pub reason: String,
    /// Whether the call was cut off by the shard deadline or the client timeout
    pub is_timeout: bool,
}

/// Success/failure count for one shard's broadcast
#[derive(Debug, Clone, Default)]
pub struct QuorumTally {
    /// Number of nodes the shard was sent to
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<NodeFailure>,
}

impl QuorumTally {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, failure: NodeFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn has_quorum(&self, quorum: usize) -> bool {
        self.successful >= quorum
    }
}

/// A shard whose result passed the quorum gate
#[derive(Debug, Clone)]
pub struct AcceptedShard {
    pub shard: usize,
    /// The chosen node's matches, in the node's (unspecified) order
    pub matches: Vec<String>,
    pub tally: QuorumTally,
}

/// Quorum decision for one shard
#[derive(Debug, Clone)]
pub enum ShardOutcome {
    Accepted(AcceptedShard),
    Rejected { shard: usize, tally: QuorumTally },
}

/// Distributed grep coordinator over a static node set
pub struct DistributedGrep {
    transport: Arc<dyn NodeTransport>,
    nodes: Vec<String>,
    timeout: Duration,
}

impl DistributedGrep {
    /// Create a coordinator talking HTTP to `nodes`
    pub fn new(nodes: Vec<String>, timeout: Duration) -> Result<Self> {
        let timeout = effective_timeout(timeout);
        let client = NodeClient::new(timeout)?;
        Self::with_transport(Arc::new(client), nodes, timeout)
    }

    /// Create a coordinator from the `[cluster]` config section
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        Self::new(config.nodes.clone(), config.timeout())
    }

    /// Create a coordinator over a custom transport
    pub fn with_transport(
        transport: Arc<dyn NodeTransport>,
        nodes: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let nodes: Vec<String> = nodes
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| normalize_node_addr(n))
            .collect();

        if nodes.is_empty() {
            return Err(ClusterError::Config("no nodes configured".to_string()));
        }

        Ok(Self {
            transport,
            nodes,
            timeout: effective_timeout(timeout),
        })
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check a pattern without contacting any node.
    ///
    /// An empty pattern is a `ConfigError`, an invalid regex a `PatternError`.
    pub fn validate(pattern: &str, mode: MatchMode) -> Result<()> {
        if pattern.is_empty() {
            return Err(ClusterError::Config("no pattern supplied".to_string()));
        }
        CompiledPattern::compile(pattern, mode)?;
        Ok(())
    }

    /// Search `lines` for `pattern` across the cluster.
    ///
    /// `shard_count` of 0 means one shard per node; `quorum` of 0 means a
    /// strict majority. Returns the matching lines in input order with their
    /// original multiplicity, or the first error; never a partial result.
    pub async fn grep(
        &self,
        pattern: &str,
        lines: &[String],
        mode: MatchMode,
        shard_count: usize,
        quorum: usize,
    ) -> Result<Vec<String>> {
        let result = self.search(pattern, lines, mode, shard_count, quorum).await;
        if let Err(e) = &result {
            metrics::record_grep_failure(e.error_type());
        }
        result
    }

    async fn search(
        &self,
        pattern: &str,
        lines: &[String],
        mode: MatchMode,
        shard_count: usize,
        quorum: usize,
    ) -> Result<Vec<String>> {
        Self::validate(pattern, mode)?;

        let start = Instant::now();
        let shard_count = effective_shard_count(shard_count, self.nodes.len());
        let shards = shard_lines(lines, shard_count);

        let accepted = self.fan_out(pattern, shards, mode, quorum).await?;
        let shard_matches: Vec<Vec<String>> = accepted.into_iter().map(|a| a.matches).collect();
        let merged = restore_order(lines, &shard_matches);

        let elapsed = start.elapsed();
        metrics::record_grep(shard_count, merged.len(), elapsed);
        info!(
            "Grep over {} lines in {} shards on {} nodes: {} matches in {:?}",
            lines.len(),
            shard_count,
            self.nodes.len(),
            merged.len(),
            elapsed
        );

        Ok(merged)
    }

    /// Broadcast each shard to every node, in shard order, and gate each on `quorum`.
    ///
    /// Stops at the first shard that misses quorum; later shards are never sent.
    pub async fn fan_out(
        &self,
        pattern: &str,
        shards: Vec<Vec<String>>,
        mode: MatchMode,
        quorum: usize,
    ) -> Result<Vec<AcceptedShard>> {
        let quorum = effective_quorum(quorum, self.nodes.len());
        debug!(
            "Fanning out {} shards to {} nodes (quorum={}, timeout={:?})",
            shards.len(),
            self.nodes.len(),
            quorum,
            self.timeout
        );

        let mut accepted = Vec::with_capacity(shards.len());
        for (shard, lines) in shards.into_iter().enumerate() {
            let request = ProcessRequest::new(pattern, lines, mode);
            match self.gather_shard(shard, request, quorum).await {
                ShardOutcome::Accepted(result) => accepted.push(result),
                ShardOutcome::Rejected { shard, tally } => {
                    warn!(
                        "Quorum not reached for shard {}: {}/{} nodes succeeded, {} required",
                        shard, tally.successful, tally.total, quorum
                    );
                    return Err(ClusterError::Quorum {
                        shard,
                        successes: tally.successful,
                        required: quorum,
                    });
                }
            }
        }

        Ok(accepted)
    }

    /// Send one shard to every node and wait for all of them to finish or fail.
    async fn gather_shard(
        &self,
        shard: usize,
        request: ProcessRequest,
        quorum: usize,
    ) -> ShardOutcome {
        let request = Arc::new(request);
        let token = CancellationToken::new();
        let _cancel_on_exit = token.clone().drop_guard();
        let timeout = self.timeout;

        let mut calls: FuturesUnordered<_> = self
            .nodes
            .iter()
            .map(|node| {
                let transport = Arc::clone(&self.transport);
                let request = Arc::clone(&request);
                let token = token.clone();
                let node = node.clone();

                async move {
                    let result = tokio::select! {
                        biased;
                        result = transport.process(&node, &request) => result,
                        _ = token.cancelled() => Err(NodeError::Timeout(format!(
                            "shard deadline of {:?} elapsed",
                            timeout
                        ))),
                    };
                    (node, result)
                }
            })
            .collect();

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut tally = QuorumTally::new(self.nodes.len());
        let mut chosen: Option<Vec<String>> = None;

        loop {
            tokio::select! {
                next = calls.next() => {
                    let Some((node, result)) = next else {
                        break;
                    };
                    match result {
                        Ok(matches) => {
                            debug!("Shard {} on {}: {} matches", shard, node, matches.len());
                            tally.record_success();
                            if chosen.is_none() {
                                chosen = Some(matches);
                            }
                        }
                        Err(e) => {
                            warn!("Shard {} on {} failed: {}", shard, node, e);
                            tally.record_failure(NodeFailure {
                                node,
                                reason: e.to_string(),
                                is_timeout: e.is_timeout(),
                            });
                        }
                    }
                }
                _ = &mut deadline, if !token.is_cancelled() => {
                    debug!("Shard {} deadline reached, cancelling outstanding calls", shard);
                    token.cancel();
                }
            }
        }

        let accepted = tally.has_quorum(quorum);
        metrics::record_quorum_decision(accepted, tally.successful);

        match chosen {
            Some(matches) if accepted => ShardOutcome::Accepted(AcceptedShard {
                shard,
                matches,
                tally,
            }),
            _ => ShardOutcome::Rejected { shard, tally },
        }
    }
}

fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shardgrep::engine::{GrepEngine, Matcher};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Behavior {
        Match,
        Fail(NodeError),
        Delay(Duration),
        Hang,
    }

    /// In-process transport: each node runs a real engine or misbehaves on purpose.
    struct MockTransport {
        engine: GrepEngine,
        behaviors: HashMap<String, Behavior>,
        calls: AtomicUsize,
    }

    impl MockTransport {
        fn new(behaviors: &[(&str, Behavior)]) -> Arc<Self> {
            Arc::new(Self {
                engine: GrepEngine::new(2),
                behaviors: behaviors
                    .iter()
                    .map(|(node, b)| (normalize_node_addr(node), b.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn run(&self, request: &ProcessRequest) -> std::result::Result<Vec<String>, NodeError> {
            self.engine
                .find_matches(&request.lines, &request.pattern, request.mode())
                .map_err(|e| NodeError::Remote(e.to_string()))
        }
    }

    #[async_trait]
    impl NodeTransport for MockTransport {
        async fn process(
            &self,
            node: &str,
            request: &ProcessRequest,
        ) -> std::result::Result<Vec<String>, NodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviors.get(node).cloned().unwrap_or(Behavior::Match) {
                Behavior::Match => self.run(request),
                Behavior::Fail(e) => Err(e),
                Behavior::Delay(d) => {
                    tokio::time::sleep(d).await;
                    self.run(request)
                }
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fruit() -> Vec<String> {
        lines(&["apple", "banana", "apple pie", "orange"])
    }

    fn coordinator(
        transport: Arc<MockTransport>,
        nodes: &[&str],
        timeout: Duration,
    ) -> DistributedGrep {
        DistributedGrep::with_transport(
            transport,
            nodes.iter().map(|n| n.to_string()).collect(),
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_two_shards_two_nodes_quorum_one() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport.clone(), &["n1:1", "n2:1"], Duration::from_secs(1));

        let matches = grep
            .grep("apple", &fruit(), MatchMode::Substring, 2, 1)
            .await
            .unwrap();
        assert_eq!(matches, lines(&["apple", "apple pie"]));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_one_failing_node_quorum_two() {
        let transport = MockTransport::new(&[(
            "n2:1",
            Behavior::Fail(NodeError::Transport("connection refused".into())),
        )]);
        let grep = coordinator(transport.clone(), &["n1:1", "n2:1"], Duration::from_secs(1));

        let err = grep
            .grep("apple", &fruit(), MatchMode::Substring, 2, 2)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClusterError::Quorum {
                shard: 0,
                successes: 1,
                required: 2
            }
        );
        // Shard 1 is never launched once shard 0 fails.
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_keep_order_and_count() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport, &["n1:1", "n2:1", "n3:1"], Duration::from_secs(1));

        let matches = grep
            .grep("a", &lines(&["a", "b", "a"]), MatchMode::Substring, 0, 0)
            .await
            .unwrap();
        assert_eq!(matches, lines(&["a", "a"]));
    }

    #[tokio::test]
    async fn test_regex_mode() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport, &["n1:1"], Duration::from_secs(1));

        let matches = grep
            .grep("^ca", &lines(&["cat", "dog", "scar", "cart"]), MatchMode::Regex, 3, 1)
            .await
            .unwrap();
        assert_eq!(matches, lines(&["cat", "cart"]));
    }

    #[tokio::test]
    async fn test_invalid_regex_never_dispatched() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport.clone(), &["n1:1", "n2:1"], Duration::from_secs(1));

        let err = grep
            .grep("(*", &fruit(), MatchMode::Regex, 2, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Pattern(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_pattern_is_config_error() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport.clone(), &["n1:1"], Duration::from_secs(1));

        let err = grep
            .grep("", &fruit(), MatchMode::Substring, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_no_nodes_is_config_error() {
        let transport = MockTransport::new(&[]);
        let result =
            DistributedGrep::with_transport(transport, vec![" ".into()], Duration::from_secs(1));
        let err = result.err().unwrap();
        assert!(matches!(err, ClusterError::Config(_)));
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport, &["n1:1/"], Duration::ZERO);
        assert_eq!(grep.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(grep.nodes(), &["http://n1:1".to_string()]);
    }

    #[tokio::test]
    async fn test_remote_error_counts_as_failure() {
        let transport = MockTransport::new(&[
            ("n1:1", Behavior::Fail(NodeError::Remote("boom".into()))),
            ("n2:1", Behavior::Fail(NodeError::Decode("bad json".into()))),
        ]);
        let grep = coordinator(transport, &["n1:1", "n2:1", "n3:1"], Duration::from_secs(1));

        // Majority of 3 is 2, only n3 succeeds.
        let err = grep
            .grep("apple", &fruit(), MatchMode::Substring, 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Quorum { shard: 0, successes: 1, required: 2 }));
    }

    #[tokio::test]
    async fn test_hung_node_cut_off_by_deadline() {
        let transport = MockTransport::new(&[("n2:1", Behavior::Hang)]);
        let grep = coordinator(transport, &["n1:1", "n2:1"], Duration::from_millis(100));

        let start = Instant::now();
        let accepted = grep
            .fan_out("apple", shard_lines(&fruit(), 1), MatchMode::Substring, 1)
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));

        let tally = &accepted[0].tally;
        assert_eq!(tally.successful, 1);
        assert_eq!(tally.failed, 1);
        assert!(tally.failures[0].is_timeout);
        assert_eq!(tally.failures[0].node, "http://n2:1");
    }

    #[tokio::test]
    async fn test_hung_node_fails_quorum() {
        let transport = MockTransport::new(&[("n2:1", Behavior::Hang)]);
        let grep = coordinator(transport, &["n1:1", "n2:1"], Duration::from_millis(100));

        let err = grep
            .grep("apple", &fruit(), MatchMode::Substring, 2, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Quorum { shard: 0, .. }));
    }

    #[tokio::test]
    async fn test_drains_all_calls_after_quorum() {
        let transport = MockTransport::new(&[("n2:1", Behavior::Delay(Duration::from_millis(50)))]);
        let grep = coordinator(transport, &["n1:1", "n2:1"], Duration::from_secs(2));

        let accepted = grep
            .fan_out("apple", shard_lines(&fruit(), 1), MatchMode::Substring, 1)
            .await
            .unwrap();
        assert_eq!(accepted[0].tally.successful, 2);
        assert_eq!(accepted[0].tally.failed, 0);
    }

    #[tokio::test]
    async fn test_quorum_above_node_count_rejects() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport, &["n1:1", "n2:1"], Duration::from_secs(1));

        let err = grep
            .grep("apple", &fruit(), MatchMode::Substring, 1, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Quorum { shard: 0, successes: 2, required: 3 }));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let transport = MockTransport::new(&[]);
        let grep = coordinator(transport, &["n1:1", "n2:1"], Duration::from_secs(1));

        let matches = grep
            .grep("apple", &[], MatchMode::Substring, 0, 0)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    /// Hangs like an unresponsive node, timing the call the way `NodeClient` does.
    struct TimedHangTransport;

    #[async_trait]
    impl NodeTransport for TimedHangTransport {
        async fn process(
            &self,
            node: &str,
            _request: &ProcessRequest,
        ) -> std::result::Result<Vec<String>, NodeError> {
            let timer = metrics::NodeCallTimer::new(node);
            std::future::pending::<()>().await;
            timer.success();
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_deadline_cut_calls_recorded_as_timeouts() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let err = ::metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            runtime.block_on(async {
                let grep = DistributedGrep::with_transport(
                    Arc::new(TimedHangTransport),
                    vec!["n1:1".into()],
                    Duration::from_millis(50),
                )
                .unwrap();
                grep.grep("apple", &fruit(), MatchMode::Substring, 1, 1)
                    .await
                    .unwrap_err()
            })
        });
        assert!(matches!(err, ClusterError::Quorum { shard: 0, successes: 0, required: 1 }));

        let rendered = handle.render();
        let timeout_line = rendered
            .lines()
            .find(|l| l.starts_with("shardgrep_node_call_errors_total{"))
            .unwrap();
        assert!(timeout_line.contains(r#"error_type="timeout""#));
        assert!(timeout_line.ends_with(" 1"));

        let failure_line = rendered
            .lines()
            .find(|l| l.starts_with("shardgrep_grep_failures_total{"))
            .unwrap();
        assert!(failure_line.contains(r#"error_type="quorum""#));
    }

    #[test]
    fn test_validate() {
        assert!(DistributedGrep::validate("apple", MatchMode::Substring).is_ok());
        assert!(DistributedGrep::validate("(*", MatchMode::Substring).is_ok());
        assert!(matches!(
            DistributedGrep::validate("(*", MatchMode::Regex),
            Err(ClusterError::Pattern(_))
        ));
        assert!(matches!(
            DistributedGrep::validate("", MatchMode::Substring),
            Err(ClusterError::Config(_))
        ));
    }

    #[test]
    fn test_quorum_tally() {
        let mut tally = QuorumTally::new(3);
        tally.record_success();
        tally.record_failure(NodeFailure {
            node: "http://n2:1".into(),
            reason: "Timeout: shard deadline".into(),
            is_timeout: true,
        });

        assert_eq!(tally.total, 3);
        assert!(tally.has_quorum(1));
        assert!(!tally.has_quorum(2));
        assert_eq!(tally.failures.len(), 1);
    }
}
