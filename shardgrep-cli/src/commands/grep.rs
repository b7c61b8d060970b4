use anyhow::{Context, Result};
use shardgrep::config::ClusterConfig;
use shardgrep::input::read_lines;
use shardgrep::{Config, MatchMode};
use shardgrep_cluster::DistributedGrep;
use std::io::{BufRead, BufWriter, Write};
use std::time::Duration;

/// Flags that override the `[cluster]` config section
#[derive(Debug, Default)]
pub struct GrepArgs {
    pub pattern: String,
    pub servers: Vec<String>,
    pub regex: bool,
    pub shards: Option<usize>,
    pub quorum: Option<usize>,
    pub timeout: Option<Duration>,
}

/// Grep standard input across the cluster and print matches to stdout.
///
/// Nothing is printed unless every shard reached quorum.
pub async fn run_grep(config: &Config, args: GrepArgs) -> Result<()> {
    grep_stream(config, args, std::io::stdin().lock(), std::io::stdout().lock()).await
}

/// Validate, read `input` to the end, grep it and write matches to `output`.
///
/// Configuration and pattern errors are reported before `input` is touched.
async fn grep_stream<R: BufRead, W: Write>(
    config: &Config,
    args: GrepArgs,
    input: R,
    output: W,
) -> Result<()> {
    let cluster = cluster_config(&config.cluster, &args);
    let mode = MatchMode::from_regex_flag(args.regex);

    let grep = DistributedGrep::from_config(&cluster)?;
    DistributedGrep::validate(&args.pattern, mode)?;

    let lines = read_lines(input).context("failed to read standard input")?;
    tracing::debug!("Read {} lines from stdin", lines.len());

    let matches = grep
        .grep(&args.pattern, &lines, mode, cluster.shards, cluster.quorum)
        .await?;

    write_matches(output, &matches).context("failed to write matches")
}

/// Apply command-line overrides on top of the `[cluster]` section.
fn cluster_config(base: &ClusterConfig, args: &GrepArgs) -> ClusterConfig {
    let mut cluster = base.clone();
    if !args.servers.is_empty() {
        cluster.nodes = args.servers.clone();
    }
    if let Some(shards) = args.shards {
        cluster.shards = shards;
    }
    if let Some(quorum) = args.quorum {
        cluster.quorum = quorum;
    }
    if let Some(timeout) = args.timeout {
        // Sub-millisecond deadlines round up so they never read as "unset".
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        cluster.timeout_ms = if timeout.is_zero() { 0 } else { millis.max(1) };
    }
    cluster
}

fn write_matches<W: Write>(out: W, matches: &[String]) -> std::io::Result<()> {
    let mut out = BufWriter::new(out);
    for line in matches {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
