use anyhow::{Context, Result};
use shardgrep::api::{install_metrics_recorder, NodeServer};
use shardgrep::{Config, GrepEngine};

/// Flags that override the `[server]` and `[engine]` config sections
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<usize>,
}

/// Run a node until Ctrl-C
pub async fn run_serve(config: &Config, args: ServeArgs) -> Result<()> {
    let addr = resolve_bind_addr(&config.server.bind_addr, args.host.as_deref(), args.port);
    let engine = GrepEngine::new(args.workers.unwrap_or(config.engine.workers));

    tracing::info!(
        "Starting shardgrep node {} on {} ({} workers)",
        shardgrep::VERSION,
        addr,
        engine.workers()
    );

    let mut server = NodeServer::new(engine).with_max_body_size(config.server.max_body_size);
    if config.observability.metrics_enabled {
        server = server.with_metrics(install_metrics_recorder()?);
    }

    server
        .serve(&addr)
        .await
        .with_context(|| format!("node on {} failed", addr))
}

/// Replace the host and/or port of `bind_addr`.
fn resolve_bind_addr(bind_addr: &str, host: Option<&str>, port: Option<u16>) -> String {
    let (default_host, default_port) = bind_addr.rsplit_once(':').unwrap_or((bind_addr, "8081"));
    let host = host.unwrap_or(default_host);
    match port {
        Some(port) => format!("{}:{}", host, port),
        None => format!("{}:{}", host, default_port),
    }
}
