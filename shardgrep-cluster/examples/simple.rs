//! Distributed grep through the library API.
//!
//! Uses the nodes listed in `SHARDGREP_SERVERS` (comma-separated) when set,
//! otherwise starts two in-process nodes on random local ports.
//!
//! ```text
//! cargo run -p shardgrep-cluster --example simple
//! ```

use shardgrep::api::NodeServer;
use shardgrep::{GrepEngine, MatchMode};
use std::time::Duration;

async fn start_local_node() -> std::io::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = NodeServer::new(GrepEngine::default()).router();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("node {} stopped: {}", addr, e);
        }
    });

    Ok(format!("http://{}", addr))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let servers: Vec<String> = match std::env::var("SHARDGREP_SERVERS") {
        Ok(list) => list.split(',').map(str::to_string).collect(),
        Err(_) => vec![start_local_node().await?, start_local_node().await?],
    };

    let lines: Vec<String> = "apple\nbanana\napple pie\norange\n"
        .lines()
        .map(str::to_string)
        .collect();

    // 2 shards, quorum of 1, 2 second deadline per shard.
    let matches = shardgrep_cluster::grep(
        "apple",
        &lines,
        MatchMode::Substring,
        2,
        1,
        Duration::from_secs(2),
        &servers,
    )
    .await?;

    println!("Matches:");
    for line in matches {
        println!("{}", line);
    }

    Ok(())
}
