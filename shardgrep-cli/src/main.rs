use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "shardgrep")]
#[command(about = "Distributed grep over replicated shards")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SHARDGREP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a node serving POST /process
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Matching threads per request (0 = available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Search standard input across a set of nodes
    Grep {
        /// Substring or regular expression to search for
        pattern: String,

        /// Node addresses (comma-separated host:port or URLs)
        #[arg(short, long, value_delimiter = ',', env = "SHARDGREP_SERVERS")]
        servers: Vec<String>,

        /// Interpret the pattern as a regular expression
        #[arg(short = 'E', long)]
        regex: bool,

        /// Number of shards (0 = one per node)
        #[arg(long)]
        shards: Option<usize>,

        /// Successful nodes required per shard (0 = majority)
        #[arg(short, long)]
        quorum: Option<usize>,

        /// Per-shard deadline, e.g. "5s" or "750ms"
        #[arg(short, long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Log at the configured level instead of errors only
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("shardgrep: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = shardgrep::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            workers,
        } => {
            logging::init(&config.observability, None);
            commands::run_serve(
                &config,
                commands::ServeArgs {
                    host,
                    port,
                    workers,
                },
            )
            .await
        }
        Commands::Grep {
            pattern,
            servers,
            regex,
            shards,
            quorum,
            timeout,
            verbose,
        } => {
            logging::init(&config.observability, (!verbose).then_some("error"));
            commands::run_grep(
                &config,
                commands::GrepArgs {
                    pattern,
                    servers,
                    regex,
                    shards,
                    quorum,
                    timeout,
                },
            )
            .await
        }
    }
}
