//! shardgrep - node-side search core
//!
//! Every shardgrep node is a full replica of the search capability. A node
//! receives a shard of lines plus a pattern, evaluates the lines on a fixed
//! worker pool and answers with the matching lines.
//!
//! # Modules
//!
//! - **engine**: the concurrent matching engine (substring or regex mode)
//! - **api**: the HTTP node service exposing the engine at `POST /process`
//! - **config**: TOML configuration shared by server and client binaries
//! - **input**: line reader used by the client to slurp standard input

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod metrics;

pub use config::Config;
pub use engine::{GrepEngine, MatchMode, Matcher};
pub use error::{Error, Result};

/// Crate version reported by the node health endpoint
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
