//! Tracing setup shared by both subcommands
//!
//! Logs always go to stderr; the grep client's stdout carries matches only.

use shardgrep::config::ObservabilityConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level_override`, which wins over the configured level.
/// `LOG_FORMAT=json` (or `log_format = "json"`) selects JSON lines.
pub fn init(config: &ObservabilityConfig, level_override: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(level_override.unwrap_or(config.log_level.as_str()))
    });

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.log_format.clone());
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
