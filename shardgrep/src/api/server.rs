use crate::config::ServerConfig;
use crate::engine::{GrepEngine, Matcher};
use crate::{Error, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<dyn Matcher>,
    pub workers: usize,
    pub metrics: Option<PrometheusHandle>,
}

/// Stateless HTTP node wrapping a matcher
pub struct NodeServer {
    matcher: Arc<dyn Matcher>,
    workers: usize,
    max_body_size: usize,
    metrics: Option<PrometheusHandle>,
}

impl NodeServer {
    pub fn new(engine: GrepEngine) -> Self {
        let workers = engine.workers();
        Self::with_matcher(Arc::new(engine), workers)
    }

    /// Serve an arbitrary matcher; `workers` is only reported by `/health`.
    pub fn with_matcher(matcher: Arc<dyn Matcher>, workers: usize) -> Self {
        Self {
            matcher,
            workers,
            max_body_size: ServerConfig::default().max_body_size,
            metrics: None,
        }
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Expose the given Prometheus handle at `GET /metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            matcher: self.matcher.clone(),
            workers: self.workers,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/process", post(crate::api::routes::process))
            .route("/health", get(crate::api::routes::health))
            .route("/metrics", get(crate::api::routes::metrics))
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.max_body_size))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Node listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        tracing::info!("Node stopped");
        Ok(())
    }
}

/// Install the process-wide Prometheus recorder
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("failed to install metrics recorder: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
