//! HTTP client for shardgrep nodes
//!
//! Provides the transport the coordinator uses to send one shard to one node.

use crate::error::{ClusterError, NodeError, Result};
use crate::metrics::NodeCallTimer;
use async_trait::async_trait;
use shardgrep::api::{ProcessRequest, ProcessResponse};
use std::time::Duration;
use tracing::debug;

/// Sends a match request to a single node.
///
/// Any failure - transport, undecodable response, or an error string
/// reported by the node - comes back as a [`NodeError`].
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn process(
        &self,
        node: &str,
        request: &ProcessRequest,
    ) -> std::result::Result<Vec<String>, NodeError>;
}

/// Normalize a node address into a base URL.
///
/// Trims whitespace and trailing slashes and prefixes `http://` when no scheme is given.
pub fn normalize_node_addr(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

/// reqwest-backed node client
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
}

impl NodeClient {
    /// Create a client whose individual requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClusterError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    async fn send(
        &self,
        node: &str,
        request: &ProcessRequest,
    ) -> std::result::Result<Vec<String>, NodeError> {
        let url = format!("{}/process", node);
        debug!("Sending {} lines to {}", request.lines.len(), url);

        let resp = self.http.post(&url).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NodeError::Transport(format!(
                "{} returned {}: {}",
                url,
                status,
                body.trim()
            )));
        }

        let body: ProcessResponse = resp
            .json()
            .await
            .map_err(|e| NodeError::Decode(format!("{}: {}", url, e)))?;

        body.into_result().map_err(NodeError::Remote)
    }
}

#[async_trait]
impl NodeTransport for NodeClient {
    async fn process(
        &self,
        node: &str,
        request: &ProcessRequest,
    ) -> std::result::Result<Vec<String>, NodeError> {
        let timer = NodeCallTimer::new(node);
        let result = self.send(node, request).await;
        match &result {
            Ok(_) => timer.success(),
            Err(e) => timer.error(e.error_type()),
        }
        result
    }
}
