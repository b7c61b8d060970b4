//! Cluster-specific error types

use thiserror::Error;

/// A single node call failed. Absorbed into the shard's quorum count, never fatal on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Node reported error: {0}")]
    Remote(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl NodeError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            NodeError::Transport(_) => "transport",
            NodeError::Decode(_) => "decode",
            NodeError::Remote(_) => "remote",
            NodeError::Timeout(_) => "timeout",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NodeError::Timeout(_))
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NodeError::Timeout(err.to_string())
        } else if err.is_decode() {
            NodeError::Decode(err.to_string())
        } else {
            NodeError::Transport(err.to_string())
        }
    }
}

/// Errors that abort a distributed grep
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("quorum not reached for shard {shard}: {successes} of {required} required nodes succeeded")]
    Quorum {
        shard: usize,
        successes: usize,
        required: usize,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClusterError {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            ClusterError::Pattern(_) => "pattern",
            ClusterError::Config(_) => "config",
            ClusterError::Quorum { .. } => "quorum",
            ClusterError::Internal(_) => "internal",
        }
    }
}

impl From<shardgrep::Error> for ClusterError {
    fn from(err: shardgrep::Error) -> Self {
        match err {
            shardgrep::Error::Pattern(e) => ClusterError::Pattern(e.to_string()),
            shardgrep::Error::Config(msg) => ClusterError::Config(msg),
            other => ClusterError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_error_names_shard() {
        let err = ClusterError::Quorum {
            shard: 0,
            successes: 1,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "quorum not reached for shard 0: 1 of 2 required nodes succeeded"
        );
        assert_eq!(err.error_type(), "quorum");
    }

    #[test]
    fn test_from_core_pattern_error() {
        let core = shardgrep::engine::CompiledPattern::compile("(*", shardgrep::MatchMode::Regex)
            .unwrap_err();
        let err = ClusterError::from(core);
        assert!(matches!(err, ClusterError::Pattern(_)));
        assert!(!err.to_string().contains("Invalid pattern: Invalid pattern"));
    }

    #[test]
    fn test_node_error_labels() {
        assert_eq!(NodeError::Timeout("x".into()).error_type(), "timeout");
        assert!(NodeError::Timeout("x".into()).is_timeout());
        assert!(!NodeError::Remote("x".into()).is_timeout());
        assert_eq!(NodeError::Decode("x".into()).error_type(), "decode");
    }
}
