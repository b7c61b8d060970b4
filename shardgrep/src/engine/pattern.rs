//! Pattern compilation for the two match modes

use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a pattern is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Literal substring containment, no escaping
    #[default]
    Substring,
    /// Regular expression, matched anywhere in the line
    Regex,
}

impl MatchMode {
    /// Map the wire-level `regex` flag onto a mode
    pub fn from_regex_flag(regex: bool) -> Self {
        if regex {
            MatchMode::Regex
        } else {
            MatchMode::Substring
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, MatchMode::Regex)
    }

    /// Get mode as a string for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Substring => "substring",
            MatchMode::Regex => "regex",
        }
    }
}

/// A pattern compiled once per call and shared read-only by every worker
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Substring(String),
    Regex(Regex),
}

impl CompiledPattern {
    /// Compile `pattern` for `mode`. An invalid regex fails here, before any line is looked at.
    pub fn compile(pattern: &str, mode: MatchMode) -> Result<Self> {
        match mode {
            MatchMode::Substring => Ok(CompiledPattern::Substring(pattern.to_string())),
            MatchMode::Regex => Ok(CompiledPattern::Regex(Regex::new(pattern)?)),
        }
    }

    #[inline]
    pub fn is_match(&self, line: &str) -> bool {
        match self {
            CompiledPattern::Substring(needle) => line.contains(needle.as_str()),
            CompiledPattern::Regex(re) => re.is_match(line),
        }
    }
}
