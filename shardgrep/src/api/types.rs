//! Wire types for the node service
//!
//! Both the node (`POST /process`) and the coordinator's HTTP client speak
//! these JSON shapes.

use crate::engine::MatchMode;
use serde::{Deserialize, Deserializer, Serialize};

/// One shard of lines to match against a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub pattern: String,
    #[serde(default)]
    pub lines: Vec<String>,
    /// Interpret `pattern` as a regular expression
    #[serde(default)]
    pub regex: bool,
}

impl ProcessRequest {
    pub fn new(pattern: impl Into<String>, lines: Vec<String>, mode: MatchMode) -> Self {
        Self {
            pattern: pattern.into(),
            lines,
            regex: mode.is_regex(),
        }
    }

    pub fn mode(&self) -> MatchMode {
        MatchMode::from_regex_flag(self.regex)
    }
}

/// Either the matched lines or a node-reported error
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProcessResponse {
    pub fn ok(matches: Vec<String>) -> Self {
        Self {
            matches,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Split into matches or the error message. An empty error string counts as success.
    pub fn into_result(self) -> std::result::Result<Vec<String>, String> {
        match self.error {
            Some(error) if !error.is_empty() => Err(error),
            _ => Ok(self.matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: ProcessRequest = serde_json::from_str(r#"{"pattern":"foo"}"#).unwrap();
        assert_eq!(req.pattern, "foo");
        assert!(req.lines.is_empty());
        assert_eq!(req.mode(), MatchMode::Substring);
    }

    #[test]
    fn test_request_missing_pattern_rejected() {
        assert!(serde_json::from_str::<ProcessRequest>(r#"{"lines":["a"]}"#).is_err());
    }

    #[test]
    fn test_request_wire_shape() {
        let req = ProcessRequest::new("^a", vec!["abc".into()], MatchMode::Regex);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pattern": "^a", "lines": ["abc"], "regex": true})
        );
    }

    #[test]
    fn test_response_ok_omits_error() {
        let json = serde_json::to_string(&ProcessResponse::ok(vec!["a".into()])).unwrap();
        assert_eq!(json, r#"{"matches":["a"]}"#);
    }

    #[test]
    fn test_response_into_result() {
        let ok: ProcessResponse = serde_json::from_str(r#"{"matches":["x"],"error":""}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), vec!["x"]);

        let failed: ProcessResponse =
            serde_json::from_str(r#"{"matches":null,"error":"boom"}"#).unwrap();
        assert!(failed.matches.is_empty());
        assert_eq!(failed.into_result().unwrap_err(), "boom");

        let failed = ProcessResponse::failed("regex parse error");
        assert_eq!(failed.into_result().unwrap_err(), "regex parse error");
    }
}
