//! Concurrent matching engine
//!
//! Evaluates a list of lines against a substring or regex pattern on a fixed
//! pool of worker threads. Only the matched lines (with multiplicity) are
//! meaningful to callers; the order they come back in is not.
//!
//! # Example
//!
//! ```
//! use shardgrep::engine::{GrepEngine, MatchMode, Matcher};
//!
//! let engine = GrepEngine::new(2);
//! let lines = vec!["cat".to_string(), "dog".to_string(), "cart".to_string()];
//! let mut matches = engine.find_matches(&lines, "^ca", MatchMode::Regex).unwrap();
//! matches.sort();
//! assert_eq!(matches, vec!["cart", "cat"]);
//! ```

mod pattern;
mod pool;

pub use pattern::{CompiledPattern, MatchMode};

use crate::metrics;
use crate::Result;
use std::time::Instant;
use tracing::debug;

/// Anything that can select the lines matching a pattern.
///
/// The node service only talks to this trait.
pub trait Matcher: Send + Sync {
    /// Return the lines that match `pattern` under `mode`, in unspecified order.
    fn find_matches(&self, lines: &[String], pattern: &str, mode: MatchMode) -> Result<Vec<String>>;
}

/// Worker-pool backed matcher
#[derive(Debug, Clone)]
pub struct GrepEngine {
    workers: usize,
}

impl GrepEngine {
    /// Create an engine with `workers` threads per call; 0 uses the available parallelism.
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            workers
        };
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for GrepEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Matcher for GrepEngine {
    fn find_matches(&self, lines: &[String], pattern: &str, mode: MatchMode) -> Result<Vec<String>> {
        let compiled = CompiledPattern::compile(pattern, mode)?;

        let start = Instant::now();
        let matches = pool::run(lines, &compiled, self.workers);
        let elapsed = start.elapsed();

        metrics::record_match(mode, lines.len(), matches.len(), elapsed);
        debug!(
            "Matched {}/{} lines ({} mode, {} workers) in {:?}",
            matches.len(),
            lines.len(),
            mode.as_str(),
            self.workers,
            elapsed
        );

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_default_workers() {
        assert!(GrepEngine::new(0).workers() >= 1);
        assert_eq!(GrepEngine::new(3).workers(), 3);
    }

    #[test]
    fn test_match_substring() {
        let engine = GrepEngine::new(2);
        let input = lines(&["apple", "banana", "apple pie", "orange"]);
        let matches = engine.find_matches(&input, "apple", MatchMode::Substring).unwrap();
        assert_eq!(sorted(matches), vec!["apple", "apple pie"]);
    }

    #[test]
    fn test_match_regex() {
        let engine = GrepEngine::new(2);
        let input = lines(&["cat", "car", "dog", "cart"]);
        let matches = engine.find_matches(&input, "^ca.*", MatchMode::Regex).unwrap();
        assert_eq!(sorted(matches), vec!["car", "cart", "cat"]);
    }

    #[test]
    fn test_invalid_regex_fails_whole_call() {
        let engine = GrepEngine::new(2);
        let err = engine
            .find_matches(&lines(&["test"]), "(*", MatchMode::Regex)
            .unwrap_err();
        assert!(matches!(err, crate::Error::Pattern(_)));
    }

    #[test]
    fn test_no_matches() {
        let engine = GrepEngine::new(4);
        let matches = engine
            .find_matches(&lines(&["a", "b"]), "zzz", MatchMode::Substring)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_duplicates_preserved() {
        let engine = GrepEngine::new(2);
        let matches = engine
            .find_matches(&lines(&["a", "b", "a"]), "a", MatchMode::Substring)
            .unwrap();
        assert_eq!(matches, vec!["a", "a"]);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let matcher: std::sync::Arc<dyn Matcher> = std::sync::Arc::new(GrepEngine::new(1));
        let matches = matcher
            .find_matches(&lines(&["x1", "y"]), r"\d", MatchMode::Regex)
            .unwrap();
        assert_eq!(matches, vec!["x1"]);
    }

    proptest! {
        #[test]
        fn prop_matches_equal_sequential_filter(
            input in proptest::collection::vec("[abc]{0,4}", 0..200),
            needle in "[abc]{1,2}",
            workers in 1usize..8,
        ) {
            let engine = GrepEngine::new(workers);
            let got = engine.find_matches(&input, &needle, MatchMode::Substring).unwrap();
            let expected: Vec<String> =
                input.iter().filter(|l| l.contains(needle.as_str())).cloned().collect();
            prop_assert_eq!(sorted(got), sorted(expected));
        }
    }
}
