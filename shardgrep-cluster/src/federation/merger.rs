//! Order-restoring merge of accepted shard results
//!
//! Shard results carry line values, not positions, and arrive in whatever
//! order the node's workers produced them. The merge counts matched values
//! across all shards and then walks the original input once, emitting a line
//! while its remaining count is positive.
//!
//! A value therefore appears `min(occurrences in input, matched occurrences)`
//! times, at its original positions.

use std::collections::HashMap;

/// Rebuild the final match list in input order from unordered per-shard matches.
pub fn restore_order<S: AsRef<[String]>>(original: &[String], accepted: &[S]) -> Vec<String> {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for shard in accepted {
        for line in shard.as_ref() {
            *remaining.entry(line.as_str()).or_insert(0) += 1;
        }
    }

    if remaining.is_empty() {
        return Vec::new();
    }

    let mut merged = Vec::new();
    for line in original {
        if let Some(count) = remaining.get_mut(line.as_str()) {
            if *count > 0 {
                *count -= 1;
                merged.push(line.clone());
            }
        }
    }

    merged
}
