//! Round-robin sharding of the input lines
//!
//! Line `i` lands in shard `i % n`; inside a shard lines keep their input
//! order. Membership depends only on position and shard count.

/// Resolve the requested shard count: 0 means one shard per node, never fewer than one.
pub fn effective_shard_count(requested: usize, nodes: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        nodes.max(1)
    }
}

/// Resolve the requested quorum: 0 means a strict majority of `nodes`.
pub fn effective_quorum(requested: usize, nodes: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        nodes / 2 + 1
    }
}

/// Split `lines` into exactly `shard_count` shards (a count of 0 is treated as 1).
pub fn shard_lines(lines: &[String], shard_count: usize) -> Vec<Vec<String>> {
    let n = shard_count.max(1);
    let mut shards: Vec<Vec<String>> = (0..n)
        .map(|i| Vec::with_capacity(lines.len() / n + usize::from(i < lines.len() % n)))
        .collect();

    for (i, line) in lines.iter().enumerate() {
        shards[i % n].push(line.clone());
    }

    shards
}
