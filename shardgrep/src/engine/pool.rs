//! Fixed-size worker pool draining a bounded queue of line indices
//!
//! ```text
//! feeder ──(idx)──▶ [bounded queue] ──▶ worker 1..W ──(line)──▶ collector
//! ```
//!
//! Workers push matches as they find them, so the collector's fill order is
//! whatever order the workers happen to finish in.

use super::pattern::CompiledPattern;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::thread;

/// Queue slots per worker
const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// Evaluate every line against `pattern` on `workers` threads.
///
/// Returns the matching lines with their multiplicity preserved; the order
/// of the returned vector is unspecified.
pub(crate) fn run(lines: &[String], pattern: &CompiledPattern, workers: usize) -> Vec<String> {
    if lines.is_empty() {
        return Vec::new();
    }

    let workers = workers.clamp(1, lines.len());
    let (tx, rx) = mpsc::sync_channel::<usize>(workers * QUEUE_DEPTH_PER_WORKER);
    let rx = Mutex::new(rx);
    let matches = Mutex::new(Vec::new());

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                // Guard is released at the end of the statement, before matching.
                let next = rx.lock().recv();
                let Ok(idx) = next else {
                    break;
                };
                let line = &lines[idx];
                if pattern.is_match(line) {
                    matches.lock().push(line.clone());
                }
            });
        }

        for idx in 0..lines.len() {
            if tx.send(idx).is_err() {
                break;
            }
        }
        // Closing the queue lets idle workers exit.
        drop(tx);
    });

    matches.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MatchMode;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_empty_input() {
        let p = CompiledPattern::compile("a", MatchMode::Substring).unwrap();
        assert!(run(&[], &p, 4).is_empty());
    }

    #[test]
    fn test_more_workers_than_lines() {
        let p = CompiledPattern::compile("a", MatchMode::Substring).unwrap();
        let out = run(&lines(&["a", "b"]), &p, 64);
        assert_eq!(out, vec!["a"]);
    }

    #[test]
    fn test_zero_workers_still_runs() {
        let p = CompiledPattern::compile("a", MatchMode::Substring).unwrap();
        let out = run(&lines(&["a", "ba", "c"]), &p, 0);
        assert_eq!(sorted(out), vec!["a", "ba"]);
    }

    #[test]
    fn test_keeps_duplicates() {
        let p = CompiledPattern::compile("x", MatchMode::Substring).unwrap();
        let out = run(&lines(&["x", "y", "x", "x"]), &p, 3);
        assert_eq!(out, vec!["x", "x", "x"]);
    }

    #[test]
    fn test_large_input_overflows_queue() {
        // More lines than queue slots forces the feeder to block on a full queue.
        let input: Vec<String> = (0..10_000).map(|i| format!("line-{}", i)).collect();
        let p = CompiledPattern::compile("7", MatchMode::Substring).unwrap();
        let out = run(&input, &p, 2);

        let expected: Vec<String> = input.iter().filter(|l| l.contains('7')).cloned().collect();
        assert_eq!(out.len(), expected.len());
        assert_eq!(sorted(out), sorted(expected));
    }
}
