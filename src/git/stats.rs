//! git::stats
//!
//! Per-command timing statistics.
//!
//! Every git invocation is recorded under its program and argument list:
//! how often it
//! ran, the total time spent in it and the slowest single run. The table is
//! shared between threads, can be read as a sorted snapshot and can be
//! reset. [`CommandStats::global`] is the process-wide table used by default.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use serde::Serialize;

/// Metric to sort a statistics snapshot by (descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatSort {
    /// Total time across all runs
    #[default]
    TotalTime,
    /// Number of runs
    Count,
    /// Slowest single run
    MaxTime,
}

/// Accumulated timings for one command signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Accumulator {
    count: u64,
    total: Duration,
    max: Duration,
}

/// Program and arguments identifying a command.
type Signature = (String, Vec<String>);

/// One row of a statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandStat {
    /// The program that was run
    pub program: String,
    /// The arguments, without the program name
    pub args: Vec<String>,
    /// Number of runs
    pub count: u64,
    /// Total time in milliseconds
    pub total_ms: f64,
    /// Slowest single run in milliseconds
    pub max_ms: f64,
}

impl CommandStat {
    /// The command line as it would be typed, e.g. `git rev-list --all`.
    pub fn command(&self) -> String {
        let mut command = self.program.clone();
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

/// Thread-safe statistics table.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tagtrail::git::{CommandStats, StatSort};
///
/// let stats = CommandStats::new();
/// stats.record("git", &["rev-list".to_string()], Duration::from_millis(20));
/// stats.record("git", &["rev-list".to_string()], Duration::from_millis(40));
///
/// let rows = stats.snapshot(StatSort::Count);
/// assert_eq!(rows[0].count, 2);
/// assert_eq!(rows[0].max_ms, 40.0);
///
/// stats.reset();
/// assert!(stats.snapshot(StatSort::Count).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct CommandStats {
    entries: Mutex<HashMap<Signature, Accumulator>>,
}

impl CommandStats {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table.
    pub fn global() -> &'static CommandStats {
        static GLOBAL: OnceLock<CommandStats> = OnceLock::new();
        GLOBAL.get_or_init(CommandStats::new)
    }

    /// Record one run of a command.
    pub fn record(&self, program: &str, args: &[String], elapsed: Duration) {
        let mut entries = self.lock();
        let entry = entries
            .entry((program.to_string(), args.to_vec()))
            .or_default();
        entry.count += 1;
        entry.total += elapsed;
        if elapsed > entry.max {
            entry.max = elapsed;
        }
    }

    /// Take a consistent snapshot, sorted descending by `sort`.
    pub fn snapshot(&self, sort: StatSort) -> Vec<CommandStat> {
        let mut rows: Vec<(Signature, Accumulator)> = self
            .lock()
            .iter()
            .map(|(signature, acc)| (signature.clone(), *acc))
            .collect();

        rows.sort_by(|(a_sig, a), (b_sig, b)| {
            let ord = match sort {
                StatSort::TotalTime => b.total.cmp(&a.total),
                StatSort::Count => b.count.cmp(&a.count),
                StatSort::MaxTime => b.max.cmp(&a.max),
            };
            ord.then_with(|| a_sig.cmp(b_sig))
        });

        rows.into_iter()
            .map(|((program, args), acc)| CommandStat {
                program,
                args,
                count: acc.count,
                total_ms: millis(acc.total),
                max_ms: millis(acc.max),
            })
            .collect()
    }

    /// Clear all counters.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Number of distinct command signatures recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Signature, Accumulator>> {
        // Poisoning is ignored; entries are updated field by field.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accumulates_per_signature() {
        let stats = CommandStats::new();
        stats.record("git", &args(&["rev-list", "--all"]), Duration::from_millis(10));
        stats.record("git", &args(&["rev-list", "--all"]), Duration::from_millis(30));
        stats.record("git", &args(&["show", "-s"]), Duration::from_millis(5));

        let rows = stats.snapshot(StatSort::TotalTime);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].args, args(&["rev-list", "--all"]));
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total_ms, 40.0);
        assert_eq!(rows[0].max_ms, 30.0);
    }

    #[test]
    fn sort_orders() {
        let stats = CommandStats::new();
        // "a": many cheap runs, "b": one slow run
        for _ in 0..3 {
            stats.record("git", &args(&["a"]), Duration::from_millis(1));
        }
        stats.record("git", &args(&["b"]), Duration::from_millis(50));

        assert_eq!(stats.snapshot(StatSort::Count)[0].args, args(&["a"]));
        assert_eq!(stats.snapshot(StatSort::MaxTime)[0].args, args(&["b"]));
        assert_eq!(stats.snapshot(StatSort::TotalTime)[0].args, args(&["b"]));
    }

    #[test]
    fn reset_clears() {
        let stats = CommandStats::new();
        stats.record("git", &args(&["a"]), Duration::from_millis(1));
        assert!(!stats.is_empty());
        stats.reset();
        assert!(stats.is_empty());
        assert!(stats.snapshot(StatSort::Count).is_empty());
    }

    #[test]
    fn command_display() {
        let row = CommandStat {
            program: "git".to_string(),
            args: args(&["rev-list", "--topo-order"]),
            count: 1,
            total_ms: 1.0,
            max_ms: 1.0,
        };
        assert_eq!(row.command(), "git rev-list --topo-order");

        let custom = CommandStat {
            program: "/opt/git/bin/git".to_string(),
            ..row
        };
        assert_eq!(custom.command(), "/opt/git/bin/git rev-list --topo-order");
    }

    #[test]
    fn programs_are_counted_separately() {
        let stats = CommandStats::new();
        stats.record("git", &args(&["describe"]), Duration::from_millis(1));
        stats.record("/opt/git/bin/git", &args(&["describe"]), Duration::from_millis(1));

        let rows = stats.snapshot(StatSort::Count);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].program, "/opt/git/bin/git");
        assert_eq!(rows[1].program, "git");
    }

    #[test]
    fn concurrent_increments() {
        let stats = Arc::new(CommandStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record("git", &args(&["x"]), Duration::from_micros(1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.snapshot(StatSort::Count)[0].count, 800);
    }
}
