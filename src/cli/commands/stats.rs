//! --stats output - Git command timings for this run
//!
//! Printed to stderr so it never mixes with command results.

use anyhow::Result;

use crate::git::{CommandStats, StatSort};

/// Print the process-wide statistics table sorted by `sort`.
pub fn print_stats(sort: StatSort, json: bool) -> Result<()> {
    let rows = CommandStats::global().snapshot(sort);

    if json {
        eprintln!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        eprintln!("no git commands were run");
        return Ok(());
    }

    eprintln!("{:>6} {:>10} {:>10}  command", "count", "total ms", "max ms");
    for row in rows {
        eprintln!(
            "{:>6} {:>10.1} {:>10.1}  {}",
            row.count,
            row.total_ms,
            row.max_ms,
            row.command()
        );
    }
    Ok(())
}
