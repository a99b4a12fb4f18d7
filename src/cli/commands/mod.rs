//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves its revision arguments to commits
//! 2. Asks the [`TagResolver`](crate::graph::TagResolver) in the context
//! 3. Formats and displays output
//!
//! An absent result (unknown commit, no matching tag) prints a note to
//! stderr and succeeds. Repository failures are returned as errors.

mod completion;
mod describe;
mod graph;
mod show;
mod stats;
mod tags;

pub use completion::completion;
pub use describe::{describe, parse_describe};
pub use graph::{graph, is_ancestor, topo};
pub use show::{show, suggest};
pub use stats::print_stats;
pub use tags::{follows, precedes, tags};

use anyhow::Result;

use super::args::Command;
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Follows { rev } => follows(ctx, &rev),
        Command::Precedes { rev } => precedes(ctx, &rev),
        Command::Tags => tags(ctx),
        Command::Topo => topo(ctx),
        Command::IsAncestor {
            ancestor,
            descendant,
        } => is_ancestor(ctx, &ancestor, &descendant),
        Command::Describe { rev } => describe(ctx, &rev),
        Command::ParseDescribe { raw } => parse_describe(ctx, &raw),
        Command::Graph { rev } => graph(ctx, &rev),
        Command::Suggest { rev, current } => suggest(ctx, &rev, current.as_deref()),
        Command::Show { rev } => show(ctx, &rev),
        Command::Completion { shell } => completion(shell),
    }
}
