//! topo, is-ancestor and graph commands - Commit graph queries

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output::{self, format_inline, print, print_json};

/// Print every commit, oldest first.
pub fn topo(ctx: &Context) -> Result<()> {
    let order = ctx
        .resolver
        .topo_order(&ctx.repo)
        .context("Failed to list commits")?;

    if ctx.json {
        print_json(order.as_slice())?;
        return Ok(());
    }
    for commit in order.as_slice() {
        print(commit);
    }
    Ok(())
}

/// Print whether `ancestor` is reachable from `descendant`.
pub fn is_ancestor(ctx: &Context, ancestor: &str, descendant: &str) -> Result<()> {
    let a = ctx.commit(ancestor)?;
    let d = ctx.commit(descendant)?;
    let answer = ctx
        .resolver
        .is_ancestor(&a, &d, &ctx.repo)
        .context("Failed to check ancestry")?;

    if ctx.json {
        print_json(&answer)?;
    } else {
        print(answer);
    }
    Ok(())
}

/// Print the immediate parents and children of a commit.
pub fn graph(ctx: &Context, rev: &str) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let edges = ctx
        .resolver
        .commit_edges(&sha, &ctx.repo)
        .context("Failed to read commit graph")?;

    if ctx.json {
        print_json(&edges)?;
        return Ok(());
    }
    match edges {
        Some(edges) => {
            print(format!("parents:  {}", format_inline(&edges.parents, "(none)")));
            print(format!("children: {}", format_inline(&edges.children, "(none)")));
        }
        None => output::note(format!("unknown commit {}", rev), ctx.verbosity),
    }
    Ok(())
}
