//! describe and parse-describe commands

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::describe::parse_describe_output;
use crate::ui::output::{self, print, print_json};

/// Print the nearest reachable matching tag and distance for a commit.
pub fn describe(ctx: &Context, rev: &str) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let outcome = ctx
        .resolver
        .describe(&sha, &ctx.repo, &ctx.pattern)
        .context("Failed to describe commit")?;

    if ctx.json {
        print_json(&outcome)?;
        return Ok(());
    }
    match outcome {
        Some(outcome) => print(outcome),
        None => output::note(
            format!("no tag matching '{}' is reachable from {}", ctx.pattern, rev),
            ctx.verbosity,
        ),
    }
    Ok(())
}

/// Parse a describe descriptor without touching a repository.
pub fn parse_describe(ctx: &Context, raw: &str) -> Result<()> {
    let outcome = parse_describe_output(raw)
        .with_context(|| format!("Cannot parse describe output '{}'", raw))?;

    if ctx.json {
        print_json(&outcome)?;
    } else {
        print(outcome);
    }
    Ok(())
}
