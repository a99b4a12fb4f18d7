//! follows, precedes and tags commands - Tag lookups around a commit

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output::{self, print, print_json};

/// Print the nearest matching tag behind a commit.
pub fn follows(ctx: &Context, rev: &str) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let found = ctx
        .resolver
        .find_follows_tag(&sha, &ctx.repo, &ctx.pattern)
        .context("Failed to resolve follows tag")?;

    if ctx.json {
        print_json(&found)?;
        return Ok(());
    }
    match found {
        Some(f) => print(format!("{} +{} ({})", f.base_tag, f.count, f.tag_sha.short(7))),
        None => output::note(
            format!("no tag matching '{}' follows {}", ctx.pattern, rev),
            ctx.verbosity,
        ),
    }
    Ok(())
}

/// Print the nearest matching tag ahead of a commit.
pub fn precedes(ctx: &Context, rev: &str) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let found = ctx
        .resolver
        .find_precedes_tag(&sha, &ctx.repo, &ctx.pattern)
        .context("Failed to resolve precedes tag")?;

    if ctx.json {
        print_json(&found)?;
        return Ok(());
    }
    match found {
        Some(p) => print(format!("{} ({})", p.base_tag, p.tag_sha.short(7))),
        None => output::note(
            format!("no tag matching '{}' precedes {}", ctx.pattern, rev),
            ctx.verbosity,
        ),
    }
    Ok(())
}

/// Print every matching tag with its commit, ordered by tag name.
pub fn tags(ctx: &Context) -> Result<()> {
    let index = ctx
        .resolver
        .matching_tags(&ctx.repo, &ctx.pattern)
        .context("Failed to list tags")?;

    if ctx.json {
        print_json(&index)?;
        return Ok(());
    }
    if index.is_empty() {
        output::note(format!("no tags match '{}'", ctx.pattern), ctx.verbosity);
        return Ok(());
    }

    let mut rows: Vec<_> = index.iter().collect();
    rows.sort_by(|a, b| a.1.cmp(b.1));
    for (commit, tag) in rows {
        print(format!("{}\t{}", commit, tag));
    }
    Ok(())
}
