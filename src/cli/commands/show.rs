//! show and suggest commands - Release context of a commit
//!
//! `show` prints what a commit page needs in one go: the commit's own tag,
//! the tags on either side, the describe name, its neighbours and a release
//! suggestion.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output::{self, format_inline, print, print_json};

/// Suggest the release a commit shipped in.
pub fn suggest(ctx: &Context, rev: &str, current: Option<&str>) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let suggestion = ctx
        .resolver
        .suggest_release(&sha, &ctx.repo, &ctx.pattern, current)
        .context("Failed to suggest a release")?;

    if ctx.json {
        print_json(&suggestion)?;
        return Ok(());
    }
    match suggestion {
        Some(s) => print(format!("{} (from {})", s.release, s.source)),
        None => output::note(format!("no release suggestion for {}", rev), ctx.verbosity),
    }
    Ok(())
}

/// Print the full release context of a commit.
pub fn show(ctx: &Context, rev: &str) -> Result<()> {
    let sha = ctx.commit(rev)?;
    let context = ctx
        .resolver
        .commit_context(&sha, &ctx.repo, &ctx.pattern)
        .context("Failed to read commit context")?;

    if ctx.json {
        print_json(&context)?;
        return Ok(());
    }
    let Some(c) = context else {
        output::note(format!("unknown commit {}", rev), ctx.verbosity);
        return Ok(());
    };

    let none = || "-".to_string();
    print(format!("commit     {}", c.commit));
    print(format!(
        "tag        {}",
        c.tag.as_ref().map_or_else(none, |t| t.to_string())
    ));
    print(format!(
        "follows    {}",
        c.follows
            .as_ref()
            .map_or_else(none, |f| format!("{} +{} ({})", f.base_tag, f.count, f.tag_sha.short(7)))
    ));
    print(format!(
        "precedes   {}",
        c.precedes
            .as_ref()
            .map_or_else(none, |p| format!("{} ({})", p.base_tag, p.tag_sha.short(7)))
    ));
    print(format!(
        "describe   {}",
        c.describe.as_ref().map_or_else(none, |d| d.to_string())
    ));
    print(format!("parents    {}", format_inline(&c.edges.parents, "-")));
    print(format!("children   {}", format_inline(&c.edges.children, "-")));
    print(format!(
        "suggested  {}",
        c.suggestion
            .as_ref()
            .map_or_else(none, |s| format!("{} (from {})", s.release, s.source))
    ));
    Ok(())
}
