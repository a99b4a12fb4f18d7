//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>` / `--repo <path>`: Repository to query
//! - `--tag-pattern <glob>`: Release tag glob (overrides configuration)
//! - `--backend <cli|libgit2>`: Query backend (overrides configuration)
//! - `--no-cache`: Recompute whole-graph scans on every use
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Suppress notes about absent results
//! - `--json`: Machine-readable output
//! - `--stats` / `--stats-sort <metric>`: Print git command statistics

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::git::StatSort;

/// tagtrail - Release-tag resolution for git history
#[derive(Parser, Debug)]
#[command(name = "tagtrail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to query (defaults to the current directory)
    #[arg(long, visible_alias = "repo", global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Glob selecting release tags, e.g. 'rel-*'
    #[arg(long, global = true, value_name = "GLOB")]
    pub tag_pattern: Option<String>,

    /// Where repository data comes from
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Recompute topological order and child map on every use
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress notes about absent results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Print git command statistics to stderr after the command
    #[arg(long, global = true)]
    pub stats: bool,

    /// Metric to sort statistics by
    #[arg(long, global = true, value_enum, default_value_t = StatSort::TotalTime)]
    pub stats_sort: StatSort,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Query backends.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Run the git command line
    Cli,
    /// Use libgit2 in-process
    Libgit2,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the nearest matching tag behind a commit
    #[command(
        name = "follows",
        long_about = "Show the nearest matching tag behind a commit.\n\n\
            Walks the topological order backwards from the commit and reports the \
            first tagged commit, with the number of steps taken. A tagged commit \
            reports the tag before its own.",
        after_help = "\
EXAMPLES:
    # Which release does HEAD build on?
    tagtrail follows HEAD

    # Use a different tag scheme
    tagtrail --tag-pattern 'v*' follows 3f2c1a9"
    )]
    Follows {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,
    },

    /// Show the nearest matching tag ahead of a commit
    #[command(
        name = "precedes",
        long_about = "Show the nearest matching tag ahead of a commit.\n\n\
            Walks the topological order forwards from the commit and reports the \
            first tagged commit that is not one of its ancestors.",
        after_help = "\
EXAMPLES:
    # Which release first shipped this fix?
    tagtrail precedes 3f2c1a9"
    )]
    Precedes {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,
    },

    /// List matching tags by commit
    Tags,

    /// List every commit, oldest first
    Topo,

    /// Check whether one commit is an ancestor of another
    #[command(name = "is-ancestor")]
    IsAncestor {
        /// Possible ancestor
        ancestor: String,
        /// Possible descendant
        descendant: String,
    },

    /// Show the nearest reachable tag and distance, as git describe does
    Describe {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,
    },

    /// Parse a git describe descriptor such as 'rel-2-5-7-1-gabc1234'
    #[command(name = "parse-describe")]
    ParseDescribe {
        /// Descriptor to parse
        raw: String,
    },

    /// Show the immediate parents and children of a commit
    Graph {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,
    },

    /// Suggest the release a commit shipped in
    #[command(
        name = "suggest",
        long_about = "Suggest the release a commit shipped in.\n\n\
            The commit's own matching tag wins, then the tag that precedes it. \
            Nothing is suggested when --current names a recorded release.",
        after_help = "\
EXAMPLES:
    tagtrail suggest 3f2c1a9
    tagtrail suggest 3f2c1a9 --current rel-4   # prints nothing"
    )]
    Suggest {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,

        /// Release already recorded for the commit
        #[arg(long, value_name = "RELEASE")]
        current: Option<String>,
    },

    /// Show tags, describe name, edges and suggestion for a commit
    Show {
        /// Commit (id, abbreviation, branch or tag name)
        rev: String,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    tagtrail completion bash >> ~/.bashrc

    # Fish
    tagtrail completion fish > ~/.config/fish/completions/tagtrail.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
