//! cli
//!
//! Command-line interface layer for tagtrail.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize logging
//! - Build a [`Context`] from flags and configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It resolves the repository, tag pattern and
//! backend once, then hands the [`TagResolver`] to the command handlers.

pub mod args;
pub mod commands;

pub use args::{Backend, Cli, Command, Shell};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use clap::ValueEnum;

use crate::core::config::Config;
use crate::core::pattern::TagPattern;
use crate::core::types::CommitId;
use crate::git::{CommandRunner, Git, Git2Backend, GitQueries};
use crate::graph::{CachePolicy, TagResolver};
use crate::ui::output::{self, Verbosity};

/// Everything a command handler needs.
#[derive(Debug)]
pub struct Context {
    /// Repository being queried.
    pub repo: PathBuf,
    /// Release tag pattern.
    pub pattern: TagPattern,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Print JSON instead of text.
    pub json: bool,
    /// Resolver over the selected backend.
    pub resolver: TagResolver,
}

impl Context {
    /// Build the context from parsed flags and the configuration files.
    ///
    /// Flags override repository configuration, which overrides global
    /// configuration.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let repo = match &cli.cwd {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let config = Config::load(Some(&repo))
            .context("Failed to load configuration")?
            .config;

        let raw_pattern = cli.tag_pattern.as_deref().unwrap_or(config.tag_pattern());
        let pattern = TagPattern::new(raw_pattern)
            .with_context(|| format!("Invalid tag pattern '{}'", raw_pattern))?;

        let backend = match cli.backend {
            Some(backend) => backend,
            None => Backend::from_str(config.backend(), false).map_err(|e| anyhow!(e))?,
        };
        let queries: Arc<dyn GitQueries> = match backend {
            Backend::Cli => Arc::new(Git::new(CommandRunner::from_config(&config))),
            Backend::Libgit2 => Arc::new(Git2Backend::new()),
        };

        let policy = if cli.no_cache || !config.cache_enabled() {
            CachePolicy::Disabled
        } else {
            CachePolicy::Process
        };

        log::debug!(
            "repo {}, pattern {}, backend {:?}, cache {:?}",
            repo.display(),
            pattern,
            backend,
            policy
        );

        Ok(Self {
            repo,
            pattern,
            verbosity: Verbosity::from_flags(cli.quiet),
            json: cli.json,
            resolver: TagResolver::with_cache_policy(queries, policy),
        })
    }

    /// Resolve a user-supplied revision to a commit.
    ///
    /// A revision that names no commit is used verbatim, so unknown commits
    /// flow through as absent results rather than errors.
    pub fn commit(&self, rev: &str) -> Result<CommitId> {
        let resolved = self
            .resolver
            .resolve_revision(rev, &self.repo)
            .with_context(|| format!("Failed to resolve '{}'", rev))?;
        match resolved {
            Some(commit) => Ok(commit),
            None => {
                output::warn(
                    format!("'{}' does not name a commit in {}", rev, self.repo.display()),
                    self.verbosity,
                );
                CommitId::new(rev).with_context(|| format!("Invalid commit '{}'", rev))
            }
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let ctx = Context::from_cli(&cli)?;
    let result = commands::dispatch(cli.command, &ctx);

    if cli.stats {
        commands::print_stats(cli.stats_sort, ctx.json)?;
    }
    result
}

/// Log to stderr at warn level, or debug with `--debug`. `RUST_LOG` wins.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}
