//! git
//!
//! Single doorway to repository data.
//!
//! # Architecture
//!
//! Everything above this module asks its questions through the
//! [`GitQueries`] trait and never touches git directly. Three implementations
//! are provided:
//!
//! - [`Git`] runs the git command line through a [`CommandRunner`], which
//!   enforces timeouts and records per-command timings in [`CommandStats`]
//! - [`Git2Backend`] answers in-process with libgit2
//! - [`MockGit`] answers from an in-memory graph for tests
//!
//! # Invariants
//!
//! - All queries are read-only
//! - Structural queries (tags, topological order, parents) fail loudly;
//!   advisory queries (ancestry, describe) degrade to `false` / `None`
//! - No other module imports `git2`
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tagtrail::git::{Git, GitQueries};
//!
//! let git = Git::default();
//! let commits = git.topo_order(Path::new("."))?;
//! println!("{} commits", commits.len());
//! # Ok::<(), tagtrail::git::GitError>(())
//! ```

mod interface;
mod libgit;
mod mock;
mod runner;
mod stats;

pub use interface::{Git, GitError, GitQueries, TagRef};
pub use libgit::Git2Backend;
pub use mock::MockGit;
pub use runner::{CommandOutput, CommandRunner};
pub use stats::{CommandStat, CommandStats, StatSort};
