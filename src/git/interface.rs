//! git::interface
//!
//! The query surface the rest of tagtrail consumes, and its default
//! implementation on top of the git command line.
//!
//! # Architecture
//!
//! [`GitQueries`] is the narrow seam between the graph logic and wherever
//! repository data comes from. It carries exactly the read-only queries the
//! resolver needs:
//!
//! - list tags with their peeled targets
//! - list all commits in topological order (oldest first)
//! - test ancestry between two commits
//! - produce the "nearest tag, distance" descriptor for a commit
//! - fetch the parents of one commit
//! - list the parents of every commit (for building child maps)
//! - resolve a revision name to a commit id
//!
//! [`Git`] answers them by running git through a [`CommandRunner`].
//! [`Git2Backend`](super::Git2Backend) answers them in-process and
//! [`MockGit`](super::MockGit) from memory.
//!
//! # Error Handling
//!
//! Git failures are categorized into typed variants:
//! - [`GitError::NotARepo`] / [`GitError::NoCommits`]: the repository is unusable
//! - [`GitError::CommandFailed`]: a structural query exited non-zero
//! - [`GitError::CommandTimedOut`]: a query ran past its deadline
//!
//! Advisory queries (ancestry, describe) never surface a non-zero exit as an
//! error: they answer `false` or `None` instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use super::runner::{CommandOutput, CommandRunner};
use crate::core::pattern::TagPattern;
use crate::core::types::{CommitId, TagName, TypeError};

/// Errors from git queries.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not an accessible git repository.
    #[error("not a git repository: {}", .path.display())]
    NotARepo {
        /// The path that was queried
        path: PathBuf,
    },

    /// The repository has no commits reachable from any ref.
    #[error("repository has no commits: {}", .path.display())]
    NoCommits {
        /// The path that was queried
        path: PathBuf,
    },

    /// A git command exited with a non-zero status.
    #[error("{command} failed (exit code {}): {stderr}", exit_code(.code))]
    CommandFailed {
        /// The command line
        command: String,
        /// Exit code, `None` if killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// A git command did not finish before its deadline.
    #[error("{command} timed out after {timeout:?}")]
    CommandTimedOut {
        /// The command line
        command: String,
        /// The timeout that expired
        timeout: Duration,
    },

    /// The git program could not be started or waited on.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// The command line
        command: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// A command succeeded but printed something unparseable.
    #[error("unexpected output from {command}: {message}")]
    InvalidOutput {
        /// The command line
        command: String,
        /// What was wrong
        message: String,
    },

    /// An identifier failed validation.
    #[error(transparent)]
    InvalidId(#[from] TypeError),

    /// Error reported by the in-process backend.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Check if this error means the repository itself is unusable.
    pub fn is_repository_error(&self) -> bool {
        matches!(self, GitError::NotARepo { .. } | GitError::NoCommits { .. })
    }

    /// Reclassify "not a git repository" failures of a structural query.
    fn for_repo(self, repo: &Path) -> Self {
        match self {
            GitError::CommandFailed { ref stderr, .. }
                if stderr.contains("not a git repository") =>
            {
                GitError::NotARepo {
                    path: repo.to_path_buf(),
                }
            }
            other => other,
        }
    }
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// A tag and the object it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Tag name without the `refs/tags/` prefix
    pub name: TagName,
    /// Peeled target; the raw object id if peeling failed
    pub target: CommitId,
}

/// Read-only repository queries.
///
/// Implementations must be usable from several threads at once.
pub trait GitQueries: Send + Sync {
    /// List every tag with its peeled target.
    fn list_tags(&self, repo: &Path) -> Result<Vec<TagRef>, GitError>;

    /// List every commit reachable from any ref, oldest first, parents
    /// before children.
    fn topo_order(&self, repo: &Path) -> Result<Vec<CommitId>, GitError>;

    /// Check whether `ancestor` is reachable from `descendant` (a commit is
    /// its own ancestor). Unknown commits answer `false`.
    fn is_ancestor(
        &self,
        repo: &Path,
        ancestor: &CommitId,
        descendant: &CommitId,
    ) -> Result<bool, GitError>;

    /// Produce the describe descriptor for `commit` using tags matching
    /// `pattern`, or `None` if no matching tag is reachable.
    fn describe(
        &self,
        repo: &Path,
        commit: &CommitId,
        pattern: &TagPattern,
    ) -> Result<Option<String>, GitError>;

    /// Immediate parents of `commit`.
    fn parents(&self, repo: &Path, commit: &CommitId) -> Result<Vec<CommitId>, GitError>;

    /// Every reachable commit with its immediate parents.
    fn all_parents(&self, repo: &Path) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitError>;

    /// Resolve a revision (full or abbreviated id, ref or tag name) to the
    /// commit it names, or `None` if it names no commit.
    fn resolve_revision(&self, repo: &Path, rev: &str) -> Result<Option<CommitId>, GitError>;
}

/// Format for listing tags in one pass: name, object, peeled object, peeled type.
const TAG_FORMAT: &str =
    "--format=%(refname:strip=2)%09%(objectname)%09%(*objectname)%09%(*objecttype)";

/// Query backend that runs the git command line.
#[derive(Debug, Clone, Default)]
pub struct Git {
    runner: CommandRunner,
}

impl Git {
    /// Create a backend using `runner`.
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// The runner used for all commands.
    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Run a structural query: any failure is an error.
    fn structural(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.runner
            .run_checked(repo, args)
            .map_err(|e| e.for_repo(repo))
    }

    /// Peel a nested annotated tag, falling back to `raw`.
    fn peel_nested(&self, repo: &Path, name: &str, raw: &str) -> Result<String, GitError> {
        let spec = format!("refs/tags/{}^{{}}", name);
        let output = self.runner.run(repo, &["rev-parse", "--verify", "--quiet", &spec])?;
        if output.success() {
            let peeled = output.stdout.trim();
            if !peeled.is_empty() {
                return Ok(peeled.to_string());
            }
        }
        debug!("could not peel tag {}, using {}", name, raw);
        Ok(raw.to_string())
    }
}

impl GitQueries for Git {
    fn list_tags(&self, repo: &Path) -> Result<Vec<TagRef>, GitError> {
        let output = self.structural(repo, &["for-each-ref", TAG_FORMAT, "refs/tags"])?;

        let mut tags = Vec::new();
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split('\t');
            let (Some(name), Some(object)) = (fields.next(), fields.next()) else {
                return Err(GitError::InvalidOutput {
                    command: "git for-each-ref".to_string(),
                    message: format!("malformed tag line: {:?}", line),
                });
            };
            let peeled = fields.next().unwrap_or("");
            let peeled_type = fields.next().unwrap_or("");

            let target = match (peeled, peeled_type) {
                ("", _) => object.to_string(),
                (_, "tag") => self.peel_nested(repo, name, object)?,
                (peeled, _) => peeled.to_string(),
            };

            let name = match TagName::new(name) {
                Ok(name) => name,
                Err(e) => {
                    warn!("skipping tag {:?}: {}", name, e);
                    continue;
                }
            };

            tags.push(TagRef {
                name,
                target: CommitId::new(target)?,
            });
        }

        debug!("listed {} tags in {}", tags.len(), repo.display());
        Ok(tags)
    }

    fn topo_order(&self, repo: &Path) -> Result<Vec<CommitId>, GitError> {
        let output = self.structural(repo, &["rev-list", "--topo-order", "--reverse", "--all"])?;

        let commits = output
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| CommitId::new(l.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        if commits.is_empty() {
            return Err(GitError::NoCommits {
                path: repo.to_path_buf(),
            });
        }
        Ok(commits)
    }

    fn is_ancestor(
        &self,
        repo: &Path,
        ancestor: &CommitId,
        descendant: &CommitId,
    ) -> Result<bool, GitError> {
        let output = self.runner.run(
            repo,
            &[
                "merge-base",
                "--is-ancestor",
                ancestor.as_str(),
                descendant.as_str(),
            ],
        )?;

        match output.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => {
                debug!(
                    "ancestry check {} -> {} failed: {}",
                    ancestor,
                    descendant,
                    output.stderr.trim()
                );
                Ok(false)
            }
        }
    }

    fn describe(
        &self,
        repo: &Path,
        commit: &CommitId,
        pattern: &TagPattern,
    ) -> Result<Option<String>, GitError> {
        let output = self.runner.run(
            repo,
            &[
                "describe",
                "--tags",
                "--match",
                pattern.as_str(),
                commit.as_str(),
            ],
        )?;

        if !output.success() {
            debug!("no describe name for {}: {}", commit, output.stderr.trim());
            return Ok(None);
        }

        let name = output.stdout.trim();
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    fn parents(&self, repo: &Path, commit: &CommitId) -> Result<Vec<CommitId>, GitError> {
        let output = self.structural(repo, &["show", "-s", "--format=%P", commit.as_str()])?;

        output
            .stdout
            .split_whitespace()
            .map(|id| CommitId::new(id).map_err(GitError::from))
            .collect()
    }

    fn all_parents(&self, repo: &Path) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitError> {
        let output = self.structural(repo, &["rev-list", "--all", "--parents"])?;

        let mut entries = Vec::new();
        for line in output.stdout.lines() {
            let mut ids = line.split_whitespace();
            let Some(commit) = ids.next() else {
                continue;
            };
            let parents = ids
                .map(CommitId::new)
                .collect::<Result<Vec<_>, _>>()?;
            entries.push((CommitId::new(commit)?, parents));
        }
        Ok(entries)
    }

    fn resolve_revision(&self, repo: &Path, rev: &str) -> Result<Option<CommitId>, GitError> {
        if rev.is_empty() || rev.starts_with('-') {
            return Ok(None);
        }
        let spec = format!("{}^{{commit}}", rev);
        let output = self
            .runner
            .run(repo, &["rev-parse", "--verify", "--quiet", &spec])?;
        if !output.success() {
            debug!("cannot resolve {:?} in {}", rev, repo.display());
            return Ok(None);
        }
        Ok(CommitId::new(output.stdout.trim()).ok())
    }
}
