//! git::libgit
//!
//! In-process query backend using `git2`.
//!
//! Answers the same [`GitQueries`] as the command-line backend without
//! spawning processes. `git2::Repository` is not `Sync`, so each query opens
//! the repository afresh; the expensive whole-graph results are cached one
//! layer up anyway.
//!
//! Runs through this backend are not recorded in the command statistics
//! table.

use std::path::Path;

use git2::{DescribeFormatOptions, DescribeOptions, ObjectType, Oid, Repository, Revwalk, Sort};
use log::debug;

use super::interface::{GitError, GitQueries, TagRef};
use crate::core::pattern::TagPattern;
use crate::core::types::{CommitId, TagName};

/// Query backend built on libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Backend;

impl Git2Backend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }

    fn open(repo: &Path) -> Result<Repository, GitError> {
        Repository::discover(repo).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: repo.to_path_buf(),
            },
            _ => from_git2(e, &repo.display().to_string()),
        })
    }

    /// A walk over every commit reachable from any ref or HEAD.
    fn walk_all(repository: &Repository, sort: Sort) -> Result<Revwalk<'_>, GitError> {
        let mut walk = repository.revwalk().map_err(|e| from_git2(e, "revwalk"))?;
        walk.set_sorting(sort).map_err(|e| from_git2(e, "revwalk"))?;
        // References that do not point at a commit are skipped by libgit2.
        walk.push_glob("*").map_err(|e| from_git2(e, "refs/*"))?;
        if walk.push_head().is_err() {
            debug!("HEAD is unborn or detached from any commit");
        }
        Ok(walk)
    }

    fn commit_oid(id: &CommitId) -> Result<Oid, GitError> {
        Oid::from_str(id.as_str()).map_err(|e| from_git2(e, id.as_str()))
    }
}

/// Convert a git2 error, naming what was being accessed.
fn from_git2(err: git2::Error, context: &str) -> GitError {
    GitError::Internal {
        message: format!("{}: {}", context, err.message()),
    }
}

fn commit_id(oid: Oid) -> Result<CommitId, GitError> {
    Ok(CommitId::new(oid.to_string())?)
}

impl GitQueries for Git2Backend {
    fn list_tags(&self, repo: &Path) -> Result<Vec<TagRef>, GitError> {
        let repository = Self::open(repo)?;
        let references = repository
            .references_glob("refs/tags/*")
            .map_err(|e| from_git2(e, "refs/tags"))?;

        let mut tags = Vec::new();
        for reference in references {
            let reference = reference.map_err(|e| from_git2(e, "refs/tags"))?;
            let Some(name) = reference
                .name()
                .and_then(|n| n.strip_prefix("refs/tags/"))
            else {
                continue;
            };
            let Ok(name) = TagName::new(name) else {
                debug!("skipping tag with unusable name {:?}", reference.name());
                continue;
            };

            let Some(raw) = reference.resolve().ok().and_then(|r| r.target()) else {
                debug!("skipping tag {} without a target", name);
                continue;
            };

            // Peel through annotated tags to the first non-tag object.
            let target = reference
                .peel(ObjectType::Any)
                .map(|object| object.id())
                .unwrap_or(raw);

            tags.push(TagRef {
                name,
                target: commit_id(target)?,
            });
        }
        Ok(tags)
    }

    fn topo_order(&self, repo: &Path) -> Result<Vec<CommitId>, GitError> {
        let repository = Self::open(repo)?;
        let walk = Self::walk_all(&repository, Sort::TOPOLOGICAL | Sort::REVERSE)?;

        let commits = walk
            .map(|oid| {
                oid.map_err(|e| from_git2(e, "revwalk"))
                    .and_then(commit_id)
            })
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
        let repository = Self::open(repo)?;
        let (Ok(a), Ok(b)) = (Self::commit_oid(ancestor), Self::commit_oid(descendant)) else {
            return Ok(false);
        };
        if repository.find_commit(a).is_err() || repository.find_commit(b).is_err() {
            return Ok(false);
        }
        if a == b {
            return Ok(true);
        }
        Ok(repository.graph_descendant_of(b, a).unwrap_or(false))
    }

    fn describe(
        &self,
        repo: &Path,
        commit: &CommitId,
        pattern: &TagPattern,
    ) -> Result<Option<String>, GitError> {
        let repository = Self::open(repo)?;
        let Ok(oid) = Self::commit_oid(commit) else {
            return Ok(None);
        };
        let Ok(object) = repository.find_object(oid, None) else {
            return Ok(None);
        };

        let mut options = DescribeOptions::new();
        options.describe_tags().pattern(pattern.as_str());

        let described = object
            .describe(&options)
            .and_then(|d| d.format(Some(&DescribeFormatOptions::new())));

        match described {
            Ok(name) => Ok(Some(name)),
            Err(e) => {
                debug!("no describe name for {}: {}", commit, e.message());
                Ok(None)
            }
        }
    }

    fn parents(&self, repo: &Path, commit: &CommitId) -> Result<Vec<CommitId>, GitError> {
        let repository = Self::open(repo)?;
        let found = repository
            .find_commit(Self::commit_oid(commit)?)
            .map_err(|e| from_git2(e, commit.as_str()))?;
        found.parent_ids().map(commit_id).collect()
    }

    fn all_parents(&self, repo: &Path) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitError> {
        let repository = Self::open(repo)?;
        let walk = Self::walk_all(&repository, Sort::NONE)?;

        let mut entries = Vec::new();
        for oid in walk {
            let oid = oid.map_err(|e| from_git2(e, "revwalk"))?;
            let commit = repository
                .find_commit(oid)
                .map_err(|e| from_git2(e, &oid.to_string()))?;
            let parents = commit.parent_ids().map(commit_id).collect::<Result<_, _>>()?;
            entries.push((commit_id(oid)?, parents));
        }
        Ok(entries)
    }

    fn resolve_revision(&self, repo: &Path, rev: &str) -> Result<Option<CommitId>, GitError> {
        let repository = Self::open(repo)?;
        let resolved = match repository
            .revparse_single(rev)
            .and_then(|object| object.peel_to_commit())
        {
            Ok(commit) => Some(commit_id(commit.id())?),
            Err(e) => {
                debug!("cannot resolve {:?}: {}", rev, e.message());
                None
            }
        };
        Ok(resolved)
    }
}
