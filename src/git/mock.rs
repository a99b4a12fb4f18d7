//! git::mock
//!
//! In-memory repository for deterministic testing.
//!
//! # Design
//!
//! [`MockGit`] implements [`GitQueries`] over a commit graph held in memory.
//! Commits are added parents first, and insertion order is the topological
//! order it reports. Each query is counted so tests can check how often the
//! graph layer actually asked, and the whole repository can be switched to
//! a broken state to exercise error paths.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use tagtrail::git::{GitQueries, MockGit};
//!
//! let git = MockGit::new();
//! git.add_commit("a1", &[]).unwrap();
//! git.add_commit("b2", &["a1"]).unwrap();
//! git.tag("rel-1", "a1").unwrap();
//!
//! let repo = Path::new("/mock");
//! assert_eq!(git.topo_order(repo).unwrap().len(), 2);
//! assert_eq!(git.calls("topo_order"), 1);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::interface::{GitError, GitQueries, TagRef};
use crate::core::pattern::TagPattern;
use crate::core::types::{CommitId, TagName, TypeError};

/// Mock repository for testing.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGit {
    inner: Arc<Mutex<MockGitInner>>,
}

#[derive(Debug, Default)]
struct MockGitInner {
    /// Commits in insertion (topological) order.
    order: Vec<CommitId>,
    /// Parents of each commit.
    parents: HashMap<CommitId, Vec<CommitId>>,
    /// Tags by name.
    tags: BTreeMap<TagName, CommitId>,
    /// Number of calls per query name.
    calls: HashMap<&'static str, usize>,
    /// Structural queries fail when set.
    broken: bool,
}

impl MockGit {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a linear history of `count` commits with 40-digit hex ids,
    /// returned oldest first.
    pub fn linear(count: usize) -> Result<(Self, Vec<CommitId>), TypeError> {
        let git = Self::new();
        let mut ids: Vec<CommitId> = Vec::with_capacity(count);
        for i in 0..count {
            let id = format!("{:040x}", i + 1);
            match ids.last() {
                Some(prev) => git.add_commit(&id, &[prev.as_str()])?,
                None => git.add_commit(&id, &[])?,
            }
            ids.push(CommitId::new(id)?);
        }
        Ok((git, ids))
    }

    /// Add a commit. Parents should already have been added.
    pub fn add_commit(&self, id: &str, parents: &[&str]) -> Result<(), TypeError> {
        let id = CommitId::new(id)?;
        let parents = parents
            .iter()
            .map(|p| CommitId::new(*p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut inner = self.lock();
        if inner.parents.insert(id.clone(), parents).is_none() {
            inner.order.push(id);
        }
        Ok(())
    }

    /// Point tag `name` at `commit`, replacing any previous target.
    pub fn tag(&self, name: &str, commit: &str) -> Result<(), TypeError> {
        let name = TagName::new(name)?;
        let commit = CommitId::new(commit)?;
        self.lock().tags.insert(name, commit);
        Ok(())
    }

    /// Delete a tag. Returns whether it existed.
    pub fn remove_tag(&self, name: &str) -> bool {
        match TagName::new(name) {
            Ok(name) => self.lock().tags.remove(&name).is_some(),
            Err(_) => false,
        }
    }

    /// Make structural queries fail as if the repository had vanished.
    pub fn set_broken(&self, broken: bool) {
        self.lock().broken = broken;
    }

    /// Number of times `query` (a [`GitQueries`] method name) was called.
    pub fn calls(&self, query: &str) -> usize {
        self.lock().calls.get(query).copied().unwrap_or(0)
    }

    /// Total number of queries answered.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    fn lock(&self) -> MutexGuard<'_, MockGitInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the call and fail if the repository is broken.
    fn enter(
        &self,
        query: &'static str,
        repo: &Path,
    ) -> Result<MutexGuard<'_, MockGitInner>, GitError> {
        let mut inner = self.lock();
        *inner.calls.entry(query).or_default() += 1;
        if inner.broken {
            return Err(GitError::NotARepo {
                path: repo.to_path_buf(),
            });
        }
        Ok(inner)
    }
}

impl MockGitInner {
    /// Every commit reachable from `start`, including itself.
    fn reachable(&self, start: &CommitId) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(id) = queue.pop_front() {
            if !self.parents.contains_key(&id) || !seen.insert(id.clone()) {
                continue;
            }
            queue.extend(self.parents[&id].iter().cloned());
        }
        seen
    }

    fn abbrev(id: &CommitId) -> String {
        let s = id.as_str();
        let usable = s.len() >= 7
            && s.bytes()
                .take(7)
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if usable {
            s[..7].to_string()
        } else {
            "0000000".to_string()
        }
    }
}

impl GitQueries for MockGit {
    fn list_tags(&self, repo: &Path) -> Result<Vec<TagRef>, GitError> {
        let inner = self.enter("list_tags", repo)?;
        Ok(inner
            .tags
            .iter()
            .map(|(name, target)| TagRef {
                name: name.clone(),
                target: target.clone(),
            })
            .collect())
    }

    fn topo_order(&self, repo: &Path) -> Result<Vec<CommitId>, GitError> {
        let inner = self.enter("topo_order", repo)?;
        if inner.order.is_empty() {
            return Err(GitError::NoCommits {
                path: repo.to_path_buf(),
            });
        }
        Ok(inner.order.clone())
    }

    fn is_ancestor(
        &self,
        _repo: &Path,
        ancestor: &CommitId,
        descendant: &CommitId,
    ) -> Result<bool, GitError> {
        let mut inner = self.lock();
        *inner.calls.entry("is_ancestor").or_default() += 1;
        if inner.broken || !inner.parents.contains_key(ancestor) {
            return Ok(false);
        }
        Ok(inner.reachable(descendant).contains(ancestor))
    }

    /// Nearest matching tag by the number of commits reachable from `commit`
    /// but not from the tagged commit; ties go to the smaller tag name.
    fn describe(
        &self,
        _repo: &Path,
        commit: &CommitId,
        pattern: &TagPattern,
    ) -> Result<Option<String>, GitError> {
        let mut inner = self.lock();
        *inner.calls.entry("describe").or_default() += 1;
        if inner.broken || !inner.parents.contains_key(commit) {
            return Ok(None);
        }

        let history = inner.reachable(commit);
        let mut best: Option<(usize, &TagName)> = None;
        for (name, target) in &inner.tags {
            if !pattern.matches(name.as_str()) || !history.contains(target) {
                continue;
            }
            let distance = history.difference(&inner.reachable(target)).count();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, name));
            }
        }

        Ok(best.map(|(distance, name)| {
            if distance == 0 {
                name.to_string()
            } else {
                format!("{}-{}-g{}", name, distance, MockGitInner::abbrev(commit))
            }
        }))
    }

    fn parents(&self, repo: &Path, commit: &CommitId) -> Result<Vec<CommitId>, GitError> {
        let inner = self.enter("parents", repo)?;
        inner
            .parents
            .get(commit)
            .cloned()
            .ok_or_else(|| GitError::CommandFailed {
                command: format!("git show -s --format=%P {}", commit),
                code: Some(128),
                stderr: format!("fatal: bad object {}", commit),
            })
    }

    fn all_parents(&self, repo: &Path) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitError> {
        let inner = self.enter("all_parents", repo)?;
        Ok(inner
            .order
            .iter()
            .map(|id| (id.clone(), inner.parents[id].clone()))
            .collect())
    }

    /// Exact ids first, then tag names, then unambiguous id prefixes.
    fn resolve_revision(&self, repo: &Path, rev: &str) -> Result<Option<CommitId>, GitError> {
        let inner = self.enter("resolve_revision", repo)?;
        if let Some(id) = inner.order.iter().find(|id| id.as_str() == rev) {
            return Ok(Some(id.clone()));
        }
        if let Some((_, target)) = inner.tags.iter().find(|(name, _)| name.as_str() == rev) {
            return Ok(Some(target.clone()));
        }
        let mut prefixed = inner.order.iter().filter(|id| id.as_str().starts_with(rev));
        match (prefixed.next(), prefixed.next()) {
            (Some(id), None) if !rev.is_empty() => Ok(Some(id.clone())),
            _ => Ok(None),
        }
    }
}
