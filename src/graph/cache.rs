//! graph::cache
//!
//! Per-repository cache of whole-graph scans.
//!
//! # Design
//!
//! Listing every commit in topological order and inverting every commit's
//! parent list into a child map are the two expensive queries. [`RepoCache`]
//! keeps one entry per repository (keyed by canonical path) with a slot for
//! each. A slot is filled under its own mutex, so threads racing on the first
//! access compute once and the rest wait for the result. Failed computations
//! are not stored.
//!
//! # Staleness
//!
//! A filled slot is served until the entry is dropped with
//! [`RepoCache::invalidate`] or [`RepoCache::clear`]. Commits or tags added
//! to the repository afterwards are not seen before that. Tag listings are
//! never cached here.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::core::types::CommitId;
use crate::git::GitError;

/// Every reachable commit, oldest first, with O(1) position lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoOrder {
    commits: Vec<CommitId>,
    positions: HashMap<CommitId, usize>,
}

impl TopoOrder {
    /// Index an ordered commit list. A repeated id keeps its first position.
    pub fn new(commits: Vec<CommitId>) -> Self {
        let mut positions = HashMap::with_capacity(commits.len());
        for (i, commit) in commits.iter().enumerate() {
            positions.entry(commit.clone()).or_insert(i);
        }
        Self { commits, positions }
    }

    /// Position of `commit`, if it is part of the order.
    pub fn position(&self, commit: &CommitId) -> Option<usize> {
        self.positions.get(commit).copied()
    }

    /// Check if `commit` is part of the order.
    pub fn contains(&self, commit: &CommitId) -> bool {
        self.positions.contains_key(commit)
    }

    /// Number of commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Check if there are no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The commits, oldest first.
    pub fn as_slice(&self) -> &[CommitId] {
        &self.commits
    }

    /// Commits before position `i`, nearest first.
    pub fn before(&self, i: usize) -> impl Iterator<Item = &CommitId> {
        self.commits[..i.min(self.commits.len())].iter().rev()
    }

    /// Commits after position `i`, nearest first.
    pub fn after(&self, i: usize) -> impl Iterator<Item = &CommitId> {
        self.commits
            .get(i.saturating_add(1)..)
            .unwrap_or_default()
            .iter()
    }
}

/// Immediate children of every commit, plus the set of listed commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildMap {
    children: HashMap<CommitId, Vec<CommitId>>,
    commits: HashSet<CommitId>,
}

impl ChildMap {
    /// Invert (commit, parents) pairs. Children keep the order in which
    /// their commits were listed; a commit listed twice counts once.
    pub fn from_parent_lists(
        entries: impl IntoIterator<Item = (CommitId, Vec<CommitId>)>,
    ) -> Self {
        let mut children: HashMap<CommitId, Vec<CommitId>> = HashMap::new();
        let mut commits = HashSet::new();
        for (commit, mut parents) in entries {
            if !commits.insert(commit.clone()) {
                continue;
            }
            parents.sort();
            parents.dedup();
            for parent in parents {
                children.entry(parent).or_default().push(commit.clone());
            }
        }
        Self { children, commits }
    }

    /// Check if `commit` was listed in the scan.
    pub fn contains(&self, commit: &CommitId) -> bool {
        self.commits.contains(commit)
    }

    /// Children of `commit`; empty for a leaf or an unknown commit.
    pub fn children_of(&self, commit: &CommitId) -> &[CommitId] {
        self.children.get(commit).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of commits with at least one child.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if no commit has children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// How long computed graph scans are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Keep until invalidated or the process exits
    #[default]
    Process,
    /// Recompute on every call
    Disabled,
}

#[derive(Debug, Default)]
struct RepoEntry {
    topo: Mutex<Option<Arc<TopoOrder>>>,
    children: Mutex<Option<Arc<ChildMap>>>,
}

/// Cache of topological orders and child maps, one entry per repository.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tagtrail::core::types::CommitId;
/// use tagtrail::graph::{RepoCache, TopoOrder};
///
/// let cache = RepoCache::default();
/// let repo = Path::new("/srv/project");
/// let order = cache
///     .topo_order(repo, || Ok(TopoOrder::new(vec![CommitId::new("c0")?])))
///     .unwrap();
/// assert_eq!(order.len(), 1);
/// assert!(cache.has_topo_order(repo));
///
/// cache.invalidate(repo);
/// assert!(!cache.has_topo_order(repo));
/// ```
#[derive(Debug, Default)]
pub struct RepoCache {
    policy: CachePolicy,
    entries: Mutex<HashMap<PathBuf, Arc<RepoEntry>>>,
}

impl RepoCache {
    /// Create an empty cache with `policy`.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The caching policy.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Cached topological order of `repo`, computed with `compute` on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` fails with; nothing is stored then.
    pub fn topo_order<F>(&self, repo: &Path, compute: F) -> Result<Arc<TopoOrder>, GitError>
    where
        F: FnOnce() -> Result<TopoOrder, GitError>,
    {
        if self.policy == CachePolicy::Disabled {
            return compute().map(Arc::new);
        }
        let entry = self.entry(repo);
        fill(&entry.topo, compute, |order| {
            debug!(
                "cached topological order of {} ({} commits)",
                repo.display(),
                order.len()
            )
        })
    }

    /// Cached child map of `repo`, computed with `compute` on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` fails with; nothing is stored then.
    pub fn child_map<F>(&self, repo: &Path, compute: F) -> Result<Arc<ChildMap>, GitError>
    where
        F: FnOnce() -> Result<ChildMap, GitError>,
    {
        if self.policy == CachePolicy::Disabled {
            return compute().map(Arc::new);
        }
        let entry = self.entry(repo);
        fill(&entry.children, compute, |map| {
            debug!(
                "cached child map of {} ({} parents)",
                repo.display(),
                map.len()
            )
        })
    }

    /// Check if the topological order of `repo` is cached.
    pub fn has_topo_order(&self, repo: &Path) -> bool {
        self.peek(repo).is_some_and(|entry| {
            let cached = lock(&entry.topo).is_some();
            cached
        })
    }

    /// Check if the child map of `repo` is cached.
    pub fn has_child_map(&self, repo: &Path) -> bool {
        self.peek(repo).is_some_and(|entry| {
            let cached = lock(&entry.children).is_some();
            cached
        })
    }

    /// Drop everything cached for `repo`. Returns whether anything was held.
    pub fn invalidate(&self, repo: &Path) -> bool {
        let removed = lock(&self.entries).remove(&key(repo)).is_some();
        if removed {
            debug!("invalidated graph cache for {}", repo.display());
        }
        removed
    }

    /// Drop everything cached for every repository.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn entry(&self, repo: &Path) -> Arc<RepoEntry> {
        Arc::clone(lock(&self.entries).entry(key(repo)).or_default())
    }

    fn peek(&self, repo: &Path) -> Option<Arc<RepoEntry>> {
        lock(&self.entries).get(&key(repo)).cloned()
    }
}

/// Return the slot's value, computing and storing it if empty. The slot
/// stays locked during the computation.
fn fill<T, F, L>(
    slot: &Mutex<Option<Arc<T>>>,
    compute: F,
    on_fill: L,
) -> Result<Arc<T>, GitError>
where
    F: FnOnce() -> Result<T, GitError>,
    L: FnOnce(&T),
{
    let mut guard = lock(slot);
    if let Some(value) = guard.as_ref() {
        return Ok(Arc::clone(value));
    }
    let value = Arc::new(compute()?);
    on_fill(&value);
    *guard = Some(Arc::clone(&value));
    Ok(value)
}

fn key(repo: &Path) -> PathBuf {
    repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
