//! graph::resolver
//!
//! Release-tag resolution for a single commit.
//!
//! # Algorithms
//!
//! **Follows** walks the topological order backwards from the commit and
//! reports the first tagged commit met, with the number of steps taken
//! (1 for the immediate predecessor). A directly tagged commit never
//! follows itself.
//!
//! **Precedes** walks the topological order forwards from the commit and
//! reports the first tagged commit that is not an ancestor of it. The
//! ancestry check rejects commits that are listed later but sit earlier in
//! the graph. No distance is reported.
//!
//! Both walk topological position rather than the ancestor path, which is
//! exact on a single line of history and an approximation across merges.
//!
//! # Errors
//!
//! An unknown commit or a missing tag is `Ok(None)`. Failures of the
//! structural queries (tags, topological order, parents) are logged at
//! error level and returned. Advisory queries (ancestry, describe) degrade
//! to `false` / `None` in the backends.

use std::path::Path;
use std::sync::Arc;

use log::{debug, error};
use serde::Serialize;

use super::cache::{CachePolicy, ChildMap, RepoCache, TopoOrder};
use super::tags::{matching_tags, TagIndex};
use crate::core::describe::{parse_describe_output, DescribeOutcome};
use crate::core::pattern::TagPattern;
use crate::core::types::{CommitId, TagName};
use crate::git::{GitError, GitQueries};

/// Nearest matching tag behind a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowsResult {
    /// The tag name
    pub base_tag: TagName,
    /// The tagged commit
    pub tag_sha: CommitId,
    /// Steps walked back from the queried commit
    pub count: usize,
}

/// Nearest matching tag ahead of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecedesResult {
    /// The tag name
    pub base_tag: TagName,
    /// The tagged commit
    pub tag_sha: CommitId,
}

/// Immediate neighbours of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitEdges {
    /// Immediate parents, in commit order
    pub parents: Vec<CommitId>,
    /// Immediate children
    pub children: Vec<CommitId>,
}

/// Where a release suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    /// The commit itself carries a matching tag
    Tag,
    /// The first matching tag ahead of the commit
    Precedes,
}

impl std::fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionSource::Tag => write!(f, "tag"),
            SuggestionSource::Precedes => write!(f, "precedes"),
        }
    }
}

/// Release a commit most likely shipped in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSuggestion {
    /// Suggested release (a tag name)
    pub release: TagName,
    /// Provenance of the suggestion
    pub source: SuggestionSource,
}

/// Everything known about a commit's place among the release tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitContext {
    /// The commit
    pub commit: CommitId,
    /// Matching tag on the commit itself
    pub tag: Option<TagName>,
    /// Nearest tag behind
    pub follows: Option<FollowsResult>,
    /// Nearest tag ahead
    pub precedes: Option<PrecedesResult>,
    /// Parsed describe descriptor
    pub describe: Option<DescribeOutcome>,
    /// Immediate parents and children
    pub edges: CommitEdges,
    /// Release suggestion, as for a commit with no recorded release
    pub suggestion: Option<ReleaseSuggestion>,
}

/// Answers tag and graph queries for commits, caching whole-graph scans.
///
/// One resolver can serve many repositories; cached data is keyed by path.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use tagtrail::core::pattern::TagPattern;
/// use tagtrail::git::MockGit;
/// use tagtrail::graph::TagResolver;
///
/// let (git, ids) = MockGit::linear(3).unwrap();
/// git.tag("rel-0.1", ids[0].as_str()).unwrap();
///
/// let resolver = TagResolver::new(Arc::new(git));
/// let repo = Path::new("/mock");
/// let pattern = TagPattern::new("rel-*").unwrap();
///
/// let follows = resolver.find_follows_tag(&ids[2], repo, &pattern).unwrap().unwrap();
/// assert_eq!(follows.base_tag.as_str(), "rel-0.1");
/// assert_eq!(follows.count, 2);
/// ```
pub struct TagResolver {
    queries: Arc<dyn GitQueries>,
    cache: RepoCache,
}

impl std::fmt::Debug for TagResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl TagResolver {
    /// Create a resolver over `queries` with a process-lifetime cache.
    pub fn new(queries: Arc<dyn GitQueries>) -> Self {
        Self::with_cache(queries, RepoCache::default())
    }

    /// Create a resolver with an explicit cache.
    pub fn with_cache(queries: Arc<dyn GitQueries>, cache: RepoCache) -> Self {
        Self { queries, cache }
    }

    /// Create a resolver with a fresh cache using `policy`.
    pub fn with_cache_policy(queries: Arc<dyn GitQueries>, policy: CachePolicy) -> Self {
        Self::with_cache(queries, RepoCache::new(policy))
    }

    /// The graph cache, for inspection and invalidation.
    pub fn cache(&self) -> &RepoCache {
        &self.cache
    }

    /// The underlying query backend.
    pub fn queries(&self) -> &dyn GitQueries {
        self.queries.as_ref()
    }

    /// Matching tags keyed by commit. Recomputed on every call.
    ///
    /// # Errors
    ///
    /// Returns the tag listing failure.
    pub fn matching_tags(&self, repo: &Path, pattern: &TagPattern) -> Result<TagIndex, GitError> {
        logged("tag listing", repo, matching_tags(self.queries(), repo, pattern))
    }

    /// Every reachable commit, oldest first. Cached per repository.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepo`] or [`GitError::NoCommits`] for an unusable
    /// repository, or the listing failure.
    pub fn topo_order(&self, repo: &Path) -> Result<Arc<TopoOrder>, GitError> {
        let result = self
            .cache
            .topo_order(repo, || self.queries.topo_order(repo).map(TopoOrder::new));
        logged("topological order", repo, result)
    }

    /// Immediate children of every commit. Cached per repository.
    ///
    /// # Errors
    ///
    /// Returns the parent listing failure.
    pub fn child_map(&self, repo: &Path) -> Result<Arc<ChildMap>, GitError> {
        let result = self.cache.child_map(repo, || {
            self.queries
                .all_parents(repo)
                .map(ChildMap::from_parent_lists)
        });
        logged("child map", repo, result)
    }

    /// Check whether `ancestor` is reachable from `descendant` (inclusive).
    /// Unknown commits answer `false`.
    pub fn is_ancestor(
        &self,
        ancestor: &CommitId,
        descendant: &CommitId,
        repo: &Path,
    ) -> Result<bool, GitError> {
        self.queries.is_ancestor(repo, ancestor, descendant)
    }

    /// Resolve a revision (full id, abbreviation, ref name) to a commit.
    pub fn resolve_revision(&self, rev: &str, repo: &Path) -> Result<Option<CommitId>, GitError> {
        self.queries.resolve_revision(repo, rev)
    }

    /// Nearest matching tag behind `sha` in topological order.
    ///
    /// `None` when no tag matches, `sha` is unknown, or nothing before it
    /// is tagged.
    ///
    /// # Errors
    ///
    /// Structural query failures only.
    pub fn find_follows_tag(
        &self,
        sha: &CommitId,
        repo: &Path,
        pattern: &TagPattern,
    ) -> Result<Option<FollowsResult>, GitError> {
        let tags = self.matching_tags(repo, pattern)?;
        if tags.is_empty() {
            debug!("no tags match {} in {}", pattern, repo.display());
            return Ok(None);
        }
        let order = self.topo_order(repo)?;

        let found = follows_in(sha, &tags, &order);
        if found.is_none() {
            debug!("no tag matching {} follows {}", pattern, sha);
        }
        Ok(found)
    }

    /// Nearest matching tag ahead of `sha` in topological order that is not
    /// one of its ancestors.
    ///
    /// `None` when no tag matches, `sha` is unknown, or no qualifying tag
    /// comes after it.
    ///
    /// # Errors
    ///
    /// Structural query failures, and failures to run the ancestry check.
    pub fn find_precedes_tag(
        &self,
        sha: &CommitId,
        repo: &Path,
        pattern: &TagPattern,
    ) -> Result<Option<PrecedesResult>, GitError> {
        let tags = self.matching_tags(repo, pattern)?;
        if tags.is_empty() {
            debug!("no tags match {} in {}", pattern, repo.display());
            return Ok(None);
        }
        let order = self.topo_order(repo)?;

        let found = precedes_in(sha, &tags, &order, |candidate| {
            self.is_ancestor(candidate, sha, repo)
        })?;
        if found.is_none() {
            debug!("no tag matching {} precedes {}", pattern, sha);
        }
        Ok(found)
    }

    /// Nearest reachable matching tag and distance, as `git describe` sees it.
    ///
    /// `None` when nothing matching is reachable or the descriptor cannot
    /// be parsed.
    pub fn describe(
        &self,
        sha: &CommitId,
        repo: &Path,
        pattern: &TagPattern,
    ) -> Result<Option<DescribeOutcome>, GitError> {
        let Some(raw) = self.queries.describe(repo, sha, pattern)? else {
            return Ok(None);
        };
        match parse_describe_output(&raw) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                debug!("ignoring describe output {:?} for {}: {}", raw, sha, e);
                Ok(None)
            }
        }
    }

    /// Immediate parents and children of `sha`; `None` if `sha` is unknown.
    ///
    /// # Errors
    ///
    /// Structural query failures.
    pub fn commit_edges(&self, sha: &CommitId, repo: &Path) -> Result<Option<CommitEdges>, GitError> {
        let map = self.child_map(repo)?;
        if !map.contains(sha) {
            debug!("{} is not in {}", sha, repo.display());
            return Ok(None);
        }
        let parents = logged("parent lookup", repo, self.queries.parents(repo, sha))?;
        let children = map.children_of(sha).to_vec();
        Ok(Some(CommitEdges { parents, children }))
    }

    /// Suggest the release `sha` shipped in.
    ///
    /// A non-blank `current_release` means a release is already recorded
    /// and nothing is suggested. Otherwise the commit's own matching tag
    /// wins, then the tag that precedes it.
    pub fn suggest_release(
        &self,
        sha: &CommitId,
        repo: &Path,
        pattern: &TagPattern,
        current_release: Option<&str>,
    ) -> Result<Option<ReleaseSuggestion>, GitError> {
        if current_release.is_some_and(|r| !r.trim().is_empty()) {
            return Ok(None);
        }

        let tags = self.matching_tags(repo, pattern)?;
        if let Some(tag) = tags.get(sha) {
            return Ok(Some(ReleaseSuggestion {
                release: tag.clone(),
                source: SuggestionSource::Tag,
            }));
        }

        let precedes = self.find_precedes_tag(sha, repo, pattern)?;
        Ok(suggestion(None, precedes.as_ref()))
    }

    /// Tags, describe descriptor, edges and suggestion for `sha` in one
    /// call; `None` if `sha` is unknown.
    pub fn commit_context(
        &self,
        sha: &CommitId,
        repo: &Path,
        pattern: &TagPattern,
    ) -> Result<Option<CommitContext>, GitError> {
        let Some(edges) = self.commit_edges(sha, repo)? else {
            return Ok(None);
        };

        let tag = self.matching_tags(repo, pattern)?.get(sha).cloned();
        let follows = self.find_follows_tag(sha, repo, pattern)?;
        let precedes = self.find_precedes_tag(sha, repo, pattern)?;
        let describe = self.describe(sha, repo, pattern)?;
        let suggestion = suggestion(tag.as_ref(), precedes.as_ref());

        Ok(Some(CommitContext {
            commit: sha.clone(),
            tag,
            follows,
            precedes,
            describe,
            edges,
            suggestion,
        }))
    }
}

/// First tagged commit walking back from `sha`.
fn follows_in(sha: &CommitId, tags: &TagIndex, order: &TopoOrder) -> Option<FollowsResult> {
    let i = order.position(sha)?;
    order.before(i).zip(1..).find_map(|(commit, count)| {
        tags.get(commit).map(|tag| FollowsResult {
            base_tag: tag.clone(),
            tag_sha: commit.clone(),
            count,
        })
    })
}

/// First tagged commit walking forward from `sha` that is not its ancestor.
fn precedes_in<F>(
    sha: &CommitId,
    tags: &TagIndex,
    order: &TopoOrder,
    mut is_ancestor_of_sha: F,
) -> Result<Option<PrecedesResult>, GitError>
where
    F: FnMut(&CommitId) -> Result<bool, GitError>,
{
    let Some(i) = order.position(sha) else {
        return Ok(None);
    };
    for commit in order.after(i) {
        let Some(tag) = tags.get(commit) else {
            continue;
        };
        if is_ancestor_of_sha(commit)? {
            debug!("skipping {} on {}: ancestor of {}", tag, commit, sha);
            continue;
        }
        return Ok(Some(PrecedesResult {
            base_tag: tag.clone(),
            tag_sha: commit.clone(),
        }));
    }
    Ok(None)
}

fn suggestion(
    direct: Option<&TagName>,
    precedes: Option<&PrecedesResult>,
) -> Option<ReleaseSuggestion> {
    if let Some(tag) = direct {
        return Some(ReleaseSuggestion {
            release: tag.clone(),
            source: SuggestionSource::Tag,
        });
    }
    precedes.map(|p| ReleaseSuggestion {
        release: p.base_tag.clone(),
        source: SuggestionSource::Precedes,
    })
}

fn logged<T>(what: &str, repo: &Path, result: Result<T, GitError>) -> Result<T, GitError> {
    if let Err(e) = &result {
        error!("{} failed for {}: {}", what, repo.display(), e);
    }
    result
}
