//! graph::tags
//!
//! Commit to tag-name index for tags matching a pattern.

use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::core::pattern::TagPattern;
use crate::core::types::{CommitId, TagName};
use crate::git::{GitError, GitQueries, TagRef};

/// Matching tags keyed by the commit they resolve to.
///
/// When several matching tags resolve to the same commit, the
/// lexicographically smallest name is kept.
///
/// # Example
///
/// ```
/// use tagtrail::core::pattern::TagPattern;
/// use tagtrail::core::types::{CommitId, TagName};
/// use tagtrail::git::TagRef;
/// use tagtrail::graph::TagIndex;
///
/// let c0 = CommitId::new("c0").unwrap();
/// let refs = vec![
///     TagRef { name: TagName::new("rel-2").unwrap(), target: c0.clone() },
///     TagRef { name: TagName::new("rel-1").unwrap(), target: c0.clone() },
///     TagRef { name: TagName::new("foo-2").unwrap(), target: c0.clone() },
/// ];
///
/// let index = TagIndex::from_refs(refs, &TagPattern::new("rel-*").unwrap());
/// assert_eq!(index.len(), 1);
/// assert_eq!(index.get(&c0).unwrap().as_str(), "rel-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagIndex {
    by_commit: BTreeMap<CommitId, TagName>,
}

impl TagIndex {
    /// Build the index from listed tags, keeping those matching `pattern`.
    pub fn from_refs(refs: impl IntoIterator<Item = TagRef>, pattern: &TagPattern) -> Self {
        let mut by_commit: BTreeMap<CommitId, TagName> = BTreeMap::new();
        for TagRef { name, target } in refs {
            if !pattern.matches(name.as_str()) {
                continue;
            }
            match by_commit.entry(target) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(name);
                }
                btree_map::Entry::Occupied(mut slot) => {
                    if name < *slot.get() {
                        slot.insert(name);
                    }
                }
            }
        }
        Self { by_commit }
    }

    /// The tag on `commit`, if any.
    pub fn get(&self, commit: &CommitId) -> Option<&TagName> {
        self.by_commit.get(commit)
    }

    /// Check if `commit` carries a matching tag.
    pub fn contains(&self, commit: &CommitId) -> bool {
        self.by_commit.contains_key(commit)
    }

    /// Number of tagged commits.
    pub fn len(&self) -> usize {
        self.by_commit.len()
    }

    /// Check if no commit carries a matching tag.
    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty()
    }

    /// Iterate over (commit, tag) pairs ordered by commit id.
    pub fn iter(&self) -> impl Iterator<Item = (&CommitId, &TagName)> {
        self.by_commit.iter()
    }
}

/// List the tags in `repo` and index the ones matching `pattern`.
///
/// Never cached: tag sets change often and are cheap to relist.
///
/// # Errors
///
/// Propagates structural failures of the tag listing. No matching tags is an
/// empty index, not an error.
pub fn matching_tags(
    queries: &dyn GitQueries,
    repo: &Path,
    pattern: &TagPattern,
) -> Result<TagIndex, GitError> {
    let refs = queries.list_tags(repo)?;
    let total = refs.len();
    let index = TagIndex::from_refs(refs, pattern);
    debug!(
        "{} of {} tags match {} in {}",
        index.len(),
        total,
        pattern,
        repo.display()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockGit;

    fn tag(name: &str, target: &str) -> TagRef {
        TagRef {
            name: TagName::new(name).unwrap(),
            target: CommitId::new(target).unwrap(),
        }
    }

    fn rel() -> TagPattern {
        TagPattern::new("rel-*").unwrap()
    }

    #[test]
    fn filters_by_pattern() {
        let index = TagIndex::from_refs(vec![tag("rel-1", "a"), tag("foo-2", "b")], &rel());
        assert_eq!(index.len(), 1);
        assert!(index.contains(&CommitId::new("a").unwrap()));
        assert!(!index.contains(&CommitId::new("b").unwrap()));
    }

    #[test]
    fn empty_when_nothing_matches() {
        let index = TagIndex::from_refs(vec![tag("v1", "a")], &rel());
        assert!(index.is_empty());
        assert!(TagIndex::from_refs(Vec::new(), &rel()).is_empty());
    }

    #[test]
    fn smallest_name_wins_regardless_of_order() {
        let a = CommitId::new("a").unwrap();
        let forward = TagIndex::from_refs(vec![tag("rel-1", "a"), tag("rel-2", "a")], &rel());
        let backward = TagIndex::from_refs(vec![tag("rel-2", "a"), tag("rel-1", "a")], &rel());
        assert_eq!(forward.get(&a).unwrap().as_str(), "rel-1");
        assert_eq!(forward, backward);
    }

    #[test]
    fn serializes_as_map() {
        let index = TagIndex::from_refs(vec![tag("rel-1", "a")], &rel());
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"a":"rel-1"}"#);
    }

    #[test]
    fn matching_tags_queries_every_time() {
        let git = MockGit::new();
        git.add_commit("a", &[]).unwrap();
        git.tag("rel-1", "a").unwrap();
        let repo = Path::new("/mock");

        let first = matching_tags(&git, repo, &rel()).unwrap();
        let second = matching_tags(&git, repo, &rel()).unwrap();
        assert_eq!(first, second);
        assert_eq!(git.calls("list_tags"), 2);
    }

    #[test]
    fn matching_tags_propagates_repository_errors() {
        let git = MockGit::new();
        git.set_broken(true);
        let result = matching_tags(&git, Path::new("/mock"), &rel());
        assert!(matches!(result, Err(GitError::NotARepo { .. })));
    }
}
