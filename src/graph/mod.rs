//! graph
//!
//! Release-tag resolution over the commit graph.
//!
//! # Modules
//!
//! - [`tags`] - Commit to tag index for a pattern
//! - [`cache`] - Per-repository topological order and child map cache
//! - [`resolver`] - Follows / Precedes, describe, parents and children
//!
//! All repository access goes through [`GitQueries`](crate::git::GitQueries),
//! so the resolver runs unchanged over the command line, libgit2 or the
//! in-memory mock.

pub mod cache;
pub mod resolver;
pub mod tags;

pub use cache::{CachePolicy, ChildMap, RepoCache, TopoOrder};
pub use resolver::{
    CommitContext, CommitEdges, FollowsResult, PrecedesResult, ReleaseSuggestion,
    SuggestionSource, TagResolver,
};
pub use tags::{matching_tags, TagIndex};
