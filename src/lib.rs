//! tagtrail - Release-tag resolution for git history
//!
//! Given a commit and a glob selecting release tags, tagtrail answers where
//! the commit sits among the releases: the nearest tag behind it (Follows),
//! the nearest tag ahead of it (Precedes), its `git describe` name, and its
//! immediate parents and children.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to graph)
//! - [`graph`] - Tag index, cached whole-graph scans and the resolver
//! - [`core`] - Domain types, tag patterns, describe parsing, configuration
//! - [`git`] - Single interface for all repository queries
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. Repository state is never modified
//! 2. Absent results are `Option::None`, never placeholder values
//! 3. Structural query failures propagate; advisory ones degrade to absence

pub mod cli;
pub mod core;
pub mod git;
pub mod graph;
pub mod ui;
