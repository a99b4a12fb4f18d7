//! core
//!
//! Core domain types, parsing and configuration for tagtrail.
//!
//! # Modules
//!
//! - [`types`] - Strong types: CommitId, TagName
//! - [`pattern`] - Glob patterns for selecting tags
//! - [`describe`] - Parsing of `git describe` descriptors
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing in this layer talks to git

pub mod config;
pub mod describe;
pub mod pattern;
pub mod types;
