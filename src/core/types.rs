//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`CommitId`] - Opaque commit identifier (full hex object hash)
//! - [`TagName`] - Name of a tag reference, without the `refs/tags/` prefix
//!
//! # Validation
//!
//! These types enforce validity at construction time. Both are handed to the
//! git command line as arguments, so neither may start with `-` or contain
//! whitespace.
//!
//! # Examples
//!
//! ```
//! use tagtrail::core::types::{CommitId, TagName};
//!
//! let commit = CommitId::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let tag = TagName::new("rel-1.0").unwrap();
//!
//! assert!(CommitId::new("--all").is_err());
//! assert!(TagName::new("rel-*").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("invalid tag pattern: {0}")]
    InvalidPattern(String),
}

/// A commit identifier.
///
/// Commit ids are opaque and case-sensitive: two ids are equal iff their
/// string forms are equal. No normalization is applied, so an id supplied by
/// a caller only matches graph entries spelled exactly the same way.
///
/// # Example
///
/// ```
/// use tagtrail::core::types::CommitId;
///
/// let a = CommitId::new("abc123def4567890abc123def4567890abc12345").unwrap();
/// let b = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Create a new validated commit id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitId` if the id is empty, starts with
    /// `-`, or contains whitespace or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidCommitId(
                "commit id cannot be empty".into(),
            ));
        }
        if id.starts_with('-') {
            return Err(TypeError::InvalidCommitId(format!(
                "commit id cannot start with '-': {id}"
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidCommitId(format!(
                "commit id cannot contain whitespace: {id:?}"
            )));
        }
        Ok(())
    }

    /// Get an abbreviated form of the id.
    ///
    /// Returns the first `len` characters, or the whole id if it is shorter.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for CommitId {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tag name, as listed under `refs/tags/`.
///
/// Glob metacharacters are only meaningful in a
/// [`TagPattern`](crate::core::pattern::TagPattern); git refuses them in
/// ref names, so they are rejected here too.
///
/// # Example
///
/// ```
/// use tagtrail::core::types::TagName;
///
/// let tag = TagName::new("release/rel-2-5-7").unwrap();
/// assert_eq!(tag.as_str(), "release/rel-2-5-7");
///
/// assert!(TagName::new("").is_err());
/// assert!(TagName::new("has space").is_err());
/// assert!(TagName::new("rel-[12]").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Create a new validated tag name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTagName` if the name is empty, starts with
    /// `-`, or contains whitespace, control characters or glob metacharacters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidTagName("tag name cannot be empty".into()));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidTagName(
                "tag name cannot start with '-'".into(),
            ));
        }

        const INVALID_CHARS: [char; 3] = ['*', '?', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidTagName(format!(
                    "tag name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidTagName(
                "tag name cannot contain whitespace or control characters".into(),
            ));
        }

        Ok(())
    }

    /// Get the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TagName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.0
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
