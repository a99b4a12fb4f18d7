//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$TAGTRAIL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tagtrail/config.toml`
//! 3. `~/.tagtrail/config.toml`
//!
//! # Repo Config
//!
//! Located at `.git/tagtrail/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., the tag pattern must
//! compile, the backend must be a known one).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::pattern::TagPattern;

/// Query backends that can be selected in config.
pub const VALID_BACKENDS: &[&str] = &["cli", "libgit2"];

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// tag_pattern = "rel-*"
/// backend = "cli"
///
/// [git]
/// program = "git"
/// timeout_ms = 30000
/// slow_threshold_ms = 150
///
/// [cache]
/// enabled = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Glob selecting release tags
    pub tag_pattern: Option<String>,

    /// Query backend ("cli" or "libgit2")
    pub backend: Option<String>,

    /// Git command settings
    pub git: Option<GitCommandConfig>,

    /// Graph cache settings
    pub cache: Option<CacheConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tag_pattern(self.tag_pattern.as_deref())?;

        if let Some(backend) = &self.backend {
            if !VALID_BACKENDS.contains(&backend.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid backend '{}', must be one of: {}",
                    backend,
                    VALID_BACKENDS.join(", ")
                )));
            }
        }

        if let Some(git) = &self.git {
            git.validate()?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// tag_pattern = "v*"
///
/// [cache]
/// enabled = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Glob selecting release tags in this repository
    pub tag_pattern: Option<String>,

    /// Graph cache settings for this repository
    pub cache: Option<CacheConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tag_pattern(self.tag_pattern.as_deref())
    }
}

/// Settings for spawning git.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitCommandConfig {
    /// Program to run (default: "git")
    pub program: Option<String>,

    /// Per-command timeout in milliseconds; 0 disables it
    pub timeout_ms: Option<u64>,

    /// Commands at or above this duration are logged as slow
    pub slow_threshold_ms: Option<u64>,
}

impl GitCommandConfig {
    /// Validate the git command settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(program) = &self.program {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git program cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Graph cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache topological order and child maps for the process lifetime
    pub enabled: Option<bool>,
}

fn validate_tag_pattern(pattern: Option<&str>) -> Result<(), ConfigError> {
    if let Some(pattern) = pattern {
        TagPattern::new(pattern)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid tag_pattern: {}", e)))?;
    }
    Ok(())
}
