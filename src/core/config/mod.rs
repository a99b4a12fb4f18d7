//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! tagtrail has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TAGTRAIL_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tagtrail/config.toml`
//! 3. `~/.tagtrail/config.toml`
//!
//! # Repo Config Location
//!
//! `.git/tagtrail/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use tagtrail::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo"))).unwrap().config;
//! println!("Tag pattern: {}", config.tag_pattern());
//! println!("Backend: {}", config.backend());
//! ```

pub mod schema;

pub use schema::{CacheConfig, GitCommandConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::pattern::TagPattern;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default threshold above which a command is logged as slow.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(150);

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically: repo config
/// overrides global config, which overrides defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads repo-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path_found) = match repo_path {
            Some(path) => Self::load_repo(path)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path: repo_path_found,
            },
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("TAGTRAIL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("tagtrail/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tagtrail/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(repo_path: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(repo_path);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path for repo config.
    ///
    /// Returns `.git/tagtrail/config.toml` relative to the given repo path.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(".git/tagtrail/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the tag pattern.
    ///
    /// Defaults to `rel-*` if not configured.
    pub fn tag_pattern(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.tag_pattern.as_deref())
            .or(self.global.tag_pattern.as_deref())
            .unwrap_or(TagPattern::DEFAULT)
    }

    /// Get the query backend.
    ///
    /// Defaults to "cli" if not configured.
    pub fn backend(&self) -> &str {
        self.global.backend.as_deref().unwrap_or("cli")
    }

    /// Get the git program to run.
    ///
    /// Defaults to "git" if not configured.
    pub fn git_program(&self) -> &str {
        self.global
            .git
            .as_ref()
            .and_then(|g| g.program.as_deref())
            .unwrap_or("git")
    }

    /// Get the per-command timeout.
    ///
    /// Defaults to 30 seconds; `timeout_ms = 0` disables the timeout.
    pub fn command_timeout(&self) -> Option<Duration> {
        match self.global.git.as_ref().and_then(|g| g.timeout_ms) {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => Some(DEFAULT_TIMEOUT),
        }
    }

    /// Get the slow-command threshold.
    ///
    /// Defaults to 150 ms.
    pub fn slow_threshold(&self) -> Duration {
        self.global
            .git
            .as_ref()
            .and_then(|g| g.slow_threshold_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SLOW_THRESHOLD)
    }

    /// Check if graph caching is enabled.
    ///
    /// Defaults to `true` if not configured.
    pub fn cache_enabled(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.cache.as_ref())
            .and_then(|c| c.enabled)
            .or(self.global.cache.as_ref().and_then(|c| c.enabled))
            .unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_config(contents: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".git/tagtrail");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), contents).unwrap();
        temp
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.tag_pattern(), "rel-*");
        assert_eq!(config.backend(), "cli");
        assert_eq!(config.git_program(), "git");
        assert_eq!(config.command_timeout(), Some(DEFAULT_TIMEOUT));
        assert_eq!(config.slow_threshold(), Duration::from_millis(150));
        assert!(config.cache_enabled());
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
            backend = "libgit2"

            [git]
            timeout_ms = 0
            "#,
        )
        .unwrap();

        std::env::set_var("TAGTRAIL_CONFIG", config_path.to_str().unwrap());
        let result = Config::load(None);
        std::env::remove_var("TAGTRAIL_CONFIG");

        let config = result.unwrap().config;
        assert_eq!(config.backend(), "libgit2");
        assert_eq!(config.command_timeout(), None);
        assert_eq!(config.global_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn load_repo_config() {
        let temp = write_repo_config(
            r#"
            tag_pattern = "v*"

            [cache]
            enabled = false
            "#,
        );

        let config = Config::load(Some(temp.path())).unwrap().config;

        assert_eq!(config.tag_pattern(), "v*");
        assert!(!config.cache_enabled());
        assert!(config.repo_config_loaded_from().is_some());
    }

    #[test]
    fn missing_repo_config_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(temp.path())).unwrap();
        assert!(result.config.repo.is_none());
    }

    #[test]
    fn invalid_pattern_rejected() {
        let temp = write_repo_config("tag_pattern = \"v[z-a]\"");
        assert!(Config::load(Some(temp.path())).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = write_repo_config(
            r#"
            tag_pattern = "rel-*"
            unknown_field = true
            "#,
        );
        assert!(matches!(
            Config::load(Some(temp.path())),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn precedence_repo_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                tag_pattern: Some("v*".to_string()),
                cache: Some(CacheConfig {
                    enabled: Some(false),
                }),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                tag_pattern: Some("rel-*".to_string()),
                cache: Some(CacheConfig {
                    enabled: Some(true),
                }),
            }),
            global_path: None,
            repo_path: None,
        };

        assert_eq!(config.tag_pattern(), "rel-*");
        assert!(config.cache_enabled());
    }

    #[test]
    fn global_used_when_repo_silent() {
        let config = Config {
            global: GlobalConfig {
                tag_pattern: Some("v*".to_string()),
                ..Default::default()
            },
            repo: Some(RepoConfig::default()),
            global_path: None,
            repo_path: None,
        };

        assert_eq!(config.tag_pattern(), "v*");
    }
}
