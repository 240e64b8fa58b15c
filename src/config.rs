//! Layered application configuration.
//!
//! Settings are merged with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <path>` if given, otherwise `config.toml` in
//!    the platform config directory (skipped if absent)
//! 3. `DUPESIFT_*` environment variables (`__` separates nested keys)
//!
//! CLI flags are applied on top by the binary.
//!
//! ```toml
//! roots = ["/home/me/Downloads"]
//! max_file_size = 52428800
//! algorithm = "blake3"
//! delete_mode = "trash"
//!
//! [[rules]]
//! type = "FILE_EXTENSION"
//! pattern = ".log"
//! category = "Logs"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::DeleteMode;
use crate::duplicates::FinderConfig;
use crate::rules::RuleDefinition;
use crate::scanner::{FingerprintAlgorithm, WalkerConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_FILE_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPESIFT_";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or had the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories scanned when none are given on the command line.
    pub roots: Vec<PathBuf>,
    /// Files larger than this (bytes) are skipped.
    pub max_file_size: u64,
    /// Fingerprint read buffer (bytes).
    pub buffer_size: usize,
    /// Fingerprint digest.
    pub algorithm: FingerprintAlgorithm,
    /// Worker threads; 0 uses every hardware thread.
    pub threads: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Skip zero-length files.
    pub skip_empty: bool,
    /// Gitignore-style patterns to exclude.
    pub ignore_patterns: Vec<String>,
    /// How `delete` removes files.
    pub delete_mode: DeleteMode,
    /// Classification rules, evaluated in order.
    pub rules: Vec<RuleDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            algorithm: FingerprintAlgorithm::default(),
            threads: 0,
            follow_symlinks: false,
            skip_hidden: false,
            skip_empty: false,
            ignore_patterns: Vec::new(),
            delete_mode: DeleteMode::default(),
            rules: Vec::new(),
        }
    }
}

impl Config {
    /// Load defaults, the config file, and the environment.
    ///
    /// # Errors
    ///
    /// Fails if `path` is given but missing, or if any source is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::layered(path, ENV_PREFIX)
    }

    fn layered(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                log::debug!("Loading config from {}", p.display());
                figment = figment.merge(Toml::file(p));
            }
            None => {
                if let Some(default_path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        figment
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Platform-specific default config path, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupesift", "dupesift")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Walker settings derived from this config.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            skip_empty: self.skip_empty,
            max_size: Some(self.max_file_size),
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }

    /// Finder settings derived from this config. Shutdown and progress hooks
    /// are left for the caller to attach.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_threads(self.threads)
            .with_algorithm(self.algorithm)
            .with_buffer_size(self.buffer_size)
            .with_walker_config(self.walker_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.algorithm, FingerprintAlgorithm::Md5);
        assert_eq!(config.delete_mode, DeleteMode::Permanent);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
roots = ["/data"]
max_file_size = 1024
algorithm = "blake3"
threads = 3
skip_hidden = true
delete_mode = "trash"

[[rules]]
type = "FILE_EXTENSION"
pattern = ".log"
category = "Logs"

[[rules]]
kind = "regex"
pattern = "^IMG_"
category = "Camera"
"#,
        )
        .unwrap();

        let config = Config::layered(Some(&path), "DUPESIFT_TEST_TOML_").unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("/data")]);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.algorithm, FingerprintAlgorithm::Blake3);
        assert_eq!(config.threads, 3);
        assert!(config.skip_hidden);
        assert_eq!(config.delete_mode, DeleteMode::Trash);
        assert_eq!(
            config.rules,
            vec![
                RuleDefinition::new(RuleKind::FileExtension, ".log", "Logs"),
                RuleDefinition::new(RuleKind::NameRegex, "^IMG_", "Camera"),
            ]
        );
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::layered(Some(&dir.path().join("nope.toml")), "DUPESIFT_TEST_MISSING_")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_file_size = \"lots\"").unwrap();

        let err = Config::layered(Some(&path), "DUPESIFT_TEST_INVALID_").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "threads = 2\nskip_empty = false").unwrap();

        std::env::set_var("DUPESIFT_TEST_ENV_THREADS", "9");
        std::env::set_var("DUPESIFT_TEST_ENV_SKIP_EMPTY", "true");
        let config = Config::layered(Some(&path), "DUPESIFT_TEST_ENV_").unwrap();
        std::env::remove_var("DUPESIFT_TEST_ENV_THREADS");
        std::env::remove_var("DUPESIFT_TEST_ENV_SKIP_EMPTY");

        assert_eq!(config.threads, 9);
        assert!(config.skip_empty);
    }

    #[test]
    fn test_finder_config_mapping() {
        let config = Config {
            threads: 5,
            max_file_size: 10,
            skip_hidden: true,
            ..Config::default()
        };
        let finder = config.finder_config();
        assert_eq!(finder.threads, 5);
        assert_eq!(finder.walker_config.max_size, Some(10));
        assert!(finder.walker_config.skip_hidden);
    }
}
