//! Configuration management
//!
//! Defaults can be persisted in a TOML file under the platform config
//! directory (or `$BCP_CONFIG_DIR`). Command-line flags take precedence over
//! the file, which takes precedence over the built-in defaults. The resolved
//! values for a single invocation are frozen into a [`RunConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "BCP_CONFIG_DIR";

/// Default maximum object age eligible for copy, in days
pub const DEFAULT_RETENTION_DAYS: i64 = 365;

/// Queue slots per worker when no explicit queue depth is configured
const QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Upper bound on copy workers in one run
pub const MAX_CONCURRENCY: usize = 1024;

/// Upper bound on buffered requests; the queue allocates every slot up front
pub const MAX_QUEUE_DEPTH: usize = 65_536;

/// Retry policy for a single copy
///
/// `max_attempts` counts the first attempt, so the default of 1 means
/// failures are reported as-is without retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// Run defaults stored in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub retention_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_timeout_secs: Option<u64>,
    pub retry: RetryConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            concurrency: None,
            queue_depth: None,
            task_timeout_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Backend connection settings
///
/// Credentials are never stored here; they come from the ambient provider
/// chain (environment, shared profile files, instance metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub force_path_style: bool,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub s3: S3Settings,
}

/// Loads and saves [`Config`] from disk
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Locate the config file using `$BCP_CONFIG_DIR` or the platform config dir
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?
                .join("bcp"),
        };
        Ok(Self::with_dir(dir))
    }

    /// Use `dir/config.toml` as the config file
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("config.toml"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {e}", self.path.display()))
        })?;
        Ok(config)
    }
}

/// Number of workers used when none is configured
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_CONCURRENCY)
}

/// Queue depth used when none is configured: a few slots per worker
pub fn derived_queue_depth(concurrency: usize) -> usize {
    concurrency
        .saturating_mul(QUEUE_SLOTS_PER_WORKER)
        .min(MAX_QUEUE_DEPTH)
}

/// Immutable configuration for one run, handed to every copy task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source_bucket: String,
    pub dest_bucket: String,
    pub retention_days: i64,
    pub concurrency: usize,
    pub queue_depth: usize,
    pub task_timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl RunConfig {
    /// Build a run config from bucket names and file defaults
    pub fn new(
        source_bucket: impl Into<String>,
        dest_bucket: impl Into<String>,
        defaults: &Defaults,
    ) -> Self {
        let concurrency = defaults.concurrency.unwrap_or_else(default_concurrency);
        Self {
            source_bucket: source_bucket.into(),
            dest_bucket: dest_bucket.into(),
            retention_days: defaults.retention_days,
            concurrency,
            queue_depth: defaults
                .queue_depth
                .unwrap_or_else(|| derived_queue_depth(concurrency)),
            task_timeout: defaults.task_timeout_secs.map(Duration::from_secs),
            retry: defaults.retry.clone(),
        }
    }

    /// Set the worker count, rescaling a derived queue depth
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        if self.queue_depth == derived_queue_depth(self.concurrency) {
            self.queue_depth = derived_queue_depth(concurrency);
        }
        self.concurrency = concurrency;
        self
    }

    /// Reject configurations that cannot start a run
    pub fn validate(&self) -> Result<()> {
        if self.source_bucket.trim().is_empty() {
            return Err(Error::Config("Source bucket is required".to_string()));
        }
        if self.dest_bucket.trim().is_empty() {
            return Err(Error::Config("Destination bucket is required".to_string()));
        }
        if self.retention_days < 0 {
            return Err(Error::Config(format!(
                "Retention must be zero or more days, got {}",
                self.retention_days
            )));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(Error::Config(format!(
                "Concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if !(1..=MAX_QUEUE_DEPTH).contains(&self.queue_depth) {
            return Err(Error::Config(format!(
                "Queue depth must be between 1 and {MAX_QUEUE_DEPTH}, got {}",
                self.queue_depth
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("Retry attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_config() -> RunConfig {
        RunConfig::new("src", "dst", &Defaults::default())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.defaults.retention_days, 365);
        assert_eq!(config.defaults.retry.max_attempts, 1);
        assert!(config.defaults.concurrency.is_none());
        assert!(!config.s3.force_path_style);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path());
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn test_load_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path());
        std::fs::write(
            manager.path(),
            "[defaults]\nretention_days = 30\nconcurrency = 16\n\n[s3]\nregion = \"eu-west-1\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.retention_days, 30);
        assert_eq!(config.defaults.concurrency, Some(16));
        assert_eq!(config.s3.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path());
        std::fs::write(
            manager.path(),
            "[defaults]\ntask_timeout_secs = 30\n\n[defaults.retry]\nmax_attempts = 3\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.retention_days, 365);
        assert_eq!(config.defaults.task_timeout_secs, Some(30));
        assert_eq!(config.defaults.retry.max_attempts, 3);
        assert_eq!(config.defaults.retry.initial_backoff_ms, 100);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path());
        std::fs::write(manager.path(), "[defaults\nretention_days = ").unwrap();

        assert!(matches!(manager.load(), Err(Error::Config(_))));
    }

    #[test]
    fn test_run_config_from_defaults() {
        let defaults = Defaults {
            concurrency: Some(3),
            task_timeout_secs: Some(10),
            ..Default::default()
        };
        let config = RunConfig::new("a", "b", &defaults);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.queue_depth, 12);
        assert_eq!(config.task_timeout, Some(Duration::from_secs(10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_concurrency_rescales_derived_depth() {
        let config = RunConfig::new("a", "b", &Defaults::default()).with_concurrency(8);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.queue_depth, 32);

        let defaults = Defaults {
            queue_depth: Some(5),
            ..Default::default()
        };
        let config = RunConfig::new("a", "b", &defaults).with_concurrency(8);
        assert_eq!(config.queue_depth, 5);
    }

    #[test]
    fn test_validate_missing_buckets() {
        let mut config = run_config();
        config.source_bucket = String::new();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = run_config();
        config.dest_bucket = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_limits() {
        let mut config = run_config();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = run_config();
        config.retention_days = -1;
        assert!(config.validate().is_err());

        let mut config = run_config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = run_config();
        config.queue_depth = MAX_QUEUE_DEPTH + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_huge_concurrency_is_a_config_error() {
        let config = run_config().with_concurrency(usize::MAX);
        assert_eq!(config.concurrency, usize::MAX);
        assert_eq!(config.queue_depth, MAX_QUEUE_DEPTH);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let defaults = Defaults {
            concurrency: Some(usize::MAX),
            ..Default::default()
        };
        let config = RunConfig::new("a", "b", &defaults);
        assert_eq!(config.queue_depth, MAX_QUEUE_DEPTH);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = run_config().with_concurrency(MAX_CONCURRENCY);
        assert!(config.validate().is_ok());
    }
}
