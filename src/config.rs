//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\lyriks\config.toml
//! - macOS: ~/Library/Application Support/lyriks/config.toml
//! - Linux: ~/.config/lyriks/config.toml
//!
//! The file is optional and every setting has a default. Command-line flags
//! override file values; the merged result is validated once at startup,
//! before any file is processed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetcher::DEFAULT_CONCURRENCY;
use crate::musicbrainz::DEFAULT_BASE_URL;
use crate::musicbrainz::rate_limit::DEFAULT_INTERVAL;
use crate::providers::ProviderKind;

/// Report file name used when the report path is a directory
pub const DEFAULT_REPORT_NAME: &str = "report.html";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metadata registry settings
    pub registry: RegistryConfig,

    /// Fetch run settings
    pub fetch: FetchConfig,
}

/// Metadata registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry web service root
    pub base_url: String,

    /// Minimum seconds between request starts; only allowed for a
    /// non-default `base_url`
    pub rate_limit_secs: Option<f64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_secs: None,
        }
    }
}

impl RegistryConfig {
    fn is_default_endpoint(&self) -> bool {
        self.base_url.trim_end_matches('/') == DEFAULT_BASE_URL
    }

    /// Validated spacing between registry requests.
    pub fn interval(&self) -> Result<Duration> {
        let Some(secs) = self.rate_limit_secs else {
            return Ok(DEFAULT_INTERVAL);
        };

        if self.is_default_endpoint() {
            return Err(Error::config(
                "the rate limit can only be changed for a custom registry URL",
            ));
        }
        if !secs.is_finite() || secs <= 0.0 {
            return Err(Error::config(format!(
                "invalid rate limit {}, expected a positive number of seconds",
                secs
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

/// Fetch run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Files processed concurrently
    pub concurrency: usize,

    /// Lyrics backend: "genie", "qq"/"qqm"/"qqmusic" or "vibe"
    pub provider: String,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            provider: ProviderKind::default().to_string(),
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider.parse().map_err(Error::Config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Values given on the command line, taking precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub registry_url: Option<String>,
    pub rate_limit: Option<f64>,
    pub concurrency: Option<usize>,
    pub provider: Option<ProviderKind>,
}

impl Config {
    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.registry_url {
            self.registry.base_url = url;
        }
        if let Some(secs) = overrides.rate_limit {
            self.registry.rate_limit_secs = Some(secs);
        }
        if let Some(concurrency) = overrides.concurrency {
            self.fetch.concurrency = concurrency;
        }
        if let Some(provider) = overrides.provider {
            self.fetch.provider = provider.to_string();
        }
        self
    }

    /// Check option combinations that cannot be run.
    pub fn validate(&self) -> Result<()> {
        self.registry.interval()?;
        self.fetch.provider_kind()?;
        if self.fetch.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// The collection root, which must be an existing directory.
pub fn resolve_collection(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::config(format!(
            "collection path '{}' is not a directory",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// The report output file.
///
/// A directory resolves to [`DEFAULT_REPORT_NAME`] inside it; otherwise the
/// parent directory must exist.
pub fn resolve_report_path(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        return Ok(path.join(DEFAULT_REPORT_NAME));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(Error::config(format!(
            "report directory '{}' does not exist",
            parent.display()
        )));
    }
    Ok(path.to_path_buf())
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lyriks"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from `path`, see [`load`].
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
