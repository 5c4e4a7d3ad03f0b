//! Configuration file loading and merging with CLI arguments.
//!
//! The config file is YAML, by default at `~/.campus_press/config.yml`:
//!
//! ```yaml
//! api_url: https://cms.example.edu/api
//! timeout_secs: 10
//! max_retries: 3
//! retry_base_delay_ms: 500
//! # fixtures: ./fixtures.yml
//! ```
//!
//! A missing default file is fine; a missing file named with `--config` is
//! an error. CLI flags and environment variables win over file values.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub fixtures: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_base_delay_ms: Option<u64>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".campus_press").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let config = serde_yaml::from_str::<ConfigFile>(&contents).map_err(|source| {
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            debug!(path = %path.display(), "No config file; using defaults");
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load the file named on the command line, or the default one if present.
pub fn load_for_cli(cli: &Cli) -> Result<ConfigFile, ConfigError> {
    match &cli.config {
        Some(path) => load_config(&expand_tilde(&path.to_string_lossy()), false),
        None => match default_config_path() {
            Some(path) => load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

/// Effective settings after merging CLI arguments over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub fixtures: Option<PathBuf>,
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_base_delay: Duration,
}

impl Settings {
    pub fn merge(cli: &Cli, file: ConfigFile) -> Self {
        Self {
            api_url: cli.api_url.clone().or(file.api_url),
            fixtures: cli
                .fixtures
                .clone()
                .or_else(|| file.fixtures.as_deref().map(expand_tilde)),
            timeout: Duration::from_secs(
                cli.timeout
                    .or(file.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_retries: cli
                .max_retries
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay: Duration::from_millis(
                file.retry_base_delay_ms
                    .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            ),
        }
    }
}
