//! TOML configuration and credential loading.
//!
//! Every section is optional; omitted keys fall back to the defaults below,
//! which reproduce the classic layout of `movies.csv` in, `movie_data.xlsx`
//! and `dead_letter_queue.csv` out of the working directory.
//!
//! ```toml
//! [paths]
//! input = "movies.csv"
//! report = "movie_data.xlsx"
//! dead_letter = "dead_letter_queue.csv"
//!
//! [tmdb]
//! base_url = "https://api.themoviedb.org/3"
//! language = "en-US"
//! timeout_secs = 10
//!
//! [retry]
//! max_retries = 3
//! initial_backoff_ms = 1000
//! max_jitter_ms = 500
//!
//! [pipeline]
//! concurrency = 10
//! ```
//!
//! The TMDB credential is never read from the file: it comes from the
//! `TMDB_API_KEY` environment variable (see [`load_api_key`]).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::Semaphore;

/// Environment variable holding the TMDB v3 API key.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/movie-report.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default = "default_dead_letter")]
    pub dead_letter: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            report: default_report(),
            dead_letter: default_dead_letter(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("movies.csv")
}
fn default_report() -> PathBuf {
    PathBuf::from("movie_data.xlsx")
}
fn default_dead_letter() -> PathBuf {
    PathBuf::from("dead_letter_queue.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct TmdbConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
    /// Seed for reproducible jitter; random when absent.
    #[serde(default)]
    pub jitter_seed: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            jitter_seed: None,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_jitter_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    10
}

impl Config {
    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            bail!("pipeline.concurrency must be >= 1");
        }
        if self.pipeline.concurrency > Semaphore::MAX_PERMITS {
            bail!(
                "pipeline.concurrency must be <= {}",
                Semaphore::MAX_PERMITS
            );
        }
        if self.tmdb.timeout_secs == 0 {
            bail!("tmdb.timeout_secs must be >= 1");
        }
        if self.tmdb.base_url.trim().is_empty() {
            bail!("tmdb.base_url must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Resolve the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is used
/// when present and the built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Read the TMDB credential from the environment.
///
/// Missing or blank keys are a fatal precondition: the run must stop before
/// any request is made.
pub fn load_api_key() -> Result<String> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => bail!("{} not set in environment", API_KEY_ENV),
    }
}
