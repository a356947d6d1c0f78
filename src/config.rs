//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all, see
//! [`load_or_default`]) crawls the public service with the reference
//! settings.
//!
//! ```toml
//! [oracle]
//! options_url = "https://voterlist.election.gov.np/bbvrs1/index_process_1.php"
//! lookup_url = "https://voterlist.election.gov.np/bbvrs1/view_ward_1.php"
//! timeout_secs = 30
//! max_retries = 1
//!
//! [crawl]
//! output_dir = "./links"
//! concurrency = 4
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_options_url")]
    pub options_url: String,
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    #[serde(default = "default_boundary")]
    pub boundary: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Proxy URL applied to every request (`http://` or `https://`).
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            options_url: default_options_url(),
            lookup_url: default_lookup_url(),
            boundary: default_boundary(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            proxy: None,
        }
    }
}

fn default_options_url() -> String {
    "https://voterlist.election.gov.np/bbvrs1/index_process_1.php".to_string()
}
fn default_lookup_url() -> String {
    "https://voterlist.election.gov.np/bbvrs1/view_ward_1.php".to_string()
}
fn default_boundary() -> String {
    "kljmyvW1ndjXaOEAg4vPm6RBUqO6MC5A".to_string()
}
fn default_user_agent() -> String {
    concat!("vlist/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    1
}
fn default_retry_backoff_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum number of oracle requests in flight. `1` reproduces the
    /// strictly sequential, deterministic walk.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_min_state")]
    pub min_state: u32,
    #[serde(default = "default_max_state")]
    pub max_state: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
            min_state: default_min_state(),
            max_state: default_max_state(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_concurrency() -> usize {
    4
}
fn default_min_state() -> u32 {
    1
}
fn default_max_state() -> u32 {
    7
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise use the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate oracle
    for (key, url) in [
        ("oracle.options_url", &config.oracle.options_url),
        ("oracle.lookup_url", &config.oracle.lookup_url),
    ] {
        reqwest::Url::parse(url).with_context(|| format!("{} is not a valid URL: '{}'", key, url))?;
    }
    if config.oracle.boundary.trim().is_empty() {
        anyhow::bail!("oracle.boundary must not be empty");
    }
    if config.oracle.timeout_secs == 0 {
        anyhow::bail!("oracle.timeout_secs must be >= 1");
    }

    // Validate crawl
    if config.crawl.concurrency == 0 {
        anyhow::bail!("crawl.concurrency must be >= 1");
    }
    if config.crawl.min_state > config.crawl.max_state {
        anyhow::bail!(
            "crawl.min_state ({}) must not exceed crawl.max_state ({})",
            config.crawl.min_state,
            config.crawl.max_state
        );
    }

    Ok(())
}
