use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::normalize::DEFAULT_FALLBACK_CHARS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Revisions per listing page (`rvlimit`); `"max"` lets the server decide.
    #[serde(default = "default_page_limit")]
    pub page_limit: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}
fn default_user_agent() -> String {
    format!(
        "lede/{} (revision history analysis)",
        env!("CARGO_PKG_VERSION")
    )
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_limit() -> String {
    "max".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    #[serde(default)]
    pub retry_failed: bool,
    #[serde(default)]
    pub section: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            checkpoint_every: default_checkpoint_every(),
            retry_failed: false,
            section: 0,
        }
    }
}

impl FetchConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }
}

fn default_throttle_ms() -> u64 {
    500
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_secs() -> u64 {
    5
}
fn default_checkpoint_every() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeConfig {
    #[serde(default = "default_fallback_chars")]
    pub fallback_chars: usize,
    #[serde(default)]
    pub lead_in_patterns: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            fallback_chars: DEFAULT_FALLBACK_CHARS,
            lead_in_patterns: Vec::new(),
        }
    }
}

fn default_fallback_chars() -> usize {
    DEFAULT_FALLBACK_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Record file for `article` inside the output directory.
    pub fn record_path(&self, article: &str) -> PathBuf {
        self.output.dir.join(record_file_name(article))
    }
}

/// `27 Club` → `27_Club_first_sentence_analysis.json`.
pub fn record_file_name(article: &str) -> String {
    format!(
        "{}_first_sentence_analysis.json",
        article.trim().replace(' ', "_")
    )
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(config.wiki.api_url.starts_with("http://") || config.wiki.api_url.starts_with("https://"))
    {
        anyhow::bail!(
            "wiki.api_url must be an http(s) URL, got '{}'",
            config.wiki.api_url
        );
    }

    if config.wiki.timeout_secs == 0 {
        anyhow::bail!("wiki.timeout_secs must be > 0");
    }

    if config.fetch.max_retries > 10 {
        anyhow::bail!("fetch.max_retries must be <= 10");
    }

    if config.fetch.checkpoint_every == 0 {
        anyhow::bail!("fetch.checkpoint_every must be >= 1");
    }

    if config.normalize.fallback_chars == 0 {
        anyhow::bail!("normalize.fallback_chars must be >= 1");
    }

    for pattern in &config.normalize.lead_in_patterns {
        regex::Regex::new(pattern)
            .with_context(|| format!("normalize.lead_in_patterns: invalid pattern '{}'", pattern))?;
    }

    Ok(())
}
