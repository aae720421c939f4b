// src/config/mod.rs
//! Operator configuration: limits, watchlist, feed URLs and curated topics.
//!
//! Resolution order for each file:
//! 1) explicit env var (must point to an existing file)
//! 2) `config/<name>.toml`
//! 3) `config/<name>.json`
//! 4) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::narrative::NarrativeTopic;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_TOPICS_PATH: &str = "DIGEST_TOPICS_PATH";

fn default_max_items() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchedToken {
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_max_items")]
    pub max_news_items: usize,
    #[serde(default = "default_max_items")]
    pub max_meme_items: usize,
    #[serde(default = "default_max_items")]
    pub max_topics: usize,
    /// Per-request timeout shared by every outbound call.
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub news_sources: Vec<String>,
    #[serde(default)]
    pub watchlist: Vec<WatchedToken>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_news_items: default_max_items(),
            max_meme_items: default_max_items(),
            max_topics: default_max_items(),
            http_timeout_secs: default_timeout_secs(),
            news_sources: Vec::new(),
            watchlist: Vec::new(),
        }
    }
}

impl DigestConfig {
    /// Drop blank feed URLs / addresses; keep order.
    fn sanitized(mut self) -> Self {
        self.news_sources = self
            .news_sources
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.watchlist.retain(|t| !t.address.trim().is_empty());
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_timeout_secs();
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct TopicsFile {
    #[serde(default)]
    topics: Vec<NarrativeTopic>,
}

/// Load the digest config from an explicit path (TOML or JSON).
pub fn load_config_from(path: &Path) -> Result<DigestConfig> {
    let content = read(path)?;
    let cfg: DigestConfig = parse_by_ext(&content, path)?;
    Ok(cfg.sanitized())
}

pub fn load_config_default() -> Result<DigestConfig> {
    match resolve(ENV_CONFIG_PATH, "digest")? {
        Some(p) => load_config_from(&p),
        None => {
            tracing::info!("no digest config found, using defaults");
            Ok(DigestConfig::default())
        }
    }
}

/// Load curated topics (`topics = [...]`) from an explicit path.
pub fn load_topics_from(path: &Path) -> Result<Vec<NarrativeTopic>> {
    let content = read(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: TopicsFile = parse_by_ext(&content, path)?;
    Ok(file.topics)
}

pub fn load_topics_default() -> Result<Vec<NarrativeTopic>> {
    match resolve(ENV_TOPICS_PATH, "hot_topics")? {
        Some(p) => load_topics_from(&p),
        None => Ok(Vec::new()),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn resolve(env_key: &str, stem: &str) -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{env_key} points to non-existent path {}", pb.display()));
    }
    for ext in ["toml", "json"] {
        let p = PathBuf::from(format!("config/{stem}.{ext}"));
        if p.exists() {
            return Ok(Some(p));
        }
    }
    Ok(None)
}

fn parse_by_ext<T: serde::de::DeserializeOwned>(content: &str, path: &Path) -> Result<T> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "json" {
        serde_json::from_str(content).with_context(|| format!("parsing json {}", path.display()))
    } else {
        toml::from_str(content).with_context(|| format!("parsing toml {}", path.display()))
    }
}
