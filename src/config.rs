//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/cnotes.sqlite"
//!
//! [resolver]
//! settle_delay_ms = 800
//! poll_interval_ms = 250
//! max_attempts = 20
//!
//! [related]
//! limit = 5
//!
//! [page_content]
//! max_chars = 5000
//! ```
//!
//! Only `[db]` is required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use context_notes_core::notes::DEFAULT_RELATED_LIMIT;
use context_notes_core::resolver::StabilizationPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub related: RelatedConfig,
    #[serde(default)]
    pub page_content: PageContentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    800
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_max_attempts() -> u32 {
    20
}

impl ResolverConfig {
    pub fn policy(&self) -> StabilizationPolicy {
        StabilizationPolicy {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelatedConfig {
    #[serde(default = "default_related_limit")]
    pub limit: usize,
}

impl Default for RelatedConfig {
    fn default() -> Self {
        Self {
            limit: default_related_limit(),
        }
    }
}

fn default_related_limit() -> usize {
    DEFAULT_RELATED_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct PageContentConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for PageContentConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    5000
}

impl Config {
    /// Defaults for commands that work without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/cnotes.sqlite"),
            },
            resolver: ResolverConfig::default(),
            related: RelatedConfig::default(),
            page_content: PageContentConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.resolver.max_attempts == 0 {
        anyhow::bail!("resolver.max_attempts must be >= 1");
    }
    if config.resolver.poll_interval_ms == 0 {
        anyhow::bail!("resolver.poll_interval_ms must be > 0");
    }
    if config.related.limit == 0 {
        anyhow::bail!("related.limit must be >= 1");
    }
    if config.page_content.max_chars == 0 {
        anyhow::bail!("page_content.max_chars must be > 0");
    }

    Ok(config)
}
