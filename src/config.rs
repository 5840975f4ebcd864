//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is constructed once at startup and handed to the
//! orchestrator; there is no ambient global state. Defaults cover every
//! field, and an optional YAML file can override any of them:
//!
//! ```yaml
//! sources:
//!   - "https://www.theverge.com"
//!   - url: "https://techcrunch.com/category/artificial-intelligence/feed/"
//!     label: techcrunch
//! intermediate_path: data/normalized_items.json
//! output_path: output/classified_news.tsv
//! fetch_timeout_secs: 10
//! fetch_concurrency: 4
//! max_items_per_source: 30
//! max_age_days: 2
//! ```

use crate::errors::PipelineError;
use crate::models::SourceDescriptor;
use crate::sources;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Construction-time parameters for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Default sources scraped on every run (extras are added per call).
    pub sources: Vec<SourceDescriptor>,
    /// Path of the intermediate store (JSON array of normalized records).
    pub intermediate_path: PathBuf,
    /// Path of the output store (line-oriented classified records).
    pub output_path: PathBuf,
    /// Per-source time budget covering feed probing and article fetches.
    pub fetch_timeout: Duration,
    /// Maximum number of sources fetched concurrently.
    pub fetch_concurrency: usize,
    /// Cap on items taken from a single source in one run.
    pub max_items_per_source: usize,
    /// Drop items whose publication date is older than this many days.
    /// `None` disables the recency filter; undated items are always kept.
    pub max_age_days: Option<i64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: sources::default_sources(),
            intermediate_path: PathBuf::from("data/normalized_items.json"),
            output_path: PathBuf::from("output/classified_news.tsv"),
            fetch_timeout: Duration::from_secs(10),
            fetch_concurrency: 4,
            max_items_per_source: 30,
            max_age_days: Some(2),
        }
    }
}

/// On-disk shape of the optional YAML config. Every field is optional;
/// missing fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    sources: Option<Vec<SourceEntry>>,
    intermediate_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    fetch_timeout_secs: Option<u64>,
    fetch_concurrency: Option<usize>,
    max_items_per_source: Option<usize>,
    max_age_days: Option<i64>,
}

/// A source in the config file: either a bare URL string or a full
/// descriptor with a label.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceEntry {
    Url(String),
    Full(SourceDescriptor),
}

impl From<SourceEntry> for SourceDescriptor {
    fn from(entry: SourceEntry) -> Self {
        match entry {
            SourceEntry::Url(url) => SourceDescriptor::new(url),
            SourceEntry::Full(descriptor) => descriptor,
        }
    }
}

impl PipelineConfig {
    /// Build a configuration from defaults, overlaid with the given YAML
    /// file when present.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = Self::default();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            let file: ConfigFile = serde_yaml::from_str(&text).map_err(|e| {
                PipelineError::Config(format!("cannot parse {}: {e}", path.display()))
            })?;
            config.apply(file);
            info!(path = %path.display(), "Loaded configuration overrides");
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(entries) = file.sources {
            self.sources = entries.into_iter().map(SourceDescriptor::from).collect();
        }
        if let Some(path) = file.intermediate_path {
            self.intermediate_path = path;
        }
        if let Some(path) = file.output_path {
            self.output_path = path;
        }
        if let Some(secs) = file.fetch_timeout_secs {
            self.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = file.fetch_concurrency {
            self.fetch_concurrency = limit;
        }
        if let Some(cap) = file.max_items_per_source {
            self.max_items_per_source = cap;
        }
        if file.max_age_days.is_some() {
            self.max_age_days = file.max_age_days.filter(|days| *days > 0);
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.fetch_concurrency == 0 {
            return Err(PipelineError::Config(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_items_per_source == 0 {
            return Err(PipelineError::Config(
                "max_items_per_source must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
