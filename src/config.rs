//! YAML configuration.
//!
//! Everything but secrets lives in `newsbrief.yaml`; secrets come from the
//! command line or the environment (see [`crate::cli::Cli`]). Every section
//! and field is optional and falls back to the built-in defaults below.
//!
//! ```yaml
//! search:
//!   query: decentralized AI
//!   page_size: 5
//! summarizer:
//!   backend: hugging_face   # or awful_aj
//!   concurrency: 4
//! telegram:
//!   header: Today's Decentralized-AI News
//! extraction: pattern       # or dom
//! http:
//!   timeout_secs: 30
//! state_dir: ./state
//! ```

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};
use crate::normalize::ExtractionStrategy;
use crate::pipeline::IngestSettings;
use crate::providers::{huggingface, newsapi, telegram};

pub const DEFAULT_CONFIG_FILE: &str = "newsbrief.yaml";

/// NewsAPI rejects larger pages.
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    /// How pasted pages are scraped for title, description and metadata.
    #[serde(default)]
    pub extraction: ExtractionStrategy,

    #[serde(default)]
    pub http: HttpConfig,

    /// Directory holding `drafts.json`, `articles.json` and `sent.json`.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            summarizer: SummarizerConfig::default(),
            telegram: TelegramConfig::default(),
            extraction: ExtractionStrategy::default(),
            http: HttpConfig::default(),
            state_dir: default_state_dir(),
        }
    }
}

// ── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Articles requested per batch ingestion.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            query: default_query(),
            language: default_language(),
            page_size: default_page_size(),
            sort_by: default_sort_by(),
        }
    }
}

// ── Summarizer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerKind {
    /// Hosted inference API (`HF_API_KEY`).
    #[default]
    HuggingFace,
    /// OpenAI-compatible model configured through `awful_aj`.
    AwfulAj,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub backend: SummarizerKind,

    #[serde(default = "default_hf_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_length")]
    pub max_length: u32,

    #[serde(default = "default_min_length")]
    pub min_length: u32,

    /// Summaries requested at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// `awful_aj` chat template name.
    #[serde(default = "default_template")]
    pub template: String,

    /// `awful_aj` config file; defaults to its own config directory.
    #[serde(default)]
    pub awful_config: Option<PathBuf>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerKind::default(),
            endpoint: default_hf_endpoint(),
            model: default_model(),
            max_length: default_max_length(),
            min_length: default_min_length(),
            concurrency: default_concurrency(),
            template: default_template(),
            awful_config: None,
        }
    }
}

// ── Telegram / HTTP ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_endpoint")]
    pub endpoint: String,

    /// Bold first line of every delivered message. Empty disables it.
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            endpoint: default_telegram_endpoint(),
            header: default_header(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./state")
}
fn default_search_endpoint() -> String {
    newsapi::DEFAULT_ENDPOINT.to_string()
}
fn default_query() -> String {
    "decentralized AI".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_page_size() -> usize {
    5
}
fn default_sort_by() -> String {
    "publishedAt".to_string()
}
fn default_hf_endpoint() -> String {
    huggingface::DEFAULT_ENDPOINT.to_string()
}
fn default_model() -> String {
    huggingface::DEFAULT_MODEL.to_string()
}
fn default_max_length() -> u32 {
    60
}
fn default_min_length() -> u32 {
    20
}
fn default_concurrency() -> usize {
    4
}
fn default_template() -> String {
    "news_summary".to_string()
}
fn default_telegram_endpoint() -> String {
    telegram::DEFAULT_ENDPOINT.to_string()
}
fn default_header() -> String {
    "Today's Decentralized-AI News".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty file deserializes as unit, not as a mapping.
        let config: AppConfig = if raw.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults unless the caller named the file
    /// explicitly, in which case it is an error.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path, explicit: bool) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let config = Self::from_yaml(&raw).map_err(|e| match e {
                    PipelineError::Config(m) => PipelineError::Config(format!("{}: {m}", path.display())),
                    other => other,
                })?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !explicit => {
                info!(path = %path.display(), "No configuration file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(PipelineError::Config(format!(
                "could not read {}: {e}",
                path.display()
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 || self.search.page_size > MAX_PAGE_SIZE {
            return Err(PipelineError::Config(format!(
                "search.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.summarizer.concurrency == 0 {
            return Err(PipelineError::Config(
                "summarizer.concurrency must be at least 1".to_string(),
            ));
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            return Err(PipelineError::Config(
                "summarizer.min_length must not exceed summarizer.max_length".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "http.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            query: self.search.query.clone(),
            count: self.search.page_size,
            concurrency: self.summarizer.concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.search.query, "decentralized AI");
        assert_eq!(config.search.page_size, 5);
        assert_eq!(config.summarizer.backend, SummarizerKind::HuggingFace);
        assert_eq!(config.summarizer.model, "sshleifer/distilbart-cnn-12-6");
        assert_eq!(config.summarizer.concurrency, 4);
        assert_eq!(config.extraction, ExtractionStrategy::Pattern);
        assert_eq!(config.state_dir, PathBuf::from("./state"));
        assert_eq!(
            config.ingest_settings(),
            IngestSettings {
                query: "decentralized AI".to_string(),
                count: 5,
                concurrency: 4,
            }
        );
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = AppConfig::from_yaml(
            "search:\n  query: rust\nsummarizer:\n  backend: awful_aj\n  template: brief\nextraction: dom\n",
        )
        .unwrap();
        assert_eq!(config.search.query, "rust");
        assert_eq!(config.search.language, "en");
        assert_eq!(config.summarizer.backend, SummarizerKind::AwfulAj);
        assert_eq!(config.summarizer.template, "brief");
        assert_eq!(config.summarizer.max_length, 60);
        assert_eq!(config.extraction, ExtractionStrategy::Dom);
        assert_eq!(config.telegram, TelegramConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_yaml("search:\n  page_size: 0\n"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("summarizer:\n  concurrency: 0\n"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("summarizer:\n  min_length: 90\n"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("extraction: regex\n"),
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(AppConfig::load(&path, false).await.unwrap(), AppConfig::default());
        assert!(matches!(
            AppConfig::load(&path, true).await,
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.yaml");
        std::fs::write(&path, "state_dir: /var/lib/newsbrief\nhttp:\n  timeout_secs: 5\n").unwrap();
        let config = AppConfig::load(&path, true).await.unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/newsbrief"));
        assert_eq!(config.http.timeout_secs, 5);
    }
}
