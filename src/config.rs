//! Configuration loading for the summarization pipeline.
//!
//! A [`Config`] is an immutable snapshot built once at startup and passed by
//! reference to every component. Values are resolved in order (later wins):
//!
//! 1. Compiled defaults
//! 2. JSON config file (default `config.json`; a missing file keeps defaults)
//! 3. Environment variables (`PAPERSMITH_API_KEY`, loaded via dotenvy)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Immutable configuration snapshot for one pipeline run.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for `.json` input records.
    pub input_dir: PathBuf,
    /// Directory receiving processed output records.
    pub output_dir: PathBuf,
    /// Summary cache directory; an empty string disables caching.
    pub cache_dir: String,
    /// API key for the model backends. Usually supplied via
    /// `PAPERSMITH_API_KEY` rather than the config file.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible chat-completions backend.
    pub api_base_url: String,
    /// Chat model identifier.
    pub model_name: String,
    /// Sampling temperature for summary generation.
    pub temperature: f32,
    /// Bounded worker-pool size for the per-file tasks.
    pub max_workers: usize,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks, in characters.
    pub chunk_overlap: usize,
    /// Embedding model identifier.
    pub embedding_model_name: String,
    /// Base URL of the OpenAI-compatible embeddings backend.
    pub embedding_base_url: String,
    /// Reprocess files with existing outputs and force cache lookups to miss.
    pub force_regenerate: bool,
    /// Pause after each successful generation, per worker.
    pub rate_limit_pause_ms: u64,
    /// Timeout applied to every backend HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("papers_raw"),
            output_dir: PathBuf::from("papers_processed"),
            cache_dir: "summary_cache".to_string(),
            api_key: String::new(),
            api_base_url: "https://openrouter.ai/api/v1".to_string(),
            model_name: "meta-llama/llama-3.3-70b-instruct:free".to_string(),
            temperature: 0.3,
            max_workers: 4,
            chunk_size: 1000,
            chunk_overlap: 200,
            embedding_model_name: "text-embedding-3-small".to_string(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            force_regenerate: false,
            rate_limit_pause_ms: 500,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file, then applies env overrides.
    ///
    /// A missing file is not an error; compiled defaults are used so a fresh
    /// checkout can run against a local `.env` alone.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            serde_json::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        dotenvy::dotenv().ok();
        if let Ok(key) = std::env::var("PAPERSMITH_API_KEY") {
            config.api_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    /// Cache root, or `None` when caching is disabled.
    pub fn cache_root(&self) -> Option<&Path> {
        if self.cache_dir.is_empty() {
            None
        } else {
            Some(Path::new(&self.cache_dir))
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be non-zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("cache_dir", &self.cache_dir)
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_workers", &self.max_workers)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("embedding_model_name", &self.embedding_model_name)
            .field("embedding_base_url", &self.embedding_base_url)
            .field("force_regenerate", &self.force_regenerate)
            .field("rate_limit_pause_ms", &self.rate_limit_pause_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
