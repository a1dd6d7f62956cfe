//! Configuration loaded from `pagewise.toml`
//!
//! Every field has a default, so an empty file (or no file at all) is valid.
//!
//! ```toml
//! [chunking]
//! max_chunk_size = 1000
//! overlap_size = 200
//! overlap_word_count = 20
//!
//! [retrieval]
//! top_k = 5
//!
//! [llm]
//! model = "gpt-3.5-turbo"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()
    }
}

/// Segmentation parameters. Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Character budget per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Characters shared between consecutive fixed windows
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
    /// Trailing words carried into the next paragraph chunk
    #[serde(default = "default_overlap_word_count")]
    pub overlap_word_count: usize,
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_overlap_size() -> usize {
    200
}

fn default_overlap_word_count() -> usize {
    20
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
            overlap_word_count: default_overlap_word_count(),
        }
    }
}

impl ChunkConfig {
    /// Reject budgets that would produce a zero or negative window stride.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "max_chunk_size must be greater than zero".into(),
            ));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap_size ({}) must be smaller than max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of two consecutive fixed windows.
    ///
    /// Never zero, even for configs that skipped validation.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.max_chunk_size.saturating_sub(self.overlap_size).max(1)
    }
}

/// Candidate multiplier applied when a document filter is active.
pub const OVERFETCH_FACTOR: usize = 3;

/// Retrieval parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer step
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Over-fetch multiplier used with a document filter
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_overfetch_factor() -> usize {
    OVERFETCH_FACTOR
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            overfetch_factor: default_overfetch_factor(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.overfetch_factor == 0 {
            return Err(Error::InvalidConfig(
                "overfetch_factor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name, e.g. `all-MiniLM-L6-v2` or `bge-large-en-v1.5`
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Print a progress bar while the model downloads
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".into()
}

fn default_true() -> bool {
    true
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            show_download_progress: true,
        }
    }
}

/// Chat-completions provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where the vector index snapshot lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("pagewise_index.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}
