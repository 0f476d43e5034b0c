//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};

/// Default chunk window: 800 characters, 100 shared with the next chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Summary length bounds passed through to the summarization model.
pub const DEFAULT_SUMMARY_MIN: usize = 50;
pub const DEFAULT_SUMMARY_MAX: usize = 150;

/// Paths to all LegalEase data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Local model files (`data/models/`).
    pub models: PathBuf,
    /// Generated PDFs written by the CLI (`data/exports/`).
    pub exports: PathBuf,
    /// Model backend configuration (`data/model-config.json`).
    pub model_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            models: root.join("models"),
            exports: root.join("exports"),
            model_config_file: root.join("model-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.models)?;
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

/// Fixed-size window chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows. Must be smaller than `chunk_size`.
    pub overlap: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be less than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive chunks.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Minimum / maximum summary length, in units defined by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLength {
    pub min: usize,
    pub max: usize,
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self {
            min: DEFAULT_SUMMARY_MIN,
            max: DEFAULT_SUMMARY_MAX,
        }
    }
}

/// Model backend configuration (persisted to model-config.json).
///
/// Every field falls back to an environment variable when the file
/// does not set it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Summarization endpoint (Hugging Face inference API shape).
    #[serde(default)]
    pub summarizer_url: Option<String>,
    /// Extractive question-answering endpoint.
    #[serde(default)]
    pub qa_url: Option<String>,
    /// Bearer token sent to both endpoints.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Directory holding `model.onnx` + `tokenizer.json` for local QA.
    #[serde(default)]
    pub qa_model_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Entries kept in each per-chunk result cache.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_cache_size() -> usize {
    512
}

impl ModelConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: ModelConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Ignoring malformed {}: {}", config_path.display(), e);
                    None
                }
            })
            .unwrap_or_else(|| ModelConfig {
                request_timeout_secs: default_timeout_secs(),
                cache_size: default_cache_size(),
                ..Default::default()
            });

        if config.summarizer_url.is_none() {
            config.summarizer_url = std::env::var("LEGALEASE_SUMMARIZER_URL").ok();
        }
        if config.qa_url.is_none() {
            config.qa_url = std::env::var("LEGALEASE_QA_URL").ok();
        }
        if config.api_token.is_none() {
            config.api_token = std::env::var("LEGALEASE_API_TOKEN").ok();
        }
        if config.qa_model_dir.is_none() {
            config.qa_model_dir = std::env::var("LEGALEASE_QA_MODEL_DIR").ok().map(PathBuf::from);
        }

        config
    }
}

/// Top-level LegalEase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEaseConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub chunking: ChunkingConfig,
    pub summary_length: SummaryLength,
    pub models: ModelConfig,
}

impl LegalEaseConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let data_paths = DataPaths::new(data_dir)?;
        let mut models = ModelConfig::load(&data_paths.model_config_file);
        if models.qa_model_dir.is_none() {
            let bundled = data_paths.models.join("qa");
            if bundled.join("model.onnx").exists() {
                models.qa_model_dir = Some(bundled);
            }
        }

        Ok(Self {
            port,
            data_paths,
            chunking: ChunkingConfig::default(),
            summary_length: SummaryLength::default(),
            models,
        })
    }
}
