//! LegalEase Infer: summarization and extractive QA capabilities.
//!
//! Provides the `Summarizer` and `QuestionAnswerer` traits. Backends are
//! chosen from `ModelConfig`: an HTTP endpoint when a URL is configured,
//! the local ONNX QA model when the `onnx` feature is enabled and model
//! files are present, otherwise an unconfigured placeholder that fails.

pub mod cache;
pub mod http;
pub mod onnx_qa;
pub mod qa;
pub mod summarizer;

pub use cache::ResultCache;
pub use http::{HttpQuestionAnswerer, HttpSummarizer};
pub use qa::{
    decode_best_span, CachedQuestionAnswerer, QaPrediction, QuestionAnswerer,
    UnconfiguredQuestionAnswerer,
};
pub use summarizer::{CachedSummarizer, Summarizer, UnconfiguredSummarizer};

#[cfg(feature = "onnx")]
pub use onnx_qa::OnnxQuestionAnswerer;

use std::sync::Arc;
use std::time::Duration;

use legalease_core::ModelConfig;

/// The model capabilities shared by every request.
#[derive(Clone)]
pub struct ModelBackends {
    pub summarizer: Arc<dyn Summarizer>,
    pub qa: Arc<dyn QuestionAnswerer>,
}

impl ModelBackends {
    /// Build the best available backends for `config`.
    ///
    /// Constructs blocking HTTP clients, so call it from a blocking context.
    pub fn from_config(config: &ModelConfig) -> Self {
        let summarizer = create_summarizer(config);
        let qa = create_question_answerer(config);
        Self {
            summarizer: Arc::new(CachedSummarizer::new(summarizer, config.cache_size)),
            qa: Arc::new(CachedQuestionAnswerer::new(qa, config.cache_size)),
        }
    }
}

fn timeout(config: &ModelConfig) -> Duration {
    Duration::from_secs(config.request_timeout_secs)
}

/// Create the summarizer for `config`, falling back to the unconfigured one.
pub fn create_summarizer(config: &ModelConfig) -> Arc<dyn Summarizer> {
    if let Some(url) = &config.summarizer_url {
        match HttpSummarizer::new(url, config.api_token.clone(), timeout(config)) {
            Ok(s) => {
                tracing::info!("Using HTTP summarizer at {}", url);
                return Arc::new(s);
            }
            Err(e) => tracing::warn!("HTTP summarizer unavailable: {}", e),
        }
    }
    tracing::warn!("No summarization backend configured. Summaries will fail.");
    Arc::new(UnconfiguredSummarizer)
}

/// Create the QA backend for `config`.
///
/// Tries ONNX first (if feature enabled and model files present), then the
/// HTTP endpoint, then falls back to the unconfigured one.
pub fn create_question_answerer(config: &ModelConfig) -> Arc<dyn QuestionAnswerer> {
    #[cfg(feature = "onnx")]
    {
        if let Some(dir) = &config.qa_model_dir {
            match OnnxQuestionAnswerer::load(dir) {
                Ok(qa) => {
                    tracing::info!("Using ONNX QA model from {}", dir.display());
                    return Arc::new(qa);
                }
                Err(e) => tracing::warn!("ONNX QA unavailable: {}", e),
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        if config.qa_model_dir.is_some() {
            tracing::info!("ONNX feature disabled. Ignoring local QA model directory.");
        }
    }

    if let Some(url) = &config.qa_url {
        match HttpQuestionAnswerer::new(url, config.api_token.clone(), timeout(config)) {
            Ok(qa) => {
                tracing::info!("Using HTTP QA at {}", url);
                return Arc::new(qa);
            }
            Err(e) => tracing::warn!("HTTP QA unavailable: {}", e),
        }
    }

    tracing::warn!("No question-answering backend configured. Questions will fail.");
    Arc::new(UnconfiguredQuestionAnswerer)
}
