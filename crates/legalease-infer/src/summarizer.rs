//! Summarization capability.
//!
//! The `Summarizer` trait abstracts over an abstractive summarization model.
//! Implementations:
//! - `HttpSummarizer`: Hugging Face inference API compatible endpoint
//! - `UnconfiguredSummarizer`: fails every call (no backend configured)
//! - `CachedSummarizer`: memoizes another summarizer per chunk

use std::sync::Arc;

use legalease_core::{Error, Result, SummaryLength};

use crate::cache::ResultCache;

/// Trait for summarization backends.
pub trait Summarizer: Send + Sync {
    /// Summarize one chunk of text, bounded by `length`.
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String>;

    /// Check if the backend can serve requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Placeholder used when no summarization backend is configured.
pub struct UnconfiguredSummarizer;

impl Summarizer for UnconfiguredSummarizer {
    fn summarize(&self, _text: &str, _length: SummaryLength) -> Result<String> {
        Err(Error::Inference(
            "no summarization backend configured (set LEGALEASE_SUMMARIZER_URL)".into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Wraps a summarizer with a per-chunk result cache. Errors are not cached.
pub struct CachedSummarizer {
    inner: Arc<dyn Summarizer>,
    cache: ResultCache<String>,
}

impl CachedSummarizer {
    pub fn new(inner: Arc<dyn Summarizer>, capacity: usize) -> Self {
        Self {
            inner,
            cache: ResultCache::with_capacity(capacity),
        }
    }
}

impl Summarizer for CachedSummarizer {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        let key = format!("{}:{}\u{0}{}", length.min, length.max, text);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let summary = self.inner.summarize(text, length)?;
        self.cache.put(key, summary.clone());
        Ok(summary)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
