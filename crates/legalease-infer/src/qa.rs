//! Extractive question-answering capability.

use std::ops::Range;
use std::sync::Arc;

use legalease_core::{Error, Result};
use serde::Serialize;

use crate::cache::ResultCache;

/// Longest answer span considered by local span decoding, in tokens.
pub const MAX_ANSWER_TOKENS: usize = 15;

/// A single answer extracted from one context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaPrediction {
    pub answer: String,
    /// Confidence in [0, 1]; higher is better.
    pub score: f32,
    /// Byte range of `answer` inside the context.
    pub span: Range<usize>,
}

/// Trait for extractive QA backends.
pub trait QuestionAnswerer: Send + Sync {
    /// Select the span of `context` that best answers `question`.
    fn answer(&self, question: &str, context: &str) -> Result<QaPrediction>;

    fn is_available(&self) -> bool {
        true
    }
}

/// Placeholder used when no QA backend is configured.
pub struct UnconfiguredQuestionAnswerer;

impl QuestionAnswerer for UnconfiguredQuestionAnswerer {
    fn answer(&self, _question: &str, _context: &str) -> Result<QaPrediction> {
        Err(Error::Inference(
            "no question-answering backend configured (set LEGALEASE_QA_URL or LEGALEASE_QA_MODEL_DIR)"
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Wraps a QA backend with a per-(question, chunk) cache.
pub struct CachedQuestionAnswerer {
    inner: Arc<dyn QuestionAnswerer>,
    cache: ResultCache<QaPrediction>,
}

impl CachedQuestionAnswerer {
    pub fn new(inner: Arc<dyn QuestionAnswerer>, capacity: usize) -> Self {
        Self {
            inner,
            cache: ResultCache::with_capacity(capacity),
        }
    }
}

impl QuestionAnswerer for CachedQuestionAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<QaPrediction> {
        let key = format!("{}\u{0}{}", question, context);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let prediction = self.inner.answer(question, context)?;
        self.cache.put(key, prediction.clone());
        Ok(prediction)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// Pick the best answer span from start/end logits.
///
/// Only tokens flagged in `is_context` may start or end a span. Start and end
/// probabilities are softmaxed over the context tokens; a span's score is
/// `p(start) · p(end)` with `start ≤ end < start + max_tokens`.
/// Returns `(start_token, end_token, score)`, or `None` when no token is context.
pub fn decode_best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    is_context: &[bool],
    max_tokens: usize,
) -> Option<(usize, usize, f32)> {
    let n = start_logits.len().min(end_logits.len()).min(is_context.len());
    let start_probs = masked_softmax(&start_logits[..n], &is_context[..n])?;
    let end_probs = masked_softmax(&end_logits[..n], &is_context[..n])?;

    let mut best: Option<(usize, usize, f32)> = None;
    for s in (0..n).filter(|&i| is_context[i]) {
        let limit = (s + max_tokens).min(n);
        for e in (s..limit).filter(|&i| is_context[i]) {
            let score = start_probs[s] * end_probs[e];
            if best.map_or(true, |(_, _, b)| score > b) {
                best = Some((s, e, score));
            }
        }
    }
    best
}

fn masked_softmax(logits: &[f32], mask: &[bool]) -> Option<Vec<f32>> {
    let max = logits
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .map(|(l, _)| *l)
        .fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return None;
    }
    let exps: Vec<f32> = logits
        .iter()
        .zip(mask)
        .map(|(l, m)| if *m { (l - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / sum).collect())
}

/// Convert a character offset into a byte offset of `text`, clamped to its end.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_picks_highest_joint_span() {
        // tokens: [CLS] q [SEP] c0 c1 c2 [SEP]
        let is_context = [false, false, false, true, true, true, false];
        let start = [9.0, 9.0, 0.0, 0.1, 3.0, 0.2, 0.0];
        let end = [9.0, 0.0, 0.0, 0.1, 0.5, 4.0, 9.0];
        let (s, e, score) = decode_best_span(&start, &end, &is_context, MAX_ANSWER_TOKENS).unwrap();
        assert_eq!((s, e), (4, 5));
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_decode_never_ends_before_start() {
        let is_context = [true, true, true];
        let start = [0.0, 0.0, 10.0];
        let end = [10.0, 0.0, 0.0];
        let (s, e, _) = decode_best_span(&start, &end, &is_context, MAX_ANSWER_TOKENS).unwrap();
        assert!(s <= e);
    }

    #[test]
    fn test_decode_respects_max_length() {
        let is_context = [true; 6];
        let start = [5.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let end = [0.0, 0.0, 0.0, 0.0, 0.0, 5.0];
        let (s, e, _) = decode_best_span(&start, &end, &is_context, 2).unwrap();
        assert!(e - s < 2);
    }

    #[test]
    fn test_decode_without_context_is_none() {
        assert!(decode_best_span(&[1.0], &[1.0], &[false], MAX_ANSWER_TOKENS).is_none());
    }

    #[test]
    fn test_char_to_byte() {
        let text = "§1 Term";
        assert_eq!(char_to_byte(text, 0), 0);
        assert_eq!(char_to_byte(text, 1), 2);
        assert_eq!(char_to_byte(text, 100), text.len());
    }

    #[test]
    fn test_unconfigured_fails() {
        let qa = UnconfiguredQuestionAnswerer;
        assert!(!qa.is_available());
        assert!(qa.answer("Who?", "Nobody.").is_err());
    }
}
