//! Best-answer selection across chunks.

use legalease_core::Result;
use legalease_infer::QuestionAnswerer;
use legalease_ingest::Chunker;
use serde::Serialize;
use tracing::debug;

/// Answer text reported when no chunk produced a better candidate.
pub const NO_ANSWER: &str = "No answer found.";

/// An answer together with the chunk it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCandidate {
    pub score: f32,
    pub answer: String,
    /// Text of the supporting chunk; empty for the sentinel.
    pub context: String,
    #[serde(rename = "chunkIndex", skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

impl AnswerCandidate {
    /// The "no answer found" placeholder with score 0.
    pub fn sentinel() -> Self {
        Self {
            score: 0.0,
            answer: NO_ANSWER.to_string(),
            context: String::new(),
            chunk_index: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.chunk_index.is_none()
    }
}

/// Running maximum over answer candidates.
///
/// A candidate replaces the current best only when its score is strictly
/// greater, so the earliest of equally scored candidates is kept.
#[derive(Debug, Clone)]
pub struct AnswerSelector {
    best: AnswerCandidate,
}

impl AnswerSelector {
    pub fn new() -> Self {
        Self {
            best: AnswerCandidate::sentinel(),
        }
    }

    /// Offer a candidate. Returns true if it became the new best.
    pub fn offer(&mut self, candidate: AnswerCandidate) -> bool {
        if candidate.score > self.best.score {
            self.best = candidate;
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> &AnswerCandidate {
        &self.best
    }

    pub fn into_best(self) -> AnswerCandidate {
        self.best
    }
}

impl Default for AnswerSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask `question` against every chunk of `text` and keep the best answer.
///
/// Any QA failure aborts the whole search. Empty text returns the sentinel.
pub fn select_best_answer(
    text: &str,
    question: &str,
    chunker: &Chunker,
    qa: &dyn QuestionAnswerer,
) -> Result<AnswerCandidate> {
    let mut selector = AnswerSelector::new();
    for chunk in chunker.chunks(text) {
        let prediction = qa.answer(question, chunk.text)?;
        debug!(
            "Chunk {} answered with score {:.4}",
            chunk.index, prediction.score
        );
        selector.offer(AnswerCandidate {
            score: prediction.score,
            answer: prediction.answer,
            context: chunk.text.to_string(),
            chunk_index: Some(chunk.index),
        });
    }
    Ok(selector.into_best())
}
