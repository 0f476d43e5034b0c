//! Session Q&A history. Append-only; insertion order is display order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::answer::AnswerCandidate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaHistoryEntry {
    pub question: String,
    pub answer: String,
    pub context: String,
    pub score: f32,
    #[serde(rename = "askedAt")]
    pub asked_at: DateTime<Utc>,
}

impl QaHistoryEntry {
    pub fn new(question: impl Into<String>, candidate: AnswerCandidate) -> Self {
        Self {
            question: question.into(),
            answer: candidate.answer,
            context: candidate.context,
            score: candidate.score,
            asked_at: Utc::now(),
        }
    }
}

/// Ordered log of answered questions for one session.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<QaHistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: QaHistoryEntry) {
        self.entries.push(entry);
    }

    pub fn list(&self) -> &[QaHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answer strings in insertion order.
    pub fn answers(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.answer.as_str()).collect()
    }
}
