//! LegalEase Analyze: summarization and question answering over chunked
//! documents, and the per-session Q&A history.

pub mod analyzer;
pub mod answer;
pub mod history;
pub mod summarize;

pub use analyzer::Analyzer;
pub use answer::{select_best_answer, AnswerCandidate, AnswerSelector, NO_ANSWER};
pub use history::{HistoryStore, QaHistoryEntry};
pub use summarize::{summarize_text, ChunkSummaries, ChunkSummary, Progress, SummaryResult};
