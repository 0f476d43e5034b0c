//! Analyzer runs the user actions against a loaded document.

use legalease_core::{ChunkingConfig, Result, SummaryLength};
use legalease_infer::ModelBackends;
use legalease_ingest::{Chunker, Document};
use tracing::info;

use crate::answer::{select_best_answer, AnswerCandidate};
use crate::history::{HistoryStore, QaHistoryEntry};
use crate::summarize::{summarize_text, Progress, SummaryResult};

/// Binds the chunking parameters and model backends used by every action.
///
/// Cheap to clone: backends are shared.
#[derive(Clone)]
pub struct Analyzer {
    chunker: Chunker,
    summary_length: SummaryLength,
    backends: ModelBackends,
}

impl Analyzer {
    pub fn new(
        chunking: ChunkingConfig,
        summary_length: SummaryLength,
        backends: ModelBackends,
    ) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(chunking)?,
            summary_length,
            backends,
        })
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn backends(&self) -> &ModelBackends {
        &self.backends
    }

    /// Action: generate summary.
    pub fn summarize(
        &self,
        document: &Document,
        on_progress: impl FnMut(Progress),
    ) -> Result<SummaryResult> {
        let result = summarize_text(
            &document.text,
            &self.chunker,
            self.backends.summarizer.as_ref(),
            self.summary_length,
            on_progress,
        )?;
        info!(
            "Summarized {} in {} chunks ({} chars)",
            document.filename,
            result.chunks,
            result.text.len()
        );
        Ok(result)
    }

    /// Find the best answer without recording it.
    pub fn answer(&self, document: &Document, question: &str) -> Result<AnswerCandidate> {
        select_best_answer(
            &document.text,
            question,
            &self.chunker,
            self.backends.qa.as_ref(),
        )
    }

    /// Action: get answer. The result is appended to `history`.
    pub fn ask(
        &self,
        document: &Document,
        question: &str,
        history: &mut HistoryStore,
    ) -> Result<QaHistoryEntry> {
        let best = self.answer(document, question)?;
        info!(
            "Answered {:?} with score {:.4}{}",
            question,
            best.score,
            if best.is_sentinel() { " (no answer)" } else { "" }
        );
        let entry = QaHistoryEntry::new(question, best);
        history.append(entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalease_infer::{QaPrediction, QuestionAnswerer, Summarizer};
    use std::sync::Arc;

    /// Summarizes a chunk as its character count.
    struct ChunkLength;

    impl Summarizer for ChunkLength {
        fn summarize(&self, text: &str, _length: SummaryLength) -> Result<String> {
            Ok(format!("[{}]", text.chars().count()))
        }
    }

    /// Answers with the word after "rent is"; weak score elsewhere.
    struct KeywordQa;

    impl QuestionAnswerer for KeywordQa {
        fn answer(&self, _question: &str, context: &str) -> Result<QaPrediction> {
            match context.find("rent is ") {
                Some(pos) => {
                    let start = pos + "rent is ".len();
                    let end = context[start..]
                        .find(' ')
                        .map(|i| start + i)
                        .unwrap_or(context.len());
                    Ok(QaPrediction {
                        answer: context[start..end].to_string(),
                        score: 0.8,
                        span: start..end,
                    })
                }
                None => Ok(QaPrediction {
                    answer: "nothing".into(),
                    score: 0.1,
                    span: 0..0,
                }),
            }
        }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(
            ChunkingConfig::default(),
            SummaryLength::default(),
            ModelBackends {
                summarizer: Arc::new(ChunkLength),
                qa: Arc::new(KeywordQa),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_ask_appends_to_history() {
        let mut text = "Filler clause. ".repeat(100);
        text.push_str("The monthly rent is $1,200 payable in advance.");
        let doc = Document::plain_text("lease.txt", text);

        let mut history = HistoryStore::new();
        let a = analyzer();
        let entry = a.ask(&doc, "What is the rent?", &mut history).unwrap();
        assert_eq!(entry.answer, "$1,200");
        assert!(entry.context.contains("rent is $1,200"));

        a.ask(&doc, "What is the rent again?", &mut history).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.list()[0].question, "What is the rent?");
    }

    #[test]
    fn test_summarize_document() {
        let doc = Document::plain_text("nda.txt", "The cat sat. ".repeat(100));
        let mut updates = 0;
        let result = analyzer().summarize(&doc, |_| updates += 1).unwrap();
        assert_eq!(result.chunks, 2);
        assert_eq!(updates, 2);
        assert_eq!(result.text, "[800] [600] ");
    }

    #[test]
    fn test_rejects_invalid_chunking() {
        let backends = ModelBackends {
            summarizer: Arc::new(ChunkLength),
            qa: Arc::new(KeywordQa),
        };
        let bad = ChunkingConfig {
            chunk_size: 10,
            overlap: 10,
        };
        assert!(Analyzer::new(bad, SummaryLength::default(), backends).is_err());
    }
}
