//! Blocking user actions shared by the HTTP routes and the CLI.

use std::path::Path;

use legalease_analyze::{Analyzer, HistoryStore};
use legalease_core::{Error, Result};
use legalease_export::{highlight_pdf, HighlightReport};
use legalease_ingest::{load_file, Document};
use tracing::info;

pub const PDF_ONLY_INFO: &str = "PDF highlighting works only with PDF files.";
pub const NO_QA_INFO: &str = "No Q&A found to highlight in PDF.";

/// Result of a highlight export request.
#[derive(Debug)]
pub enum HighlightOutcome {
    Pdf {
        bytes: Vec<u8>,
        report: HighlightReport,
    },
    /// A precondition was not met; nothing was produced.
    Info(&'static str),
}

/// Load a supported document from disk.
pub fn open_document(path: &Path) -> Result<Document> {
    load_file(path)?.ok_or_else(|| {
        Error::Extraction(format!(
            "unsupported file type: {} (expected .pdf or .txt)",
            path.display()
        ))
    })
}

/// Highlight every answer in `history` on `document`.
pub fn highlight_history(document: &Document, history: &HistoryStore) -> Result<HighlightOutcome> {
    let Some(pdf_bytes) = document.pdf_bytes.as_deref() else {
        return Ok(HighlightOutcome::Info(PDF_ONLY_INFO));
    };
    if history.is_empty() {
        return Ok(HighlightOutcome::Info(NO_QA_INFO));
    }
    let (bytes, report) = highlight_pdf(pdf_bytes, &history.answers())?;
    Ok(HighlightOutcome::Pdf { bytes, report })
}

/// Answer `questions` in order, recording each in a fresh history.
///
/// Blank questions are skipped.
pub fn ask_all(analyzer: &Analyzer, document: &Document, questions: &[String]) -> Result<HistoryStore> {
    let mut history = HistoryStore::new();
    for question in questions {
        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        analyzer.ask(document, question, &mut history)?;
    }
    info!("Answered {} questions on {}", history.len(), document.filename);
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalease_analyze::{AnswerCandidate, QaHistoryEntry};

    fn history_with(answer: &str) -> HistoryStore {
        let mut history = HistoryStore::new();
        history.append(QaHistoryEntry::new(
            "What is the term?",
            AnswerCandidate {
                score: 0.9,
                answer: answer.to_string(),
                context: String::new(),
                chunk_index: Some(0),
            },
        ));
        history
    }

    #[test]
    fn test_text_documents_cannot_be_highlighted() {
        let doc = Document::plain_text("lease.txt", "Term: one year.".into());
        let outcome = highlight_history(&doc, &history_with("one year")).unwrap();
        assert!(matches!(outcome, HighlightOutcome::Info(PDF_ONLY_INFO)));
    }

    #[test]
    fn test_empty_history_is_reported() {
        let pdf = legalease_export::render_summary_pdf("Term: one year.").unwrap();
        let doc = Document::pdf("lease.pdf", vec!["Term: one year.".into()], pdf);
        let outcome = highlight_history(&doc, &HistoryStore::new()).unwrap();
        assert!(matches!(outcome, HighlightOutcome::Info(NO_QA_INFO)));
    }

    #[test]
    fn test_history_answers_are_highlighted() {
        let pdf = legalease_export::render_summary_pdf("Term: one year.").unwrap();
        let doc = Document::pdf("lease.pdf", vec!["Term: one year.".into()], pdf);
        match highlight_history(&doc, &history_with("one year")).unwrap() {
            HighlightOutcome::Pdf { bytes, report } => {
                assert!(bytes.starts_with(b"%PDF"));
                assert_eq!(report.per_answer, vec![1]);
            }
            other => panic!("expected a PDF, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.docx");
        std::fs::write(&path, b"PK").unwrap();
        assert!(matches!(open_document(&path), Err(Error::Extraction(_))));
    }
}
