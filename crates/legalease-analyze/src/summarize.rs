//! Chunked summarization: summarize each window, join in order.

use legalease_core::{Result, SummaryLength};
use legalease_infer::Summarizer;
use legalease_ingest::{Chunker, Chunks};
use serde::Serialize;
use tracing::debug;

/// Concatenated per-chunk summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryResult {
    /// Each chunk summary followed by a single space, trailing space kept.
    pub text: String,
    pub chunks: usize,
}

/// Progress after a chunk has been summarized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub processed: usize,
    /// `floor(len / stride) + 1`; may exceed the real chunk count by one.
    pub total: usize,
    /// `processed / total`, clamped to 1.0.
    pub fraction: f32,
}

impl Progress {
    fn new(processed: usize, total: usize) -> Self {
        Self {
            processed,
            total,
            fraction: (processed as f32 / total as f32).min(1.0),
        }
    }
}

/// One chunk's summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSummary {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub summary: String,
}

/// Lazy sequence of per-chunk summaries, in chunk order.
///
/// Each `next` runs one model call. The first error is yielded and ends the
/// sequence.
pub struct ChunkSummaries<'a> {
    chunks: Chunks<'a>,
    summarizer: &'a dyn Summarizer,
    length: SummaryLength,
    failed: bool,
}

impl<'a> ChunkSummaries<'a> {
    pub fn new(
        text: &'a str,
        chunker: &Chunker,
        summarizer: &'a dyn Summarizer,
        length: SummaryLength,
    ) -> Self {
        Self {
            chunks: chunker.chunks(text),
            summarizer,
            length,
            failed: false,
        }
    }
}

impl Iterator for ChunkSummaries<'_> {
    type Item = Result<ChunkSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let chunk = self.chunks.next()?;
        match self.summarizer.summarize(chunk.text, self.length) {
            Ok(summary) => {
                debug!(
                    "Chunk {} [{}..{}) summarized ({} chars)",
                    chunk.index,
                    chunk.start,
                    chunk.end,
                    summary.len()
                );
                Some(Ok(ChunkSummary {
                    index: chunk.index,
                    start: chunk.start,
                    end: chunk.end,
                    summary,
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Summarize `text` chunk by chunk, reporting progress after each chunk.
///
/// Any summarizer failure aborts the whole run; no partial result is
/// returned. Empty text yields an empty summary without calling the model.
pub fn summarize_text(
    text: &str,
    chunker: &Chunker,
    summarizer: &dyn Summarizer,
    length: SummaryLength,
    mut on_progress: impl FnMut(Progress),
) -> Result<SummaryResult> {
    let summaries = ChunkSummaries::new(text, chunker, summarizer, length);
    let total = chunker.progress_total(summaries.chunks.text_len());

    let mut result = SummaryResult::default();
    for item in summaries {
        let chunk = item?;
        result.text.push_str(&chunk.summary);
        result.text.push(' ');
        result.chunks += 1;
        on_progress(Progress::new(result.chunks, total));
    }
    Ok(result)
}
