//! Fixed-size sliding-window chunking.
//!
//! Chunk `k` spans characters `[k·stride, min(k·stride + size, len))` where
//! `stride = size − overlap`. Offsets count Unicode scalar values, not bytes,
//! so a window never splits a character.

use legalease_core::{ChunkingConfig, Result};

/// A window over the document text. Borrowed from the text it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    /// Inclusive start, in characters.
    pub start: usize,
    /// Exclusive end, in characters.
    pub end: usize,
    pub text: &'a str,
}

/// Splits text into overlapping fixed-size windows.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Lazily iterate over the windows of `text`.
    ///
    /// The iterator holds no state beyond its position, so calling this
    /// again with the same text yields the same sequence. Nothing is
    /// allocated; each window is found by walking forward from the last one.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            len: text.chars().count(),
            size: self.config.chunk_size,
            stride: self.config.stride(),
            next: 0,
            start_byte: 0,
        }
    }

    /// Number of windows produced for a text of `len` characters.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.config.stride())
    }

    /// Progress denominator: `floor(len / stride) + 1`.
    ///
    /// Overestimates `chunk_count` by one when `len` is a multiple of the
    /// stride, so progress fractions must be clamped to 1.0.
    pub fn progress_total(&self, len: usize) -> usize {
        len / self.config.stride() + 1
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

/// Iterator returned by [`Chunker::chunks`].
pub struct Chunks<'a> {
    text: &'a str,
    len: usize,
    size: usize,
    stride: usize,
    next: usize,
    /// Byte offset of the next window's first character.
    start_byte: usize,
}

/// Byte offset of the character `n` chars into `s`, or `s.len()` past the end.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

impl<'a> Chunks<'a> {
    /// Length of the chunked text in characters.
    pub fn text_len(&self) -> usize {
        self.len
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let start = self.next * self.stride;
        if start >= self.len {
            return None;
        }
        let end = (start + self.size).min(self.len);
        let rest = &self.text[self.start_byte..];
        let chunk = Chunk {
            index: self.next,
            start,
            end,
            text: &rest[..byte_offset(rest, end - start)],
        };
        self.start_byte += byte_offset(rest, self.stride);
        self.next += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let produced = self.next * self.stride;
        let remaining = self.len.saturating_sub(produced).div_ceil(self.stride);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingConfig {
            chunk_size: size,
            overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_empty_text_gives_no_chunks() {
        let c = Chunker::default();
        assert_eq!(c.chunks("").count(), 0);
        assert_eq!(c.chunk_count(0), 0);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let c = Chunker::default();
        let chunks: Vec<_> = c.chunks("This Agreement is made today.").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, 29);
        assert_eq!(chunks[0].text, "This Agreement is made today.");
    }

    #[test]
    fn test_repeated_sentence_scenario() {
        let text = "The cat sat. ".repeat(100);
        assert_eq!(text.len(), 1300);

        let c = Chunker::default();
        let spans: Vec<_> = c.chunks(&text).map(|ch| (ch.start, ch.end)).collect();
        // The second window would reach 1500 and is clamped to the text end.
        assert_eq!(spans, vec![(0, 800), (700, 1300)]);
        assert_eq!(c.progress_total(text.len()), 2);
    }

    #[test]
    fn test_windows_overlap_by_configured_amount() {
        let c = chunker(4, 2);
        let chunks: Vec<_> = c.chunks("abcdefgh").collect();
        let texts: Vec<_> = chunks.iter().map(|ch| ch.text).collect();
        assert_eq!(texts, vec!["abcd", "cdef", "efgh", "gh"]);
    }

    #[test]
    fn test_coverage_and_count() {
        for (size, overlap) in [(800, 100), (5, 0), (7, 3), (10, 9)] {
            let c = chunker(size, overlap);
            for len in [1usize, 4, 5, 6, 13, 699, 700, 701, 2101] {
                let text = "x".repeat(len);
                let chunks: Vec<_> = c.chunks(&text).collect();

                let mut covered = vec![false; len];
                for ch in &chunks {
                    assert!(ch.start < ch.end && ch.end <= len);
                    covered[ch.start..ch.end].iter_mut().for_each(|b| *b = true);
                }
                assert!(covered.iter().all(|b| *b), "gap for len={len}");
                assert_eq!(chunks.len(), c.chunk_count(len));

                let stride = size - overlap;
                if len % stride != 0 {
                    assert_eq!(chunks.len(), c.progress_total(len));
                } else {
                    assert_eq!(chunks.len() + 1, c.progress_total(len));
                }
            }
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Section 4.2 Indemnification. ".repeat(60);
        let c = Chunker::default();
        let first: Vec<_> = c.chunks(&text).collect();
        let second: Vec<_> = c.chunks(&text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let c = chunker(3, 1);
        let chunks: Vec<_> = c.chunks("§§€€éé").map(|ch| ch.text).collect();
        assert_eq!(chunks, vec!["§§€", "€€é", "éé"]);
    }

    #[test]
    fn test_multibyte_windows_match_char_offsets() {
        let text = "Clause §4 — “Tenant’s” deposit: €1 200, payable ½ in advance. ".repeat(9);
        let chars: Vec<char> = text.chars().collect();
        for (size, overlap) in [(7, 2), (13, 0), (40, 39)] {
            let c = chunker(size, overlap);
            let chunks: Vec<_> = c.chunks(&text).collect();
            assert_eq!(chunks.len(), c.chunk_count(chars.len()));
            for ch in chunks {
                let expected: String = chars[ch.start..ch.end].iter().collect();
                assert_eq!(ch.text, expected);
            }
        }
    }

    #[test]
    fn test_size_hint_is_exact() {
        let c = chunker(4, 1);
        let mut it = c.chunks("abcdefghij");
        // Starts at 0, 3, 6, 9.
        assert_eq!(it.len(), 4);
        it.next();
        assert_eq!(it.len(), 3);
    }
}
