//! LegalEase Ingest: document loading, text extraction, fixed-window chunking.

pub mod chunking;
pub mod document;
pub mod file;

pub use chunking::{Chunk, Chunker, Chunks};
pub use document::{Document, DocumentFormat, DocumentInfo, PagePreview, Preview};
pub use file::{extract_document, load_file, load_upload};
