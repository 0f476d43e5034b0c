//! Text extraction for uploaded documents (PDF and plain text).

use std::path::Path;

use legalease_core::{Error, Result};
use tracing::{debug, info};

use crate::document::{Document, DocumentFormat};

/// Resolve the format of an upload.
///
/// The declared MIME type wins; the file extension is only consulted when
/// the client sent no type or a generic binary one.
pub fn detect_format(filename: &str, content_type: Option<&str>) -> Option<DocumentFormat> {
    match content_type {
        Some(ct) if !ct.is_empty() && !ct.starts_with("application/octet-stream") => {
            DocumentFormat::from_content_type(ct)
        }
        _ => Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(DocumentFormat::from_extension),
    }
}

/// Turn an upload into a [`Document`].
///
/// Unsupported types are ignored: `Ok(None)`, nothing extracted.
pub fn load_upload(
    filename: &str,
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<Option<Document>> {
    match detect_format(filename, content_type) {
        Some(format) => extract_document(filename, format, bytes).map(Some),
        None => {
            debug!(
                "Ignoring upload {} with unsupported type {:?}",
                filename, content_type
            );
            Ok(None)
        }
    }
}

/// Load a document from disk, detecting the format from its extension.
pub fn load_file(path: &Path) -> Result<Option<Document>> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let bytes = std::fs::read(path)?;
    load_upload(filename, None, bytes)
}

/// Extract text from raw bytes of a known format.
pub fn extract_document(filename: &str, format: DocumentFormat, bytes: Vec<u8>) -> Result<Document> {
    let document = match format {
        DocumentFormat::PlainText => {
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::Extraction(format!("{} is not valid UTF-8: {}", filename, e)))?;
            Document::plain_text(filename, text)
        }
        DocumentFormat::Pdf => {
            let pages = extract_pdf_pages(&bytes)?;
            Document::pdf(filename, pages, bytes)
        }
    };

    info!(
        "Extracted {} ({:?}): {} chars{}",
        filename,
        document.format,
        document.char_len(),
        document
            .page_count()
            .map(|n| format!(", {} pages", n))
            .unwrap_or_default()
    );
    Ok(document)
}

/// Extract the text of every page, in page order.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let pdf = lopdf::Document::load_mem(bytes).map_err(|e| Error::Pdf(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in pdf.get_pages().keys() {
        let text = pdf
            .extract_text(&[*page_number])
            .map_err(|e| Error::Pdf(format!("page {}: {}", page_number, e)))?;
        pages.push(text);
    }
    Ok(pages)
}
