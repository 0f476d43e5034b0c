//! The loaded document and its preview.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Characters shown when previewing a plain-text document.
pub const PREVIEW_CHARS: usize = 5000;

/// Source format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    #[serde(rename = "text")]
    PlainText,
}

impl DocumentFormat {
    /// Detect format from an upload's MIME type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
        }
    }
}

/// A document after text extraction. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub format: DocumentFormat,
    /// Full text; for PDFs, the page texts concatenated in order.
    pub text: String,
    /// Per-page text (PDF only).
    pub pages: Option<Vec<String>>,
    /// SHA-256 of the extracted text, hex encoded.
    pub content_hash: String,
    /// Original file bytes, kept for PDFs so they can be re-annotated.
    pub pdf_bytes: Option<Vec<u8>>,
}

impl Document {
    pub fn plain_text(filename: impl Into<String>, text: String) -> Self {
        Self {
            filename: filename.into(),
            format: DocumentFormat::PlainText,
            content_hash: content_hash(&text),
            text,
            pages: None,
            pdf_bytes: None,
        }
    }

    pub fn pdf(filename: impl Into<String>, pages: Vec<String>, pdf_bytes: Vec<u8>) -> Self {
        let text = pages.concat();
        Self {
            filename: filename.into(),
            format: DocumentFormat::Pdf,
            content_hash: content_hash(&text),
            text,
            pages: Some(pages),
            pdf_bytes: Some(pdf_bytes),
        }
    }

    /// Length of the full text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn page_count(&self) -> Option<usize> {
        self.pages.as_ref().map(Vec::len)
    }

    pub fn preview(&self) -> Preview {
        match &self.pages {
            Some(pages) => Preview::Pages {
                pages: pages
                    .iter()
                    .enumerate()
                    .map(|(i, text)| PagePreview {
                        number: i + 1,
                        text: text.clone(),
                    })
                    .collect(),
            },
            None => {
                let text: String = self.text.chars().take(PREVIEW_CHARS).collect();
                Preview::Text {
                    truncated: self.char_len() > PREVIEW_CHARS,
                    text,
                }
            }
        }
    }

    pub fn metadata(&self) -> DocumentInfo {
        DocumentInfo {
            filename: self.filename.clone(),
            format: self.format,
            chars: self.char_len(),
            pages: self.page_count(),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// Summary of a loaded document for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub format: DocumentFormat,
    pub chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(rename = "contentHash")]
    pub content_hash: String,
}

/// What the preview pane shows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Preview {
    Pages { pages: Vec<PagePreview> },
    Text { text: String, truncated: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct PagePreview {
    pub number: usize,
    pub text: String,
}

/// Compute SHA-256 content hash.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
