//! LegalEase Export: PDF outputs.
//!
//! Two artifacts: a rendering of the summary text, and the uploaded PDF with
//! Q&A answers highlighted.

pub mod highlight;
pub mod summary_pdf;
mod winansi;

pub use highlight::{
    highlight_pdf, locate_answers, AnswerLocation, HighlightReport, HIGHLIGHTED_FILE_NAME,
};
pub use summary_pdf::{render_summary_pdf, wrap_text, SUMMARY_FILE_NAME};
