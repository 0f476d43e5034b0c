//! Answer highlighting: find answer strings on each page and add Highlight
//! annotations over them.
//!
//! Positions come from walking the page content stream and tracking the text
//! matrix. The text runs of a page are joined into one string, with a space
//! where a new baseline starts, and answers are searched in that string, so a
//! match may cover several runs or lines. Each match becomes one annotation
//! with one quad per run it touches. Glyph widths are not read from the font;
//! every glyph is assumed to be half an em wide, so rectangles are approximate.

use legalease_core::{Error, Result};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::winansi;

pub const HIGHLIGHTED_FILE_NAME: &str = "highlighted_QA.pdf";

const AVG_GLYPH_WIDTH: f32 = 0.5;
/// TJ adjustments beyond this many thousandths of an em read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// One place an answer occurs in the extracted page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerLocation {
    #[serde(rename = "answerIndex")]
    pub answer_index: usize,
    /// Zero-based page index.
    pub page: usize,
    /// Byte offset into that page's text.
    pub offset: usize,
}

/// Every non-overlapping occurrence of each answer on each page.
///
/// Empty answers are skipped. Matching is exact and case-sensitive.
pub fn locate_answers<S: AsRef<str>>(pages: &[S], answers: &[&str]) -> Vec<AnswerLocation> {
    let mut found = Vec::new();
    for (page, text) in pages.iter().enumerate() {
        let text = text.as_ref();
        for (answer_index, answer) in answers.iter().copied().enumerate() {
            if answer.is_empty() {
                continue;
            }
            found.extend(text.match_indices(answer).map(|(offset, _)| AnswerLocation {
                answer_index,
                page,
                offset,
            }));
        }
    }
    found
}

/// What `highlight_pdf` marked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HighlightReport {
    /// One per match, however many runs the match covers.
    pub annotations: usize,
    /// Annotation count per answer, aligned with the input slice.
    #[serde(rename = "perAnswer")]
    pub per_answer: Vec<usize>,
    #[serde(rename = "pagesTouched")]
    pub pages_touched: usize,
}

/// A text-showing operation with its estimated baseline origin.
#[derive(Debug, Clone)]
struct TextRun {
    text: String,
    x: f32,
    y: f32,
    /// Effective font size after the text matrix scale.
    size: f32,
}

/// The runs of one page joined into a searchable string.
#[derive(Debug, Default)]
struct PageText {
    text: String,
    /// For each char of `text`: its byte offset and the `(run, glyph)` that
    /// showed it. Spaces inserted between lines have no glyph.
    chars: Vec<(usize, Option<(usize, usize)>)>,
}

impl PageText {
    fn new(runs: &[TextRun]) -> Self {
        let mut page = PageText::default();
        for (run_index, run) in runs.iter().enumerate() {
            let new_line = run_index > 0 && (runs[run_index - 1].y - run.y).abs() > 0.01;
            if new_line
                && !page.text.ends_with(char::is_whitespace)
                && !run.text.starts_with(char::is_whitespace)
            {
                page.chars.push((page.text.len(), None));
                page.text.push(' ');
            }
            for (glyph, c) in run.text.chars().enumerate() {
                page.chars.push((page.text.len(), Some((run_index, glyph))));
                page.text.push(c);
            }
        }
        page
    }

    /// `(run, first glyph, glyph count)` for each run the `len` bytes at
    /// `offset` cover, in page order.
    fn segments(&self, offset: usize, len: usize) -> Vec<(usize, usize, usize)> {
        let first = self.chars.partition_point(|(byte, _)| *byte < offset);
        let end = offset + len;
        let mut segments: Vec<(usize, usize, usize)> = Vec::new();
        for (_, shown) in self.chars[first..].iter().take_while(|(byte, _)| *byte < end) {
            let Some((run, glyph)) = *shown else {
                continue;
            };
            match segments.last_mut() {
                Some((last_run, start, count)) if *last_run == run && *start + *count == glyph => {
                    *count += 1;
                }
                _ => segments.push((run, glyph, 1)),
            }
        }
        segments
    }
}

/// A page ready for matching.
struct PageLayout {
    number: u32,
    id: ObjectId,
    runs: Vec<TextRun>,
    text: PageText,
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    font_size: f32,
    leading: f32,
    scale: f32,
    line_x: f32,
    line_y: f32,
    x: f32,
    y: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            leading: 0.0,
            scale: 1.0,
            line_x: 0.0,
            line_y: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.scale = 1.0;
        self.line_x = 0.0;
        self.line_y = 0.0;
        self.x = 0.0;
        self.y = 0.0;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx * self.scale;
        self.line_y += ty * self.scale;
        self.x = self.line_x;
        self.y = self.line_y;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn glyph_width(&self) -> f32 {
        self.font_size * self.scale * AVG_GLYPH_WIDTH
    }

    fn show(&mut self, text: String, runs: &mut Vec<TextRun>) {
        let advance = text.chars().count() as f32 * self.glyph_width();
        runs.push(TextRun {
            text,
            x: self.x,
            y: self.y,
            size: self.font_size * self.scale,
        });
        self.x += advance;
    }
}

fn operand(operands: &[Object], i: usize) -> Option<f32> {
    operands.get(i).and_then(|o| o.as_float().ok())
}

/// PDF string bytes to text: UTF-16BE with BOM, otherwise WinAnsi.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| winansi::decode_byte(b)).collect()
}

fn text_runs(content: &Content) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in &content.operations {
        let ops = &op.operands;
        match op.operator.as_str() {
            "BT" => state.begin_text(),
            "Tf" => {
                if let Some(size) = operand(ops, 1) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operand(ops, 0) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (operand(ops, 0), operand(ops, 1)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if ops.len() == 6 {
                    let m: Vec<f32> = ops.iter().filter_map(|o| o.as_float().ok()).collect();
                    if m.len() == 6 {
                        let scale = (m[2] * m[2] + m[3] * m[3]).sqrt();
                        state.scale = if scale > 0.0 { scale } else { 1.0 };
                        state.line_x = m[4];
                        state.line_y = m[5];
                        state.x = m[4];
                        state.y = m[5];
                    }
                }
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    state.next_line();
                }
                let string = ops.last().and_then(|o| o.as_str().ok());
                if let Some(bytes) = string {
                    state.show(decode_pdf_string(bytes), &mut runs);
                }
            }
            "TJ" => {
                let Some(Ok(items)) = ops.first().map(Object::as_array) else {
                    continue;
                };
                let mut text = String::new();
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                        other => {
                            if let Ok(adjust) = other.as_float() {
                                if -adjust > TJ_SPACE_THRESHOLD {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                }
                state.show(text, &mut runs);
            }
            _ => {}
        }
    }
    runs
}

/// `[x1, y1, x2, y2]` around the `len` glyphs starting at glyph `start`.
fn match_rect(run: &TextRun, start: usize, len: usize) -> [f32; 4] {
    let width = run.size * AVG_GLYPH_WIDTH;
    let x1 = run.x + start as f32 * width;
    let x2 = x1 + len as f32 * width;
    [x1, run.y - 0.25 * run.size, x2, run.y + 0.85 * run.size]
}

/// One annotation covering `rects`; `/Rect` is their bounding box.
fn highlight_annotation(page_id: ObjectId, rects: &[[f32; 4]], answer: &str) -> lopdf::Dictionary {
    let mut bounds = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    let mut quads: Vec<Object> = Vec::with_capacity(rects.len() * 8);
    for &[x1, y1, x2, y2] in rects {
        bounds = [bounds[0].min(x1), bounds[1].min(y1), bounds[2].max(x2), bounds[3].max(y2)];
        quads.extend([x1, y2, x2, y2, x1, y1, x2, y1].map(Object::from));
    }
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => bounds.map(Object::from).to_vec(),
        "QuadPoints" => quads,
        "C" => vec![1.0f32.into(), 1.0f32.into(), 0.0f32.into()],
        "F" => 4,
        "Contents" => Object::string_literal(answer),
        "P" => page_id,
    }
}

/// Append annotation references to the page's `/Annots`, keeping any that
/// are already there.
fn append_annotations(doc: &mut Document, page_id: ObjectId, new: Vec<Object>) -> Result<()> {
    let mut annots = {
        let page = doc.get_dictionary(page_id).map_err(pdf_err)?;
        match page.get(b"Annots") {
            Ok(Object::Array(existing)) => existing.clone(),
            Ok(Object::Reference(id)) => doc
                .get_object(*id)
                .and_then(Object::as_array)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    };
    annots.extend(new);

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(pdf_err)?;
    page.set("Annots", annots);
    Ok(())
}

fn pdf_err(e: lopdf::Error) -> Error {
    Error::Pdf(e.to_string())
}

/// Highlight every occurrence of each answer in `pdf_bytes`.
///
/// Returns the modified PDF and a count of what was marked. Answers that are
/// empty or never found leave the document unchanged apart from re-encoding.
pub fn highlight_pdf(pdf_bytes: &[u8], answers: &[&str]) -> Result<(Vec<u8>, HighlightReport)> {
    let mut doc = Document::load_mem(pdf_bytes).map_err(pdf_err)?;
    let mut report = HighlightReport {
        per_answer: vec![0; answers.len()],
        ..Default::default()
    };

    let mut layouts = Vec::new();
    for (number, id) in doc.get_pages() {
        let content = match doc.get_and_decode_page_content(id) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping page {}: unreadable content ({})", number, e);
                continue;
            }
        };
        let runs = text_runs(&content);
        let text = PageText::new(&runs);
        layouts.push(PageLayout { number, id, runs, text });
    }

    let page_texts: Vec<&str> = layouts.iter().map(|l| l.text.text.as_str()).collect();
    let locations = locate_answers(&page_texts, answers);

    for (page_index, layout) in layouts.iter().enumerate() {
        let mut new_annots = Vec::new();
        for location in locations.iter().filter(|l| l.page == page_index) {
            let answer = answers[location.answer_index];
            let rects: Vec<[f32; 4]> = layout
                .text
                .segments(location.offset, answer.len())
                .into_iter()
                .map(|(run, start, count)| match_rect(&layout.runs[run], start, count))
                .collect();
            if rects.is_empty() {
                continue;
            }
            let id = doc.add_object(highlight_annotation(layout.id, &rects, answer));
            new_annots.push(Object::Reference(id));
            report.per_answer[location.answer_index] += 1;
        }

        if !new_annots.is_empty() {
            debug!("Page {}: {} highlights", layout.number, new_annots.len());
            report.annotations += new_annots.len();
            report.pages_touched += 1;
            append_annotations(&mut doc, layout.id, new_annots)?;
        }
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(|e| Error::Pdf(e.to_string()))?;
    info!(
        "Highlighted {} occurrences of {} answers on {} pages",
        report.annotations,
        answers.len(),
        report.pages_touched
    );
    Ok((buf, report))
}
