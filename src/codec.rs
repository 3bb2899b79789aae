// Workspace Gate - Content Codec
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Decides how a confined file is read and whether it may be text-written:
// - PDF: per-page text extraction (lopdf)
// - DOCX: body paragraph extraction (zip + WordprocessingML via quick-xml)
// - Database: never dumped, caller is pointed at inspect_sql_db
// - Everything else: strict UTF-8, binary is refused

use crate::error::{GateError, GateResult};
use crate::paths::ConfinedPath;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

/// Message returned instead of dumping undecodable bytes
pub const BINARY_SENTINEL: &str = "Error: Binary file detected. Use 'inspect_sql_db' for databases.";

/// Archive member holding the main DOCX body
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Docx,
    Database,
    TextOrBinary,
}

impl ContentKind {
    /// Structured kinds are never mutated through the text-write path
    pub fn is_structured(&self) -> bool {
        !matches!(self, ContentKind::TextOrBinary)
    }
}

/// Classify by lowercase extension.
pub fn classify(path: &Path) -> ContentKind {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => ContentKind::Pdf,
        "docx" => ContentKind::Docx,
        "db" | "sqlite" => ContentKind::Database,
        _ => ContentKind::TextOrBinary,
    }
}

/// Read a confined file as text according to its kind.
pub fn decode_for_read(path: &ConfinedPath, kind: ContentKind) -> GateResult<String> {
    match kind {
        ContentKind::Pdf => read_pdf(path.as_path())
            .map_err(|e| GateError::DecodeFailure(format!("Error reading PDF: {}", e))),
        ContentKind::Docx => read_docx(path.as_path())
            .map_err(|e| GateError::DecodeFailure(format!("Error reading DOCX: {}", e))),
        ContentKind::Database => Err(GateError::DecodeFailure(BINARY_SENTINEL.to_string())),
        ContentKind::TextOrBinary => {
            let bytes = std::fs::read(path.as_path())
                .map_err(|e| GateError::from_io(path.name(), e))?;
            String::from_utf8(bytes)
                .map_err(|_| GateError::DecodeFailure(BINARY_SENTINEL.to_string()))
        }
    }
}

/// Refuse text writes over an existing PDF, DOCX or database.
/// A structured file that does not exist yet is not guarded.
pub fn guard_write(path: &ConfinedPath, kind: ContentKind) -> GateResult<()> {
    if path.exists() && kind.is_structured() {
        log::warn!("Blocked text write over {:?} file {}", kind, path.name());
        return Err(GateError::UnsupportedWrite(path.name().to_string()));
    }
    Ok(())
}

/// Concatenate page text in document order, one newline after each page.
fn read_pdf(path: &Path) -> anyhow::Result<String> {
    let doc = lopdf::Document::load(path)?;
    let mut text = String::new();
    // get_pages() is keyed by 1-based page number, BTreeMap keeps order
    for page_number in doc.get_pages().keys() {
        // extract_text already ends each text block with a newline
        let page = doc.extract_text(&[*page_number])?;
        text.push_str(page.trim_end_matches('\n'));
        text.push('\n');
    }
    Ok(text)
}

fn read_docx(path: &Path) -> anyhow::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY)?.read_to_string(&mut xml)?;
    docx_paragraphs(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Extract top-level body paragraphs from WordprocessingML.
/// Paragraphs nested in tables are skipped, matching what a body-paragraph
/// walk of the document yields.
fn docx_paragraphs(xml: &str) -> anyhow::Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" if table_depth == 0 => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:p" if table_depth == 0 => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 => paragraphs.push(String::new()),
                b"w:tab" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\t');
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = current.as_mut() {
                    p.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

// ============================================================================
// TESTS
// ============================================================================
