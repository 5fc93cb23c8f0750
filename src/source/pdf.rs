//! PDF text extraction.
//!
//! Uses lopdf to decode page content streams. Pages that fail to decode are
//! skipped; a document with no extractable text yields an empty string.

use super::PdfUpload;
use crate::error::{Result, StudyError};
use tracing::{debug, warn};

/// Extract the text of every upload, in upload order then page order.
pub fn extract_documents(uploads: &[PdfUpload]) -> Result<String> {
    let mut text = String::new();

    for upload in uploads {
        let document_text = extract_text(upload)?;
        append_section(&mut text, &document_text);
    }

    Ok(text)
}

/// Extract the text of a single PDF.
pub fn extract_text(upload: &PdfUpload) -> Result<String> {
    let doc = lopdf::Document::load_mem(&upload.bytes)
        .map_err(|e| StudyError::Pdf(format!("Failed to load {}: {}", upload.name, e)))?;

    let pages = doc.get_pages();
    debug!(file = %upload.name, page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => append_section(&mut text, &page_text),
            Err(e) => {
                warn!(file = %upload.name, page = page_number, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    Ok(text)
}

/// Append text, keeping consecutive pages and files on separate lines.
fn append_section(text: &mut String, section: &str) {
    if section.is_empty() {
        return;
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(section);
}
