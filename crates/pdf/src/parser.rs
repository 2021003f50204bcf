//! PDF file parser implementation.

use speak_core::{DocumentFormat, DocumentParser, Error, Result};
use std::panic;
use unicode_normalization::UnicodeNormalization;

/// Parser for PDF files.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }

    /// Extract the text layer of a PDF held in memory.
    ///
    /// Scanned documents without a text layer yield an empty string.
    pub fn parse(&self, data: &[u8]) -> Result<String> {
        if DocumentFormat::from_magic(data) != Some(DocumentFormat::Pdf) {
            return Err(Error::PdfParseError("missing %PDF- header".to_string()));
        }

        // pdf-extract panics on some malformed inputs instead of returning an error
        let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|payload| Error::PdfParseError(panic_message(payload.as_ref())))?
            .map_err(|e| Error::PdfParseError(e.to_string()))?;

        log::debug!("Extracted {} characters from PDF", extracted.len());

        Ok(fold_compatibility_forms(&extracted))
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, data: &[u8]) -> Result<String> {
        self.parse(data)
    }
}

/// Replace typographic ligatures and other compatibility characters
/// (`ﬁ`, `ﬂ`, full-width digits) with their plain equivalents.
fn fold_compatibility_forms(text: &str) -> String {
    text.nfkc().collect()
}

/// Best-effort description of a caught panic.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("extractor panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("extractor panicked: {}", message)
    } else {
        "extractor panicked".to_string()
    }
}
