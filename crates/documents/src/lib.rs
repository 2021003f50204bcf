//! All supported document backends wired into one parser chain.

pub use speak_docx::DocxParser;
pub use speak_pdf::PdfParser;

use speak_core::{ParserChain, PlainTextParser};

/// PDF, then DOCX, then plain text.
pub fn default_parsers() -> ParserChain {
    ParserChain::new()
        .with_parser(PdfParser::new())
        .with_parser(DocxParser::new())
        .with_parser(PlainTextParser::new())
}
