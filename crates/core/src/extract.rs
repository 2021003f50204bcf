//! Ranked document extraction.
//!
//! Uploaded files are not trusted to carry the right extension, so each
//! parser is tried until one accepts the bytes. The parser for the format
//! named by the magic bytes (or failing that, the extension) goes first and
//! the rest follow in rank order. Every failure is kept so the caller can see
//! why nothing worked.

use crate::{DocumentFormat, Error, ExtractedDocument, Result};

/// A backend that turns document bytes into raw text.
pub trait DocumentParser: Send + Sync {
    /// The format this parser reads.
    fn format(&self) -> DocumentFormat;

    /// Extract raw text, or explain why the bytes are not this format.
    fn extract(&self, data: &[u8]) -> Result<String>;
}

/// Parser for plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new plain text parser.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for PlainTextParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn extract(&self, data: &[u8]) -> Result<String> {
        // Binary formats almost always contain NUL; UTF-8 prose never does
        if data.contains(&0) {
            return Err(Error::ExtractionError("binary data is not text".to_string()));
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| Error::ExtractionError(format!("invalid UTF-8: {}", e)))?;

        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

/// Parsers tried in order until one succeeds.
#[derive(Default)]
pub struct ParserChain {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parser with lower rank than those already added.
    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Formats in the order they will be tried.
    pub fn formats(&self) -> Vec<DocumentFormat> {
        self.parsers.iter().map(|p| p.format()).collect()
    }

    /// Parsers in the order they will be tried for this document.
    fn attempt_order<'a>(
        &'a self,
        data: &[u8],
        filename: &str,
    ) -> impl Iterator<Item = &'a dyn DocumentParser> + 'a {
        let likely =
            DocumentFormat::from_magic(data).or_else(|| DocumentFormat::from_filename(filename));

        let preferred = self
            .parsers
            .iter()
            .filter(move |p| Some(p.format()) == likely);
        let rest = self
            .parsers
            .iter()
            .filter(move |p| Some(p.format()) != likely);

        preferred.chain(rest).map(|p| &**p)
    }

    /// Extract text with the first parser that accepts the data.
    pub fn extract(&self, data: &[u8], filename: &str) -> Result<ExtractedDocument> {
        if data.is_empty() {
            return Err(Error::EmptyDocument);
        }
        if self.parsers.is_empty() {
            return Err(Error::UnsupportedFormat(filename.to_string()));
        }

        let mut failures = Vec::with_capacity(self.parsers.len());

        for parser in self.attempt_order(data, filename) {
            let format = parser.format();
            match parser.extract(data) {
                Ok(text) => {
                    log::debug!("Extracted {} as {} ({} bytes of text)", filename, format, text.len());
                    return Ok(ExtractedDocument::new(filename, format, text));
                }
                Err(e) => {
                    log::debug!("{} parser rejected {}: {}", format, filename, e);
                    failures.push(format!("{}: {}", format, e));
                }
            }
        }

        Err(Error::NoParserSucceeded(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingParser(DocumentFormat);

    impl DocumentParser for FailingParser {
        fn format(&self) -> DocumentFormat {
            self.0
        }

        fn extract(&self, _data: &[u8]) -> Result<String> {
            Err(Error::ExtractionError("nope".to_string()))
        }
    }

    struct FixedParser(DocumentFormat, &'static str);

    impl DocumentParser for FixedParser {
        fn format(&self) -> DocumentFormat {
            self.0
        }

        fn extract(&self, _data: &[u8]) -> Result<String> {
            Ok(self.1.to_string())
        }
    }

    #[test]
    fn test_plain_text_parser() {
        let parser = PlainTextParser::new();
        assert_eq!(parser.extract(b"hello\nthere").unwrap(), "hello\nthere");
        assert_eq!(parser.extract("\u{feff}bom".as_bytes()).unwrap(), "bom");
        assert!(parser.extract(&[0xff, 0xfe, 0x41]).is_err());
        assert!(parser.extract(b"PK\x03\x04\x00\x00").is_err());
    }

    #[test]
    fn test_first_success_wins() {
        let chain = ParserChain::new()
            .with_parser(FailingParser(DocumentFormat::Pdf))
            .with_parser(FixedParser(DocumentFormat::Docx, "from docx"))
            .with_parser(FixedParser(DocumentFormat::Text, "from text"));

        let doc = chain.extract(b"data", "upload.bin").unwrap();
        assert_eq!(doc.format, DocumentFormat::Docx);
        assert_eq!(doc.text, "from docx");
        assert_eq!(doc.filename, "upload.bin");
    }

    #[test]
    fn test_all_failures_reported_in_rank_order() {
        let chain = ParserChain::new()
            .with_parser(FailingParser(DocumentFormat::Pdf))
            .with_parser(FailingParser(DocumentFormat::Docx));

        match chain.extract(b"data", "x") {
            Err(Error::NoParserSucceeded(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("pdf: "));
                assert!(failures[1].starts_with("docx: "));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_extension_picks_first_parser() {
        let chain = ParserChain::new()
            .with_parser(FixedParser(DocumentFormat::Text, "from text"))
            .with_parser(FixedParser(DocumentFormat::Docx, "from docx"));

        let doc = chain.extract(b"data", "Report.DOCX").unwrap();
        assert_eq!(doc.format, DocumentFormat::Docx);

        // Unknown extension keeps rank order
        let doc = chain.extract(b"data", "report.bin").unwrap();
        assert_eq!(doc.format, DocumentFormat::Text);
    }

    #[test]
    fn test_magic_outranks_extension() {
        let chain = ParserChain::new()
            .with_parser(FixedParser(DocumentFormat::Text, "from text"))
            .with_parser(FixedParser(DocumentFormat::Pdf, "from pdf"));

        let doc = chain.extract(b"%PDF-1.4 body", "renamed.txt").unwrap();
        assert_eq!(doc.format, DocumentFormat::Pdf);
        assert_eq!(doc.text, "from pdf");
    }

    #[test]
    fn test_failures_listed_in_attempt_order() {
        let chain = ParserChain::new()
            .with_parser(FailingParser(DocumentFormat::Pdf))
            .with_parser(FailingParser(DocumentFormat::Docx));

        match chain.extract(b"data", "notes.docx") {
            Err(Error::NoParserSucceeded(failures)) => {
                assert!(failures[0].starts_with("docx: "));
                assert!(failures[1].starts_with("pdf: "));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_document() {
        let chain = ParserChain::new().with_parser(PlainTextParser::new());
        assert!(matches!(chain.extract(b"", "empty.txt"), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_empty_chain() {
        assert!(matches!(
            ParserChain::new().extract(b"abc", "a.txt"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_formats_in_rank_order() {
        let chain = ParserChain::new()
            .with_parser(FailingParser(DocumentFormat::Pdf))
            .with_parser(PlainTextParser::new());
        assert_eq!(chain.formats(), vec![DocumentFormat::Pdf, DocumentFormat::Text]);
    }
}
