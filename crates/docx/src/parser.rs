//! DOCX file parser implementation.

use quick_xml::events::Event;
use quick_xml::Reader;
use speak_core::{DocumentFormat, DocumentParser, Error, Result};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Path of the main document part inside the archive.
const DOCUMENT_PATH: &str = "word/document.xml";

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a DOCX file from a reader, returning its paragraphs.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<String>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content = self.read_file_from_archive(&mut archive, DOCUMENT_PATH)?;
        let paragraphs = self.extract_paragraphs_from_xml(&content)?;

        log::debug!("Found {} non-empty paragraphs", paragraphs.len());
        Ok(paragraphs)
    }

    /// Extract paragraph text from the main document XML.
    fn extract_paragraphs_from_xml(&self, xml_content: &str) -> Result<Vec<String>> {
        let mut reader = Reader::from_str(xml_content);
        // Runs carry significant leading/trailing spaces
        reader.trim_text(false);

        let mut paragraphs = Vec::new();
        // Text boxes nest paragraphs inside paragraphs
        let mut open_paragraphs: Vec<String> = Vec::new();
        let mut run_depth = 0usize;
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"p" => open_paragraphs.push(String::new()),
                    b"r" => run_depth += 1,
                    b"t" if run_depth > 0 => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if run_depth == 0 {
                        continue;
                    }
                    if let Some(current) = open_paragraphs.last_mut() {
                        match local_name(e.name().as_ref()) {
                            b"tab" => current.push('\t'),
                            b"br" | b"cr" => current.push('\n'),
                            _ => {}
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        if let Some(current) = open_paragraphs.last_mut() {
                            let text = e
                                .unescape()
                                .map_err(|e| Error::XmlError(format!("Bad text run: {}", e)))?;
                            current.push_str(&text);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"p" => {
                        if let Some(paragraph) = open_paragraphs.pop() {
                            if !paragraph.trim().is_empty() {
                                paragraphs.push(paragraph);
                            }
                        }
                    }
                    b"r" => run_depth = run_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {} at position {}: {}",
                        DOCUMENT_PATH,
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(paragraphs)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for DocxParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    /// Paragraphs are separated by a blank line so normalization keeps them.
    fn extract(&self, data: &[u8]) -> Result<String> {
        if DocumentFormat::from_magic(data) != Some(DocumentFormat::Docx) {
            return Err(Error::DocxParseError("missing ZIP signature".to_string()));
        }

        Ok(self.parse(Cursor::new(data))?.join("\n\n"))
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
