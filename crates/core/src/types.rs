//! Domain types for documents, synthesis settings and generated audio.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PERCENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]\d+%$").unwrap());
static HERTZ_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]\d+Hz$").unwrap());

/// The format of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// Word document (Office Open XML).
    Docx,
    /// Plain UTF-8 text.
    Text,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    /// Detect format from the extension of a file name.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    /// Detect format from file magic bytes.
    ///
    /// Plain text has no magic and is never detected here.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }

        // DOCX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Docx);
        }

        None
    }

    /// Short lowercase name, also used as the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text pulled out of a document, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Original filename (without path).
    pub filename: String,

    /// Format of the parser that succeeded.
    pub format: DocumentFormat,

    /// Extracted text, line breaks as the source laid them out.
    pub text: String,
}

impl ExtractedDocument {
    /// Create a new extracted document.
    pub fn new(filename: impl Into<String>, format: DocumentFormat, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            format,
            text: text.into(),
        }
    }
}

/// Where the text to speak comes from.
#[derive(Debug, Clone)]
pub enum TextSource {
    /// Text typed by the user, spoken as typed.
    Typed(String),
    /// Document bytes that still need extraction.
    Document { filename: String, bytes: Vec<u8> },
}

impl TextSource {
    /// Build a document source.
    pub fn document(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Document {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Speaking rate, volume and pitch adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prosody {
    /// Rate change, e.g. `+10%`.
    pub rate: String,
    /// Volume change, e.g. `-20%`.
    pub volume: String,
    /// Pitch change, e.g. `+5Hz`.
    pub pitch: String,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: "+0%".to_string(),
            volume: "+0%".to_string(),
            pitch: "+0Hz".to_string(),
        }
    }
}

impl Prosody {
    /// Create validated prosody settings.
    pub fn new(
        rate: impl Into<String>,
        volume: impl Into<String>,
        pitch: impl Into<String>,
    ) -> Result<Self> {
        let prosody = Self {
            rate: rate.into(),
            volume: volume.into(),
            pitch: pitch.into(),
        };
        prosody.validate()?;
        Ok(prosody)
    }

    /// Check every value has the form the speech service accepts.
    pub fn validate(&self) -> Result<()> {
        if !PERCENT_REGEX.is_match(&self.rate) {
            return Err(Error::InvalidProsody(format!("rate '{}'", self.rate)));
        }
        if !PERCENT_REGEX.is_match(&self.volume) {
            return Err(Error::InvalidProsody(format!("volume '{}'", self.volume)));
        }
        if !HERTZ_REGEX.is_match(&self.pitch) {
            return Err(Error::InvalidProsody(format!("pitch '{}'", self.pitch)));
        }
        Ok(())
    }
}

/// Synthesized audio, ready to save or download.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Suggested download name.
    pub file_name: String,

    /// MP3 data.
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_extension("doc"), None);
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("Report.Final.docx"),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_filename("README"), None);
    }

    #[test]
    fn test_format_from_magic() {
        assert_eq!(
            DocumentFormat::from_magic(b"%PDF-1.7\n%"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_magic(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_magic(b"plain words"), None);
        assert_eq!(DocumentFormat::from_magic(b""), None);
    }

    #[test]
    fn test_default_prosody_is_valid() {
        assert!(Prosody::default().validate().is_ok());
    }

    #[test]
    fn test_prosody_validation() {
        assert!(Prosody::new("+25%", "-10%", "+3Hz").is_ok());
        assert!(matches!(
            Prosody::new("25%", "+0%", "+0Hz"),
            Err(Error::InvalidProsody(_))
        ));
        assert!(matches!(
            Prosody::new("+0%", "+0%", "+3%"),
            Err(Error::InvalidProsody(_))
        ));
        assert!(matches!(
            Prosody::new("+0%", "loud", "+0Hz"),
            Err(Error::InvalidProsody(_))
        ));
    }
}
