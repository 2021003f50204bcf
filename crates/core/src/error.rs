//! Error types for document-to-speech conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting, normalizing or synthesizing text.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The uploaded or downloaded document has no bytes at all.
    #[error("Document is empty")]
    EmptyDocument,

    /// Failed to parse the DOCX file structure.
    #[error("DOCX parsing error: {0}")]
    DocxParseError(String),

    /// Failed to parse the PDF file structure.
    #[error("PDF parsing error: {0}")]
    PdfParseError(String),

    /// Failed to extract text from a document.
    #[error("Text extraction error: {0}")]
    ExtractionError(String),

    /// Every parser in the chain rejected the document.
    #[error("No parser could read the document ({})", .0.join("; "))]
    NoParserSucceeded(Vec<String>),

    /// ZIP archive error (for DOCX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for DOCX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// There is no text left to speak.
    #[error("No text to synthesize")]
    EmptyText,

    /// A rate, volume or pitch value is malformed.
    #[error("Invalid prosody value: {0}")]
    InvalidProsody(String),

    /// The voice name is not known or not in a recognised form.
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    /// The link is not a recognised Google Drive or Docs share link.
    #[error("Invalid document link: {0}")]
    InvalidLink(String),

    /// The remote document is private or hidden behind a confirmation page.
    #[error("Document is not publicly shared: {0}")]
    NotShared(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Websocket connection or transfer failed.
    #[error("Websocket error: {0}")]
    WebSocket(String),

    /// The TTS service finished a turn without sending audio.
    #[error("No audio was received from the speech service")]
    NoAudioReceived,

    /// The TTS service sent something we could not make sense of.
    #[error("Speech service protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Whether the error was caused by the user's input rather than by a
    /// remote service.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_)
                | Error::EmptyDocument
                | Error::DocxParseError(_)
                | Error::PdfParseError(_)
                | Error::ExtractionError(_)
                | Error::NoParserSucceeded(_)
                | Error::ZipError(_)
                | Error::XmlError(_)
                | Error::EmptyText
                | Error::InvalidProsody(_)
                | Error::UnknownVoice(_)
                | Error::InvalidLink(_)
                | Error::NotShared(_)
        )
    }
}
