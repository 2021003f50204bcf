//! Core domain types, text normalization, voice catalog and the synthesis
//! pipeline for turning documents into speech.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod voices;

pub use error::{Error, Result};
pub use extract::{DocumentParser, ParserChain, PlainTextParser};
pub use normalize::{normalize, TextNormalizer};
pub use output::{audio_file_name, AUDIO_MIME_TYPE};
pub use pipeline::{SpeechPipeline, SpeechSynthesizer};
pub use types::{AudioClip, DocumentFormat, ExtractedDocument, Prosody, TextSource};
pub use voices::{Voice, VoiceCatalog, VoiceSource};
