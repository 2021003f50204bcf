//! From user input to an audio clip.

use crate::{
    audio_file_name, AudioClip, Error, ParserChain, Prosody, Result, TextNormalizer, TextSource,
};
use std::sync::Arc;

/// A speech service that turns text into MP3 audio.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` with `voice`, returning the encoded audio.
    fn synthesize(&self, text: &str, voice: &str, prosody: &Prosody) -> Result<Vec<u8>>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Arc<T> {
    fn synthesize(&self, text: &str, voice: &str, prosody: &Prosody) -> Result<Vec<u8>> {
        (**self).synthesize(text, voice, prosody)
    }
}

/// Extraction, normalization and synthesis wired together.
pub struct SpeechPipeline<T> {
    parsers: ParserChain,
    normalizer: TextNormalizer,
    synthesizer: T,
}

impl<T: SpeechSynthesizer> SpeechPipeline<T> {
    /// Create a pipeline with the given parsers and speech service.
    pub fn new(parsers: ParserChain, synthesizer: T) -> Self {
        Self {
            parsers,
            normalizer: TextNormalizer::new(),
            synthesizer,
        }
    }

    /// The speech service in use.
    pub fn synthesizer(&self) -> &T {
        &self.synthesizer
    }

    /// Produce the text that will be spoken.
    ///
    /// Typed text is spoken as typed. Documents are extracted and then
    /// normalized so layout line breaks do not become pauses.
    pub fn prepare_text(&self, source: &TextSource) -> Result<String> {
        let text = match source {
            TextSource::Typed(text) => text.clone(),
            TextSource::Document { filename, bytes } => {
                let document = self.parsers.extract(bytes, filename)?;
                self.normalizer.normalize(&document.text)
            }
        };

        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }

        Ok(text)
    }

    /// Speak already prepared text.
    pub fn speak(&self, text: &str, voice: &str, prosody: &Prosody) -> Result<AudioClip> {
        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        prosody.validate()?;

        log::info!("Synthesizing {} characters with {}", text.chars().count(), voice);
        let bytes = self.synthesizer.synthesize(text, voice, prosody)?;

        Ok(AudioClip {
            file_name: audio_file_name(voice),
            bytes,
        })
    }

    /// Prepare the text from `source` and speak it.
    pub fn synthesize(&self, source: &TextSource, voice: &str, prosody: &Prosody) -> Result<AudioClip> {
        let text = self.prepare_text(source)?;
        self.speak(&text, voice, prosody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainTextParser;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSynthesizer {
        spoken: Mutex<Vec<(String, String)>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn synthesize(&self, text: &str, voice: &str, _prosody: &Prosody) -> Result<Vec<u8>> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), voice.to_string()));
            Ok(b"ID3fake".to_vec())
        }
    }

    fn pipeline() -> SpeechPipeline<RecordingSynthesizer> {
        SpeechPipeline::new(
            ParserChain::new().with_parser(PlainTextParser::new()),
            RecordingSynthesizer::default(),
        )
    }

    #[test]
    fn test_typed_text_spoken_as_typed() {
        let pipeline = pipeline();
        let clip = pipeline
            .synthesize(
                &TextSource::Typed("Hola\nmundo".to_string()),
                "es-MX-DaliaNeural",
                &Prosody::default(),
            )
            .unwrap();

        assert_eq!(clip.file_name, "audio_es-MX-DaliaNeural.mp3");
        assert_eq!(clip.bytes, b"ID3fake");

        let spoken = pipeline.synthesizer().spoken.lock().unwrap();
        assert_eq!(spoken[0], ("Hola\nmundo".to_string(), "es-MX-DaliaNeural".to_string()));
    }

    #[test]
    fn test_document_text_normalized() {
        let pipeline = pipeline();
        let source = TextSource::document("notes.txt", "line one\nline two\r\n\r\n\r\nnext");
        assert_eq!(
            pipeline.prepare_text(&source).unwrap(),
            "line one line two\n\nnext"
        );
    }

    #[test]
    fn test_blank_input_rejected_before_synthesis() {
        let pipeline = pipeline();

        let typed = TextSource::Typed("  \n\t ".to_string());
        assert!(matches!(
            pipeline.synthesize(&typed, "en-US-AriaNeural", &Prosody::default()),
            Err(Error::EmptyText)
        ));

        let document = TextSource::document("blank.txt", "\n\n   \n");
        assert!(matches!(pipeline.prepare_text(&document), Err(Error::EmptyText)));

        assert!(pipeline.synthesizer().spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn test_extraction_failure_propagates() {
        let pipeline = pipeline();
        let source = TextSource::document("scan.pdf", vec![0u8, 159, 146, 150]);
        assert!(matches!(
            pipeline.prepare_text(&source),
            Err(Error::NoParserSucceeded(_))
        ));
    }

    #[test]
    fn test_invalid_prosody_rejected() {
        let pipeline = pipeline();
        let prosody = Prosody {
            rate: "fast".to_string(),
            ..Prosody::default()
        };
        assert!(matches!(
            pipeline.speak("hello", "en-US-AriaNeural", &prosody),
            Err(Error::InvalidProsody(_))
        ));
    }
}
