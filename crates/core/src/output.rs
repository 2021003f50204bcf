//! Naming and typing of generated audio.

/// MIME type of synthesized audio.
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// File extension of synthesized audio.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Download name for audio spoken by `voice`.
///
/// Spaces in the voice name become underscores, e.g.
/// `audio_en-US-AriaNeural.mp3`.
pub fn audio_file_name(voice: &str) -> String {
    format!("audio_{}.{}", voice.replace(' ', "_"), AUDIO_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(audio_file_name("en-US-AriaNeural"), "audio_en-US-AriaNeural.mp3");
    }

    #[test]
    fn test_spaces_replaced() {
        assert_eq!(
            audio_file_name("Microsoft Server Speech Text to Speech Voice (es-MX, DaliaNeural)"),
            "audio_Microsoft_Server_Speech_Text_to_Speech_Voice_(es-MX,_DaliaNeural).mp3"
        );
    }
}
