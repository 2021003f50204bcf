//! SSML construction and text chunking.

use quick_xml::escape::escape;
use regex::Regex;
use speak_core::{Error, Prosody, Result};
use std::sync::LazyLock;

/// Largest escaped text the service accepts in one SSML request.
pub const MAX_CHUNK_BYTES: usize = 4096;

/// `en-US-AriaNeural`, `zh-CN-liaoning-XiaobeiNeural`
static SHORT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2,})-([A-Z]{2,})-(.+Neural)$").unwrap());

/// Locale and name may not contain markup characters.
static LONG_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Microsoft Server Speech Text to Speech Voice \([^'"<>&]+,[^'"<>&]+\)$"#).unwrap()
});

/// Expand a short voice name to the full form used in SSML.
///
/// Full names pass through unchanged.
pub fn full_voice_name(voice: &str) -> Result<String> {
    let voice = voice.trim();

    let expanded = match SHORT_NAME_REGEX.captures(voice) {
        Some(caps) => {
            let lang = &caps[1];
            let mut region = caps[2].to_string();
            let mut name = &caps[3];

            // An extra segment before the name belongs to the region
            if let Some((sub_region, rest)) = name.split_once('-') {
                region = format!("{}-{}", region, sub_region);
                name = rest;
            }

            format!(
                "Microsoft Server Speech Text to Speech Voice ({}-{}, {})",
                lang, region, name
            )
        }
        None => voice.to_string(),
    };

    if !LONG_NAME_REGEX.is_match(&expanded) {
        return Err(Error::UnknownVoice(voice.to_string()));
    }

    Ok(expanded)
}

/// Replace control characters the service rejects with spaces.
///
/// Tab, line feed and carriage return are kept.
pub fn remove_incompatible_characters(text: &str) -> String {
    text.chars()
        .map(|c| match c as u32 {
            0..=8 | 11..=12 | 14..=31 => ' ',
            _ => c,
        })
        .collect()
}

/// Clean and XML-escape text, then split it into request-sized chunks.
pub fn prepare_chunks(text: &str) -> Vec<String> {
    let cleaned = remove_incompatible_characters(text);
    split_by_byte_length(&escape(&cleaned), MAX_CHUNK_BYTES)
}

/// Split escaped text into trimmed, non-empty chunks of at most `limit` bytes.
///
/// Splits prefer the last newline, then the last space. Neither a UTF-8
/// character nor an `&...;` entity is ever cut in half.
pub fn split_by_byte_length(text: &str, limit: usize) -> Vec<String> {
    assert!(limit > 0, "chunk limit must be positive");

    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > limit {
        let window = &rest[..floor_char_boundary(rest, limit)];

        let mut split_at = window
            .rfind('\n')
            .filter(|&i| i > 0)
            .or_else(|| window.rfind(' ').filter(|&i| i > 0))
            .unwrap_or(window.len());

        // Back off to before an entity that would straddle the split
        if let Some(amp) = rest[..split_at].rfind('&') {
            if !rest[amp..split_at].contains(';') {
                split_at = amp;
            }
        }

        // Entity at the very start of the window: take it whole
        if split_at == 0 {
            split_at = rest.find(';').map(|i| i + 1).unwrap_or(rest.len());
        }

        push_trimmed(&mut chunks, &rest[..split_at]);
        rest = &rest[split_at..];
    }

    push_trimmed(&mut chunks, rest);
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

/// Largest index `<= index` that falls on a character boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Build the SSML document for one escaped chunk.
///
/// The voice name is escaped here; the text must already be.
pub fn build_ssml(escaped_text: &str, voice: &str, prosody: &Prosody) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{}'>\
         <prosody pitch='{}' rate='{}' volume='{}'>\
         {}\
         </prosody></voice></speak>",
        escape(voice),
        prosody.pitch,
        prosody.rate,
        prosody.volume,
        escaped_text
    )
}
