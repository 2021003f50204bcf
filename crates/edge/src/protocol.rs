//! Websocket message framing for the synthesis endpoint.
//!
//! Messages are HTTP-like: `Name:value` header lines separated by CRLF, a
//! blank line, then the body. Binary frames prefix the header block with
//! its length as a big-endian `u16`.

use chrono::{DateTime, Utc};
use speak_core::{Error, Result};

/// Audio format requested from the service.
pub const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Timestamp in the JavaScript `Date.toString()` form the service expects.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

/// The `speech.config` message sent before each request.
pub fn speech_config_message(timestamp: &str) -> String {
    format!(
        "X-Timestamp:{}\r\n\
         Content-Type:application/json; charset=utf-8\r\n\
         Path:speech.config\r\n\r\n\
         {{\"context\":{{\"synthesis\":{{\"audio\":{{\"metadataoptions\":{{\
         \"sentenceBoundaryEnabled\":\"false\",\"wordBoundaryEnabled\":\"true\"}},\
         \"outputFormat\":\"{}\"}}}}}}}}\r\n",
        timestamp, OUTPUT_FORMAT
    )
}

/// The `ssml` message carrying one chunk of text.
///
/// The trailing `Z` after the timestamp matches what the browser sends.
pub fn ssml_message(request_id: &str, timestamp: &str, ssml: &str) -> String {
    format!(
        "X-RequestId:{}\r\n\
         Content-Type:application/ssml+xml\r\n\
         X-Timestamp:{}Z\r\n\
         Path:ssml\r\n\r\n\
         {}",
        request_id, timestamp, ssml
    )
}

/// Parsed header block of a service message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Parse CRLF-separated `Name:value` lines.
    pub fn parse(block: &str) -> Self {
        let entries = block
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();
        Self { entries }
    }

    /// Value of the first header called `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `Path` header.
    pub fn path(&self) -> Option<&str> {
        self.get("Path")
    }
}

/// Split a text frame into headers and body.
pub fn parse_text_frame(frame: &str) -> (Headers, &str) {
    match frame.split_once("\r\n\r\n") {
        Some((headers, body)) => (Headers::parse(headers), body),
        None => (Headers::parse(frame), ""),
    }
}

/// Split a binary frame into headers and payload.
pub fn parse_binary_frame(frame: &[u8]) -> Result<(Headers, &[u8])> {
    if frame.len() < 2 {
        return Err(Error::Protocol("binary frame shorter than its length prefix".to_string()));
    }

    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let body_start = 2 + header_len;
    if body_start > frame.len() {
        return Err(Error::Protocol(format!(
            "binary frame header length {} exceeds frame size {}",
            header_len,
            frame.len()
        )));
    }

    let headers = String::from_utf8_lossy(&frame[2..body_start]);
    Ok((Headers::parse(&headers), &frame[body_start..]))
}
