//! Blocking Edge TTS client.

use crate::protocol;
use crate::ssml;
use crate::token::{self, SEC_CH_UA, SEC_MS_GEC_VERSION, TRUSTED_CLIENT_TOKEN, USER_AGENT};
use crate::voices::parse_voice_list;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use speak_core::{Error, Prosody, Result, SpeechSynthesizer, Voice, VoiceSource};
use std::io;
use std::net::TcpStream;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::{header, HeaderValue};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use uuid::Uuid;

/// Host and path shared by both endpoints.
const BASE_URL: &str = "speech.platform.bing.com/consumer/speech/synthesize/readaloud";

/// Origin of the Edge read-aloud extension.
const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";

/// Timeout for the voice list request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest silence tolerated on the synthesis websocket.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// URL of the voice list endpoint.
fn voice_list_url(sec_ms_gec: &str) -> String {
    format!(
        "https://{}/voices/list?trustedclienttoken={}&Sec-MS-GEC={}&Sec-MS-GEC-Version={}",
        BASE_URL,
        TRUSTED_CLIENT_TOKEN,
        sec_ms_gec,
        SEC_MS_GEC_VERSION.as_str()
    )
}

/// URL of the synthesis websocket.
fn websocket_url(sec_ms_gec: &str, connection_id: &str) -> String {
    format!(
        "wss://{}/edge/v1?TrustedClientToken={}&Sec-MS-GEC={}&Sec-MS-GEC-Version={}&ConnectionId={}",
        BASE_URL,
        TRUSTED_CLIENT_TOKEN,
        sec_ms_gec,
        SEC_MS_GEC_VERSION.as_str(),
        connection_id
    )
}

fn ws_error(e: tungstenite::Error) -> Error {
    Error::WebSocket(e.to_string())
}

/// Like [`ws_error`], but names a read that hit the socket timeout.
fn read_error(e: tungstenite::Error) -> Error {
    match &e {
        tungstenite::Error::Io(err)
            if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
        {
            Error::WebSocket("Timed out waiting for the speech service".to_string())
        }
        _ => ws_error(e),
    }
}

/// Bound reads and writes on the TCP stream under the websocket.
fn set_socket_timeout(socket: &Socket, timeout: Duration) -> io::Result<()> {
    let stream = match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream,
        MaybeTlsStream::Rustls(tls) => tls.get_ref(),
        _ => return Ok(()),
    };
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

/// Client for voice listing and speech synthesis.
///
/// Tokens are time based; when the service rejects a request with 403 the
/// client adopts the server's clock and retries once.
pub struct EdgeClient {
    http: Client,
    clock_skew: AtomicI64,
    socket_timeout: Duration,
}

impl EdgeClient {
    /// Create a client.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT.as_str())
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            clock_skew: AtomicI64::new(0),
            socket_timeout: SOCKET_TIMEOUT,
        })
    }

    /// Give up on a synthesis connection that stays silent this long.
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Current clock correction in seconds.
    pub fn clock_skew(&self) -> i64 {
        self.clock_skew.load(Ordering::Relaxed)
    }

    fn sec_ms_gec(&self) -> String {
        token::sec_ms_gec(token::unix_now(self.clock_skew()))
    }

    /// Adopt the clock of a server that sent `server_date` (RFC 2822).
    ///
    /// Returns whether the skew changed.
    fn adjust_clock_skew(&self, server_date: Option<&str>) -> bool {
        let Some(server_time) = server_date.and_then(|d| DateTime::parse_from_rfc2822(d).ok()) else {
            log::warn!("Request rejected but server sent no usable Date header");
            return false;
        };

        let skew = server_time.timestamp() - token::unix_now(0);
        let previous = self.clock_skew.swap(skew, Ordering::Relaxed);
        log::info!("Adjusted clock skew to {}s", skew);
        previous != skew
    }

    /// Fetch the voice list from the service.
    pub fn fetch_voices(&self) -> Result<Vec<Voice>> {
        let mut response = self.request_voice_list()?;

        if response.status() == StatusCode::FORBIDDEN {
            let date = response
                .headers()
                .get("Date")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if self.adjust_clock_skew(date.as_deref()) {
                response = self.request_voice_list()?;
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("Voice list request returned {}", status)));
        }

        let body = response
            .text()
            .map_err(|e| Error::Http(format!("Failed to read voice list: {}", e)))?;

        parse_voice_list(&body)
    }

    fn request_voice_list(&self) -> Result<Response> {
        self.http
            .get(voice_list_url(&self.sec_ms_gec()))
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Sec-CH-UA", SEC_CH_UA.as_str())
            .header("Sec-CH-UA-Mobile", "?0")
            .header("Sec-CH-UA-Platform", "\"Windows\"")
            .send()
            .map_err(|e| Error::Http(format!("Voice list request failed: {}", e)))
    }

    /// Speak `text` with `voice`, returning MP3 data.
    ///
    /// Long text is split into chunks; each chunk uses its own connection and
    /// the audio is concatenated in order.
    pub fn synthesize_text(&self, text: &str, voice: &str, prosody: &Prosody) -> Result<Vec<u8>> {
        prosody.validate()?;
        let voice = ssml::full_voice_name(voice)?;

        let chunks = ssml::prepare_chunks(text);
        if chunks.is_empty() {
            return Err(Error::EmptyText);
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            log::debug!("Synthesizing chunk {}/{} ({} bytes)", idx + 1, chunks.len(), chunk.len());

            let mut socket = self.connect()?;
            let result = self.stream_chunk(&mut socket, chunk, &voice, prosody, &mut audio);
            if let Err(e) = socket.close(None) {
                log::debug!("Error closing websocket: {}", e);
            }
            result?;
        }

        log::info!("Received {} bytes of audio", audio.len());
        Ok(audio)
    }

    fn connect(&self) -> Result<Socket> {
        match self.try_connect() {
            Err(tungstenite::Error::Http(response)) if response.status().as_u16() == 403 => {
                let date = response
                    .headers()
                    .get(header::DATE)
                    .and_then(|v| v.to_str().ok());
                if self.adjust_clock_skew(date) {
                    return self.try_connect().map_err(ws_error);
                }
                Err(Error::WebSocket(format!(
                    "Handshake rejected with {}",
                    response.status()
                )))
            }
            other => other.map_err(ws_error),
        }
    }

    fn try_connect(&self) -> tungstenite::Result<Socket> {
        let connection_id = Uuid::new_v4().simple().to_string();
        let mut request = websocket_url(&self.sec_ms_gec(), &connection_id).into_client_request()?;

        let headers = request.headers_mut();
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::ORIGIN, HeaderValue::from_static(ORIGIN));
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&USER_AGENT)?);
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let muid = Uuid::new_v4().simple().to_string().to_uppercase();
        if let Ok(cookie) = HeaderValue::from_str(&format!("muid={};", muid)) {
            headers.insert(header::COOKIE, cookie);
        }

        let (socket, _) = tungstenite::connect(request)?;
        set_socket_timeout(&socket, self.socket_timeout)?;
        Ok(socket)
    }

    /// Send one chunk and collect its audio until the turn ends.
    fn stream_chunk(
        &self,
        socket: &mut Socket,
        chunk: &str,
        voice: &str,
        prosody: &Prosody,
        audio: &mut Vec<u8>,
    ) -> Result<()> {
        let timestamp = protocol::timestamp(Utc::now());
        socket
            .send(Message::text(protocol::speech_config_message(&timestamp)))
            .map_err(ws_error)?;

        let request_id = Uuid::new_v4().simple().to_string();
        let ssml = ssml::build_ssml(chunk, voice, prosody);
        socket
            .send(Message::text(protocol::ssml_message(&request_id, &timestamp, &ssml)))
            .map_err(ws_error)?;

        let mut received_audio = false;

        loop {
            match socket.read().map_err(read_error)? {
                Message::Text(frame) => {
                    let (headers, _) = protocol::parse_text_frame(frame.as_str());
                    match headers.path() {
                        Some("turn.end") => break,
                        Some("turn.start") | Some("response") | Some("audio.metadata") => {}
                        other => log::debug!("Ignoring message with path {:?}", other),
                    }
                }
                Message::Binary(frame) => {
                    let (headers, payload) = protocol::parse_binary_frame(&frame)?;
                    if headers.path() != Some("audio") {
                        return Err(Error::Protocol(format!(
                            "Binary message with unexpected path {:?}",
                            headers.path()
                        )));
                    }
                    if !payload.is_empty() {
                        audio.extend_from_slice(payload);
                        received_audio = true;
                    }
                }
                Message::Close(frame) => {
                    return Err(Error::WebSocket(format!(
                        "Connection closed before the turn ended: {:?}",
                        frame
                    )));
                }
                _ => {}
            }
        }

        if !received_audio {
            return Err(Error::NoAudioReceived);
        }

        Ok(())
    }
}

impl VoiceSource for EdgeClient {
    fn list_voices(&self) -> Result<Vec<Voice>> {
        self.fetch_voices()
    }
}

impl SpeechSynthesizer for EdgeClient {
    fn synthesize(&self, text: &str, voice: &str, prosody: &Prosody) -> Result<Vec<u8>> {
        self.synthesize_text(text, voice, prosody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_voice_list_url() {
        let url = voice_list_url("ABC");
        assert_eq!(
            url,
            "https://speech.platform.bing.com/consumer/speech/synthesize/readaloud/voices/list\
             ?trustedclienttoken=6A5AA1D4EAFF4E9FB37E23D68491D6F4&Sec-MS-GEC=ABC&Sec-MS-GEC-Version=1-130.0.2849.68"
        );
    }

    #[test]
    fn test_websocket_url() {
        let url = websocket_url("ABC", "0123");
        assert!(url.starts_with(
            "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1?"
        ));
        assert!(url.contains("TrustedClientToken=6A5AA1D4EAFF4E9FB37E23D68491D6F4"));
        assert!(url.ends_with("&ConnectionId=0123"));
    }

    #[test]
    fn test_clock_skew_from_server_date() {
        let client = EdgeClient::new().unwrap();
        assert_eq!(client.clock_skew(), 0);

        let ahead = Utc::now() + chrono::Duration::seconds(3600);
        assert!(client.adjust_clock_skew(Some(&ahead.to_rfc2822())));
        assert!((client.clock_skew() - 3600).abs() <= 2);
    }

    #[test]
    fn test_clock_skew_ignores_bad_dates() {
        let client = EdgeClient::new().unwrap();
        assert!(!client.adjust_clock_skew(None));
        assert!(!client.adjust_clock_skew(Some("yesterday")));
        assert_eq!(client.clock_skew(), 0);
    }

    #[test]
    fn test_stalled_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        // Accepts the requests and never answers
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut server = tungstenite::accept(stream).unwrap();
            let _ = server.read();
            let _ = server.read();
            thread::sleep(Duration::from_secs(5));
        });

        let client = EdgeClient::new()
            .unwrap()
            .with_socket_timeout(Duration::from_millis(200));
        let (mut socket, _) = tungstenite::connect(format!("ws://{}", addr)).unwrap();
        set_socket_timeout(&socket, client.socket_timeout).unwrap();

        let started = Instant::now();
        let mut audio = Vec::new();
        let result = client.stream_chunk(
            &mut socket,
            "hello",
            "Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)",
            &Prosody::default(),
            &mut audio,
        );

        match result {
            Err(Error::WebSocket(message)) => assert!(message.contains("Timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(audio.is_empty());
    }

    #[test]
    fn test_read_error_names_timeouts() {
        let timeout = tungstenite::Error::Io(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(matches!(read_error(timeout), Error::WebSocket(m) if m.contains("Timed out")));

        let closed = read_error(tungstenite::Error::ConnectionClosed);
        assert!(matches!(closed, Error::WebSocket(m) if !m.contains("Timed out")));
    }

    #[test]
    fn test_invalid_input_rejected_before_connecting() {
        let client = EdgeClient::new().unwrap();
        assert!(matches!(
            client.synthesize_text("hello", "Aria", &Prosody::default()),
            Err(Error::UnknownVoice(_))
        ));
        assert!(matches!(
            client.synthesize_text("  \u{1}  ", "en-US-AriaNeural", &Prosody::default()),
            Err(Error::EmptyText)
        ));
        let bad = Prosody {
            pitch: "high".to_string(),
            ..Prosody::default()
        };
        assert!(matches!(
            client.synthesize_text("hello", "en-US-AriaNeural", &bad),
            Err(Error::InvalidProsody(_))
        ));
    }
}
