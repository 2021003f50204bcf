//! HTTP handlers.

use crate::page::FormPage;
use crate::state::{AppState, SpeechService};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use speak_core::{AudioClip, Error, Prosody, Result, TextSource, Voice, AUDIO_MIME_TYPE};
use std::sync::Arc;

/// Largest accepted request body.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const MISSING_VOICE: &str = "Please choose a voice.";
const MISSING_INPUT: &str = "Please type some text, upload a document or paste a link.";

/// Build the application router.
pub fn router<S: SpeechService>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(index::<S>))
        .route("/voices", get(voices::<S>))
        .route("/synthesize", post(synthesize::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

/// Form values echoed back when the page is re-rendered.
#[derive(Debug, Default)]
struct FormFields {
    locale: Option<String>,
    voice: String,
    text: String,
    link: String,
}

/// The input the user picked, in order of precedence.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Upload { filename: String, bytes: Vec<u8> },
    Link(String),
    Text(String),
}

/// Treat an empty or blank locale as "all locales".
fn selected_locale(locale: Option<String>) -> Option<String> {
    locale
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

async fn index<S: SpeechService>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<LocaleQuery>,
) -> Response {
    let fields = FormFields {
        locale: selected_locale(query.locale),
        ..FormFields::default()
    };

    run_blocking(move || form_response(&state, &fields, StatusCode::OK, None)).await
}

async fn voices<S: SpeechService>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<LocaleQuery>,
) -> Response {
    let locale = selected_locale(query.locale);
    run_blocking(move || voices_response(&state, locale.as_deref())).await
}

fn voices_response<S: SpeechService>(state: &AppState<S>, locale: Option<&str>) -> Response {
    let voices: Result<Vec<Voice>> = state
        .catalog
        .by_locale(locale)
        .map(|voices| voices.into_iter().cloned().collect());

    match voices {
        Ok(voices) => Json(voices).into_response(),
        Err(e) => {
            log::warn!("Voice list unavailable: {}", e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

async fn synthesize<S: SpeechService>(
    State(state): State<Arc<AppState<S>>>,
    multipart: Multipart,
) -> Response {
    let (fields, upload) = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            log::warn!("Malformed form submission: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    run_blocking(move || synthesize_blocking(&state, fields, upload)).await
}

/// Collect the multipart fields. An empty file part means no file was chosen.
async fn read_form(
    mut multipart: Multipart,
) -> std::result::Result<(FormFields, Option<(String, Vec<u8>)>), axum::extract::multipart::MultipartError> {
    let mut fields = FormFields::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload = Some((filename, bytes.to_vec()));
                }
            }
            "text" => fields.text = field.text().await?,
            "link" => fields.link = field.text().await?,
            "voice" => fields.voice = field.text().await?,
            "locale" => fields.locale = selected_locale(Some(field.text().await?)),
            other => log::debug!("Ignoring form field {}", other),
        }
    }

    Ok((fields, upload))
}

fn synthesize_blocking<S: SpeechService>(
    state: &AppState<S>,
    fields: FormFields,
    upload: Option<(String, Vec<u8>)>,
) -> Response {
    let voice = fields.voice.trim();
    if voice.is_empty() {
        return form_response(state, &fields, StatusCode::BAD_REQUEST, Some(MISSING_VOICE));
    }

    let Some(input) = choose_input(upload, &fields.link, &fields.text) else {
        return form_response(state, &fields, StatusCode::BAD_REQUEST, Some(MISSING_INPUT));
    };

    let result = resolve_voice(state, voice).and_then(|voice| {
        let source = resolve_source(state, input)?;
        state.pipeline.synthesize(&source, &voice, &Prosody::default())
    });

    match result {
        Ok(clip) => {
            log::info!("Sending {} ({} bytes)", clip.file_name, clip.bytes.len());
            audio_response(clip)
        }
        Err(e) => {
            log::warn!("Synthesis failed: {}", e);
            let message = e.to_string();
            form_response(state, &fields, status_for(&e), Some(&message))
        }
    }
}

/// Pick the input: a non-empty upload, then a non-blank link, then typed text.
fn choose_input(upload: Option<(String, Vec<u8>)>, link: &str, text: &str) -> Option<Input> {
    if let Some((filename, bytes)) = upload.filter(|(_, bytes)| !bytes.is_empty()) {
        return Some(Input::Upload { filename, bytes });
    }

    if !link.trim().is_empty() {
        return Some(Input::Link(link.trim().to_string()));
    }

    if !text.trim().is_empty() {
        return Some(Input::Text(text.to_string()));
    }

    None
}

/// Only voices offered by the catalog may be used. Returns the short name.
fn resolve_voice<S: SpeechService>(state: &AppState<S>, voice: &str) -> Result<String> {
    state
        .catalog
        .find(voice)?
        .map(|v| v.short_name.clone())
        .ok_or_else(|| Error::UnknownVoice(voice.to_string()))
}

fn resolve_source<S: SpeechService>(state: &AppState<S>, input: Input) -> Result<TextSource> {
    match input {
        Input::Upload { filename, bytes } => Ok(TextSource::document(filename, bytes)),
        Input::Link(link) => Ok(state.drive.fetch_url(&link)?.into()),
        Input::Text(text) => Ok(TextSource::Typed(text)),
    }
}

/// Bad input is the user's to fix; everything else is an upstream failure.
fn status_for(error: &Error) -> StatusCode {
    if error.is_input_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn form_response<S: SpeechService>(
    state: &AppState<S>,
    fields: &FormFields,
    status: StatusCode,
    warning: Option<&str>,
) -> Response {
    let locale = fields.locale.as_deref();
    let catalog = state
        .catalog
        .locales()
        .and_then(|locales| Ok((locales, state.catalog.by_locale(locale)?)));

    let (locales, voices, status, warning) = match catalog {
        Ok((locales, voices)) => (locales, voices, status, warning.map(str::to_string)),
        Err(e) => {
            log::warn!("Voice list unavailable: {}", e);
            let warning = format!("Could not load the voice list: {}", e);
            (Vec::new(), Vec::new(), StatusCode::BAD_GATEWAY, Some(warning))
        }
    };

    let voice = Some(fields.voice.as_str()).filter(|v| !v.is_empty());
    let html = FormPage {
        locales: &locales,
        locale,
        voices: &voices,
        voice,
        text: &fields.text,
        link: &fields.link,
        warning: warning.as_deref(),
    }
    .render();

    (status, Html(html)).into_response()
}

fn audio_response(clip: AudioClip) -> Response {
    (
        [
            (header::CONTENT_TYPE, AUDIO_MIME_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&clip.file_name)),
        ],
        clip.bytes,
    )
        .into_response()
}

/// Attachment header with the file name reduced to header-safe characters.
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

/// Run blocking work off the async runtime.
async fn run_blocking<F>(work: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("Request worker failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
