//! Voice list as returned by the service.

use serde::Deserialize;
use speak_core::{Error, Result, Voice};

/// One entry of the voice list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EdgeVoice {
    name: String,
    short_name: String,
    gender: String,
    locale: String,
    #[serde(default)]
    friendly_name: Option<String>,
}

impl From<EdgeVoice> for Voice {
    fn from(v: EdgeVoice) -> Self {
        let friendly_name = v
            .friendly_name
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| v.short_name.clone());

        Voice {
            name: v.name,
            short_name: v.short_name,
            friendly_name,
            locale: v.locale,
            gender: v.gender,
        }
    }
}

/// Parse the JSON body of the voice list endpoint.
pub fn parse_voice_list(json: &str) -> Result<Vec<Voice>> {
    let voices: Vec<EdgeVoice> = serde_json::from_str(json)
        .map_err(|e| Error::Protocol(format!("Malformed voice list: {}", e)))?;
    Ok(voices.into_iter().map(Voice::from).collect())
}
