//! Services shared by every request.

use speak_core::{Result, SpeechPipeline, SpeechSynthesizer, VoiceCatalog, VoiceSource};
use speak_documents::default_parsers;
use speak_drive::DriveClient;
use speak_edge::EdgeClient;
use std::sync::Arc;

/// A backend that both lists voices and speaks with them.
pub trait SpeechService: VoiceSource + SpeechSynthesizer + 'static {}

impl<T> SpeechService for T where T: VoiceSource + SpeechSynthesizer + 'static {}

/// Application state. All members are blocking; call from `spawn_blocking`.
pub struct AppState<S> {
    pub catalog: VoiceCatalog<Arc<S>>,
    pub pipeline: SpeechPipeline<Arc<S>>,
    pub drive: DriveClient,
}

impl<S: SpeechService> AppState<S> {
    /// Share one speech service between the voice catalog and the pipeline.
    pub fn new(service: S, drive: DriveClient) -> Self {
        let service = Arc::new(service);

        Self {
            catalog: VoiceCatalog::new(Arc::clone(&service)),
            pipeline: SpeechPipeline::new(default_parsers(), service),
            drive,
        }
    }
}

impl AppState<EdgeClient> {
    /// State backed by the Edge service. No network traffic happens until
    /// first use.
    pub fn edge() -> Result<Self> {
        Ok(Self::new(EdgeClient::new()?, DriveClient::new()?))
    }
}
