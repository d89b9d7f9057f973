use crate::admission::AdmissionController;
use crate::environ::{AdmissionConfig, AuthConfig, DecodeOptionsConfig, DecoderConfig, LanguageDetectionConfig};
use std::sync::{Arc, OnceLock};
use transcription_core::Decoder;

/// The process-wide decoder handle: an opaque, lazily-initialized resource bound to a model
/// identity, device, and compute type. Exactly one handle per process; `/health` reports
/// readiness from it directly so orchestrators can gate traffic until it is set.
#[derive(Default)]
pub struct DecoderHandle(OnceLock<Arc<dyn Decoder>>);

impl DecoderHandle {
    pub fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn set(&self, decoder: Arc<dyn Decoder>) {
        let _ = self.0.set(decoder);
    }

    pub fn get(&self) -> Option<Arc<dyn Decoder>> {
        self.0.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.0.get().is_some()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub decoder: Arc<DecoderHandle>,
    pub admission: Arc<AdmissionController>,
    pub auth: AuthConfig,
    pub decoder_config: DecoderConfig,
    pub decode_options: DecodeOptionsConfig,
    pub language_detection: LanguageDetectionConfig,
    pub worker_id: String,
}

impl AppState {
    pub fn from_env(worker_id: String) -> Self {
        Self {
            decoder: Arc::new(DecoderHandle::new()),
            admission: Arc::new(AdmissionController::new(AdmissionConfig::from_env())),
            auth: AuthConfig::from_env(),
            decoder_config: DecoderConfig::from_env(),
            decode_options: DecodeOptionsConfig::from_env(),
            language_detection: LanguageDetectionConfig::from_env(),
            worker_id,
        }
    }
}
