pub mod mock;

#[cfg(feature = "whisper")]
pub mod whisper_rs;

use crate::error::DecoderError;

/// Identity of a loaded decoder: model, device, and compute precision.
///
/// Exposed verbatim in `/health` so orchestrators can confirm which weights and device a
/// running server actually loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderIdentity {
    pub model: String,
    pub device: String,
    pub compute_type: String,
    pub gpu_available: bool,
}

/// Options governing a single language-probing call over one audio window.
#[derive(Clone, Debug)]
pub struct LanguageProbeOptions {
    pub vad_filter: bool,
    pub vad_threshold: f32,
    pub vad_min_silence_ms: u32,
}

/// Options governing one decode attempt.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    pub language: Option<String>,
    pub task: Task,
    pub prompt: Option<String>,
    pub temperature: f32,
    pub beam_size: u32,
    pub best_of: u32,
    pub compression_ratio_threshold: f32,
    pub log_prob_threshold: f32,
    pub no_speech_threshold: f32,
    pub condition_on_previous_text: bool,
    pub prompt_reset_on_temperature: f32,
    pub vad_filter: bool,
    pub word_timestamps: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Task {
    #[default]
    Transcribe,
    Translate,
}

/// A single segment as produced directly by the decoder backend, before response assembly.
#[derive(Clone, Debug)]
pub struct DecodedSegment {
    pub start: f32,
    pub end: f32,
    pub text: String,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
}

/// The full output of one decode attempt: segments plus whatever language the decoder itself
/// reports it used (which may differ from the hint passed in, e.g. when no hint was given).
#[derive(Clone, Debug)]
pub struct DecodeOutcome {
    pub segments: Vec<DecodedSegment>,
    pub language: String,
}

/// The opaque, process-wide speech decoder. Bound to a specific model identity, device, and
/// compute type at construction time; invocation is a blocking call and must be dispatched off
/// the cooperative event loop by the caller (see `transcription-server`'s worker pool boundary).
pub trait Decoder: Send + Sync + 'static {
    fn identity(&self) -> &DecoderIdentity;

    /// Returns a probability distribution over candidate languages for one audio window.
    fn detect_language(
        &self,
        audio: &[f32],
        opts: &LanguageProbeOptions,
    ) -> Result<Vec<(String, f32)>, DecoderError>;

    fn decode(&self, audio: &[f32], opts: &DecodeOptions) -> Result<DecodeOutcome, DecoderError>;
}
