use transcription_core::environ::{env_bool, env_float, env_int, env_string};

/// Admission-control knobs (`MAX_CONCURRENT_TRANSCRIPTIONS`, `MAX_QUEUE_SIZE`,
/// `FAIL_FAST_WHEN_BUSY`, `BUSY_RETRY_AFTER_S`). Mirrors the Python service's own
/// `_env_int`/`_env_bool` reads at import time.
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct AdmissionConfig {
    pub max_concurrent: usize,
    pub max_queue: usize,
    pub fail_fast_when_busy: bool,
    pub busy_retry_after_s: u64,
}

impl AdmissionConfig {
    pub fn from_env() -> Self {
        Self {
            max_concurrent: env_int("MAX_CONCURRENT_TRANSCRIPTIONS", 2).max(1) as usize,
            max_queue: env_int("MAX_QUEUE_SIZE", 10).max(0) as usize,
            fail_fast_when_busy: env_bool("FAIL_FAST_WHEN_BUSY", true),
            busy_retry_after_s: env_int("BUSY_RETRY_AFTER_S", 1).max(1) as u64,
        }
    }
}

/// Decoder identity knobs (`MODEL_SIZE`, `DEVICE`, `COMPUTE_TYPE`, `CPU_THREADS`).
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct DecoderConfig {
    pub model_size: String,
    pub device: String,
    pub compute_type: String,
    pub cpu_threads: i32,
}

impl DecoderConfig {
    pub fn from_env() -> Self {
        Self {
            model_size: env_string("MODEL_SIZE", "large-v3-turbo"),
            device: env_string("DEVICE", "cuda"),
            compute_type: env_string("COMPUTE_TYPE", "int8"),
            cpu_threads: env_int("CPU_THREADS", 0) as i32,
        }
    }
}

/// Decode-time options, applied to every temperature attempt (`BEAM_SIZE`, `BEST_OF`,
/// `COMPRESSION_RATIO_THRESHOLD`, `LOG_PROB_THRESHOLD`, `NO_SPEECH_THRESHOLD`,
/// `CONDITION_ON_PREVIOUS_TEXT`, `PROMPT_RESET_ON_TEMPERATURE`, the VAD trio, and
/// `USE_TEMPERATURE_FALLBACK`).
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct DecodeOptionsConfig {
    pub beam_size: u32,
    pub best_of: u32,
    pub compression_ratio_threshold: f32,
    pub log_prob_threshold: f32,
    pub no_speech_threshold: f32,
    pub condition_on_previous_text: bool,
    pub prompt_reset_on_temperature: f32,
    pub vad_filter: bool,
    pub vad_filter_threshold: f32,
    pub vad_min_silence_duration_ms: u32,
    pub use_temperature_fallback: bool,
}

impl DecodeOptionsConfig {
    pub fn from_env() -> Self {
        Self {
            beam_size: env_int("BEAM_SIZE", 5) as u32,
            best_of: env_int("BEST_OF", 5) as u32,
            compression_ratio_threshold: env_float("COMPRESSION_RATIO_THRESHOLD", 2.4) as f32,
            log_prob_threshold: env_float("LOG_PROB_THRESHOLD", -1.0) as f32,
            no_speech_threshold: env_float("NO_SPEECH_THRESHOLD", 0.6) as f32,
            condition_on_previous_text: env_bool("CONDITION_ON_PREVIOUS_TEXT", true),
            prompt_reset_on_temperature: env_float("PROMPT_RESET_ON_TEMPERATURE", 0.5) as f32,
            vad_filter: env_bool("VAD_FILTER", true),
            vad_filter_threshold: env_float("VAD_FILTER_THRESHOLD", 0.5) as f32,
            vad_min_silence_duration_ms: env_int("VAD_MIN_SILENCE_DURATION_MS", 160) as u32,
            use_temperature_fallback: env_bool("USE_TEMPERATURE_FALLBACK", false),
        }
    }
}

pub const TEMPERATURE_FALLBACK_CHAIN: [f32; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Language-detection knobs (`LANGUAGE_DETECTION_THRESHOLD`, `LANGUAGE_DETECTION_SEGMENTS`).
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct LanguageDetectionConfig {
    pub threshold: f32,
    pub max_segments: usize,
}

impl LanguageDetectionConfig {
    pub fn from_env() -> Self {
        Self {
            threshold: env_float("LANGUAGE_DETECTION_THRESHOLD", 0.5) as f32,
            max_segments: env_int("LANGUAGE_DETECTION_SEGMENTS", 10).max(1) as usize,
        }
    }
}

/// Shared-secret auth config (`API_TOKEN`). Empty disables auth.
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone)]
pub struct AuthConfig {
    pub api_token: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            api_token: env_string("API_TOKEN", ""),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.api_token.is_empty()
    }
}

