use super::{
    DecodeOptions, DecodeOutcome, DecodedSegment, Decoder, DecoderIdentity, LanguageProbeOptions,
    Task,
};
use crate::error::DecoderError;
use flate2::bufread::ZlibEncoder;
use flate2::Compression;
use std::io::Read;
use std::sync::Mutex;
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

/// A `Decoder` backed by `whisper-rs` (whisper.cpp bindings).
///
/// whisper.cpp's segment type does not expose a `compression_ratio` the way the
/// faster-whisper/CTranslate2 backend the original service targets does. This implementation
/// derives it locally from the zlib ratio of the segment text (the same formula faster-whisper
/// computes internally). `avg_logprob` is the mean of `ln(token.p)` over each segment's tokens,
/// read from whisper.cpp's own per-token data. `no_speech_prob` comes from whisper.cpp's
/// per-segment value when available, defaulting to 0.0 otherwise.
///
/// `WhisperState` is not `Sync`, so invocation is serialized behind a mutex; the caller's worker
/// pool is still the concurrency boundary that matters (see the admission-control design), this
/// mutex only protects the one in-process state handle from being entered twice at once.
pub struct WhisperRsDecoder {
    identity: DecoderIdentity,
    cpu_threads: i32,
    state: Mutex<WhisperState>,
}

impl WhisperRsDecoder {
    pub fn load(
        model_path: &str,
        device: &str,
        compute_type: &str,
        cpu_threads: i32,
    ) -> Result<Self, DecoderError> {
        let mut params = WhisperContextParameters::default();
        params.use_gpu(device == "cuda");

        let ctx = WhisperContext::new_with_params(model_path, params)
            .map_err(|e| DecoderError::Initialization(e.to_string()))?;
        let state = ctx
            .create_state()
            .map_err(|e| DecoderError::Initialization(e.to_string()))?;

        Ok(Self {
            identity: DecoderIdentity {
                model: model_path.to_string(),
                device: device.to_string(),
                compute_type: compute_type.to_string(),
                gpu_available: device == "cuda",
            },
            cpu_threads,
            state: Mutex::new(state),
        })
    }

    /// Mean log probability of the segment's tokens, mirroring faster-whisper's own
    /// `avg_logprob` (the average of `ln(token.p)` over the segment).
    fn avg_logprob(state: &WhisperState, segment: i32) -> f32 {
        let n_tokens = match state.full_n_tokens(segment) {
            Ok(n) => n,
            Err(_) => return 0.0,
        };
        let mut sum = 0f64;
        let mut count = 0u32;
        for j in 0..n_tokens {
            if let Ok(token_data) = state.full_get_token_data(segment, j) {
                sum += (token_data.p.max(f32::EPSILON) as f64).ln();
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            (sum / count as f64) as f32
        }
    }

    fn compression_ratio(text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let raw = text.as_bytes();
        let mut encoder = ZlibEncoder::new(raw, Compression::default());
        let mut compressed = Vec::new();
        if encoder.read_to_end(&mut compressed).is_err() || compressed.is_empty() {
            return 0.0;
        }
        raw.len() as f32 / compressed.len() as f32
    }
}

impl Decoder for WhisperRsDecoder {
    fn identity(&self) -> &DecoderIdentity {
        &self.identity
    }

    fn detect_language(
        &self,
        audio: &[f32],
        _opts: &LanguageProbeOptions,
    ) -> Result<Vec<(String, f32)>, DecoderError> {
        let mut state = self.state.lock().expect("whisper state mutex poisoned");
        let probs = state
            .lang_detect(0, audio, 4)
            .map_err(|e| DecoderError::Inference(e.to_string()))?;

        let mut scored: Vec<(String, f32)> = probs
            .into_iter()
            .enumerate()
            .filter_map(|(id, prob)| {
                whisper_rs::get_lang_str(id as i32).map(|code| (code.to_string(), prob))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored)
    }

    fn decode(&self, audio: &[f32], opts: &DecodeOptions) -> Result<DecodeOutcome, DecoderError> {
        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: opts.beam_size as i32,
            patience: -1.0,
        });
        params.set_n_max_text_ctx(opts.best_of as i32);
        if self.cpu_threads > 0 {
            params.set_n_threads(self.cpu_threads);
        }
        params.set_translate(opts.task == Task::Translate);
        if let Some(lang) = &opts.language {
            params.set_language(Some(lang.as_str()));
        } else {
            params.set_language(None);
        }
        if let Some(prompt) = &opts.prompt {
            params.set_initial_prompt(prompt.as_str());
        }
        params.set_temperature(opts.temperature);
        params.set_no_speech_thold(opts.no_speech_threshold);
        params.set_suppress_blank(true);
        params.set_token_timestamps(opts.word_timestamps);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);

        let mut state = self.state.lock().expect("whisper state mutex poisoned");
        state
            .full(params, audio)
            .map_err(|e| DecoderError::Inference(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| DecoderError::Inference(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments as usize);
        let mut detected_language = opts.language.clone().unwrap_or_else(|| "en".to_string());
        if opts.language.is_none() {
            let lang_id = state
                .full_lang_id()
                .map_err(|e| DecoderError::Inference(e.to_string()))?;
            if let Some(code) = whisper_rs::get_lang_str(lang_id) {
                detected_language = code.to_string();
            }
        }

        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| DecoderError::Inference(e.to_string()))?;
            let t0 = state
                .full_get_segment_t0(i)
                .map_err(|e| DecoderError::Inference(e.to_string()))?;
            let t1 = state
                .full_get_segment_t1(i)
                .map_err(|e| DecoderError::Inference(e.to_string()))?;
            let no_speech_prob = state.full_get_segment_no_speech_prob(i).unwrap_or(0.0);

            segments.push(DecodedSegment {
                start: t0 as f32 / 100.0,
                end: t1 as f32 / 100.0,
                compression_ratio: Self::compression_ratio(&text),
                avg_logprob: Self::avg_logprob(&state, i),
                no_speech_prob,
                text: text.trim().to_string(),
            });
        }

        Ok(DecodeOutcome {
            segments,
            language: detected_language,
        })
    }
}
