use super::{DecodeOptions, DecodeOutcome, Decoder, DecoderIdentity, LanguageProbeOptions};
use crate::error::DecoderError;
use std::sync::Mutex;

/// A deterministic, dependency-free [`Decoder`] used by the test suite and by local
/// smoke-testing, so the admission-control, language-detection, and temperature-fallback logic
/// can be exercised without a GPU or any real model weights.
///
/// Language probes are served from `language_script` in order, one call per entry, cycling back
/// to the last entry once exhausted (a request partitions audio into several probe windows, so
/// a short script still covers long inputs). Decode attempts are served from `decode_script`
/// keyed by the requested temperature, falling back to the last scripted outcome for any
/// temperature not present.
pub struct MockDecoder {
    identity: DecoderIdentity,
    language_script: Vec<Vec<(String, f32)>>,
    decode_script: Vec<(f32, DecodeOutcome)>,
    language_probe_calls: Mutex<usize>,
    decode_calls: Mutex<usize>,
}

impl MockDecoder {
    pub fn new(
        identity: DecoderIdentity,
        language_script: Vec<Vec<(String, f32)>>,
        decode_script: Vec<(f32, DecodeOutcome)>,
    ) -> Self {
        Self {
            identity,
            language_script,
            decode_script,
            language_probe_calls: Mutex::new(0),
            decode_calls: Mutex::new(0),
        }
    }

    /// A decoder that always reports English with high confidence and decodes to a single
    /// accepted segment spanning the whole buffer.
    pub fn always_confident_english(text: &str) -> Self {
        let duration = 1.0;
        Self::new(
            DecoderIdentity {
                model: "mock-large-v3".into(),
                device: "cpu".into(),
                compute_type: "float32".into(),
                gpu_available: false,
            },
            vec![vec![("en".to_string(), 0.95)]],
            vec![(
                0.0,
                DecodeOutcome {
                    segments: vec![super::DecodedSegment {
                        start: 0.0,
                        end: duration,
                        text: text.to_string(),
                        avg_logprob: -0.2,
                        compression_ratio: 1.2,
                        no_speech_prob: 0.05,
                    }],
                    language: "en".to_string(),
                },
            )],
        )
    }

    pub fn language_probe_call_count(&self) -> usize {
        *self.language_probe_calls.lock().expect("mutex poisoned")
    }

    pub fn decode_call_count(&self) -> usize {
        *self.decode_calls.lock().expect("mutex poisoned")
    }
}

impl Decoder for MockDecoder {
    fn identity(&self) -> &DecoderIdentity {
        &self.identity
    }

    fn detect_language(
        &self,
        _audio: &[f32],
        _opts: &LanguageProbeOptions,
    ) -> Result<Vec<(String, f32)>, DecoderError> {
        let mut calls = self.language_probe_calls.lock().expect("mutex poisoned");
        let idx = (*calls).min(self.language_script.len().saturating_sub(1));
        *calls += 1;
        Ok(self
            .language_script
            .get(idx)
            .cloned()
            .unwrap_or_default())
    }

    fn decode(&self, _audio: &[f32], opts: &DecodeOptions) -> Result<DecodeOutcome, DecoderError> {
        *self.decode_calls.lock().expect("mutex poisoned") += 1;
        let outcome = self
            .decode_script
            .iter()
            .find(|(temp, _)| (*temp - opts.temperature).abs() < f32::EPSILON)
            .or_else(|| self.decode_script.last())
            .map(|(_, outcome)| outcome.clone())
            .ok_or_else(|| DecoderError::Inference("mock decoder has no scripted outcome".into()))?;
        Ok(outcome)
    }
}
