use crate::environ::TEMPERATURE_FALLBACK_CHAIN;
use crate::error::HttpError;
use tracing::info;
use transcription_core::{DecodeOptions, DecodeOutcome, Decoder};

/// Classification of one decode attempt, per the hallucination-filtering rules.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Classification {
    Silence,
    Hallucination,
    Accepted,
}

fn classify(
    outcome: &DecodeOutcome,
    no_speech_threshold: f32,
    log_prob_threshold: f32,
    compression_ratio_threshold: f32,
) -> Classification {
    if outcome.segments.is_empty()
        || outcome
            .segments
            .iter()
            .all(|s| s.no_speech_prob > no_speech_threshold && s.avg_logprob < log_prob_threshold)
    {
        return Classification::Silence;
    }

    if outcome.segments.iter().any(|s| {
        s.compression_ratio > compression_ratio_threshold || s.avg_logprob < log_prob_threshold
    }) {
        return Classification::Hallucination;
    }

    Classification::Accepted
}

/// Result of walking the temperature fallback chain (or a single attempt when disabled).
pub struct DecodeAttempt {
    pub classification: Classification,
    pub outcome: DecodeOutcome,
    pub temperature: f32,
}

/// Walks the temperature fallback chain, stopping on the first silence or accepted
/// classification and otherwise emitting the last attempt to preserve forward progress.
pub fn decode_with_temperature_fallback(
    decoder: &dyn Decoder,
    audio: &[f32],
    mut base_opts: DecodeOptions,
    use_temperature_fallback: bool,
    requested_temperature: f32,
) -> Result<DecodeAttempt, HttpError> {
    let chain: Vec<f32> = if use_temperature_fallback {
        TEMPERATURE_FALLBACK_CHAIN.to_vec()
    } else {
        vec![requested_temperature]
    };

    let no_speech_threshold = base_opts.no_speech_threshold;
    let log_prob_threshold = base_opts.log_prob_threshold;
    let compression_ratio_threshold = base_opts.compression_ratio_threshold;

    let mut last: Option<DecodeAttempt> = None;
    for temperature in chain {
        base_opts.temperature = temperature;
        let outcome = decoder.decode(audio, &base_opts)?;
        let classification = classify(
            &outcome,
            no_speech_threshold,
            log_prob_threshold,
            compression_ratio_threshold,
        );

        info!(?classification, temperature, "decode attempt");

        let attempt = DecodeAttempt {
            classification,
            outcome,
            temperature,
        };

        match classification {
            Classification::Silence | Classification::Accepted => return Ok(attempt),
            Classification::Hallucination => {
                last = Some(attempt);
            }
        }
    }

    last.ok_or(HttpError::NoResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcription_core::decoder::mock::MockDecoder;
    use transcription_core::{DecodedSegment, DecoderIdentity, Task};

    fn identity() -> DecoderIdentity {
        DecoderIdentity {
            model: "mock".into(),
            device: "cpu".into(),
            compute_type: "float32".into(),
            gpu_available: false,
        }
    }

    fn base_opts() -> DecodeOptions {
        DecodeOptions {
            language: Some("en".into()),
            task: Task::Transcribe,
            prompt: None,
            temperature: 0.0,
            beam_size: 5,
            best_of: 5,
            compression_ratio_threshold: 2.4,
            log_prob_threshold: -1.0,
            no_speech_threshold: 0.6,
            condition_on_previous_text: true,
            prompt_reset_on_temperature: 0.5,
            vad_filter: true,
            word_timestamps: false,
        }
    }

    fn outcome(segments: Vec<DecodedSegment>) -> DecodeOutcome {
        DecodeOutcome {
            segments,
            language: "en".to_string(),
        }
    }

    fn segment(compression_ratio: f32, avg_logprob: f32) -> DecodedSegment {
        DecodedSegment {
            start: 0.0,
            end: 1.0,
            text: "hello".to_string(),
            avg_logprob,
            compression_ratio,
            no_speech_prob: 0.05,
        }
    }

    #[test]
    fn hallucination_rejected_with_fallback_uses_second_temperature() {
        let decoder = MockDecoder::new(
            identity(),
            vec![],
            vec![
                (0.0, outcome(vec![segment(3.0, -0.2)])),
                (0.2, outcome(vec![segment(1.5, -0.2)])),
            ],
        );

        let attempt =
            decode_with_temperature_fallback(&decoder, &[0.0; 16000], base_opts(), true, 0.0)
                .expect("should decode");

        assert_eq!(attempt.classification, Classification::Accepted);
        assert_eq!(attempt.temperature, 0.2);
    }

    #[test]
    fn all_temperatures_hallucinated_returns_last_attempt() {
        let decoder = MockDecoder::new(
            identity(),
            vec![],
            vec![(0.0, outcome(vec![segment(5.0, -0.2)]))],
        );

        let attempt =
            decode_with_temperature_fallback(&decoder, &[0.0; 16000], base_opts(), false, 0.0)
                .expect("should still return a result");

        assert_eq!(attempt.classification, Classification::Hallucination);
    }

    #[test]
    fn silence_short_circuits_immediately() {
        let decoder = MockDecoder::new(identity(), vec![], vec![(0.0, outcome(vec![]))]);

        let attempt =
            decode_with_temperature_fallback(&decoder, &[0.0; 16000], base_opts(), true, 0.0)
                .expect("should decode");

        assert_eq!(attempt.classification, Classification::Silence);
        assert_eq!(decoder.decode_call_count(), 1);
    }
}
