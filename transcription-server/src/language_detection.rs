use crate::environ::LanguageDetectionConfig;
use tracing::{debug, info};
use transcription_core::{Decoder, LanguageProbeOptions};

const SAMPLE_RATE: usize = 16_000;
const SEGMENT_DURATION_S: usize = 10;
const SEGMENT_SAMPLES: usize = SAMPLE_RATE * SEGMENT_DURATION_S;
const MIN_SEGMENT_SAMPLES: usize = SAMPLE_RATE / 2; // 0.5s
const MIN_SEGMENT_CONFIDENCE: f32 = 0.4;
const ENGLISH_LOCK_CONFIDENCE: f32 = 0.65;

/// Outcome of the pre-decode language-probing pass.
pub struct LanguageProbe {
    /// Language hint to pass to `Decoder::decode`, or `None` when detection was not trusted
    /// enough to lock the decoder to a language (including the English-bias guard).
    pub hint: Option<String>,
    /// True when the probe ran but its result should not be trusted (empty audio, silence,
    /// every segment filtered out, or the English-bias guard firing).
    pub low_confidence: bool,
}

/// Runs segment-level language probing with per-language probability aggregation, early
/// stopping, and the English-bias guard, mirroring the reference service's
/// `_detect_language_improved` plus its caller-side `MIN_CONFIDENCE_FOR_EN` check.
///
/// `audio` must already be resampled to 16 kHz mono.
pub fn probe_language(
    decoder: &dyn Decoder,
    audio: &[f32],
    cfg: &LanguageDetectionConfig,
    probe_opts: &LanguageProbeOptions,
) -> LanguageProbe {
    let (language, probability) = detect_language_improved(decoder, audio, cfg, probe_opts);

    if probability <= 0.0 {
        info!("language detection low confidence, decode will use default");
        return LanguageProbe {
            hint: None,
            low_confidence: true,
        };
    }

    if language == "en" && probability < ENGLISH_LOCK_CONFIDENCE {
        info!(
            probability,
            "English detection borderline, not locking decoder to a language"
        );
        return LanguageProbe {
            hint: None,
            low_confidence: true,
        };
    }

    info!(language = %language, probability, "auto-detected language");
    LanguageProbe {
        hint: Some(language),
        low_confidence: false,
    }
}

/// Applies the English-bias guard to the final decode result, for use once the winning
/// temperature attempt's segments have been assembled.
pub fn report_language(low_confidence: bool, decoded_language: &str) -> (String, f32) {
    if low_confidence && decoded_language == "en" {
        ("unknown".to_string(), 0.0)
    } else {
        (decoded_language.to_string(), 1.0)
    }
}

fn detect_language_improved(
    decoder: &dyn Decoder,
    audio: &[f32],
    cfg: &LanguageDetectionConfig,
    probe_opts: &LanguageProbeOptions,
) -> (String, f32) {
    let n_samples = audio.len();
    let num_segments = cfg.max_segments.min(
        ((n_samples + SEGMENT_SAMPLES - 1) / SEGMENT_SAMPLES.max(1)).max(1),
    );

    let mut aggregator: std::collections::HashMap<String, Vec<f32>> =
        std::collections::HashMap::new();
    let mut segments_processed = 0u32;
    let mut last_probs: Vec<(String, f32)> = Vec::new();

    for seg_idx in 0..num_segments {
        let start = seg_idx * SEGMENT_SAMPLES;
        if start >= n_samples {
            break;
        }
        let end = (start + SEGMENT_SAMPLES).min(n_samples);
        let segment_audio = &audio[start..end];
        if segment_audio.len() < MIN_SEGMENT_SAMPLES {
            continue;
        }

        let mut probs = match decoder.detect_language(segment_audio, probe_opts) {
            Ok(p) => p,
            Err(_) => continue,
        };
        probs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        last_probs = probs.clone();

        if probs.is_empty() {
            continue;
        }
        let max_prob = probs.iter().map(|(_, p)| *p).fold(f32::MIN, f32::max);
        if max_prob < MIN_SEGMENT_CONFIDENCE {
            debug!(max_prob, "skipping segment with low confidence");
            continue;
        }
        if probs.len() >= 2 {
            let top_prob = probs[0].1;
            let second_prob = probs[1].1;
            let diff = top_prob - second_prob;
            if (diff < 0.12 && top_prob < 0.45) || top_prob < 0.30 {
                debug!(top_prob, diff, "skipping uncertain/low-confidence segment");
                continue;
            }
        }

        for (lang, prob) in &probs {
            if *prob >= 0.1 {
                aggregator.entry(lang.clone()).or_default().push(*prob);
            }
        }
        segments_processed += 1;

        if !aggregator.is_empty() {
            let (top_lang, top_avg) = top_average(&aggregator);
            let mut early_stop_threshold = cfg.threshold;
            if segments_processed >= 3 {
                early_stop_threshold = (cfg.threshold - 0.1).max(0.4);
            }
            if top_avg > early_stop_threshold && segments_processed >= 2 {
                let top_count = aggregator.get(&top_lang).map(|v| v.len()).unwrap_or(0);
                if top_count >= 2 && top_avg > early_stop_threshold {
                    return (top_lang, top_avg);
                }
            }
        }
    }

    if aggregator.is_empty() {
        return match last_probs.first() {
            Some((lang, prob)) if *prob >= 0.5 => (lang.clone(), *prob),
            Some(_) => {
                info!("all segments filtered out, last segment low confidence");
                ("en".to_string(), 0.0)
            }
            None => ("en".to_string(), 0.0),
        };
    }

    let mut best_lang = String::new();
    let mut best_score = f32::MIN;
    for (lang, probs) in &aggregator {
        let avg = probs.iter().sum::<f32>() / probs.len() as f32;
        let consistency = (probs.len() as f32 / 3.0).min(1.0);
        let score = avg * (0.7 + 0.3 * consistency);
        if score > best_score {
            best_score = score;
            best_lang = lang.clone();
        }
    }
    let probability = {
        let probs = &aggregator[&best_lang];
        probs.iter().sum::<f32>() / probs.len() as f32
    };

    if probability < 0.5 {
        info!(probability, "language detection confidence too low");
        return ("en".to_string(), 0.0);
    }
    (best_lang, probability)
}

fn top_average(aggregator: &std::collections::HashMap<String, Vec<f32>>) -> (String, f32) {
    let mut best_lang = String::new();
    let mut best_avg = f32::MIN;
    for (lang, probs) in aggregator {
        let avg = probs.iter().sum::<f32>() / probs.len() as f32;
        if avg > best_avg {
            best_avg = avg;
            best_lang = lang.clone();
        }
    }
    (best_lang, best_avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcription_core::decoder::mock::MockDecoder;
    use transcription_core::DecoderIdentity;

    fn identity() -> DecoderIdentity {
        DecoderIdentity {
            model: "mock".into(),
            device: "cpu".into(),
            compute_type: "float32".into(),
            gpu_available: false,
        }
    }

    fn probe_opts() -> LanguageProbeOptions {
        LanguageProbeOptions {
            vad_filter: true,
            vad_threshold: 0.5,
            vad_min_silence_ms: 160,
        }
    }

    fn cfg() -> LanguageDetectionConfig {
        LanguageDetectionConfig {
            threshold: 0.5,
            max_segments: 10,
        }
    }

    #[test]
    fn english_bias_guard_reports_unknown_below_threshold() {
        let decoder = MockDecoder::new(
            identity(),
            vec![vec![("en".to_string(), 0.60), ("fr".to_string(), 0.1)]],
            vec![],
        );
        let audio = vec![0.0f32; SEGMENT_SAMPLES * 2];
        let probe = probe_language(&decoder, &audio, &cfg(), &probe_opts());
        assert!(probe.low_confidence);
        assert_eq!(probe.hint, None);

        let (lang, prob) = report_language(probe.low_confidence, "en");
        assert_eq!(lang, "unknown");
        assert_eq!(prob, 0.0);
    }

    #[test]
    fn confident_non_english_locks_language() {
        let decoder = MockDecoder::new(
            identity(),
            vec![
                vec![("fr".to_string(), 0.9), ("en".to_string(), 0.05)],
                vec![("fr".to_string(), 0.9), ("en".to_string(), 0.05)],
            ],
            vec![],
        );
        let audio = vec![0.0f32; SEGMENT_SAMPLES * 2];
        let probe = probe_language(&decoder, &audio, &cfg(), &probe_opts());
        assert_eq!(probe.hint.as_deref(), Some("fr"));
        assert!(!probe.low_confidence);
    }

    #[test]
    fn short_input_consumes_no_detection_segments() {
        let decoder = MockDecoder::new(identity(), vec![vec![("en".to_string(), 0.95)]], vec![]);
        let audio = vec![0.0f32; 100];
        let probe = probe_language(&decoder, &audio, &cfg(), &probe_opts());
        assert_eq!(decoder.language_probe_call_count(), 0);
        assert!(probe.low_confidence);
    }
}
