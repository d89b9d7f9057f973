use crate::environ::RemoteTranscriberConfig;
use crate::error::AdapterError;
use crate::language::normalize_language_code;
use crate::wav::encode_wav;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// The three input shapes a caller may hand to [`RemoteTranscriber::transcribe`].
pub enum AudioSource {
    Samples(Vec<f32>, u32),
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Decode options forwarded to the remote endpoint. Most fields mirror the local decoder's
/// own options so a caller can swap between a local and remote decoder transparently.
#[derive(Clone, Debug)]
pub struct TranscribeOptions {
    pub language: Option<String>,
    pub task: String,
    pub prompt: Option<String>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            task: "transcribe".to_string(),
            prompt: None,
        }
    }
}

/// One transcribed interval, normalized from whatever shape the remote endpoint returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub id: u32,
    pub seek: u32,
    pub start: f32,
    pub end: f32,
    pub text: String,
    pub tokens: Vec<u32>,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
    pub temperature: f32,
}

/// Aggregate info about the call, independent of the individual segments.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionInfo {
    pub language: String,
    pub language_probability: f32,
    pub duration: f32,
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    language_probability: Option<f32>,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    segments: Vec<RawSegment>,
}

#[derive(Deserialize)]
struct RawSegment {
    #[serde(default)]
    seek: u32,
    #[serde(default)]
    start: Option<f32>,
    #[serde(default)]
    end: Option<f32>,
    #[serde(default)]
    audio_start: Option<f32>,
    #[serde(default)]
    audio_end: Option<f32>,
    #[serde(default)]
    duration: Option<f32>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    tokens: Vec<u32>,
    avg_logprob: Option<f32>,
    compression_ratio: Option<f32>,
    no_speech_prob: Option<f32>,
}

fn clamp_probability(value: f32) -> f32 {
    if value > 1.0 {
        1.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Wraps a remote HTTP transcription endpoint behind the same shape a local decoder would
/// expose: pooled connection, WAV framing, overload propagation, and bounded retry.
pub struct RemoteTranscriber {
    http: Client,
    config: RemoteTranscriberConfig,
}

impl RemoteTranscriber {
    pub fn new(config: RemoteTranscriberConfig) -> Result<Self, AdapterError> {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, config })
    }

    fn audio_to_samples(source: AudioSource) -> Result<(Vec<f32>, u32), AdapterError> {
        match source {
            AudioSource::Samples(samples, rate) => Ok((samples, rate)),
            AudioSource::Path(path) => {
                let mut reader = hound::WavReader::open(&path)?;
                let spec = reader.spec();
                let samples = samples_from_reader(&mut reader, spec.bits_per_sample)?;
                Ok((samples, spec.sample_rate))
            }
            AudioSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                let mut wav_reader = hound::WavReader::new(std::io::Cursor::new(bytes))?;
                let spec = wav_reader.spec();
                let samples = samples_from_reader(&mut wav_reader, spec.bits_per_sample)?;
                Ok((samples, spec.sample_rate))
            }
        }
    }

    /// Sends one audio window to the remote endpoint and returns its segments and summary
    /// info. Busy responses (429/503) are propagated immediately as
    /// [`AdapterError::Overloaded`] rather than retried, so the caller can keep buffering and
    /// transcribe the newest window instead of stalling on a stale one.
    pub async fn transcribe(
        &self,
        source: AudioSource,
        opts: &TranscribeOptions,
    ) -> Result<(Vec<Segment>, TranscriptionInfo), AdapterError> {
        let (samples, sample_rate) = Self::audio_to_samples(source)?;
        let duration = samples.len() as f32 / sample_rate.max(1) as f32;
        let wav_bytes = encode_wav(&samples, sample_rate)?;

        let sent_language = normalize_language_code(opts.language.as_deref());
        let raw = self
            .call_with_retry(wav_bytes, sent_language.as_deref(), opts)
            .await?;

        // Prefer the caller-supplied language over whatever the backend reports, then
        // normalize whichever source wins; only default to "en" when neither is present
        // (don't force "en" over a low-confidence "unknown" the backend returned on purpose).
        let raw_language = opts.language.as_deref().or(raw.language.as_deref());
        let detected_language =
            normalize_language_code(raw_language).unwrap_or_else(|| "en".to_string());

        let info = TranscriptionInfo {
            language: detected_language,
            language_probability: raw.language_probability.unwrap_or(1.0),
            duration: raw.duration.unwrap_or(duration),
        };

        let segments = self.response_to_segments(raw, info.duration);
        Ok((segments, info))
    }

    async fn call_with_retry(
        &self,
        wav_bytes: Vec<u8>,
        language: Option<&str>,
        opts: &TranscribeOptions,
    ) -> Result<RawResponse, AdapterError> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(wav_bytes.clone(), language, opts).await {
                Ok(response) => return Ok(response),
                Err(err @ AdapterError::Overloaded { .. }) => return Err(err),
                Err(err) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    let delay = (INITIAL_RETRY_DELAY * 2u32.pow(attempt - 1)).min(MAX_RETRY_DELAY);
                    warn!(attempt, error = %err, "remote transcriber call failed, retrying");
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once(
        &self,
        wav_bytes: Vec<u8>,
        language: Option<&str>,
        opts: &TranscribeOptions,
    ) -> Result<RawResponse, AdapterError> {
        let file_part = Part::bytes(wav_bytes)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .expect("audio/wav is a valid mime type");

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("temperature", self.config.temperature.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities", "segment");

        if let Some(vad_model) = &self.config.vad_model {
            form = form.text("vad_model", vad_model.clone());
        }
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }
        if let Some(prompt) = &opts.prompt {
            form = form.text("prompt", prompt.clone());
        }
        if opts.task == "translate" {
            form = form.text("task", "translate".to_string());
        }

        let response = self
            .http
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(1.0);
            let detail = response.text().await.unwrap_or_default();
            return Err(AdapterError::Overloaded {
                status: status.as_u16(),
                retry_after_seconds: retry_after,
                detail: detail.chars().take(500).collect(),
            });
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AdapterError::Http {
                status: status.as_u16(),
                detail: detail.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        info!(bytes = body.len(), "remote transcriber response received");
        Ok(serde_json::from_str(&body)?)
    }

    fn response_to_segments(&self, raw: RawResponse, total_duration: f32) -> Vec<Segment> {
        let temperature: f32 = self.config.temperature.parse().unwrap_or(0.0);

        if raw.segments.is_empty() {
            if raw.text.trim().is_empty() {
                return Vec::new();
            }
            let end = if total_duration > 0.0 {
                total_duration
            } else {
                raw.text.len() as f32 * 0.1
            };
            return vec![Segment {
                id: 0,
                seek: 0,
                start: 0.0,
                end,
                text: raw.text,
                tokens: Vec::new(),
                avg_logprob: -0.5,
                compression_ratio: 1.0,
                no_speech_prob: 0.1,
                temperature,
            }];
        }

        let mut segments = Vec::with_capacity(raw.segments.len());
        for (idx, seg) in raw.segments.into_iter().enumerate() {
            let start = seg.audio_start.or(seg.start).unwrap_or(0.0);
            let mut end = seg.audio_end.or(seg.end);

            if end.map_or(true, |e| e <= start) {
                if let Some(seg_duration) = seg.duration.filter(|d| *d > 0.0) {
                    end = Some(start + seg_duration);
                }
            }
            if end.map_or(true, |e| e <= start) {
                end = if total_duration > 0.0 {
                    Some(if start > 0.0 {
                        total_duration.min(start + total_duration)
                    } else {
                        total_duration
                    })
                } else {
                    Some(start + 0.5)
                };
            }
            let end = end.filter(|e| *e > start).unwrap_or(start + 0.5);

            let raw_prob = seg.no_speech_prob.unwrap_or(0.0);
            let mut no_speech_prob = clamp_probability(raw_prob);
            if raw_prob >= 1.0 && !seg.text.trim().is_empty() {
                no_speech_prob = 0.1;
            }

            segments.push(Segment {
                id: idx as u32,
                seek: seg.seek,
                start,
                end,
                text: seg.text,
                tokens: seg.tokens,
                avg_logprob: seg.avg_logprob.unwrap_or(-0.5),
                compression_ratio: seg.compression_ratio.unwrap_or(1.0),
                no_speech_prob,
                temperature,
            });
        }
        segments
    }
}

fn samples_from_reader<R: Read>(
    reader: &mut hound::WavReader<R>,
    bits_per_sample: u16,
) -> Result<Vec<f32>, AdapterError> {
    let samples: Result<Vec<f32>, hound::Error> = match bits_per_sample {
        16 => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        32 => reader.samples::<f32>().collect(),
        _ => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
            .collect(),
    };
    Ok(samples?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteTranscriberConfig {
        RemoteTranscriberConfig {
            api_url: "http://localhost/v1/audio/transcriptions".to_string(),
            api_key: "test-key".to_string(),
            model: "default".to_string(),
            temperature: "0".to_string(),
            vad_model: None,
        }
    }

    #[test]
    fn clamp_probability_caps_above_one() {
        assert_eq!(clamp_probability(1.5), 1.0);
        assert_eq!(clamp_probability(-0.2), 0.0);
        assert_eq!(clamp_probability(0.3), 0.3);
    }

    #[tokio::test]
    async fn bare_text_response_synthesizes_one_segment() {
        let transcriber = RemoteTranscriber::new(config()).unwrap();
        let raw = RawResponse {
            text: "hello world".to_string(),
            language: Some("en".to_string()),
            language_probability: Some(0.9),
            duration: Some(2.0),
            segments: Vec::new(),
        };
        let segments = transcriber.response_to_segments(raw, 2.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, 2.0);
    }

    #[tokio::test]
    async fn saturated_no_speech_prob_with_text_is_overridden() {
        let transcriber = RemoteTranscriber::new(config()).unwrap();
        let raw = RawResponse {
            text: String::new(),
            language: None,
            language_probability: None,
            duration: None,
            segments: vec![RawSegment {
                seek: 0,
                start: Some(0.0),
                end: Some(1.0),
                audio_start: None,
                audio_end: None,
                duration: None,
                text: "hi".to_string(),
                tokens: Vec::new(),
                avg_logprob: Some(-0.2),
                compression_ratio: Some(1.2),
                no_speech_prob: Some(1.4),
            }],
        };
        let segments = transcriber.response_to_segments(raw, 1.0);
        assert_eq!(segments[0].no_speech_prob, 0.1);
    }

    #[tokio::test]
    async fn empty_response_yields_no_segments() {
        let transcriber = RemoteTranscriber::new(config()).unwrap();
        let raw = RawResponse {
            text: String::new(),
            language: None,
            language_probability: None,
            duration: None,
            segments: Vec::new(),
        };
        assert!(transcriber.response_to_segments(raw, 0.0).is_empty());
    }
}
