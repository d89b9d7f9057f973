use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One contiguous transcribed interval together with its timing and confidence metadata.
///
/// `audio_start` / `audio_end` duplicate `start` / `end` verbatim; they exist only so
/// adapter-side consumers that key off the `audio_*` fields (see `remote-transcriber`) don't
/// need a server-specific parser.
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Segment {
    pub id: u32,
    pub seek: u32,
    pub start: f32,
    pub end: f32,
    pub text: String,
    pub tokens: Vec<u32>,
    pub temperature: f32,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
    pub audio_start: f32,
    pub audio_end: f32,
}

impl Segment {
    /// Builds a segment from decoder output, deriving the duplicate `audio_*` fields.
    pub fn from_decoded(
        id: u32,
        start: f32,
        end: f32,
        text: String,
        temperature: f32,
        avg_logprob: f32,
        compression_ratio: f32,
        no_speech_prob: f32,
    ) -> Self {
        Self {
            id,
            seek: 0,
            start,
            end,
            text,
            tokens: Vec::new(),
            temperature,
            avg_logprob,
            compression_ratio,
            no_speech_prob: no_speech_prob.clamp(0.0, 1.0),
            audio_start: start,
            audio_end: end,
        }
    }
}

/// Aggregate transcription result returned for one request.
#[cfg_attr(debug_assertions, derive(Debug))]
#[derive(Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionResponse {
    pub text: String,
    pub language: String,
    pub language_probability: f32,
    pub duration: f32,
    pub segments: Vec<Segment>,
}

impl TranscriptionResponse {
    /// Assembles a response from decoded segments, enforcing the dense-id-prefix and
    /// non-decreasing-`end` invariants in one place rather than per segment.
    ///
    /// `raw_segments` must already be ordered by `start`; ids are reassigned 0..n regardless
    /// of whatever id the decoder attached.
    pub fn assemble(
        language: String,
        language_probability: f32,
        raw_segments: Vec<RawSegment>,
    ) -> Self {
        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut last_end = f32::MIN;
        for (idx, raw) in raw_segments.into_iter().enumerate() {
            let end = raw.end.max(last_end);
            last_end = end;
            segments.push(Segment::from_decoded(
                idx as u32,
                raw.start,
                end,
                raw.text,
                raw.temperature,
                raw.avg_logprob,
                raw.compression_ratio,
                raw.no_speech_prob,
            ));
        }

        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        let duration = segments.last().map(|s| s.end).unwrap_or(0.0);

        Self {
            text,
            language,
            language_probability,
            duration,
            segments,
        }
    }

    /// An empty response, used for the silence fast-path.
    pub fn silent(language: String) -> Self {
        Self {
            text: String::new(),
            language,
            language_probability: 0.0,
            duration: 0.0,
            segments: Vec::new(),
        }
    }
}

/// Pre-assembly segment data, before ids are assigned and the `end` cascade is applied.
#[derive(Clone, Debug)]
pub struct RawSegment {
    pub start: f32,
    pub end: f32,
    pub text: String,
    pub temperature: f32,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(start: f32, end: f32, text: &str) -> RawSegment {
        RawSegment {
            start,
            end,
            text: text.to_string(),
            temperature: 0.0,
            avg_logprob: -0.2,
            compression_ratio: 1.0,
            no_speech_prob: 0.1,
        }
    }

    #[test]
    fn assemble_assigns_dense_ids() {
        let resp = TranscriptionResponse::assemble(
            "en".into(),
            0.9,
            vec![raw(0.0, 1.0, "hello"), raw(1.0, 2.5, "world")],
        );
        assert_eq!(resp.segments[0].id, 0);
        assert_eq!(resp.segments[1].id, 1);
        assert_eq!(resp.text, "hello world");
        assert_eq!(resp.duration, 2.5);
    }

    #[test]
    fn assemble_enforces_non_decreasing_end() {
        let resp = TranscriptionResponse::assemble(
            "en".into(),
            0.9,
            vec![raw(0.0, 2.0, "a"), raw(2.0, 1.0, "b")],
        );
        assert!(resp.segments[1].end >= resp.segments[0].end);
    }

    #[test]
    fn silent_response_has_zero_sentinel() {
        let resp = TranscriptionResponse::silent("en".into());
        assert_eq!(resp.language_probability, 0.0);
        assert_eq!(resp.duration, 0.0);
        assert!(resp.segments.is_empty());
    }
}
