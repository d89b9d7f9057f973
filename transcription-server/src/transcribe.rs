use crate::error::{HttpError, HttpResult};
use crate::fallback::{decode_with_temperature_fallback, Classification};
use crate::headers::RequestId;
use crate::language_detection::{probe_language, report_language};
use crate::state::AppState;
use crate::{Context, AUDIO_TAG};
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum_extra::TypedHeader;
use tracing::{info, instrument, Span};
use transcription_core::{
    audio, DecodeOptions, LanguageProbeOptions, RawSegment, Task, TranscriptionResponse,
};

/// A parsed `multipart/form-data` transcription request, before audio decoding.
struct TranscriptionRequest {
    file: Vec<u8>,
    language: Option<String>,
    task: Task,
    prompt: Option<String>,
    temperature: f32,
}

impl TranscriptionRequest {
    async fn try_from_multipart(mut multipart: Multipart) -> HttpResult<Self> {
        let mut file: Option<Vec<u8>> = None;
        let mut language: Option<String> = None;
        let mut task = Task::Transcribe;
        let mut prompt: Option<String> = None;
        let mut temperature: f32 = 0.0;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    file = Some(field.bytes().await?.to_vec());
                }
                "language" => {
                    let value = field.text().await?;
                    if !value.is_empty() {
                        language = Some(value);
                    }
                }
                "task" => {
                    let value = field.text().await?;
                    task = match value.as_str() {
                        "translate" => Task::Translate,
                        _ => Task::Transcribe,
                    };
                }
                "prompt" => {
                    let value = field.text().await?;
                    if !value.is_empty() {
                        prompt = Some(value);
                    }
                }
                "temperature" => {
                    let value = field.text().await?;
                    temperature = value.parse::<f32>()?;
                }
                // model / response_format / timestamp_granularities are accepted for
                // compatibility but have no effect: one decoder per process, and the
                // response is always the full verbose-json segment shape.
                _ => {
                    let _ = field.bytes().await?;
                }
            }
        }

        let file = file.ok_or_else(|| HttpError::Validation("missing \"file\" field".into()))?;
        Self {
            file,
            language,
            task,
            prompt,
            temperature,
        }
        .validate()
    }

    fn validate(self) -> HttpResult<Self> {
        if self.file.is_empty() {
            return Err(HttpError::Validation("uploaded file is empty".into()));
        }
        Ok(self)
    }
}

#[utoipa::path(
    post,
    path = "/v1/audio/transcriptions",
    tag = AUDIO_TAG,
    responses(
        (status = OK, description = "Transcription completed", body = TranscriptionResponse),
        (status = 400, description = "Validation or decode error"),
        (status = 401, description = "Missing or invalid API token"),
        (status = 503, description = "Server is at capacity"),
    )
)]
#[instrument(
    skip(state, headers, request_id, multipart),
    fields(request_id = tracing::field::Empty)
)]
pub async fn transcribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    request_id: TypedHeader<RequestId>,
    multipart: Multipart,
) -> HttpResult<Json<TranscriptionResponse>> {
    let ctx = Context::new(request_id.0);
    Span::current().record("request_id", ctx.request_id());

    crate::auth::verify(&headers, &state.auth)?;

    let request = TranscriptionRequest::try_from_multipart(multipart).await?;
    let permit = state.admission.admit().await?;

    let decoder = state
        .decoder
        .get()
        .ok_or(HttpError::NoResponse)?;
    let decode_options = state.decode_options.clone();
    let language_detection = state.language_detection.clone();

    let response = tokio::task::spawn_blocking(move || -> HttpResult<TranscriptionResponse> {
        let (samples, source_rate) = audio::decode_audio(request.file)?;
        let audio_samples = audio::resample_to_16k(&samples, source_rate);

        if audio_samples.is_empty() {
            return Ok(TranscriptionResponse::silent("en".to_string()));
        }

        let (language_hint, low_confidence) = match &request.language {
            Some(language) => (Some(language.clone()), false),
            None => {
                let probe_opts = LanguageProbeOptions {
                    vad_filter: decode_options.vad_filter,
                    vad_threshold: decode_options.vad_filter_threshold,
                    vad_min_silence_ms: decode_options.vad_min_silence_duration_ms,
                };
                let probe = probe_language(
                    decoder.as_ref(),
                    &audio_samples,
                    &language_detection,
                    &probe_opts,
                );
                (probe.hint, probe.low_confidence)
            }
        };

        let base_opts = DecodeOptions {
            language: language_hint,
            task: request.task,
            prompt: request.prompt,
            temperature: request.temperature,
            beam_size: decode_options.beam_size,
            best_of: decode_options.best_of,
            compression_ratio_threshold: decode_options.compression_ratio_threshold,
            log_prob_threshold: decode_options.log_prob_threshold,
            no_speech_threshold: decode_options.no_speech_threshold,
            condition_on_previous_text: decode_options.condition_on_previous_text,
            prompt_reset_on_temperature: decode_options.prompt_reset_on_temperature,
            vad_filter: decode_options.vad_filter,
            word_timestamps: false,
        };

        let attempt = decode_with_temperature_fallback(
            decoder.as_ref(),
            &audio_samples,
            base_opts,
            decode_options.use_temperature_fallback,
            request.temperature,
        )?;

        let (language, language_probability) =
            report_language(low_confidence, &attempt.outcome.language);

        if attempt.classification == Classification::Silence {
            return Ok(TranscriptionResponse::silent(language));
        }

        let raw_segments: Vec<RawSegment> = attempt
            .outcome
            .segments
            .into_iter()
            .map(|segment| RawSegment {
                start: segment.start,
                end: segment.end,
                text: segment.text,
                temperature: attempt.temperature,
                avg_logprob: segment.avg_logprob,
                compression_ratio: segment.compression_ratio,
                no_speech_prob: segment.no_speech_prob,
            })
            .collect();

        Ok(TranscriptionResponse::assemble(
            language,
            language_probability,
            raw_segments,
        ))
    })
    .await
    .map_err(|_| HttpError::NoResponse)??;

    drop(permit);
    info!(segments = response.segments.len(), "transcription complete");
    Ok(Json(response))
}
