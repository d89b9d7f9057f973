use axum::extract::multipart::MultipartError;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::num::ParseFloatError;
use thiserror::Error;
use transcription_core::environ::EnvironmentError;
use transcription_core::{DecodeAudioError, DecoderError};

/// Errors surfaced by the transcription HTTP surface, one variant per entry in the error
/// taxonomy: admission-shed, validation, auth, and fatal-decoder.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment configuration error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Malformed multipart/form-data payload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Decode(#[from] DecodeAudioError),

    #[error("Decoder invocation failed: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Missing or invalid authentication token")]
    Unauthorized,

    #[error("Server is at capacity")]
    Overloaded { retry_after_seconds: f64 },

    #[error("No response was returned by the decoder worker pool")]
    NoResponse,
}

impl From<ParseFloatError> for HttpError {
    fn from(value: ParseFloatError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
            Self::Environment(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            Self::Multipart(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e).into_response(),
            Self::Decode(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            Self::Decoder(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::Overloaded {
                retry_after_seconds,
            } => {
                let retry_after = retry_after_seconds.max(1.0).ceil() as u64;
                let mut response =
                    (StatusCode::SERVICE_UNAVAILABLE, "Server is at capacity").into_response();
                response.headers_mut().insert(
                    "Retry-After",
                    HeaderValue::from_str(&retry_after.to_string())
                        .expect("integer retry-after is a valid header value"),
                );
                response
            }
            Self::NoResponse => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
