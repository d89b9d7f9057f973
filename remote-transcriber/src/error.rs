use thiserror::Error;

/// Errors surfaced by [`crate::client::RemoteTranscriber::transcribe`].
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("remote transcriber overloaded (HTTP {status}, retry_after={retry_after_seconds}s): {detail}")]
    Overloaded {
        status: u16,
        retry_after_seconds: f64,
        detail: String,
    },

    #[error("remote transcriber returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("request to remote transcriber failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read audio source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode audio as WAV: {0}")]
    WavEncode(#[from] hound::Error),

    #[error("failed to parse remote transcriber response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}
