use thiserror::Error;

/// Errors raised by a [`crate::decoder::Decoder`] implementation.
#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("decoder backend failed to initialize: {0}")]
    Initialization(String),

    #[error("decoder rejected the audio buffer: {0}")]
    InvalidAudio(String),

    #[error("decoder invocation failed: {0}")]
    Inference(String),
}

/// Errors raised while decoding an uploaded audio payload into samples.
#[derive(Error, Debug)]
pub enum DecodeAudioError {
    #[error("unsupported or corrupt audio container: {0}")]
    UnsupportedFormat(String),

    #[error("audio stream carries no decodable track")]
    NoDecodableTrack,

    #[error("i/o error while reading audio: {0}")]
    Io(#[from] std::io::Error),
}
