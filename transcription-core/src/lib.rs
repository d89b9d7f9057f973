pub mod audio;
pub mod decoder;
pub mod environ;
pub mod error;
pub mod segment;

pub use decoder::{
    DecodeOptions, DecodeOutcome, DecodedSegment, Decoder, DecoderIdentity, LanguageProbeOptions,
    Task,
};
pub use error::{DecodeAudioError, DecoderError};
pub use segment::{RawSegment, Segment, TranscriptionResponse};
