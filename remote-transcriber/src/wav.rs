use crate::error::AdapterError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Encodes mono `f32` samples in `[-1, 1]` as 16-bit PCM WAV bytes in memory, matching the
/// reference adapter's `_numpy_to_wav_bytes` (no temp files on the hot path).
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AdapterError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let pcm = (clamped * 32767.0) as i16;
            writer.write_sample(pcm)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_riff_header() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5], 16_000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn clamps_out_of_range_samples() {
        let bytes = encode_wav(&[2.0, -2.0], 16_000).unwrap();
        assert!(!bytes.is_empty());
    }
}
