use crate::error::DecodeAudioError;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decodes an arbitrary-format audio payload into mono `f32` samples plus its native sample
/// rate. The decoding library (symphonia) is intentionally tolerant of container/codec details;
/// callers resample to 16 kHz with [`resample_to_16k`] before handing samples to a decoder.
pub fn decode_audio(bytes: Vec<u8>) -> Result<(Vec<f32>, u32), DecodeAudioError> {
    let cursor = std::io::Cursor::new(bytes);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeAudioError::UnsupportedFormat(e.to_string()))?;

    let track = probed
        .format
        .default_track()
        .ok_or(DecodeAudioError::NoDecodableTrack)?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeAudioError::UnsupportedFormat("missing sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeAudioError::UnsupportedFormat(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeAudioError::UnsupportedFormat(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_as_mono(&decoded, &mut samples),
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeAudioError::UnsupportedFormat(e.to_string())),
        }
    }

    Ok((samples, sample_rate))
}

fn append_as_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::U8(buf) => mix_scaled(buf.planes().planes(), out, |s| {
            (s as f32 - 128.0) / 128.0
        }),
        AudioBufferRef::S16(buf) => mix_scaled(buf.planes().planes(), out, |s| s as f32 / 32768.0),
        AudioBufferRef::S32(buf) => {
            mix_scaled(buf.planes().planes(), out, |s| s as f32 / 2_147_483_648.0)
        }
        _ => {}
    }
}

fn mix_planes(planes: &[&[f32]], out: &mut Vec<f32>) {
    if planes.is_empty() {
        return;
    }
    let len = planes[0].len();
    for i in 0..len {
        let sum: f32 = planes.iter().map(|p| p[i]).sum();
        out.push(sum / planes.len() as f32);
    }
}

fn mix_scaled<T: Copy>(planes: &[&[T]], out: &mut Vec<f32>, to_f32: impl Fn(T) -> f32) {
    if planes.is_empty() {
        return;
    }
    let len = planes[0].len();
    for i in 0..len {
        let sum: f32 = planes.iter().map(|p| to_f32(p[i])).sum();
        out.push(sum / planes.len() as f32);
    }
}

/// Resamples mono audio to 16 kHz via linear interpolation, matching the reference service's
/// `_resample_to_16k` (itself a thin wrapper over `np.interp`). A windowed-sinc resample would
/// be higher fidelity, but language-detection and hallucination-filtering behavior were tuned
/// against the cheap linear resample, so we keep it identical rather than "improve" it.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_SAMPLE_RATE || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let out_len = ((samples.len() as f64) * ratio).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(out_len);
    let last_idx = samples.len() - 1;
    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let lo = src_pos.floor() as usize;
        let hi = (lo + 1).min(last_idx);
        let frac = (src_pos - lo as f64) as f32;
        let lo_val = samples[lo.min(last_idx)];
        let hi_val = samples[hi];
        out.push(lo_val + (hi_val - lo_val) * frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_when_already_target_rate() {
        let samples = vec![0.1, 0.2, 0.3];
        let out = resample_to_16k(&samples, TARGET_SAMPLE_RATE);
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_upsamples_linearly() {
        let samples = vec![0.0, 1.0];
        let out = resample_to_16k(&samples, 8_000);
        assert_eq!(out.len(), 4);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out.last().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn resample_empty_input_is_empty_output() {
        assert!(resample_to_16k(&[], 8_000).is_empty());
    }
}
