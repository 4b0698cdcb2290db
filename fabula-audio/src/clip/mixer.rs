//! N-source gain mixing
//!
//! Sums gain-weighted sources sample by sample and hard-clamps the sum to
//! [-1, 1]. There is deliberately no limiter or soft knee on any path;
//! callers needing louder mixes pre-attenuate their gains.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use tracing::debug;

/// Mix sources with per-source gains.
///
/// The output spans the longest input (exhausted inputs contribute 0) and
/// carries the widest channel count. Mono inputs broadcast channel 0 to
/// every output channel; a wider input contributes only the channels it
/// actually has. Every output sample is the gain-weighted sum across
/// sources, hard-clamped to [-1, 1].
///
/// # Errors
/// `InvalidBuffer` when there are no sources, the gain count differs from
/// the source count, any source is zero-length, or sample rates differ
/// (resample first; see `audio::resampler`).
pub fn mix(buffers: &[&SampleBuffer], gains: &[f32]) -> Result<SampleBuffer> {
    if buffers.is_empty() {
        return Err(Error::InvalidBuffer("mix requires at least one source".to_string()));
    }
    if gains.len() != buffers.len() {
        return Err(Error::InvalidBuffer(format!(
            "{} gains for {} sources",
            gains.len(),
            buffers.len()
        )));
    }
    if let Some(index) = buffers.iter().position(|b| b.is_empty()) {
        return Err(Error::InvalidBuffer(format!(
            "source {} is zero-length",
            index
        )));
    }
    let rate = buffers[0].sample_rate();
    if let Some(other) = buffers.iter().find(|b| b.sample_rate() != rate) {
        return Err(Error::InvalidBuffer(format!(
            "sample rate mismatch: {} Hz vs {} Hz",
            rate,
            other.sample_rate()
        )));
    }

    let out_len = buffers.iter().map(|b| b.len()).max().unwrap_or(0);
    let out_channels = buffers.iter().map(|b| b.channel_count()).max().unwrap_or(1);

    debug!(
        "mixing {} sources -> {} samples x {} channels",
        buffers.len(),
        out_len,
        out_channels
    );

    let mut out = SampleBuffer::silent(out_channels, out_len, rate);

    for (buffer, &gain) in buffers.iter().zip(gains) {
        for channel_index in 0..out_channels {
            let source = if buffer.channel_count() == 1 {
                // Mono broadcasts to every output channel
                buffer.channel(0)
            } else if channel_index < buffer.channel_count() {
                buffer.channel(channel_index)
            } else {
                continue;
            };
            let dst = out.channel_mut(channel_index);
            for (acc, &sample) in dst.iter_mut().zip(source) {
                *acc += sample * gain;
            }
        }
    }

    for channel in out.channels_mut() {
        for sample in channel.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    Ok(out)
}

/// Two-source convenience over the same mixing path (identical clamping).
pub fn mix_pair(
    a: &SampleBuffer,
    b: &SampleBuffer,
    gain_a: f32,
    gain_b: f32,
) -> Result<SampleBuffer> {
    mix(&[a, b], &[gain_a, gain_b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum_is_exact_below_clipping() {
        let a = SampleBuffer::from_mono(vec![0.2; 100], 1000);
        let b = SampleBuffer::from_mono(vec![0.4; 100], 1000);
        let out = mix_pair(&a, &b, 0.5, 0.25).unwrap();
        for &sample in out.channel(0) {
            assert!((sample - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sums_above_one_are_clamped() {
        let a = SampleBuffer::from_mono(vec![0.9; 100], 1000);
        let b = SampleBuffer::from_mono(vec![0.9; 100], 1000);
        let out = mix_pair(&a, &b, 1.0, 1.0).unwrap();
        assert!(out.channel(0).iter().all(|&s| s == 1.0));

        let negative = SampleBuffer::from_mono(vec![-0.9; 100], 1000);
        let out = mix_pair(&negative, &negative, 1.0, 1.0).unwrap();
        assert!(out.channel(0).iter().all(|&s| s == -1.0));
    }

    #[test]
    fn test_output_spans_longest_input() {
        let short = SampleBuffer::from_mono(vec![0.5; 50], 1000);
        let long = SampleBuffer::from_mono(vec![0.25; 200], 1000);
        let out = mix_pair(&short, &long, 1.0, 1.0).unwrap();
        assert_eq!(out.len(), 200);
        assert!((out.channel(0)[0] - 0.75).abs() < 1e-6);
        // Short source exhausted: only the long one remains
        assert!((out.channel(0)[100] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_mono_broadcasts_to_all_channels() {
        let mono = SampleBuffer::from_mono(vec![0.5; 10], 1000);
        let stereo =
            SampleBuffer::from_channels(vec![vec![0.1; 10], vec![0.2; 10]], 1000).unwrap();
        let out = mix_pair(&mono, &stereo, 1.0, 1.0).unwrap();
        assert_eq!(out.channel_count(), 2);
        assert!((out.channel(0)[0] - 0.6).abs() < 1e-6);
        assert!((out.channel(1)[0] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_narrow_input_leaves_missing_channels_untouched() {
        let stereo =
            SampleBuffer::from_channels(vec![vec![0.1; 10], vec![0.2; 10]], 1000).unwrap();
        let three = SampleBuffer::from_channels(
            vec![vec![0.3; 10], vec![0.3; 10], vec![0.3; 10]],
            1000,
        )
        .unwrap();
        let out = mix_pair(&stereo, &three, 1.0, 1.0).unwrap();
        assert_eq!(out.channel_count(), 3);
        // Channel 2 only hears the three-channel source
        assert!((out.channel(2)[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_no_sources_rejected() {
        let err = mix(&[], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn test_gain_count_mismatch_rejected() {
        let a = SampleBuffer::from_mono(vec![0.1; 10], 1000);
        let err = mix(&[&a], &[1.0, 0.5]).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn test_zero_length_source_rejected() {
        let a = SampleBuffer::from_mono(vec![0.1; 10], 1000);
        let empty = SampleBuffer::from_mono(vec![], 1000);
        let err = mix_pair(&a, &empty, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let a = SampleBuffer::from_mono(vec![0.1; 10], 44100);
        let b = SampleBuffer::from_mono(vec![0.1; 10], 48000);
        let err = mix_pair(&a, &b, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn test_single_source_with_gain() {
        let a = SampleBuffer::from_mono(vec![0.5; 10], 1000);
        let out = mix(&[&a], &[0.5]).unwrap();
        assert!(out.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }
}
