//! Waveform envelope downsampling
//!
//! Reduces a buffer to a fixed number of magnitude buckets for bar-style
//! waveform rendering. Strictly display-oriented and one-way.

use crate::audio::types::SampleBuffer;

/// Downsample channel 0 into exactly `width_buckets` magnitude values.
///
/// Each bucket is the mean absolute value of `len / width_buckets`
/// (floored) consecutive samples. Buckets whose group is empty, which
/// happens for every bucket when the buffer is shorter than the bucket
/// count, are 0. Trailing samples that do not fill a whole group are
/// ignored.
pub fn compute_envelope(buffer: &SampleBuffer, width_buckets: usize) -> Vec<f32> {
    if width_buckets == 0 {
        return Vec::new();
    }

    let bucket_size = buffer.len() / width_buckets;
    let samples = buffer.channel(0);

    (0..width_buckets)
        .map(|bucket| {
            if bucket_size == 0 {
                return 0.0;
            }
            let start = bucket * bucket_size;
            let sum: f64 = samples[start..start + bucket_size]
                .iter()
                .map(|s| f64::from(s.abs()))
                .sum();
            (sum / bucket_size as f64) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_length_is_always_bucket_count() {
        let buffer = SampleBuffer::from_mono(vec![0.5; 10], 44100);
        assert_eq!(compute_envelope(&buffer, 4).len(), 4);
        assert_eq!(compute_envelope(&buffer, 10).len(), 10);
        assert_eq!(compute_envelope(&buffer, 64).len(), 64);
    }

    #[test]
    fn test_short_buffer_yields_zeros() {
        let buffer = SampleBuffer::from_mono(vec![0.9, 0.9, 0.9], 44100);
        let envelope = compute_envelope(&buffer, 8);
        assert_eq!(envelope, vec![0.0; 8]);
    }

    #[test]
    fn test_bucket_means_use_absolute_values() {
        let buffer = SampleBuffer::from_mono(vec![0.2, -0.4, 0.6, -0.8], 44100);
        let envelope = compute_envelope(&buffer, 2);
        assert!((envelope[0] - 0.3).abs() < 1e-6);
        assert!((envelope[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_trailing_remainder_is_ignored() {
        // 5 samples, 2 buckets of 2; the final 0.9 falls outside both
        let buffer = SampleBuffer::from_mono(vec![1.0, 1.0, 0.0, 0.0, 0.9], 44100);
        let envelope = compute_envelope(&buffer, 2);
        assert_eq!(envelope, vec![1.0, 0.0]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let samples: Vec<f32> = (0..1000).map(|i| ((i * 37) % 100) as f32 / 100.0).collect();
        let buffer = SampleBuffer::from_mono(samples, 44100);
        assert_eq!(compute_envelope(&buffer, 60), compute_envelope(&buffer, 60));
    }

    #[test]
    fn test_zero_buckets_is_empty() {
        let buffer = SampleBuffer::from_mono(vec![0.5; 10], 44100);
        assert!(compute_envelope(&buffer, 0).is_empty());
    }

    #[test]
    fn test_only_channel_zero_is_read() {
        let buffer = SampleBuffer::from_channels(
            vec![vec![0.5, 0.5], vec![1.0, 1.0]],
            44100,
        )
        .unwrap();
        let envelope = compute_envelope(&buffer, 1);
        assert!((envelope[0] - 0.5).abs() < 1e-6);
    }
}
