//! Static quality metrics over a recorded buffer

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use fabula_common::levels;
use serde::Serialize;

/// Guard against divide-by-zero in the dynamic range ratio.
const DYNAMIC_RANGE_EPSILON: f32 = 1e-4;

/// Samples strictly above this magnitude count as clipped.
const CLIP_THRESHOLD: f32 = 0.99;

/// Whole-buffer quality summary, recomputed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub rms: f32,
    pub peak: f32,
    pub dynamic_range_db: f32,
    pub has_clipping: bool,
}

/// Analyze channel 0 of a buffer in a single pass.
///
/// # Errors
/// Returns [`Error::InvalidBuffer`] for a zero-length buffer, where RMS
/// is undefined.
pub fn compute_static_metrics(buffer: &SampleBuffer) -> Result<QualityMetrics> {
    if buffer.is_empty() {
        return Err(Error::InvalidBuffer(
            "cannot compute metrics for an empty buffer".to_string(),
        ));
    }

    let samples = buffer.channel(0);
    let rms = levels::rms(samples);
    let peak = levels::peak(samples);

    Ok(QualityMetrics {
        rms,
        peak,
        dynamic_range_db: levels::ratio_to_db(peak / (rms + DYNAMIC_RANGE_EPSILON)),
        has_clipping: samples.iter().any(|s| s.abs() > CLIP_THRESHOLD),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_buffer_metrics() {
        let buffer = SampleBuffer::from_mono(vec![0.5; 1000], 44100);
        let metrics = compute_static_metrics(&buffer).unwrap();
        assert!((metrics.rms - 0.5).abs() < 1e-6);
        assert!((metrics.peak - 0.5).abs() < 1e-6);
        // peak == rms, so dynamic range sits just below 0 dB
        assert!(metrics.dynamic_range_db.abs() < 0.01);
        assert!(!metrics.has_clipping);
    }

    #[test]
    fn test_clipping_threshold_is_exclusive() {
        let at_threshold = SampleBuffer::from_mono(vec![0.1, 0.99, 0.1], 44100);
        assert!(!compute_static_metrics(&at_threshold).unwrap().has_clipping);

        let above_threshold = SampleBuffer::from_mono(vec![0.1, 0.995, 0.1], 44100);
        assert!(compute_static_metrics(&above_threshold).unwrap().has_clipping);

        let full_scale = SampleBuffer::from_mono(vec![0.1, 1.0, 0.1], 44100);
        assert!(compute_static_metrics(&full_scale).unwrap().has_clipping);
    }

    #[test]
    fn test_negative_samples_count_toward_clipping() {
        let buffer = SampleBuffer::from_mono(vec![-0.999, 0.0], 44100);
        assert!(compute_static_metrics(&buffer).unwrap().has_clipping);
    }

    #[test]
    fn test_silent_buffer() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 100], 44100);
        let metrics = compute_static_metrics(&buffer).unwrap();
        assert_eq!(metrics.rms, 0.0);
        assert_eq!(metrics.peak, 0.0);
        assert_eq!(metrics.dynamic_range_db, f32::NEG_INFINITY);
        assert!(!metrics.has_clipping);
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let buffer = SampleBuffer::from_mono(vec![], 44100);
        assert!(matches!(
            compute_static_metrics(&buffer),
            Err(Error::InvalidBuffer(_))
        ));
    }

    #[test]
    fn test_only_channel_zero_is_analyzed() {
        let buffer = SampleBuffer::from_channels(
            vec![vec![0.1, 0.1], vec![1.0, 1.0]],
            44100,
        )
        .unwrap();
        let metrics = compute_static_metrics(&buffer).unwrap();
        assert!(!metrics.has_clipping);
        assert!((metrics.peak - 0.1).abs() < 1e-6);
    }
}
