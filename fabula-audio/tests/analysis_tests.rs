//! Analysis behavior over real signal shapes: static metrics, envelope
//! rendering, and the live monitor loop.

use std::time::Duration;

use fabula_audio::analysis::{
    compute_envelope, compute_static_metrics, run_monitor, LevelMonitor, LiveMetrics,
    MonitorParams, QualityRating,
};
use fabula_audio::audio::wav::encode_wav;
use fabula_audio::audio::AudioDecoder;
use fabula_audio::SampleBuffer;
use tokio::sync::watch;

fn sine_buffer(seconds: f64, frequency: f32, amplitude: f32) -> SampleBuffer {
    let rate = 44100u32;
    let frames = (seconds * rate as f64) as usize;
    let samples = (0..frames)
        .map(|i| {
            amplitude * (2.0 * std::f32::consts::PI * frequency * i as f32 / rate as f32).sin()
        })
        .collect();
    SampleBuffer::from_mono(samples, rate)
}

#[test]
fn test_sine_metrics_match_theory() {
    let buffer = sine_buffer(1.0, 440.0, 0.5);
    let metrics = compute_static_metrics(&buffer).unwrap();

    assert!((metrics.peak - 0.5).abs() < 0.01);
    assert!((metrics.rms - 0.3536).abs() < 0.01);
    assert!(!metrics.has_clipping);
    // peak over RMS of a sine is sqrt(2), about 3 dB
    assert!((metrics.dynamic_range_db - 3.0).abs() < 0.1);
}

#[test]
fn test_envelope_follows_loud_and_quiet_sections() {
    let mut samples = vec![0.8f32; 500];
    samples.extend(vec![0.1f32; 500]);
    let buffer = SampleBuffer::from_mono(samples, 1000);

    let envelope = compute_envelope(&buffer, 10);
    assert_eq!(envelope.len(), 10);
    for &bucket in &envelope[..5] {
        assert!((bucket - 0.8).abs() < 1e-6);
    }
    for &bucket in &envelope[5..] {
        assert!((bucket - 0.1).abs() < 1e-6);
    }
}

#[test]
fn test_clipping_flag_survives_wav_round_trip() {
    let mut samples = vec![0.2f32; 1000];
    samples[500] = 0.995;
    let buffer = SampleBuffer::from_mono(samples, 44100);
    assert!(compute_static_metrics(&buffer).unwrap().has_clipping);

    let decoded = AudioDecoder::decode_bytes(encode_wav(&buffer), Some("wav")).unwrap();
    assert!(compute_static_metrics(&decoded).unwrap().has_clipping);
}

#[tokio::test]
async fn test_run_monitor_settles_on_excellent_for_clean_levels() {
    let mut monitor = LevelMonitor::new(MonitorParams::default());

    // Quiet room tone through the warmup window, then clean speech
    let mut frames: Vec<Vec<f32>> = vec![vec![0.0001; 64]; 30];
    frames.push(vec![0.3; 64]);
    let mut iter = frames.into_iter();

    let (tx, rx) = watch::channel(LiveMetrics::initial());
    run_monitor(&mut monitor, || iter.next(), &tx, Duration::from_millis(1)).await;

    let last = monitor.current();
    assert!((last.current_level - 30.0).abs() < 1e-3);
    assert_eq!(last.rating, QualityRating::Excellent);
    assert!(!last.is_clipping);
    assert!((last.snr_db - 49.54).abs() < 0.05);
    assert_eq!(*rx.borrow(), last, "receiver sees the final update");
}
