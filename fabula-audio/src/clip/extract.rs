//! Sub-range extraction

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use fabula_common::timing;
use tracing::debug;

/// Copy the `[start_secs, end_secs)` range of a buffer into a new buffer.
///
/// Times are clamped into `[0, duration]`, then converted to sample
/// indices by flooring, so the output holds exactly
/// `floor(end*rate) - floor(start*rate)` samples per channel.
///
/// # Errors
/// `InvalidRange` when `start >= end` after clamping.
pub fn extract_range(buffer: &SampleBuffer, start_secs: f64, end_secs: f64) -> Result<SampleBuffer> {
    let duration = buffer.duration_seconds();
    let start = start_secs.clamp(0.0, duration);
    let end = end_secs.clamp(0.0, duration);

    if start >= end {
        return Err(Error::InvalidRange(format!(
            "start {:.3}s is not before end {:.3}s (buffer is {:.3}s)",
            start, end, duration
        )));
    }

    let rate = buffer.sample_rate();
    // min() guards the float round-trip at the very end of the buffer
    let start_sample = timing::sample_index(start, rate).min(buffer.len());
    let end_sample = timing::sample_index(end, rate).min(buffer.len());

    debug!(
        "extracting [{:.3}s, {:.3}s) -> samples [{}, {}) of {}",
        start,
        end,
        start_sample,
        end_sample,
        buffer.len()
    );

    let channels = buffer
        .channels()
        .iter()
        .map(|channel| channel[start_sample..end_sample.max(start_sample)].to_vec())
        .collect();
    SampleBuffer::from_channels(channels, rate)
}
