//! Sample-rate conversion using rubato
//!
//! Used when a background bed and the narration disagree on rate, and
//! when playback hardware cannot run at a buffer's native rate. Buffers
//! are already planar, which is the layout rubato wants.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Resample a buffer to `target_rate`.
///
/// Returns a copy when the buffer is already at the target rate. The
/// whole buffer is converted in one pass with a polynomial resampler,
/// which is plenty for offline clip preparation.
///
/// # Errors
/// Resampler construction or processing failures surface as
/// [`Error::Decode`].
pub fn resample(buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if target_rate == 0 {
        return Err(Error::Decode("target sample rate must be non-zero".to_string()));
    }

    if buffer.sample_rate() == target_rate {
        debug!("already at {} Hz, skipping resample", target_rate);
        return Ok(buffer.clone());
    }

    if buffer.is_empty() {
        let empty = vec![Vec::new(); buffer.channel_count()];
        return SampleBuffer::from_channels(empty, target_rate);
    }

    debug!(
        "resampling {} Hz -> {} Hz ({} channels, {} frames)",
        buffer.sample_rate(),
        target_rate,
        buffer.channel_count(),
        buffer.len()
    );

    let mut resampler = FastFixedIn::<f32>::new(
        target_rate as f64 / buffer.sample_rate() as f64,
        1.0,
        PolynomialDegree::Septic,
        buffer.len(),
        buffer.channel_count(),
    )
    .map_err(|e| Error::Decode(format!("failed to create resampler: {}", e)))?;

    let output = resampler
        .process(buffer.channels(), None)
        .map_err(|e| Error::Decode(format!("resampling failed: {}", e)))?;

    SampleBuffer::from_channels(output, target_rate)
}
