//! Loop a buffer out to a target duration
//!
//! Background audio rarely matches the narration it sits under, so it is
//! tiled out to the target length, optionally blending each loop seam
//! with a linear crossfade.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use fabula_common::timing;
use tracing::debug;

/// Tile `buffer` to exactly `ceil(target_secs * rate)` samples.
///
/// Without crossfade this is a plain wraparound copy
/// (`out[i] = src[i % len]`); a source longer than the target truncates.
///
/// With crossfade, seams stay at whole multiples of the source length and
/// each seam that is followed by more output gets a blend window of
/// `cf = min(floor(crossfade_secs * rate), len)` samples starting at the
/// seam: at window offset `j` with `p = j / cf`,
/// `out = src[len-1] * (1 - p) + src[j] * p`. The outgoing side holds the
/// source's final sample (continuation indices clamp instead of wrapping)
/// while the next iteration's head ramps in, so the output is continuous
/// across every seam regardless of material.
///
/// # Errors
/// `InvalidBuffer` for a zero-length source, `InvalidRange` for a
/// negative target or crossfade duration.
pub fn loop_to_length(
    buffer: &SampleBuffer,
    target_secs: f64,
    crossfade: bool,
    crossfade_secs: f64,
) -> Result<SampleBuffer> {
    if buffer.is_empty() {
        return Err(Error::InvalidBuffer("cannot loop a zero-length buffer".to_string()));
    }
    if target_secs < 0.0 {
        return Err(Error::InvalidRange(format!(
            "loop target must be >= 0 (got {:.3}s)",
            target_secs
        )));
    }
    if crossfade && crossfade_secs < 0.0 {
        return Err(Error::InvalidRange(format!(
            "crossfade must be >= 0 (got {:.3}s)",
            crossfade_secs
        )));
    }

    let rate = buffer.sample_rate();
    let src_len = buffer.len();
    let out_len = timing::sample_span(target_secs, rate);
    let cf = if crossfade {
        timing::sample_index(crossfade_secs, rate).min(src_len)
    } else {
        0
    };

    debug!(
        "looping {} samples to {} ({} seams, {}-sample crossfade)",
        src_len,
        out_len,
        out_len.saturating_sub(1) / src_len,
        cf
    );

    let mut out = SampleBuffer::silent(buffer.channel_count(), out_len, rate);

    for (index, src) in buffer.channels().iter().enumerate() {
        let dst = out.channel_mut(index);
        for (i, sample) in dst.iter_mut().enumerate() {
            *sample = src[i % src_len];
        }

        if cf > 0 {
            let outgoing = src[src_len - 1];
            let mut seam = src_len;
            while seam < out_len {
                for j in 0..cf.min(out_len - seam) {
                    let p = j as f32 / cf as f32;
                    dst[seam + j] = outgoing * (1.0 - p) + src[j] * p;
                }
                seam += src_len;
            }
        }
    }

    Ok(out)
}
