//! In-place fade application
//!
//! Fades scale the head and tail of a buffer with a gain ramp. The ramp
//! shape comes from [`FadeCurve`]; all boundary guarantees below are
//! stated for the linear shape, where the gain at sample `i` of the fade
//! region is exactly `i / fade_samples`.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use fabula_common::{timing, FadeCurve};

/// Fade-in/fade-out durations plus the ramp shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSpec {
    pub fade_in_secs: f64,
    pub fade_out_secs: f64,
    pub curve: FadeCurve,
}

impl Default for FadeSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl FadeSpec {
    /// No fading at all.
    pub fn none() -> Self {
        Self {
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
            curve: FadeCurve::Linear,
        }
    }

    /// Linear ramps of the given durations.
    pub fn linear(fade_in_secs: f64, fade_out_secs: f64) -> Self {
        Self {
            fade_in_secs,
            fade_out_secs,
            curve: FadeCurve::Linear,
        }
    }

    pub fn with_curve(fade_in_secs: f64, fade_out_secs: f64, curve: FadeCurve) -> Self {
        Self {
            fade_in_secs,
            fade_out_secs,
            curve,
        }
    }

    /// Cap each fade at half the clip duration so the two fade regions
    /// cannot each cover more than half the clip.
    pub fn capped(self, clip_duration_secs: f64) -> Self {
        let cap = (clip_duration_secs / 2.0).max(0.0);
        Self {
            fade_in_secs: self.fade_in_secs.min(cap),
            fade_out_secs: self.fade_out_secs.min(cap),
            curve: self.curve,
        }
    }
}

/// Scale the head and tail of `buffer` in place.
///
/// Fade sample counts are `floor(secs * rate)`. For each channel, sample
/// `i < fade_in_samples` is scaled by the curve's rising gain at progress
/// `i / fade_in_samples`, and sample `len - 1 - i` (for
/// `i < fade_out_samples`) by the same rising gain measured from the tail
/// inward, so the final sample is scaled to exactly 0. When the two
/// regions overlap their gains multiply; that is accepted behavior, not
/// an error. Zero durations are no-ops.
///
/// # Errors
/// `InvalidRange` for negative fade durations.
pub fn apply_fades(buffer: &mut SampleBuffer, fades: &FadeSpec) -> Result<()> {
    if fades.fade_in_secs < 0.0 || fades.fade_out_secs < 0.0 {
        return Err(Error::InvalidRange(format!(
            "fade durations must be >= 0 (got in {:.3}s, out {:.3}s)",
            fades.fade_in_secs, fades.fade_out_secs
        )));
    }

    let rate = buffer.sample_rate();
    let len = buffer.len();
    let fade_in_samples = timing::sample_index(fades.fade_in_secs, rate);
    let fade_out_samples = timing::sample_index(fades.fade_out_secs, rate);
    let curve = fades.curve;

    for channel in buffer.channels_mut() {
        if fade_in_samples > 0 {
            for i in 0..fade_in_samples.min(len) {
                let gain = curve.fade_in_gain(i as f32 / fade_in_samples as f32);
                channel[i] *= gain;
            }
        }
        if fade_out_samples > 0 {
            for i in 0..fade_out_samples.min(len) {
                let gain = curve.fade_in_gain(i as f32 / fade_out_samples as f32);
                channel[len - 1 - i] *= gain;
            }
        }
    }

    Ok(())
}
