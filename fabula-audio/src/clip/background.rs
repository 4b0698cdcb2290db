//! Reusable background-audio clips
//!
//! A background clip binds one buffer to a selection, a mix volume, and
//! fade settings. It is created when a file is loaded or a recording
//! completes, tweaked through settings changes, rendered under narration,
//! and persisted through the clip store as encoded bytes.

use crate::audio::resampler;
use crate::audio::types::SampleBuffer;
use crate::clip::extract::extract_range;
use crate::clip::fades::{apply_fades, FadeSpec};
use crate::clip::looper::loop_to_length;
use crate::clip::mixer::mix_pair;
use crate::clip::selection::ClipSelection;
use crate::error::Result;
use tracing::debug;
use uuid::Uuid;

/// A named, persistable background-audio unit: buffer + selection +
/// volume + fades.
#[derive(Debug, Clone)]
pub struct BackgroundAudioClip {
    pub id: String,
    pub name: String,
    buffer: SampleBuffer,
    pub selection: ClipSelection,
    pub volume: f32,
    pub fades: FadeSpec,
}

impl BackgroundAudioClip {
    /// Wrap a freshly loaded or recorded buffer. The whole buffer is in
    /// play until a selection is made; volume starts at full.
    pub fn new(name: impl Into<String>, buffer: SampleBuffer) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            buffer,
            selection: ClipSelection::new(),
            volume: 1.0,
            fades: FadeSpec::none(),
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Set the mix volume, clamped into [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Render the clip out to `target_secs`: extract the selected region
    /// (or take the whole buffer), apply the fades capped to half the
    /// region, then loop to length, crossfading seams when
    /// `crossfade_secs > 0`.
    pub fn render(&self, target_secs: f64, crossfade_secs: f64) -> Result<SampleBuffer> {
        let mut region = match self.selection.bounds() {
            Some((start, end)) => extract_range(&self.buffer, start, end)?,
            None => self.buffer.clone(),
        };

        let fades = self.fades.capped(region.duration_seconds());
        apply_fades(&mut region, &fades)?;

        loop_to_length(&region, target_secs, crossfade_secs > 0.0, crossfade_secs)
    }

    /// Render under a narration buffer and mix at gains `[1.0, volume]`.
    ///
    /// The rendered bed is resampled to the narration's rate when the two
    /// differ and trimmed/padded to exactly the narration's length, so
    /// the mix never extends past the narration.
    pub fn mix_under(&self, narration: &SampleBuffer, crossfade_secs: f64) -> Result<SampleBuffer> {
        let mut bed = self.render(narration.duration_seconds(), crossfade_secs)?;

        if bed.sample_rate() != narration.sample_rate() {
            debug!(
                "resampling background bed {} Hz -> {} Hz",
                bed.sample_rate(),
                narration.sample_rate()
            );
            bed = resampler::resample(&bed, narration.sample_rate())?;
        }
        for channel in bed.channels_mut() {
            channel.resize(narration.len(), 0.0);
        }

        mix_pair(narration, &bed, 1.0, self.volume)
    }
}
