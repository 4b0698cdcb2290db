//! Core audio buffer type
//!
//! `SampleBuffer` is the engine's fundamental entity: decoded PCM held in
//! planar form (one float sequence per channel, all the same length) with
//! a sample rate. The clip operations, analyzers, and encoder all work on
//! this shape; interleaving happens only at the I/O boundaries (WAV
//! payloads, audio device callbacks).

use crate::error::{Error, Result};
use fabula_common::timing;

/// Decoded PCM audio: per-channel f32 samples, nominally in [-1.0, 1.0].
///
/// Invariants, enforced by the validating constructors:
/// - at least one channel
/// - every channel has the same length
/// - nonzero sample rate
///
/// Transformations return new buffers; only fade application mutates in
/// place, and that is documented on the operation itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    /// `InvalidBuffer` when there are no channels, the channel lengths
    /// differ, or the sample rate is zero.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidBuffer(
                "buffer must have at least one channel".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidBuffer("sample rate must be nonzero".to_string()));
        }
        let len = channels[0].len();
        if let Some((index, channel)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(Error::InvalidBuffer(format!(
                "channel length mismatch: channel 0 has {} samples, channel {} has {}",
                len,
                index,
                channel.len()
            )));
        }
        Ok(Self { channels, sample_rate })
    }

    /// Build a mono buffer. The sample rate must be nonzero.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Build a buffer from interleaved samples (ch0 s0, ch1 s0, ch0 s1, …).
    ///
    /// # Errors
    /// `InvalidBuffer` when the channel count is zero or the sample count
    /// is not a whole number of frames.
    pub fn from_interleaved(samples: &[f32], channel_count: u16, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidBuffer(
                "buffer must have at least one channel".to_string(),
            ));
        }
        let channel_count = channel_count as usize;
        if samples.len() % channel_count != 0 {
            return Err(Error::InvalidBuffer(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channel_count
            )));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::from_channels(channels, sample_rate)
    }

    /// Allocate an all-zero buffer. `channel_count` must be at least 1.
    pub fn silent(channel_count: usize, len: usize, sample_rate: u32) -> Self {
        debug_assert!(channel_count > 0);
        debug_assert!(sample_rate > 0);
        Self {
            channels: vec![vec![0.0; len]; channel_count],
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        timing::duration_seconds(self.len(), self.sample_rate)
    }

    /// Read access to one channel. Panics when the index is out of range,
    /// like slice indexing.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Consume the buffer into its planar channel data (rubato's input shape).
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Interleave to frame-major order (ch0 s0, ch1 s0, ch0 s1, …).
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.len() * self.channel_count());
        for frame in 0..self.len() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }
}
