//! Timing and playback seams for the edit session
//!
//! The session derives its position from wall-clock deltas rather than
//! polling the device, so both the clock and the playback device sit
//! behind traits. Production code uses [`SystemClock`] and the cpal
//! handle; tests and headless commands substitute fakes.

use crate::audio::types::SampleBuffer;
use crate::error::Result;
use std::time::Instant;

/// Wall-clock source for playback timing.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Something that can play a prepared buffer from an offset.
///
/// Implementations only move audio; position tracking and stop
/// boundaries belong to the session driving the handle.
pub trait PlaybackHandle {
    /// Begin playing `buffer` from `offset_secs`, replacing any clip
    /// already playing.
    fn start(&mut self, buffer: &SampleBuffer, offset_secs: f64) -> Result<()>;

    /// Suspend output, keeping the clip loaded.
    fn pause(&mut self) -> Result<()>;

    /// Continue after a pause.
    fn resume(&mut self) -> Result<()>;

    /// Release the device and discard the clip.
    fn stop(&mut self) -> Result<()>;
}

/// Discards all audio. Used by headless commands and tests that only
/// care about session state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl PlaybackHandle for NullPlayback {
    fn start(&mut self, _buffer: &SampleBuffer, _offset_secs: f64) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
