//! Selection and playback state for clip editing
//!
//! An [`EditSession`] binds one loaded buffer to a selection, fade
//! settings, and a transport. Position is derived from wall-clock time
//! against the moment playback started; a periodic [`EditSession::tick`]
//! advances the position and stops at the mode's boundary (selection end
//! or buffer end).

pub mod transport;

use crate::audio::types::SampleBuffer;
use crate::audio::wav::encode_wav;
use crate::clip::extract::extract_range;
use crate::clip::fades::{apply_fades, FadeSpec};
use crate::clip::selection::ClipSelection;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};
pub use transport::{Clock, NullPlayback, PlaybackHandle, SystemClock};
use uuid::Uuid;

/// Which region a `play()` covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    Full,
    Selection,
}

/// Transport state. Playing and paused states remember the mode they
/// were entered with so a resume continues the same region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing(PlayMode),
    Paused(PlayMode),
}

/// Caller-facing snapshot of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
    pub mode: PlayMode,
}

/// A finished extraction: the faded region encoded as WAV, ready to
/// persist or hand to a transcoder.
#[derive(Debug, Clone)]
pub struct ExtractedClip {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub duration_secs: f64,
    pub wav: Vec<u8>,
}

pub struct EditSession {
    buffer: SampleBuffer,
    selection: ClipSelection,
    fades: FadeSpec,
    mode: PlayMode,
    state: TransportState,
    current_time: f64,
    play_offset: f64,
    play_started_at: Option<Instant>,
    resume_needs_restart: bool,
    handle: Box<dyn PlaybackHandle>,
    clock: Box<dyn Clock>,
}

impl EditSession {
    pub fn new(
        buffer: SampleBuffer,
        handle: Box<dyn PlaybackHandle>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            buffer,
            selection: ClipSelection::new(),
            fades: FadeSpec::none(),
            mode: PlayMode::Full,
            state: TransportState::Stopped,
            current_time: 0.0,
            play_offset: 0.0,
            play_started_at: None,
            resume_needs_restart: false,
            handle,
            clock,
        }
    }

    /// Session without a device, for extraction-only workflows.
    pub fn headless(buffer: SampleBuffer) -> Self {
        Self::new(buffer, Box::new(NullPlayback), Box::new(SystemClock))
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn duration(&self) -> f64 {
        self.buffer.duration_seconds()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn selection(&self) -> &ClipSelection {
        &self.selection
    }

    pub fn fades(&self) -> &FadeSpec {
        &self.fades
    }

    pub fn set_fades(&mut self, fades: FadeSpec) {
        self.fades = fades;
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Choose the region the next `play()` covers. Does not affect a
    /// playback already in progress.
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    pub fn playback_state(&self) -> PlaybackState {
        let mode = match self.state {
            TransportState::Playing(mode) | TransportState::Paused(mode) => mode,
            TransportState::Stopped => self.mode,
        };
        PlaybackState {
            current_time: self.current_time,
            is_playing: matches!(self.state, TransportState::Playing(_)),
            mode,
        }
    }

    /// Selection edits are permitted in any state. While playing in
    /// selection mode they move the stop boundary the next tick sees.
    pub fn set_selection_start(&mut self, time: f64) {
        self.selection.set_start(time.clamp(0.0, self.duration()));
    }

    pub fn set_selection_end(&mut self, time: f64) {
        self.selection.set_end(time.clamp(0.0, self.duration()));
    }

    pub fn set_selection(&mut self, start: f64, end: f64) {
        self.set_selection_start(start);
        self.set_selection_end(end);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Start playback in the current mode, or resume after a pause.
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            TransportState::Playing(_) => Ok(()),
            TransportState::Paused(mode) => {
                if self.resume_needs_restart {
                    self.handle.start(&self.buffer, self.current_time)?;
                    self.resume_needs_restart = false;
                } else {
                    self.handle.resume()?;
                }
                self.play_offset = self.current_time;
                self.play_started_at = Some(self.clock.now());
                self.state = TransportState::Playing(mode);
                debug!("resumed {:?} playback at {:.3}s", mode, self.current_time);
                Ok(())
            }
            TransportState::Stopped => {
                let mode = self.mode;
                let offset = match mode {
                    PlayMode::Selection => self
                        .selection
                        .bounds()
                        .map(|(start, _)| start)
                        .unwrap_or(self.current_time),
                    PlayMode::Full => self.current_time,
                };

                self.handle.start(&self.buffer, offset)?;
                self.play_offset = offset;
                self.current_time = offset;
                self.play_started_at = Some(self.clock.now());
                self.resume_needs_restart = false;
                self.state = TransportState::Playing(mode);
                debug!("started {:?} playback at {:.3}s", mode, offset);
                Ok(())
            }
        }
    }

    /// Suspend playback, keeping the position for a later resume.
    pub fn pause(&mut self) -> Result<()> {
        if let TransportState::Playing(mode) = self.state {
            self.current_time = self.elapsed_position();
            self.handle.pause()?;
            self.play_started_at = None;
            self.state = TransportState::Paused(mode);
            debug!("paused at {:.3}s", self.current_time);
        }
        Ok(())
    }

    /// Stop playback and release the device. The position stays where
    /// it was.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            TransportState::Playing(_) => {
                self.current_time = self.elapsed_position();
                self.handle.stop()?;
            }
            TransportState::Paused(_) => {
                self.handle.stop()?;
            }
            TransportState::Stopped => return Ok(()),
        }
        self.play_started_at = None;
        self.state = TransportState::Stopped;
        debug!("stopped at {:.3}s", self.current_time);
        Ok(())
    }

    /// Jump to `time` (clamped to the buffer). While playing, the device
    /// restarts at the new position with no state change visible to the
    /// caller.
    pub fn seek(&mut self, time: f64) -> Result<()> {
        let time = time.clamp(0.0, self.duration());
        match self.state {
            TransportState::Playing(_) => {
                self.handle.stop()?;
                self.handle.start(&self.buffer, time)?;
                self.play_offset = time;
                self.play_started_at = Some(self.clock.now());
                self.current_time = time;
            }
            TransportState::Paused(_) => {
                self.current_time = time;
                // The device still holds the old position; the next
                // resume must restart from here instead.
                self.resume_needs_restart = true;
            }
            TransportState::Stopped => {
                self.current_time = time;
            }
        }
        debug!("seeked to {:.3}s", time);
        Ok(())
    }

    /// Advance the clock-derived position and stop at the boundary.
    ///
    /// Call this from the scheduling loop while playing. On reaching the
    /// boundary the position resets to the selection end, or to 0 after
    /// a full pass.
    pub fn tick(&mut self) -> Result<()> {
        let TransportState::Playing(mode) = self.state else {
            return Ok(());
        };

        let new_time = self.elapsed_position();
        let boundary = self.stop_boundary(mode);

        if new_time >= boundary {
            self.handle.stop()?;
            self.play_started_at = None;
            self.state = TransportState::Stopped;
            self.current_time = match mode {
                PlayMode::Selection => boundary,
                PlayMode::Full => 0.0,
            };
            debug!("playback reached {:.3}s boundary", boundary);
        } else {
            self.current_time = new_time;
        }
        Ok(())
    }

    /// Extract the selected region with the session fades applied,
    /// encoded as WAV. Returns `None` without touching anything when the
    /// selection is incomplete; the selection is cleared on success.
    pub fn extract_clip(&mut self) -> Result<Option<ExtractedClip>> {
        let Some((start, end)) = self.selection.bounds() else {
            return Ok(None);
        };

        let mut region = extract_range(&self.buffer, start, end)?;
        let fades = self.fades.capped(region.duration_seconds());
        apply_fades(&mut region, &fades)?;
        let wav = encode_wav(&region);

        self.selection.clear();

        let clip = ExtractedClip {
            id: Uuid::new_v4().to_string(),
            start,
            end,
            duration_secs: region.duration_seconds(),
            wav,
        };
        info!(
            "extracted clip {} ({:.3}s - {:.3}s, {} bytes)",
            clip.id,
            start,
            end,
            clip.wav.len()
        );
        Ok(Some(clip))
    }

    fn elapsed_position(&self) -> f64 {
        match self.play_started_at {
            Some(started) => {
                let elapsed = self.clock.now().duration_since(started).as_secs_f64();
                self.play_offset + elapsed
            }
            None => self.current_time,
        }
    }

    fn stop_boundary(&self, mode: PlayMode) -> f64 {
        match mode {
            PlayMode::Selection => self
                .selection
                .bounds()
                .map(|(_, end)| end)
                .unwrap_or_else(|| self.duration()),
            PlayMode::Full => self.duration(),
        }
    }
}
