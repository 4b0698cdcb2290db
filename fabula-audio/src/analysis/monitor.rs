//! Live level monitoring for active recordings
//!
//! Consumes per-frame sample chunks from a capture source and derives
//! level, peak, clipping, noise floor, and an advisory quality rating.
//! The noise floor is estimated from the quietest of the first frames of
//! a session, on the assumption that the recording starts with a moment
//! of room tone, then frozen for the rest of the session.

use fabula_common::levels;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Rating floor used for both sides of the SNR ratio.
const SNR_FLOOR: f32 = 0.001;

/// Advisory recording-quality classification. Never used to reject a
/// recording automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl QualityRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityRating::Excellent => "excellent",
            QualityRating::Good => "good",
            QualityRating::Fair => "fair",
            QualityRating::Poor => "poor",
            QualityRating::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-frame monitoring output. Levels are percentages (RMS and peak
/// scaled by 100), not dB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub current_level: f32,
    pub peak_level: f32,
    pub is_clipping: bool,
    pub noise_level: f32,
    pub snr_db: f32,
    pub rating: QualityRating,
}

impl LiveMetrics {
    /// State before the first frame of a session has been seen.
    pub fn initial() -> Self {
        Self {
            current_level: 0.0,
            peak_level: 0.0,
            is_clipping: false,
            noise_level: 0.0,
            snr_db: 0.0,
            rating: QualityRating::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorParams {
    /// Frames sampled for the noise floor before it freezes.
    pub warmup_frames: usize,
    /// Instantaneous peak above this reports clipping.
    pub clip_threshold: f32,
}

impl Default for MonitorParams {
    fn default() -> Self {
        Self {
            warmup_frames: 30,
            clip_threshold: 0.95,
        }
    }
}

/// Stateful per-session monitor. Feed it frames in order; reset it when
/// a new recording starts.
#[derive(Debug)]
pub struct LevelMonitor {
    params: MonitorParams,
    frames_seen: usize,
    peak_level: f32,
    min_rms: f32,
    last: LiveMetrics,
}

impl LevelMonitor {
    pub fn new(params: MonitorParams) -> Self {
        Self {
            params,
            frames_seen: 0,
            peak_level: 0.0,
            min_rms: f32::INFINITY,
            last: LiveMetrics::initial(),
        }
    }

    /// Most recent metrics, or the initial state before any frame.
    pub fn current(&self) -> LiveMetrics {
        self.last
    }

    /// Clear session state ahead of a new recording. The peak hold and
    /// the frozen noise floor both restart.
    pub fn reset(&mut self) {
        self.frames_seen = 0;
        self.peak_level = 0.0;
        self.min_rms = f32::INFINITY;
        self.last = LiveMetrics::initial();
    }

    /// Fold one frame of normalized samples into the session state.
    pub fn process_frame(&mut self, samples: &[f32]) -> LiveMetrics {
        let rms = levels::rms(samples);
        let peak = levels::peak(samples);

        let current_level = rms * 100.0;
        self.peak_level = self.peak_level.max(peak * 100.0);
        let is_clipping = peak > self.params.clip_threshold;

        if self.frames_seen < self.params.warmup_frames {
            self.min_rms = self.min_rms.min(rms);
        }
        self.frames_seen += 1;

        let noise_level = if self.min_rms.is_finite() {
            self.min_rms * 100.0
        } else {
            0.0
        };

        let ratio = rms.max(SNR_FLOOR) / (noise_level / 100.0).max(SNR_FLOOR);
        let snr_db = (levels::ratio_to_db(ratio)).clamp(0.0, 60.0);

        let rating = if is_clipping {
            QualityRating::Poor
        } else if snr_db > 35.0 && current_level > 5.0 && current_level < 70.0 {
            QualityRating::Excellent
        } else if snr_db > 25.0 && current_level > 3.0 {
            QualityRating::Good
        } else if snr_db > 15.0 {
            QualityRating::Fair
        } else {
            QualityRating::Poor
        };

        self.last = LiveMetrics {
            current_level,
            peak_level: self.peak_level,
            is_clipping,
            noise_level,
            snr_db,
            rating,
        };
        self.last
    }
}

/// Drive a monitor from a frame source on a fixed tick, publishing each
/// update through a watch channel.
///
/// `next_frame` returns `None` when the session is over; nothing runs
/// after that, so a stopped recording can never receive a stale update.
/// Empty chunks (the source had nothing new) are skipped without
/// touching the monitor state. Also returns when every receiver of
/// `updates` is gone.
pub async fn run_monitor<S>(
    monitor: &mut LevelMonitor,
    mut next_frame: S,
    updates: &watch::Sender<LiveMetrics>,
    tick: Duration,
) where
    S: FnMut() -> Option<Vec<f32>>,
{
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let Some(frame) = next_frame() else {
            debug!("monitor source ended after {} frames", monitor.frames_seen);
            break;
        };
        if frame.is_empty() {
            continue;
        }
        let metrics = monitor.process_frame(&frame);
        if updates.send(metrics).is_err() {
            break;
        }
    }
}
