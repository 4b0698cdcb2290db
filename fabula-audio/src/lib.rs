//! # Fabula Audio Engine (fabula-audio)
//!
//! Sample-accurate clip editing for narration recordings.
//!
//! **Purpose:** Decode audio into planar buffers, extract and shape clips
//! with fades, loop and mix background beds, encode WAV output, analyze
//! levels and quality, and drive playback of edits in progress.
//!
//! **Architecture:** Planar f32 pipeline using symphonia + rubato + cpal

pub mod analysis;
pub mod audio;
pub mod clip;
pub mod config;
pub mod convert;
pub mod error;
pub mod session;
pub mod store;

pub use audio::SampleBuffer;
pub use error::{Error, Result};
