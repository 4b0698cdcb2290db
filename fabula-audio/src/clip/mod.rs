//! Clip operations: selection, extraction, fades, looping, and mixing
//!
//! Everything in this module is pure buffer-to-buffer computation on
//! [`SampleBuffer`](crate::audio::types::SampleBuffer) values. Device
//! I/O, decoding, and persistence live elsewhere; these functions can be
//! exercised entirely in memory.

pub mod background;
pub mod extract;
pub mod fades;
pub mod looper;
pub mod mixer;
pub mod selection;

pub use background::BackgroundAudioClip;
pub use extract::extract_range;
pub use fades::{apply_fades, FadeSpec};
pub use looper::loop_to_length;
pub use mixer::{mix, mix_pair};
pub use selection::ClipSelection;
