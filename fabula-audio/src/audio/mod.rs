//! Audio I/O and format plumbing
//!
//! Decoding, encoding, resampling, capture, and device playback. The
//! [`types::SampleBuffer`] defined here is the currency every other
//! module trades in.

pub mod capture;
pub mod decoder;
pub mod output;
pub mod resampler;
pub mod types;
pub mod wav;

pub use capture::CaptureSession;
pub use decoder::AudioDecoder;
pub use output::CpalPlayback;
pub use types::SampleBuffer;
