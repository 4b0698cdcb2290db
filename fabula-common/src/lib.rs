//! # Fabula Common Library
//!
//! Shared vocabulary for the Fabula audio engine:
//! - Fade curve definitions and multiplier math
//! - Sample/second timing conversions
//! - Signal level helpers (RMS, peak, decibel ratios)

pub mod fade_curves;
pub mod levels;
pub mod timing;

pub use fade_curves::FadeCurve;
