//! Fade curve shapes for clip edges and loop seams
//!
//! A curve maps normalized fade progress (0.0 to 1.0) to a gain
//! multiplier. Fade-in multipliers rise from 0.0 to 1.0, fade-out
//! multipliers fall from 1.0 to 0.0. Linear is the canonical shape for
//! clip extraction; the others are offered for background-audio edges
//! where a gentler onset reads better under narration.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Gain envelope shape applied over a fade region.
///
/// - Linear: constant rate of change, sample-exact `gain = progress`
/// - Exponential: slow start, fast finish (`t²`)
/// - Logarithmic: fast start, slow finish
/// - SCurve: smooth acceleration and deceleration
/// - EqualPower: constant perceived loudness across a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    /// v(t) = t
    Linear,
    /// v(t) = t²
    Exponential,
    /// v(t) = (1-t)² for fade-out, √t for fade-in
    Logarithmic,
    /// v(t) = 0.5 × (1 - cos(π × t))
    SCurve,
    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Gain multiplier at `position` through a fade-in (0.0 = silent
    /// start, 1.0 = full volume). Positions outside [0, 1] are clamped.
    pub fn fade_in_gain(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            // Logarithmic is a fade-out shape; inverted via sqrt for fade-in
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Gain multiplier at `position` through a fade-out (1.0 at the
    /// start of the fade region, 0.0 at its end).
    pub fn fade_out_gain(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 + (std::f32::consts::PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Canonical lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s-curve",
            FadeCurve::EqualPower => "equal-power",
        }
    }

    /// All curve variants, for CLI help text and validation.
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl Default for FadeCurve {
    /// Linear: the clip engine's boundary guarantees are stated for the
    /// linear ramp.
    fn default() -> Self {
        FadeCurve::Linear
    }
}

impl std::str::FromStr for FadeCurve {
    type Err = String;

    /// Parses the canonical names plus common aliases:
    /// `cosine`/`scurve`/`s_curve` for SCurve, `equal_power`/`equalpower`
    /// for EqualPower. Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "exponential" => Ok(FadeCurve::Exponential),
            "logarithmic" => Ok(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Ok(FadeCurve::SCurve),
            "equal-power" | "equal_power" | "equalpower" => Ok(FadeCurve::EqualPower),
            other => Err(format!("unknown fade curve: {}", other)),
        }
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fade_in_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.fade_in_gain(0.0);
            let end_val = curve.fade_in_gain(1.0);
            assert!(
                (start_val - 0.0).abs() < 0.01,
                "{:?} fade-in at 0.0 should be ~0.0, got {}",
                curve,
                start_val
            );
            assert!(
                (end_val - 1.0).abs() < 0.01,
                "{:?} fade-in at 1.0 should be ~1.0, got {}",
                curve,
                end_val
            );
        }
    }

    #[test]
    fn test_fade_out_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.fade_out_gain(0.0);
            let end_val = curve.fade_out_gain(1.0);
            assert!(
                (start_val - 1.0).abs() < 0.01,
                "{:?} fade-out at 0.0 should be ~1.0, got {}",
                curve,
                start_val
            );
            assert!(
                (end_val - 0.0).abs() < 0.01,
                "{:?} fade-out at 1.0 should be ~0.0, got {}",
                curve,
                end_val
            );
        }
    }

    #[test]
    fn test_linear_is_exact() {
        // The clip engine relies on linear gain being exactly the progress
        assert_eq!(FadeCurve::Linear.fade_in_gain(0.25), 0.25);
        assert_eq!(FadeCurve::Linear.fade_in_gain(0.5), 0.5);
        assert_eq!(FadeCurve::Linear.fade_out_gain(0.25), 0.75);
    }

    #[test]
    fn test_positions_outside_range_clamp() {
        for curve in FadeCurve::all_variants() {
            assert_eq!(curve.fade_in_gain(-1.0), curve.fade_in_gain(0.0));
            assert_eq!(curve.fade_in_gain(2.0), curve.fade_in_gain(1.0));
        }
    }

    #[test]
    fn test_name_round_trip() {
        for curve in FadeCurve::all_variants() {
            let parsed = FadeCurve::from_str(curve.as_str()).unwrap();
            assert_eq!(*curve, parsed, "round-trip failed for {:?}", curve);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(FadeCurve::from_str("cosine"), Ok(FadeCurve::SCurve));
        assert_eq!(FadeCurve::from_str("scurve"), Ok(FadeCurve::SCurve));
        assert_eq!(FadeCurve::from_str("s_curve"), Ok(FadeCurve::SCurve));
        assert_eq!(FadeCurve::from_str("equal_power"), Ok(FadeCurve::EqualPower));
        assert_eq!(FadeCurve::from_str("equalpower"), Ok(FadeCurve::EqualPower));
        // Case insensitive
        assert_eq!(FadeCurve::from_str("LINEAR"), Ok(FadeCurve::Linear));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(FadeCurve::from_str("invalid").is_err());
        assert!(FadeCurve::from_str("").is_err());
    }

    #[test]
    fn test_default_is_linear() {
        assert_eq!(FadeCurve::default(), FadeCurve::Linear);
    }

    #[test]
    fn test_equal_power_crossfade_sums_to_unit_power() {
        // sin² + cos² = 1 at every position
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            let fade_in = FadeCurve::EqualPower.fade_in_gain(t);
            let fade_out = FadeCurve::EqualPower.fade_out_gain(t);
            let power = fade_in * fade_in + fade_out * fade_out;
            assert!((power - 1.0).abs() < 1e-5, "power {} at t={}", power, t);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FadeCurve::Linear), "linear");
        assert_eq!(format!("{}", FadeCurve::SCurve), "s-curve");
        assert_eq!(format!("{}", FadeCurve::EqualPower), "equal-power");
    }
}
