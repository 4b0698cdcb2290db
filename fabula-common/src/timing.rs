//! Sample/second conversions
//!
//! The engine's unit of position is the sample. Times convert to sample
//! positions by flooring (a time lands in the sample it falls within) and
//! to sample spans by ceiling (a requested duration is never shortened by
//! rounding). All conversions are per-channel; interleaving is a concern
//! of the I/O boundaries, not of timing.

/// Sample index for a time position, via `floor(seconds * rate)`.
///
/// Negative times clamp to index 0.
pub fn sample_index(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).floor().max(0.0) as usize
}

/// Sample count spanning a duration, via `ceil(seconds * rate)`.
///
/// Negative durations clamp to 0 samples.
pub fn sample_span(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).ceil().max(0.0) as usize
}

/// Duration in seconds of `samples` samples at `sample_rate`.
pub fn duration_seconds(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / sample_rate as f64
}

/// Human-readable duration: `m:ss.t` under an hour, `h:mm:ss` above.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let hours = (total / 3600.0) as u64;
    let minutes = ((total % 3600.0) / 60.0) as u64;
    // Truncate to tenths so 59.96 prints as 59.9, not a carried 60.0
    let secs = (total % 60.0 * 10.0).floor() / 10.0;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs as u64)
    } else {
        format!("{}:{:04.1}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_index_floors() {
        assert_eq!(sample_index(0.0, 44100), 0);
        assert_eq!(sample_index(1.0, 44100), 44100);
        assert_eq!(sample_index(0.9999999, 44100), 44099);
        // 0.5s at 44.1kHz lands exactly
        assert_eq!(sample_index(0.5, 44100), 22050);
    }

    #[test]
    fn test_sample_index_negative_clamps() {
        assert_eq!(sample_index(-1.0, 44100), 0);
    }

    #[test]
    fn test_sample_span_ceils() {
        assert_eq!(sample_span(1.0, 44100), 44100);
        // Any fractional sample rounds up
        assert_eq!(sample_span(1.00001, 44100), 44101);
        assert_eq!(sample_span(0.0, 44100), 0);
        assert_eq!(sample_span(-2.0, 44100), 0);
    }

    #[test]
    fn test_span_at_least_index() {
        for &t in &[0.1, 0.333, 1.0, 2.7182, 59.94] {
            assert!(sample_span(t, 48000) >= sample_index(t, 48000));
        }
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(duration_seconds(44100, 44100), 1.0);
        assert_eq!(duration_seconds(22050, 44100), 0.5);
        assert_eq!(duration_seconds(0, 44100), 0.0);
        assert_eq!(duration_seconds(100, 0), 0.0);
    }

    #[test]
    fn test_format_short_durations() {
        assert_eq!(format_duration(0.0), "0:00.0");
        assert_eq!(format_duration(3.5), "0:03.5");
        assert_eq!(format_duration(65.25), "1:05.2");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_duration(3600.0), "1:00:00");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_negative_clamps() {
        assert_eq!(format_duration(-5.0), "0:00.0");
    }
}
