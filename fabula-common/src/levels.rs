//! Signal level math shared by static metrics and live monitoring

/// Root-mean-square of a sample slice. Returns 0.0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute amplitude of a sample slice. Returns 0.0 for an empty slice.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

/// Amplitude ratio expressed in decibels: `20 * log10(ratio)`.
pub fn ratio_to_db(ratio: f32) -> f32 {
    20.0 * ratio.log10()
}
