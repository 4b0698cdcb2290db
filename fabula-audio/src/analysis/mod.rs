//! Waveform rendering data and quality analysis

pub mod envelope;
pub mod metrics;
pub mod monitor;

pub use envelope::compute_envelope;
pub use metrics::{compute_static_metrics, QualityMetrics};
pub use monitor::{run_monitor, LevelMonitor, LiveMetrics, MonitorParams, QualityRating};
