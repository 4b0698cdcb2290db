//! Configuration loading
//!
//! Settings come from a TOML file with every field optional. Resolution
//! order for the file path is CLI argument, then the `FABULA_CONFIG`
//! environment variable (both handled by the CLI layer), then a
//! `fabula.toml` in the working directory, then compiled defaults.

use crate::analysis::MonitorParams;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding saved clips and their metadata.
    pub store_root: PathBuf,
    /// Output device name; `None` uses the system default.
    pub output_device: Option<String>,
    /// Input device name; `None` uses the system default.
    pub capture_device: Option<String>,
    /// External encoder invoked for lossy conversions.
    pub transcoder_program: String,
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("clips"),
            output_device: None,
            capture_device: None,
            transcoder_program: "ffmpeg".to_string(),
            monitor: MonitorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub warmup_frames: usize,
    pub clip_threshold: f32,
    /// Interval between monitor frames in milliseconds.
    pub tick_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 30,
            clip_threshold: 0.95,
            tick_ms: 100,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `fabula.toml` when present,
    /// or fall back to defaults.
    ///
    /// # Errors
    /// An explicitly named file that is missing or malformed is
    /// [`Error::Config`]; a missing implicit file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let implicit = Path::new("fabula.toml");
        if implicit.exists() {
            return Self::from_file(implicit);
        }

        debug!("no config file, using defaults");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn monitor_params(&self) -> MonitorParams {
        MonitorParams {
            warmup_frames: self.monitor.warmup_frames,
            clip_threshold: self.monitor.clip_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store_root, PathBuf::from("clips"));
        assert_eq!(config.transcoder_program, "ffmpeg");
        assert_eq!(config.monitor.warmup_frames, 30);
        assert_eq!(config.monitor.tick_ms, 100);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fabula.toml");
        fs::write(
            &path,
            "store_root = \"/srv/clips\"\n\n[monitor]\nwarmup_frames = 10\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store_root, PathBuf::from("/srv/clips"));
        assert_eq!(config.monitor.warmup_frames, 10);
        // untouched fields keep their defaults
        assert_eq!(config.transcoder_program, "ffmpeg");
        assert!((config.monitor.clip_threshold - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let result = Config::load(Some(Path::new("/nonexistent/fabula.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "store_root = [not toml").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_monitor_params_mapping() {
        let mut config = Config::default();
        config.monitor.warmup_frames = 5;
        config.monitor.clip_threshold = 0.9;
        let params = config.monitor_params();
        assert_eq!(params.warmup_frames, 5);
        assert!((params.clip_threshold - 0.9).abs() < 1e-6);
    }
}
