//! Format conversion through an external transcoder
//!
//! The engine only produces WAV natively. Lossy targets are delegated to
//! an external encoder program (ffmpeg by default) through temp files.
//! Conversion failure is survivable: callers use [`convert_or_wav`] and
//! ship the native WAV when the encoder is unavailable.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Wav,
    Ogg,
    Mp3,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Wav => "wav",
            TargetFormat::Ogg => "ogg",
            TargetFormat::Mp3 => "mp3",
        }
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(TargetFormat::Wav),
            "ogg" => Ok(TargetFormat::Ogg),
            "mp3" => Ok(TargetFormat::Mp3),
            other => Err(format!("unknown target format: {}", other)),
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

pub trait Transcoder {
    /// Convert a WAV payload to the target format.
    fn convert(&self, wav: &[u8], format: TargetFormat) -> Result<Vec<u8>>;
}

/// Shells out to an encoder program with ffmpeg-style arguments.
pub struct CommandTranscoder {
    program: String,
}

impl CommandTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for CommandTranscoder {
    fn convert(&self, wav: &[u8], format: TargetFormat) -> Result<Vec<u8>> {
        if format == TargetFormat::Wav {
            return Ok(wav.to_vec());
        }

        let token = Uuid::new_v4();
        let in_path = std::env::temp_dir().join(format!("fabula-{}.wav", token));
        let out_path = std::env::temp_dir().join(format!("fabula-{}.{}", token, format.extension()));

        fs::write(&in_path, wav)?;
        debug!("running {} for {} conversion", self.program, format);

        let output = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&in_path)
            .arg(&out_path)
            .output();

        let result = match output {
            Err(e) => Err(Error::Conversion(format!(
                "failed to run {}: {}",
                self.program, e
            ))),
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::Conversion(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                )))
            }
            Ok(_) => fs::read(&out_path).map_err(|e| {
                Error::Conversion(format!("encoder produced no output: {}", e))
            }),
        };

        let _ = fs::remove_file(&in_path);
        let _ = fs::remove_file(&out_path);
        result
    }
}

/// Convert, falling back to the unconverted WAV when the transcoder
/// fails. Returns the payload together with the format it actually is.
pub fn convert_or_wav(
    transcoder: &dyn Transcoder,
    wav: &[u8],
    format: TargetFormat,
) -> (Vec<u8>, TargetFormat) {
    match transcoder.convert(wav, format) {
        Ok(bytes) => (bytes, format),
        Err(e) => {
            warn!("conversion to {} failed ({}), keeping wav", format, e);
            (wav.to_vec(), TargetFormat::Wav)
        }
    }
}
