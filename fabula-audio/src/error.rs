//! Error types for the Fabula audio engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error taxonomy.
///
/// Buffer-processing operations fail fast and synchronously; the message
/// carries the relevant context (attempted range, buffer lengths). The
/// only silent clamps are the numerically necessary ones documented on
/// the individual operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Decoding (or resampling) raw audio failed; terminal for that input
    #[error("Decode error: {0}")]
    Decode(String),

    /// Time bounds violate `0 <= start < end <= duration`
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Zero-length input or mismatched rates/channels/gain counts
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// External transcoder failed; callers fall back to the native WAV
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Audio device enumeration or stream failure
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Clip store failure (unknown id, bad id, corrupt sidecar)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
