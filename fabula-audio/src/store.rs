//! Clip persistence
//!
//! Clips are stored as opaque byte payloads keyed by string IDs. The
//! store does not interpret the audio; it only needs save, load, delete,
//! and list. The filesystem implementation writes a `<id>.wav` payload
//! next to a `<id>.json` metadata sidecar.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Metadata kept beside each stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredClip {
    pub id: String,
    pub duration_secs: f64,
    pub size_bytes: usize,
    pub saved_at: DateTime<Utc>,
}

pub trait ClipStore {
    /// Persist a payload under `id`, replacing any previous payload.
    fn save(&self, id: &str, bytes: &[u8], duration_secs: f64) -> Result<()>;

    /// Load the payload for `id`.
    ///
    /// # Errors
    /// [`Error::Store`] when the id is unknown.
    fn load(&self, id: &str) -> Result<Vec<u8>>;

    /// Remove `id` and its metadata.
    fn delete(&self, id: &str) -> Result<()>;

    /// Metadata for every stored clip, oldest first.
    fn list(&self) -> Result<Vec<StoredClip>>;
}

/// Directory-backed store.
pub struct FsClipStore {
    root: PathBuf,
}

impl FsClipStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn wav_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.wav", id))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

/// IDs become file names, so anything that could escape the store
/// directory is rejected.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return Err(Error::Store(format!("invalid clip id: {:?}", id)));
    }
    Ok(())
}

impl ClipStore for FsClipStore {
    fn save(&self, id: &str, bytes: &[u8], duration_secs: f64) -> Result<()> {
        validate_id(id)?;

        let meta = StoredClip {
            id: id.to_string(),
            duration_secs,
            size_bytes: bytes.len(),
            saved_at: Utc::now(),
        };
        let meta_json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| Error::Store(format!("failed to encode metadata: {}", e)))?;

        fs::write(self.wav_path(id), bytes)?;
        fs::write(self.meta_path(id), meta_json)?;
        info!("saved clip {} ({} bytes, {:.3}s)", id, bytes.len(), duration_secs);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Vec<u8>> {
        validate_id(id)?;
        fs::read(self.wav_path(id)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::Store(format!("clip not found: {}", id)),
            _ => Error::Io(e),
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        fs::remove_file(self.wav_path(id)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::Store(format!("clip not found: {}", id)),
            _ => Error::Io(e),
        })?;
        // The payload is gone either way; a missing sidecar is not an error.
        let _ = fs::remove_file(self.meta_path(id));
        info!("deleted clip {}", id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredClip>> {
        let mut clips = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path)?;
            match serde_json::from_slice::<StoredClip>(&data) {
                Ok(meta) => clips.push(meta),
                Err(e) => warn!("skipping unreadable metadata {}: {}", path.display(), e),
            }
        }
        clips.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.id.cmp(&b.id)));
        Ok(clips)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryClipStore {
    clips: Mutex<HashMap<String, (StoredClip, Vec<u8>)>>,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipStore for MemoryClipStore {
    fn save(&self, id: &str, bytes: &[u8], duration_secs: f64) -> Result<()> {
        validate_id(id)?;
        let meta = StoredClip {
            id: id.to_string(),
            duration_secs,
            size_bytes: bytes.len(),
            saved_at: Utc::now(),
        };
        self.clips
            .lock()
            .unwrap()
            .insert(id.to_string(), (meta, bytes.to_vec()));
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Vec<u8>> {
        validate_id(id)?;
        self.clips
            .lock()
            .unwrap()
            .get(id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| Error::Store(format!("clip not found: {}", id)))
    }

    fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        self.clips
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::Store(format!("clip not found: {}", id)))
    }

    fn list(&self) -> Result<Vec<StoredClip>> {
        let mut clips: Vec<StoredClip> = self
            .clips
            .lock()
            .unwrap()
            .values()
            .map(|(meta, _)| meta.clone())
            .collect();
        clips.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.id.cmp(&b.id)));
        Ok(clips)
    }
}
