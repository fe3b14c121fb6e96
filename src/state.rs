// src/state.rs
// Per-session warning state, persisted as one small marker file per
// transcript in the user cache directory.
//
// The session key is a truncated content hash of the transcript path:
// deterministic isolation between sessions, not a security boundary. No
// locking; Claude Code serializes tool-call hooks per session, so marker
// writes for one session never overlap. Writes still go through a temp
// file + rename so a hook killed by the host timeout cannot leave a torn
// file behind.

use std::fs;
use std::io;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Directory name under the user cache dir.
const STATE_DIR_NAME: &str = "context-reminder";
/// Marker file prefix.
const MARKER_PREFIX: &str = "warned-";
/// Hex chars kept from the path digest.
const KEY_LEN: usize = 12;

/// File-backed store mapping session keys to the last warned percentage.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at an explicit directory (tests, custom layouts).
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store in the per-user cache directory
    /// (e.g. ~/.cache/context-reminder on Linux).
    pub fn open_default() -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".cache")
            })
            .join(STATE_DIR_NAME);
        Self { dir }
    }

    /// Derive the session key for a transcript path: first 12 hex chars of
    /// its SHA-256 digest.
    pub fn session_key(transcript_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(transcript_path.as_bytes());
        format!("{:x}", hasher.finalize())[..KEY_LEN].to_string()
    }

    fn marker_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{MARKER_PREFIX}{key}"))
    }

    /// Last warned percentage for this session, or None for quiet state.
    /// Any read or parse failure degrades to None.
    pub fn load(&self, key: &str) -> Option<u32> {
        fs::read_to_string(self.marker_path(key))
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Record the last warned percentage, creating the cache directory on
    /// demand. Atomic: write to a temp file, then rename into place.
    pub fn save(&self, key: &str, percent: u32) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.marker_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, percent.to_string())?;
        fs::rename(&tmp, &path)
    }

    /// Forget the stored state for this session. Absence is not an error.
    pub fn clear(&self, key: &str) {
        if let Err(e) = fs::remove_file(self.marker_path(key))
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::debug!(error = %e, key, "Failed to remove warning marker");
        }
    }
}
