//! Capture Sink
//!
//! Append-only accumulation of the service's binary responses. Each
//! inbound frame gets its own open/append/close cycle, so the capture
//! file is only ever created once the first frame actually arrives.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only writer for the capture file
pub struct CaptureSink {
    path: PathBuf,
    frames_appended: u64,
    bytes_appended: u64,
}

impl CaptureSink {
    /// Create a sink targeting the given path without touching the file
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            frames_appended: 0,
            bytes_appended: 0,
        }
    }

    /// Get the capture file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one frame payload; the file handle is closed on return
    pub async fn append(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(payload).await?;
        file.flush().await?;

        self.frames_appended += 1;
        self.bytes_appended += payload.len() as u64;
        Ok(())
    }

    /// Number of frames appended so far
    pub fn frames_appended(&self) -> u64 {
        self.frames_appended
    }

    /// Number of bytes appended so far
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended
    }
}
