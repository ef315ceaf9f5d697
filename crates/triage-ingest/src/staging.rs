//! Per-upload temporary files.
//!
//! Uploaded bytes are staged to disk before parsing and removed afterwards on
//! every exit path. Removal tolerates a file that is already gone.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use triage_core::Result;

/// A temporary copy of one uploaded file, deleted on release or drop.
pub struct StagedFile {
    path: PathBuf,
    file: Option<NamedTempFile>,
}

impl StagedFile {
    /// Write `bytes` to a fresh temporary file ending in `.{extension}`.
    ///
    /// Uses `dir` when given, otherwise the system temp directory.
    pub fn write(dir: Option<&Path>, extension: &str, bytes: &[u8]) -> Result<Self> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{}", extension)
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file now.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => debug!("Released staged file {}", self.path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Staged file already removed: {}", self.path.display());
                }
                Err(e) => warn!("Failed to remove staged file {}: {}", self.path.display(), e),
            }
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.remove();
    }
}
