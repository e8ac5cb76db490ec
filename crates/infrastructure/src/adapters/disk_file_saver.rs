//! File-save implementation writing to a downloads directory.

use std::path::PathBuf;

use relay_application::ports::{FileSaver, FileSaverError};

/// Persists downloaded payloads under a fixed directory.
///
/// The MIME type has no on-disk representation; it is recorded in the
/// trace output so callers can correlate saves with downloads.
#[derive(Debug, Clone)]
pub struct DiskFileSaver {
    dir: PathBuf,
}

impl DiskFileSaver {
    /// Creates a saver writing into `dir`, created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSaver for DiskFileSaver {
    fn save(&self, bytes: &[u8], filename: &str, mime_type: &str) -> Result<(), FileSaverError> {
        let io = |error: std::io::Error| FileSaverError::Io {
            filename: filename.to_string(),
            message: error.to_string(),
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes).map_err(io)?;
        tracing::debug!(path = %path.display(), mime_type, "saved download");
        Ok(())
    }
}
