//! Utility functions and helpers

use crate::error::{Result, WatermarkError};
use std::path::Path;

/// File utilities
pub mod file {
    use super::*;

    /// Get the file size in bytes
    pub fn get_file_size(path: &Path) -> Result<u64> {
        let metadata = std::fs::metadata(path).map_err(WatermarkError::Io)?;
        Ok(metadata.len())
    }

    /// Ensure a directory exists, creating it if necessary
    pub fn ensure_directory_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| WatermarkError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Write bytes to `path` atomically: write a temp file in the same
    /// directory, then rename over the destination. On failure the temp
    /// file is removed and no partial destination file is left behind.
    pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
        let dir = path.parent().ok_or_else(|| WatermarkError::InvalidInput {
            message: format!("path has no parent directory: {}", path.display()),
        })?;
        let file_name = path
            .file_name()
            .ok_or_else(|| WatermarkError::InvalidInput {
                message: format!("path has no file name: {}", path.display()),
            })?;

        let tmp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));
        if let Err(e) = std::fs::write(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(WatermarkError::WriteFile {
                path: tmp.clone(),
                source: e,
            });
        }
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            WatermarkError::WriteFile {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}
