// File utilities for TrackID API
//
// This module contains utility functions for file operations used in the TrackID API.
// It handles creating unique upload paths, saving uploaded bytes, and cleaning up
// temporary files once a request has reached a terminal outcome.

use chrono::Utc;
use log::{debug, error, info};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Generate a unique path for an uploaded file under the given directory
///
/// The filename is derived from a millisecond timestamp, with a short random
/// suffix so concurrent requests landing in the same millisecond cannot collide.
///
/// # Arguments
///
/// * `base_dir` - Base directory for temporary files
///
/// # Returns
///
/// * The full path for the new upload file
///
/// # Errors
///
/// Returns an IO error if directory creation fails
pub fn generate_upload_path(base_dir: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(base_dir)?;

    let stamp = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    let filename = format!("blob_{}_{}", stamp, &suffix[..8]);

    Ok(Path::new(base_dir).join(filename))
}

/// Save uploaded file data to the filesystem
///
/// # Arguments
///
/// * `data` - Bytes to write to the file
/// * `file_path` - Path where the file should be saved
pub fn save_file_data(data: &[u8], file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(data)?;
    Ok(())
}

/// Remove a temporary file
///
/// This function logs errors but doesn't return them to the caller
pub fn cleanup_file(file_path: &Path) {
    if let Err(e) = fs::remove_file(file_path) {
        error!("Failed to clean up file {}: {}", file_path.display(), e);
    } else {
        info!("Successfully cleaned up file: {}", file_path.display());
    }
}

/// Scoped guard for an uploaded temporary file
///
/// Removes the file when dropped, so every exit path of a request handler
/// deletes the upload exactly once.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn new(path: PathBuf) -> Self {
        debug!("Tracking temporary upload: {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        cleanup_file(&self.path);
    }
}
