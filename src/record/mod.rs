//! Persisted "last used disk" record
//!
//! One [`IndexRecord`] exists per loaded content. It lives in a small JSON
//! side file named after the content and is only rewritten when its values
//! actually change.

/// Record file reader
pub mod reader;
/// Record file writer
pub mod writer;

pub use reader::{parse_record, read_record, StoredRecord};
pub use writer::{render_record, write_record};

use crate::error::{DiskControlError, Result};
use log::{debug, error, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of record files
pub const RECORD_FILE_EXTENSION: &str = "ldci";
/// Record format version written to new files
pub const RECORD_VERSION: &str = "1.0";
/// Maximum stored image path length in bytes
pub const MAX_IMAGE_PATH_LEN: usize = 4095;

/// Last selected disk image for one piece of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    image_index: u32,
    image_path: String,
    file_path: PathBuf,
    dirty: bool,
}

impl IndexRecord {
    /// Open the record for `content_path`
    ///
    /// Returns `Ok(None)` when record keeping does not apply (no content
    /// path). The record file goes into `save_dir`, or beside the content
    /// when `save_dir` is `None` or empty; the directory is created if
    /// needed. A missing or unreadable file yields a zeroed, dirty record.
    pub fn init(content_path: &str, save_dir: Option<&Path>) -> Result<Option<Self>> {
        let save_dir = save_dir.filter(|d| !d.as_os_str().is_empty());

        let file_path = match record_file_path(content_path, save_dir) {
            Some(path) => path,
            None => return Ok(None),
        };

        if let Some(dir) = file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                if let Err(e) = fs::create_dir_all(dir) {
                    error!(
                        "[disk index] Failed to create directory for record file {}: {}",
                        dir.display(),
                        e
                    );
                    return Err(e.into());
                }
            }
        }

        let mut record = Self {
            image_index: 0,
            image_path: String::new(),
            file_path,
            dirty: false,
        };

        match read_record(&record.file_path) {
            Ok(stored) => {
                debug!(
                    "[disk index] Loaded {}: [{}] {}",
                    record.file_path.display(),
                    stored.image_index,
                    stored.image_path
                );
                record.image_index = stored.image_index;
                record.image_path = truncate_path(&stored.image_path).to_string();
            }
            Err(DiskControlError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("[disk index] No record at {}", record.file_path.display());
                record.dirty = true;
            }
            Err(e) => {
                warn!(
                    "[disk index] Ignoring unreadable record {}: {}",
                    record.file_path.display(),
                    e
                );
                record.dirty = true;
            }
        }

        Ok(Some(record))
    }

    /// Update the record; only a changed value marks it dirty
    ///
    /// An empty `image_path` clears the stored path.
    pub fn set(&mut self, image_index: u32, image_path: &str) {
        if image_index != self.image_index {
            self.image_index = image_index;
            self.dirty = true;
        }

        let image_path = truncate_path(image_path);
        if image_path != self.image_path {
            self.image_path.clear();
            self.image_path.push_str(image_path);
            self.dirty = true;
        }
    }

    /// Write the record if it changed since the last load or save
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        write_record(&self.file_path, self.image_index, &self.image_path)?;
        debug!(
            "[disk index] Saved {}: [{}] {}",
            self.file_path.display(),
            self.image_index,
            self.image_path
        );
        self.dirty = false;
        Ok(())
    }

    /// Recorded image index
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Recorded image path (empty if unknown)
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Path of the backing file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Has the record changed since the last load or save?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Is this the first-run sentinel `{0, ""}`?
    pub fn is_first_run(&self) -> bool {
        self.image_index == 0 && self.image_path.is_empty()
    }
}

/// Backing file path for a content path
///
/// `{save_dir or content_dir}/{content stem}.ldci`, or `None` if the content
/// path has no usable file name.
pub fn record_file_path(content_path: &str, save_dir: Option<&Path>) -> Option<PathBuf> {
    if content_path.is_empty() {
        return None;
    }

    let content = Path::new(content_path);
    let stem = content.file_stem().filter(|s| !s.is_empty())?;

    let mut path = match save_dir {
        Some(dir) => dir.to_path_buf(),
        None => content.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(RECORD_FILE_EXTENSION);
    path.push(file_name);
    Some(path)
}

/// Clamp a path to [`MAX_IMAGE_PATH_LEN`] bytes on a character boundary
fn truncate_path(path: &str) -> &str {
    if path.len() <= MAX_IMAGE_PATH_LEN {
        return path;
    }

    let mut end = MAX_IMAGE_PATH_LEN;
    while !path.is_char_boundary(end) {
        end -= 1;
    }
    &path[..end]
}
