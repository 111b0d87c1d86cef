/// Record file reader

use crate::error::{DiskControlError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Values read back from a record file
///
/// Unknown keys (including `version`) are ignored and missing keys default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoredRecord {
    /// Last selected image index
    pub image_index: u32,
    /// Path of the last selected image, empty if unknown
    pub image_path: String,
}

/// Read a record file from disk
pub fn read_record<P: AsRef<Path>>(path: P) -> Result<StoredRecord> {
    let text = fs::read_to_string(path)?;
    parse_record(&text)
}

/// Parse record file content
pub fn parse_record(text: &str) -> Result<StoredRecord> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(DiskControlError::parse("record is not a JSON object"));
    }
    Ok(StoredRecord::deserialize(value)?)
}
