/// Record file writer

use crate::error::Result;
use crate::record::RECORD_VERSION;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct RecordFile<'a> {
    version: &'a str,
    image_index: u32,
    image_path: &'a str,
}

/// Render record file content
pub fn render_record(image_index: u32, image_path: &str) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&RecordFile {
        version: RECORD_VERSION,
        image_index,
        image_path,
    })?;
    text.push('\n');
    Ok(text)
}

/// Write a record file to disk
pub fn write_record<P: AsRef<Path>>(path: P, image_index: u32, image_path: &str) -> Result<()> {
    let text = render_record(image_index, image_path)?;

    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
