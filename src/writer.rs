//! Statistics output.
//!
//! Writes the analyzer's document as pretty-printed JSON, creating parent
//! directories as needed.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Write `stats` to `file_path` as pretty JSON.
///
/// # Arguments
///
/// * `stats` - Any serializable statistics document
/// * `file_path` - Destination file; missing parent directories are created
///
/// # Errors
///
/// Returns an error if directory creation, file creation or serialization fails.
pub fn write_statistics<T: Serialize>(stats: &T, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }

    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    write_to(stats, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %file_path.display(), "Statistics written");
    Ok(())
}

/// Write `stats` as pretty JSON followed by a newline
pub fn write_to<T: Serialize, W: Write>(stats: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, stats)?;
    writeln!(writer)?;
    Ok(())
}
