// src/export/mod.rs
//
// Writers that hand a finished Table to something outside the process.
// These are caller-side conveniences; the pipeline itself never writes.

pub mod csv;
pub mod json;
pub mod parquet;

pub use self::csv::write_csv;
pub use self::json::write_json_lines;
pub use self::parquet::write_parquet;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    /// Guess from a file extension (`.csv`, `.json`/`.jsonl`, `.parquet`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(ExportFormat::Json),
            "parquet" => Some(ExportFormat::Parquet),
            _ => None,
        }
    }
}

/// Write `table` to `path`, creating parent directories.
/// `format` defaults to the one implied by the extension.
pub fn write_table(table: &Table, path: &Path, format: Option<ExportFormat>) -> Result<()> {
    let Some(format) = format.or_else(|| ExportFormat::from_path(path)) else {
        bail!("cannot tell export format from {:?}; name one explicitly", path);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }

    let file = fs::File::create(path).with_context(|| format!("creating {:?}", path))?;
    match format {
        ExportFormat::Csv => write_csv(table, file),
        ExportFormat::Json => write_json_lines(table, file),
        ExportFormat::Parquet => write_parquet(table, file),
    }
    .with_context(|| format!("writing {:?}", path))?;

    info!(path = %path.display(), ?format, rows = table.len(), "exported table");
    Ok(())
}
