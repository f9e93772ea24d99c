//! File export of materialized query results

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::domain::query::{Materialized, Record};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write export file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Header row followed by one delimited line per record
    Csv,
    /// A single JSON array of objects
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write `result` to `path` in `format`. Existing files are overwritten.
pub fn write(
    result: &Materialized,
    format: ExportFormat,
    path: &Path,
    csv_delimiter: u8,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(writer, result, csv_delimiter)?,
        ExportFormat::Json => write_json(writer, &result.records)?,
    }

    tracing::debug!(
        path = %path.display(),
        %format,
        records = result.records.len(),
        "Export written"
    );
    Ok(())
}

fn write_csv<W: Write>(writer: W, result: &Materialized, delimiter: u8) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer.write_record(&result.fields)?;
    for record in &result.records {
        csv_writer.write_record(
            result
                .fields
                .iter()
                .map(|field| csv_cell(record.get(field).unwrap_or(&Value::Null))),
        )?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_json<W: Write>(mut writer: W, records: &[Record]) -> Result<(), serde_json::Error> {
    serde_json::to_writer(&mut writer, records)?;
    writer.flush().map_err(serde_json::Error::io)
}
