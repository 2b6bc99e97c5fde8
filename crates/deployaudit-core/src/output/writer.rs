//! Report file writer

use crate::error::{Error, Result};
use crate::output::csv_format::format_csv;
use crate::output::json_format::format_json;
use crate::types::ReportRow;
use std::path::Path;
use std::str::FromStr;

/// Report file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Eight-column table with the classic headers
    #[default]
    Csv,
    /// Array of full rows
    Json,
}

impl OutputFormat {
    /// Render `rows` in this format
    pub fn render(self, rows: &[ReportRow]) -> Result<String> {
        match self {
            OutputFormat::Csv => Ok(format_csv(rows)),
            OutputFormat::Json => format_json(rows),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "unknown output format '{}', expected csv or json",
                other
            ))),
        }
    }
}

/// Report file writer
pub struct ReportWriter;

impl ReportWriter {
    /// Write `rows` to `path` in `format`.
    ///
    /// Returns `false` and leaves the filesystem untouched when there are no rows.
    pub fn write(path: &Path, rows: &[ReportRow], format: OutputFormat) -> Result<bool> {
        if rows.is_empty() {
            return Ok(false);
        }
        let content = format.render(rows)?;
        std::fs::write(path, content)?;
        Ok(true)
    }
}
