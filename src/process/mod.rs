// src/process/mod.rs
pub mod convert;
pub mod date_parser;
pub mod delimited;
pub mod derive;
pub mod raw_table;
pub mod records;
pub mod sanitize;
pub mod spreadsheet;
pub mod utils;

pub use derive::{derive_consumption, DeviceSeries, WideReading};
pub use raw_table::RawTable;
pub use sanitize::remove_water_columns;

use tracing::debug;

use crate::error::{PipelineError, Result};
use utils::file_suffix;

/// Input layouts the loader understands, keyed by file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `.csv`, comma-delimited
    Csv,
    /// `.xlsx`, first worksheet
    Xlsx,
    /// `.json`, structured records
    Json,
    /// `.txt`, tab-delimited
    Tsv,
}

impl InputFormat {
    /// Pick the format from the file name alone (case-insensitive suffix).
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        match file_suffix(file_name).as_deref() {
            Some(".csv") => Ok(InputFormat::Csv),
            Some(".xlsx") => Ok(InputFormat::Xlsx),
            Some(".json") => Ok(InputFormat::Json),
            Some(".txt") => Ok(InputFormat::Tsv),
            _ => Err(PipelineError::unsupported_format(file_name)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Xlsx => "xlsx",
            InputFormat::Json => "json",
            InputFormat::Tsv => "txt",
        }
    }
}

/// Parse `content` into a [`RawTable`], choosing the parser from `file_name`'s suffix.
/// `file_name` is never opened; only `content` is read.
#[tracing::instrument(level = "debug", skip(content), fields(bytes = content.len()))]
pub fn load_table(file_name: &str, content: &[u8]) -> Result<RawTable> {
    let format = InputFormat::from_file_name(file_name)?;
    debug!(format = format.as_str(), "dispatching loader");
    match format {
        InputFormat::Csv => delimited::read_delimited(content, b','),
        InputFormat::Tsv => delimited::read_delimited(content, b'\t'),
        InputFormat::Xlsx => spreadsheet::read_first_sheet(content),
        InputFormat::Json => records::read_records(content),
    }
}
