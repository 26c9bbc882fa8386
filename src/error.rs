//! Error taxonomy surfaced by the ingestion pipeline.

use thiserror::Error;

/// Suffixes accepted by the file loader, in the order they are reported to users.
pub const SUPPORTED_SUFFIXES: [&str; 4] = [".csv", ".xlsx", ".json", ".txt"];

/// The three ways an upload can fail.
///
/// Every stage of the pipeline reports through this type so callers only ever see a
/// populated table or one of these, never both.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// File suffix is not one of [`SUPPORTED_SUFFIXES`].
    #[error("unsupported format: {message}")]
    Format { message: String },

    /// A required column is absent.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Anything else that went wrong while loading or deriving.
    #[error("error processing file: {message}")]
    Parse { message: String },
}

impl PipelineError {
    pub fn unsupported_format(file_name: &str) -> Self {
        PipelineError::Format {
            message: format!(
                "'{}' is not supported, use {}",
                file_name,
                SUPPORTED_SUFFIXES.join(", ")
            ),
        }
    }

    pub fn missing_column(column: &str) -> Self {
        PipelineError::Schema {
            message: format!("missing {} column", column),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        PipelineError::Parse {
            message: message.into(),
        }
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Format { .. } => "format",
            PipelineError::Schema { .. } => "schema",
            PipelineError::Parse { .. } => "parse",
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::parse(format!("malformed delimited text: {}", err))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::parse(format!("malformed JSON: {}", err))
    }
}

impl From<calamine::XlsxError> for PipelineError {
    fn from(err: calamine::XlsxError) -> Self {
        PipelineError::parse(format!("malformed spreadsheet: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
