use std::path::PathBuf;

use thiserror::Error;

/// Result type for table reading and writing.
pub type TableResult<T> = Result<T, TableError>;

/// Errors raised by the table reader and writer.
#[derive(Debug, Error)]
pub enum TableError {
    /// The input file does not exist.
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported table format '.{extension}' (expected json, csv, parquet or pq)")]
    UnsupportedFormat { extension: String },

    #[error("sheet {0} not found")]
    UnknownSheet(String),

    #[error("column {column} not found in sheet '{sheet}'")]
    UnknownColumn { sheet: String, column: String },

    #[error("column '{column}' row {row}: '{value}' is not numeric")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("{format} files hold a single sheet, but {count} sheets were given")]
    TooManySheets { format: &'static str, count: usize },

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl TableError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
