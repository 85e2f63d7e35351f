/// Data layer: table model, reading and writing.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  reader   │  parse file → Workbook
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Workbook    │  Vec<Sheet>, each Vec<Column> of CellValue
///   └──────────────┘
///        ▲
///        │
///   ┌──────────┐
///   │  writer   │  paste / add / add_to_row → pad → save
///   └──────────┘
/// ```

pub mod error;
pub mod model;
pub mod reader;
pub mod writer;

use std::path::Path;

pub use error::{TableError, TableResult};
pub use model::{CellValue, Column, IntoCells, Key, Sheet, Workbook};
pub use reader::TableReader;
pub use writer::TableWriter;

/// On-disk table format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Multi-sheet workbook.
    Json,
    /// Single sheet.
    Csv,
    /// Single sheet.
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> TableResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Ok(TableFormat::Json),
            "csv" => Ok(TableFormat::Csv),
            "parquet" | "pq" => Ok(TableFormat::Parquet),
            _ => Err(TableError::UnsupportedFormat { extension: ext }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableFormat::Json => "JSON",
            TableFormat::Csv => "CSV",
            TableFormat::Parquet => "Parquet",
        }
    }

    pub fn supports_multiple_sheets(self) -> bool {
        matches!(self, TableFormat::Json)
    }
}
