use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{TableError, TableResult};
use super::model::{CellValue, Column, Key, Sheet, Workbook};
use super::TableFormat;

// ---------------------------------------------------------------------------
// TableReader – a loaded workbook with lookup helpers
// ---------------------------------------------------------------------------

/// A table file loaded into memory.
#[derive(Debug, Clone)]
pub struct TableReader {
    path: PathBuf,
    workbook: Workbook,
}

impl TableReader {
    /// Load a table file. Dispatch by extension.
    ///
    /// Supported formats:
    /// * `.json`    – a whole workbook: `{"sheets": [{"name", "columns": [{"name", "values"}]}]}`
    /// * `.csv`     – one sheet named after the file stem, header row = column names
    /// * `.parquet` – one sheet named after the file stem, scalar columns
    pub fn open(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        let format = TableFormat::from_path(path)?;

        info!("Reading '{}'", display_name(path));
        let workbook = match format {
            TableFormat::Json => load_json(path)?,
            TableFormat::Csv => load_csv(path)?,
            TableFormat::Parquet => load_parquet(path)?,
        };
        for sheet in &workbook.sheets {
            info!("Sheet '{}' has {} columns", sheet.name, sheet.columns.len());
        }

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All sheets, columns and cells.
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheet_names()
    }

    pub fn sheet_count(&self) -> usize {
        self.workbook.sheets.len()
    }

    pub fn sheet<'k>(&self, sheet: impl Into<Key<'k>>) -> TableResult<&Sheet> {
        self.workbook.sheet(sheet.into())
    }

    pub fn column_names<'k>(&self, sheet: impl Into<Key<'k>>) -> TableResult<Vec<&str>> {
        Ok(self.sheet(sheet)?.column_names())
    }

    pub fn column_count<'k>(&self, sheet: impl Into<Key<'k>>) -> TableResult<usize> {
        Ok(self.sheet(sheet)?.columns.len())
    }

    /// Column names except the first, which conventionally holds x.
    pub fn value_column_names<'k>(&self, sheet: impl Into<Key<'k>>) -> TableResult<Vec<&str>> {
        Ok(self.column_names(sheet)?.into_iter().skip(1).collect())
    }

    /// Cells of one column.
    pub fn column<'s, 'c>(
        &self,
        sheet: impl Into<Key<'s>>,
        column: impl Into<Key<'c>>,
    ) -> TableResult<&[CellValue]> {
        Ok(&self.sheet(sheet)?.column(column.into())?.values)
    }

    /// One column as numbers; `Null` cells become NaN.
    pub fn column_f64<'s, 'c>(
        &self,
        sheet: impl Into<Key<'s>>,
        column: impl Into<Key<'c>>,
    ) -> TableResult<Vec<f64>> {
        self.sheet(sheet)?.column(column.into())?.to_f64()
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sheet name used for single-sheet formats.
pub(crate) fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (what [`TableWriter`](super::writer::TableWriter) saves):
///
/// ```json
/// {
///   "sheets": [
///     {
///       "name": "spectra",
///       "columns": [
///         { "name": "x", "values": [0.0, 0.5, 1.0] },
///         { "name": "A", "values": [1.2, 1.4, null] }
///       ]
///     }
///   ]
/// }
/// ```
fn load_json(path: &Path) -> TableResult<Workbook> {
    let text = std::fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;
    let workbook: Workbook = serde_json::from_str(&text)?;
    Ok(workbook)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one value per cell. Empty
/// cells and the missing tail of short rows are `Null`, so every column
/// has the length of the longest one.
fn load_csv(path: &Path) -> TableResult<Workbook> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|h| Column::new(h.clone(), Vec::new()))
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(TableError::InvalidTable(format!(
                "CSV row {row_no} has {} cells but the header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let value = record.get(col_idx).map_or(CellValue::Null, CellValue::guess);
            column.values.push(value);
        }
    }

    let mut sheet = Sheet::new(stem_name(path));
    sheet.columns = columns;
    Ok(Workbook {
        sheets: vec![sheet],
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as a single sheet.
///
/// Expected schema: any number of scalar columns (Utf8 / LargeUtf8,
/// Int32, Int64, Float32, Float64, Boolean). Nulls become `Null` cells.
/// Works with files written by Pandas (`df.to_parquet()`) and Polars.
fn load_parquet(path: &Path) -> TableResult<Workbook> {
    let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut columns: Vec<Column> = names
        .iter()
        .map(|n| Column::new(n.clone(), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                column.values.push(extract_cell(array, row)?);
            }
        }
    }

    let mut sheet = Sheet::new(stem_name(path));
    sheet.columns = columns;
    Ok(Workbook {
        sheets: vec![sheet],
    })
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> TableResult<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let unexpected = || {
        TableError::InvalidTable(format!("unexpected array layout for {:?}", col.data_type()))
    };
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col.as_any().downcast_ref::<StringArray>().ok_or_else(unexpected)?;
            CellValue::String(s.value(row).to_string())
        }
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().ok_or_else(unexpected)?;
            CellValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().ok_or_else(unexpected)?;
            CellValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().ok_or_else(unexpected)?;
            CellValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().ok_or_else(unexpected)?;
            CellValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().ok_or_else(unexpected)?;
            CellValue::Bool(arr.value(row))
        }
        other => {
            return Err(TableError::InvalidTable(format!(
                "unsupported Parquet column type {other:?}"
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_not_found() {
        let err = TableReader::open("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TableError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.xlsx");
        std::fs::write(&path, b"binary").unwrap();
        assert!(matches!(
            TableReader::open(&path),
            Err(TableError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn csv_sheet_is_named_after_file_and_typed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run1.csv");
        std::fs::write(&path, "x,A,label\n0,1.5,a\n1,2.5,\n2,,\n").unwrap();

        let reader = TableReader::open(&path).unwrap();
        assert_eq!(reader.sheet_names(), vec!["run1"]);
        assert_eq!(reader.column_names("run1").unwrap(), vec!["x", "A", "label"]);
        assert_eq!(reader.value_column_names(0usize).unwrap(), vec!["A", "label"]);
        assert_eq!(reader.column_f64("run1", "x").unwrap(), vec![0.0, 1.0, 2.0]);
        assert_eq!(
            reader.column(0usize, 1usize).unwrap(),
            &[CellValue::Float(1.5), CellValue::Float(2.5), CellValue::Null]
        );
        assert_eq!(
            reader.column("run1", "label").unwrap(),
            &[CellValue::from("a"), CellValue::Null, CellValue::Null]
        );
    }

    #[test]
    fn unknown_sheet_and_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "x,y\n1,2\n").unwrap();
        let reader = TableReader::open(&path).unwrap();
        assert!(matches!(reader.column_count("nope"), Err(TableError::UnknownSheet(_))));
        assert!(matches!(
            reader.column("t", "z"),
            Err(TableError::UnknownColumn { .. })
        ));
        assert!(matches!(reader.column("t", 5usize), Err(TableError::UnknownColumn { .. })));
    }
}
