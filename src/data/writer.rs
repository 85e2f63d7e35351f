use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

use super::error::{TableError, TableResult};
use super::model::{CellValue, Column, IntoCells, Sheet, Workbook};
use super::reader::display_name;
use super::TableFormat;

// ---------------------------------------------------------------------------
// TableWriter – accumulate columns, then save
// ---------------------------------------------------------------------------

/// Collects named columns into named sheets and persists them.
///
/// Sheets and columns keep insertion order. Columns may have different
/// lengths; [`save`](Self::save) right-pads them with `Null`.
#[derive(Debug, Clone, Default)]
pub struct TableWriter {
    workbook: Workbook,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the column's contents.
    pub fn paste(&mut self, sheet: &str, column: &str, data: impl IntoCells) {
        self.column_mut(sheet, column).values = data.into_cells();
    }

    /// Append to the column, creating it if needed.
    pub fn add(&mut self, sheet: &str, column: &str, data: impl IntoCells) {
        self.column_mut(sheet, column).values.extend(data.into_cells());
    }

    /// Write `data` into the column starting at `start_row`, padding with
    /// `Null` up to that row and overwriting cells already there. Empty
    /// data leaves the table untouched.
    pub fn add_to_row(&mut self, sheet: &str, column: &str, data: impl IntoCells, start_row: usize) {
        let cells = data.into_cells();
        if cells.is_empty() {
            return;
        }
        let values = &mut self.column_mut(sheet, column).values;
        let required = start_row + cells.len();
        if values.len() < required {
            values.resize(required, CellValue::Null);
        }
        for (slot, cell) in values[start_row..required].iter_mut().zip(cells) {
            *slot = cell;
        }
    }

    /// Everything collected so far (unpadded).
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn column_mut(&mut self, sheet: &str, column: &str) -> &mut Column {
        self.workbook
            .sheet_mut_or_insert(sheet)
            .column_mut_or_insert(column)
    }

    /// The workbook as it will be written: sheets without columns dropped,
    /// short columns padded.
    pub fn aligned(&self) -> Workbook {
        let sheets = self
            .workbook
            .sheets
            .iter()
            .filter(|s| !s.columns.is_empty())
            .cloned()
            .map(|mut s| {
                s.pad_columns();
                s
            })
            .collect();
        Workbook { sheets }
    }

    /// Persist the table. Format is chosen by extension, as for reading.
    pub fn save(&self, path: impl AsRef<Path>) -> TableResult<()> {
        let path = path.as_ref();
        let format = TableFormat::from_path(path)?;
        let workbook = self.aligned();

        info!("Writing '{}'", display_name(path));
        match format {
            TableFormat::Json => save_json(path, &workbook)?,
            TableFormat::Csv => save_csv(path, single_sheet(&workbook, format)?)?,
            TableFormat::Parquet => save_parquet(path, single_sheet(&workbook, format)?)?,
        }
        info!("File '{}' has been written", display_name(path));
        Ok(())
    }
}

fn single_sheet(workbook: &Workbook, format: TableFormat) -> TableResult<&Sheet> {
    debug_assert!(!format.supports_multiple_sheets());
    match workbook.sheets.as_slice() {
        [sheet] => Ok(sheet),
        [] => Err(TableError::InvalidTable("no sheets with columns to write".to_string())),
        sheets => Err(TableError::TooManySheets {
            format: format.name(),
            count: sheets.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Format writers
// ---------------------------------------------------------------------------

fn save_json(path: &Path, workbook: &Workbook) -> TableResult<()> {
    let file = std::fs::File::create(path).map_err(|e| TableError::io(path, e))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), workbook)?;
    Ok(())
}

/// Floats use `{:?}` so whole numbers keep their decimal point and read
/// back as floats.
fn csv_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Float(v) => format!("{v:?}"),
        other => other.to_string(),
    }
}

fn save_csv(path: &Path, sheet: &Sheet) -> TableResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(sheet.columns.iter().map(|c| c.name.as_str()))?;
    for row in 0..sheet.row_count() {
        writer.write_record(sheet.columns.iter().map(|c| csv_field(&c.values[row])))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))?;
    Ok(())
}

fn save_parquet(path: &Path, sheet: &Sheet) -> TableResult<()> {
    let mut fields = Vec::with_capacity(sheet.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(sheet.columns.len());
    for column in &sheet.columns {
        let array = column_array(&column.values);
        fields.push(Field::new(&column.name, array.data_type().clone(), true));
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = std::fs::File::create(path).map_err(|e| TableError::io(path, e))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Narrowest Arrow type holding every non-null cell: Int64, Float64,
/// Boolean, otherwise Utf8 (non-string cells rendered as text).
fn column_array(values: &[CellValue]) -> ArrayRef {
    let present = || values.iter().filter(|v| !v.is_null());
    let data_type = if present().all(|v| matches!(v, CellValue::Integer(_))) && present().next().is_some() {
        DataType::Int64
    } else if present().all(|v| v.as_f64().is_some()) {
        DataType::Float64
    } else if present().all(|v| matches!(v, CellValue::Bool(_))) {
        DataType::Boolean
    } else {
        DataType::Utf8
    };

    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(CellValue::as_f64).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|v| match v {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}
