use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{TableError, TableResult};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell.
///
/// Serialized untagged, so a JSON workbook stores cells as plain `null`,
/// booleans, numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number. Booleans and strings are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Best-effort typing of a text cell: empty → `Null`, then integer,
    /// float, boolean, and finally string.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<f32> for CellValue {
    fn from(v: f32) -> Self {
        CellValue::Float(v as f64)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Integer(v as i64)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// IntoCells – anything the writer accepts as column data
// ---------------------------------------------------------------------------

/// Conversion of column data (a sequence or a single scalar) into cells.
pub trait IntoCells {
    fn into_cells(self) -> Vec<CellValue>;
}

impl<T: Into<CellValue>> IntoCells for Vec<T> {
    fn into_cells(self) -> Vec<CellValue> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<CellValue> + Clone> IntoCells for &[T] {
    fn into_cells(self) -> Vec<CellValue> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl<T: Into<CellValue> + Clone, const N: usize> IntoCells for [T; N] {
    fn into_cells(self) -> Vec<CellValue> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! scalar_into_cells {
    ($($t:ty),*) => {
        $(impl IntoCells for $t {
            fn into_cells(self) -> Vec<CellValue> {
                vec![self.into()]
            }
        })*
    };
}

scalar_into_cells!(f64, f32, i64, i32, bool, &str, String, CellValue);

// ---------------------------------------------------------------------------
// Key – select a sheet or column by name or by position
// ---------------------------------------------------------------------------

/// Sheet or column selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(name: &'a String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key<'_> {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "'{name}'"),
            Key::Index(i) => write!(f, "#{i}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Sheet / Workbook
// ---------------------------------------------------------------------------

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Numeric view of the column. `Null` cells become NaN.
    pub fn to_f64(&self) -> TableResult<Vec<f64>> {
        self.values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                CellValue::Null => Ok(f64::NAN),
                other => other.as_f64().ok_or_else(|| TableError::NotNumeric {
                    column: self.name.clone(),
                    row,
                    value: other.to_string(),
                }),
            })
            .collect()
    }
}

/// A named, ordered collection of columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, key: Key<'_>) -> TableResult<&Column> {
        let found = match key {
            Key::Name(name) => self.columns.iter().find(|c| c.name == name),
            Key::Index(i) => self.columns.get(i),
        };
        found.ok_or_else(|| TableError::UnknownColumn {
            sheet: self.name.clone(),
            column: key.to_string(),
        })
    }

    /// Column by name, created empty at the end when missing.
    pub fn column_mut_or_insert(&mut self, name: &str) -> &mut Column {
        let idx = match self.columns.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.columns.push(Column::new(name, Vec::new()));
                self.columns.len() - 1
            }
        };
        &mut self.columns[idx]
    }

    /// Length of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    /// Right-pad every column with `Null` to the longest column.
    pub fn pad_columns(&mut self) {
        let rows = self.row_count();
        for column in &mut self.columns {
            column.values.resize(rows, CellValue::Null);
        }
    }
}

/// An ordered collection of sheets: the in-memory image of a table file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, key: Key<'_>) -> TableResult<&Sheet> {
        let found = match key {
            Key::Name(name) => self.sheets.iter().find(|s| s.name == name),
            Key::Index(i) => self.sheets.get(i),
        };
        found.ok_or_else(|| TableError::UnknownSheet(key.to_string()))
    }

    /// Sheet by name, created empty at the end when missing.
    pub fn sheet_mut_or_insert(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_types_text_cells() {
        assert_eq!(CellValue::guess(""), CellValue::Null);
        assert_eq!(CellValue::guess("42"), CellValue::Integer(42));
        assert_eq!(CellValue::guess("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::guess("true"), CellValue::Bool(true));
        assert_eq!(CellValue::guess("abc"), CellValue::String("abc".into()));
    }


    #[test]
    fn untagged_json_cells() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"[null, true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Integer(3),
                CellValue::Float(2.5),
                CellValue::String("x".into()),
            ]
        );
    }

    #[test]
    fn column_numeric_view() {
        let col = Column::new("y", vec![CellValue::Integer(1), CellValue::Float(2.5), CellValue::Null]);
        let v = col.to_f64().unwrap();
        assert_eq!(&v[..2], &[1.0, 2.5]);
        assert!(v[2].is_nan());

        let bad = Column::new("y", vec![CellValue::Integer(1), "n/a".into()]);
        assert!(matches!(bad.to_f64(), Err(TableError::NotNumeric { row: 1, .. })));
    }

    #[test]
    fn keys_select_by_name_or_index() {
        let mut wb = Workbook::default();
        let sheet = wb.sheet_mut_or_insert("data");
        sheet.column_mut_or_insert("x").values.push(1.into());
        sheet.column_mut_or_insert("y").values.push(2.into());

        assert_eq!(wb.sheet(Key::Name("data")).unwrap().name, "data");
        let sheet = wb.sheet(Key::Index(0)).unwrap();
        assert_eq!(sheet.column(Key::Name("y")).unwrap().values, vec![CellValue::Integer(2)]);
        assert_eq!(sheet.column(Key::Index(0)).unwrap().name, "x");
        assert!(matches!(wb.sheet(Key::Index(3)), Err(TableError::UnknownSheet(_))));
        assert!(matches!(sheet.column(Key::from("z")), Err(TableError::UnknownColumn { .. })));
    }
}
