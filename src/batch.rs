//! Run the derivative pipeline over every value column of a sheet.
//!
//! Column 0 of a sheet is x; every other column is one y series. Rows
//! where x or y is empty (padding of short columns) are skipped.

use log::{debug, info};

use crate::analysis::{derive, Derivation, DeriveError, DeriveOptions};
use crate::data::{CellValue, Key, Sheet, TableError, TableWriter};

/// Why a sheet could not be processed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("sheet '{sheet}', series '{series}': {source}")]
    Series {
        sheet: String,
        series: String,
        #[source]
        source: DeriveError,
    },

    #[error("sheet '{0}' needs an x column and at least one value column")]
    NoSeries(String),
}

/// One derived y column.
#[derive(Debug, Clone)]
pub struct SeriesResult {
    pub name: String,
    pub derivation: Derivation,
}

/// Derive every value column of `sheet`.
pub fn derive_sheet(sheet: &Sheet, options: &DeriveOptions) -> Result<Vec<SeriesResult>, BatchError> {
    if sheet.columns.len() < 2 {
        return Err(BatchError::NoSeries(sheet.name.clone()));
    }
    let x_all = sheet.column(Key::Index(0))?.to_f64()?;

    let mut results = Vec::with_capacity(sheet.columns.len() - 1);
    for column in &sheet.columns[1..] {
        let y_all = column.to_f64()?;
        let (x, y): (Vec<f64>, Vec<f64>) = x_all
            .iter()
            .zip(&y_all)
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
            .map(|(a, b)| (*a, *b))
            .unzip();
        debug!("sheet '{}', series '{}': {} points", sheet.name, column.name, x.len());

        let derivation = derive(&x, &y, options).map_err(|source| BatchError::Series {
            sheet: sheet.name.clone(),
            series: column.name.clone(),
            source,
        })?;
        info!(
            "'{}' / '{}': extremum at x = {:.6}, y = {:.6}",
            sheet.name, column.name, derivation.extremum.x, derivation.extremum.y
        );
        results.push(SeriesResult {
            name: column.name.clone(),
            derivation,
        });
    }
    Ok(results)
}

/// Name of the sheet holding the derivative curves of `sheet`.
pub fn derivative_sheet_name(sheet: &str) -> String {
    format!("{sheet}_derivative")
}

/// Name of the sheet holding the extrema of `sheet`.
pub fn extrema_sheet_name(sheet: &str) -> String {
    format!("{sheet}_extrema")
}

/// Store the results of one input sheet in `writer`: a sheet of
/// derivative curves (`<series> x`, `<series> dy`) and a sheet with one
/// extremum row per series.
pub fn write_results(writer: &mut TableWriter, sheet: &str, results: &[SeriesResult]) {
    let curves = derivative_sheet_name(sheet);
    let extrema = extrema_sheet_name(sheet);

    for r in results {
        let d = &r.derivation;
        writer.paste(&curves, &format!("{} x", r.name), d.derivative.x.as_slice());
        writer.paste(&curves, &format!("{} dy", r.name), d.derivative.dy.as_slice());

        writer.add(&extrema, "series", r.name.as_str());
        writer.add(&extrema, "x", d.extremum.x);
        writer.add(&extrema, "y", d.extremum.y);
        writer.add(&extrema, "coarse_x", d.extremum.coarse_x);
        writer.add(&extrema, "refined", CellValue::Bool(d.extremum.is_refined()));
    }
}
