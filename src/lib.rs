//! Derivative and extremum estimation for noisy, irregularly sampled
//! measurement curves, plus the table reading and writing around it.
//!
//! ```no_run
//! use rusty_deriv::{derive, DeriveOptions, TableReader};
//!
//! let table = TableReader::open("measurements.json")?;
//! let x = table.column_f64("run", "x")?;
//! let y = table.column_f64("run", "signal")?;
//!
//! let options = DeriveOptions { find_max: false, ..Default::default() };
//! let result = derive(&x, &y, &options)?;
//! println!("extremum at x = {}", result.extremum.x);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod batch;
pub mod data;

pub use analysis::{
    derive, Derivation, DerivativeCurve, DeriveError, DeriveOptions, DeriveResult, Extremum,
    FitFallback, InterpolationKind, Refinement, ResampledCurve,
};
pub use data::{CellValue, Key, TableError, TableFormat, TableReader, TableWriter, Workbook};
