//! Writing tables and reading them back, plus the batch runner on top.

use rusty_deriv::batch::{derive_sheet, derivative_sheet_name, extrema_sheet_name, write_results};
use rusty_deriv::{CellValue, DeriveOptions, TableError, TableReader, TableWriter};
use tempfile::tempdir;

fn mixed_writer(sheet: &str) -> TableWriter {
    let mut w = TableWriter::new();
    w.paste(sheet, "x", vec![0.5, 1.5, 2.0, 3.25]);
    w.paste(sheet, "count", vec![1_i64, 2]);
    w.paste(sheet, "label", vec!["a", "b", "c"]);
    w.paste(sheet, "ok", vec![true, false, true, true]);
    w
}

fn expected_mixed() -> Vec<(&'static str, Vec<CellValue>)> {
    vec![
        ("x", vec![0.5.into(), 1.5.into(), 2.0.into(), 3.25.into()]),
        (
            "count",
            vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Null, CellValue::Null],
        ),
        ("label", vec!["a".into(), "b".into(), "c".into(), CellValue::Null]),
        ("ok", vec![true.into(), false.into(), true.into(), true.into()]),
    ]
}

fn assert_sheet_matches(reader: &TableReader, sheet: &str) {
    let expected = expected_mixed();
    let names: Vec<&str> = expected.iter().map(|(n, _)| *n).collect();
    assert_eq!(reader.column_names(sheet).unwrap(), names);
    for (name, values) in &expected {
        assert_eq!(reader.column(sheet, *name).unwrap(), values.as_slice(), "column {name}");
    }
}

#[test]
fn json_round_trip_keeps_every_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.json");

    let mut w = mixed_writer("first");
    w.paste("second", "only", vec![42_i64]);
    w.save(&path).unwrap();

    let reader = TableReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["first", "second"]);
    assert_eq!(reader.sheet_count(), 2);
    assert_sheet_matches(&reader, "first");
    assert_eq!(reader.column(1usize, 0usize).unwrap(), &[CellValue::Integer(42)]);
    assert_eq!(reader.column_count("second").unwrap(), 1);
}

#[test]
fn csv_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sheet1.csv");
    mixed_writer("sheet1").save(&path).unwrap();

    let reader = TableReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["sheet1"]);
    assert_sheet_matches(&reader, "sheet1");
}

#[test]
fn parquet_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sheet1.parquet");
    mixed_writer("sheet1").save(&path).unwrap();

    let reader = TableReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["sheet1"]);
    assert_sheet_matches(&reader, "sheet1");
    assert_eq!(reader.value_column_names("sheet1").unwrap(), vec!["count", "label", "ok"]);
}

#[test]
fn reading_a_missing_file_fails() {
    let dir = tempdir().unwrap();
    let err = TableReader::open(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TableError::NotFound(_)));
}

#[test]
fn derive_every_series_of_a_sheet() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("curves.json");

    let x: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();
    let rising: Vec<f64> = x.iter().map(|v| 1.0 / (1.0 + (-(v - 40.0) / 3.0).exp())).collect();
    // Shorter column: padded with nulls on save, skipped when deriving.
    let falling: Vec<f64> = x[..150]
        .iter()
        .map(|v| 1.0 / (1.0 + ((v - 30.0) / 2.0).exp()))
        .collect();

    let mut w = TableWriter::new();
    w.paste("run", "x", x);
    w.paste("run", "rising", rising);
    w.paste("run", "falling", falling);
    w.save(&input).unwrap();

    let reader = TableReader::open(&input).unwrap();
    let options = DeriveOptions {
        smooth_signal: false,
        ..Default::default()
    };
    let results = derive_sheet(reader.sheet("run").unwrap(), &options).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "rising");
    assert!((results[0].derivation.extremum.x - 40.0).abs() < 0.1);
    // Maximum of the derivative of a falling step: its flattest end.
    assert!(results[1].derivation.derivative.x[999] <= 74.5 + 1e-9);

    let mut out = TableWriter::new();
    write_results(&mut out, "run", &results);
    let output = dir.path().join("derived.json");
    out.save(&output).unwrap();

    let derived = TableReader::open(&output).unwrap();
    assert_eq!(
        derived.sheet_names(),
        vec![derivative_sheet_name("run"), extrema_sheet_name("run")]
    );
    assert_eq!(
        derived.column_names("run_derivative").unwrap(),
        vec!["rising x", "rising dy", "falling x", "falling dy"]
    );
    assert_eq!(
        derived.column("run_extrema", "series").unwrap(),
        &[CellValue::from("rising"), CellValue::from("falling")]
    );
    let xs = derived.column_f64("run_extrema", "x").unwrap();
    assert!((xs[0] - 40.0).abs() < 0.1);
}
