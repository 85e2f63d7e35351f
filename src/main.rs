use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use rusty_deriv::batch::{derive_sheet, write_results};
use rusty_deriv::{DeriveOptions, FitFallback, InterpolationKind, TableReader, TableWriter};

/// Derivative and extremum estimation for tabulated measurement curves.
#[derive(Parser, Debug)]
#[command(name = "rusty-deriv", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive every value column of a table (column 0 is x)
    Derive {
        /// Input table (.json, .csv, .parquet)
        input: PathBuf,

        /// Output table; defaults to `<input stem>_derived.json`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only process this sheet (name)
        #[arg(long)]
        sheet: Option<String>,

        /// JSON file with pipeline options
        #[arg(long)]
        options: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// List sheets and columns of a table
    Inspect {
        input: PathBuf,
    },
}

/// Command-line overrides of [`DeriveOptions`].
#[derive(Args, Debug, Default)]
struct PipelineArgs {
    /// Locate the minimum of the derivative instead of the maximum
    #[arg(long)]
    find_min: bool,

    /// Skip parabolic refinement
    #[arg(long)]
    no_parabola: bool,

    /// Take the natural logarithm of y first
    #[arg(long)]
    log: bool,

    /// Lower x bound of the extremum search
    #[arg(long, allow_hyphen_values = true)]
    start: Option<f64>,

    /// Upper x bound of the extremum search
    #[arg(long, allow_hyphen_values = true)]
    end: Option<f64>,

    /// linear, quadratic or cubic
    #[arg(long)]
    interpolation_type: Option<InterpolationKind>,

    /// Size of the resampling grid
    #[arg(long)]
    interpolation_points: Option<usize>,

    #[arg(long)]
    no_smooth_signal: bool,

    #[arg(long)]
    smooth_signal_window: Option<usize>,

    #[arg(long)]
    poly_order_signal: Option<usize>,

    #[arg(long)]
    no_smooth_derivative: bool,

    #[arg(long)]
    smooth_derivative_window: Option<usize>,

    #[arg(long)]
    poly_order_derivative: Option<usize>,

    /// Half-width of the refinement neighbourhood (x units)
    #[arg(long)]
    parabola_half_width: Option<f64>,

    /// coarse (keep the grid extremum) or error
    #[arg(long)]
    on_fit_failure: Option<FitFallback>,
}

impl PipelineArgs {
    fn apply(self, options: &mut DeriveOptions) {
        if self.find_min {
            options.find_max = false;
        }
        if self.no_parabola {
            options.use_parabola = false;
        }
        if self.log {
            options.log = true;
        }
        if self.no_smooth_signal {
            options.smooth_signal = false;
        }
        if self.no_smooth_derivative {
            options.smooth_derivative = false;
        }
        options.start = self.start.or(options.start);
        options.end = self.end.or(options.end);
        if let Some(v) = self.interpolation_type {
            options.interpolation_type = v;
        }
        if let Some(v) = self.interpolation_points {
            options.interpolation_points = v;
        }
        if let Some(v) = self.smooth_signal_window {
            options.smooth_signal_window = v;
        }
        if let Some(v) = self.poly_order_signal {
            options.poly_order_signal = v;
        }
        if let Some(v) = self.smooth_derivative_window {
            options.smooth_derivative_window = v;
        }
        if let Some(v) = self.poly_order_derivative {
            options.poly_order_derivative = v;
        }
        if let Some(v) = self.parabola_half_width {
            options.parabola_half_width = v;
        }
        if let Some(v) = self.on_fit_failure {
            options.on_fit_failure = v;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Derive {
            input,
            output,
            sheet,
            options,
            pipeline,
        } => {
            let mut opts = match options {
                Some(path) => load_options(&path)?,
                None => DeriveOptions::default(),
            };
            pipeline.apply(&mut opts);
            let output = output.unwrap_or_else(|| default_output(&input));
            run_derive(&input, &output, sheet.as_deref(), &opts)
        }
        Command::Inspect { input } => inspect(&input),
    }
}

fn load_options(path: &Path) -> Result<DeriveOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading options file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing options file {}", path.display()))
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    input.with_file_name(format!("{stem}_derived.json"))
}

fn run_derive(input: &Path, output: &Path, sheet: Option<&str>, options: &DeriveOptions) -> Result<()> {
    let table = TableReader::open(input).with_context(|| format!("opening {}", input.display()))?;

    let sheets: Vec<&str> = match sheet {
        Some(name) => {
            table.sheet(name)?;
            vec![name]
        }
        None => table.sheet_names(),
    };
    if sheets.is_empty() {
        bail!("{} contains no sheets", input.display());
    }

    let mut writer = TableWriter::new();
    for name in sheets {
        let results = derive_sheet(table.sheet(name)?, options)?;
        for r in &results {
            println!(
                "{name}\t{}\tx* = {:.6}\ty* = {:.6}",
                r.name, r.derivation.extremum.x, r.derivation.extremum.y
            );
        }
        write_results(&mut writer, name, &results);
    }

    writer
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let table = TableReader::open(input).with_context(|| format!("opening {}", input.display()))?;
    println!("{}: {} sheet(s)", table.path().display(), table.sheet_count());
    for sheet in &table.workbook().sheets {
        println!("{} ({} rows)", sheet.name, sheet.row_count());
        for column in &sheet.columns {
            let numeric = column.values.iter().filter(|v| v.as_f64().is_some()).count();
            println!("  {:<24} {} values, {} numeric", column.name, column.values.len(), numeric);
        }
    }
    Ok(())
}
