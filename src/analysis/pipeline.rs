use log::{debug, warn};

use super::error::{DeriveError, DeriveResult};
use super::extremum::{locate, nearest_index, refine};
use super::gradient::gradient;
use super::interpolate::{resample, ResampledCurve};
use super::options::{DeriveOptions, FitFallback, SmoothingParams};
use super::savgol::SavitzkyGolay;

// ---------------------------------------------------------------------------
// Signal – validated input
// ---------------------------------------------------------------------------

/// Borrowed `(x, y)` measurement curve with equal, finite columns.
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl<'a> Signal<'a> {
    pub fn new(x: &'a [f64], y: &'a [f64]) -> DeriveResult<Self> {
        if x.len() != y.len() {
            return Err(DeriveError::validation(
                "y",
                format!("length {} does not match x length {}", y.len(), x.len()),
            ));
        }
        if x.is_empty() {
            return Err(DeriveError::InsufficientData {
                context: "signal".to_string(),
                required: 1,
                actual: 0,
            });
        }
        for (name, column) in [("x", x), ("y", y)] {
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                return Err(DeriveError::validation(
                    name,
                    format!("value at index {i} is not finite ({})", column[i]),
                ));
            }
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &'a [f64] {
        self.x
    }

    pub fn y(&self) -> &'a [f64] {
        self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Derivative on the resampled grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeCurve {
    pub x: Vec<f64>,
    /// Reported derivative (smoothed when derivative smoothing is on).
    pub dy: Vec<f64>,
    /// Unsmoothed finite-difference gradient.
    pub dy_raw: Vec<f64>,
}

impl DerivativeCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Outcome of the parabolic refinement step.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    Disabled,
    Refined,
    /// The fit failed and the coarse location was kept.
    FellBack(String),
}

/// The located extremum of the derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    /// Final location (refined or coarse).
    pub x: f64,
    /// Resampled signal value at the grid point nearest `x`.
    pub y: f64,
    /// Grid location found by the coarse search.
    pub coarse_x: f64,
    pub refinement: Refinement,
}

impl Extremum {
    pub fn is_refined(&self) -> bool {
        self.refinement == Refinement::Refined
    }
}

/// Everything produced by one [`derive`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub resampled: ResampledCurve,
    pub derivative: DerivativeCurve,
    pub extremum: Extremum,
}

impl Derivation {
    /// The `(x, dy)` derivative curve.
    pub fn curve(&self) -> (&[f64], &[f64]) {
        (&self.derivative.x, &self.derivative.dy)
    }

    /// The `(x*, y*)` extremum.
    pub fn point(&self) -> (f64, f64) {
        (self.extremum.x, self.extremum.y)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Resample, differentiate and locate the extremum of the derivative of
/// the curve `(x, y)`.
pub fn derive(x: &[f64], y: &[f64], options: &DeriveOptions) -> DeriveResult<Derivation> {
    options.validate()?;
    let signal = Signal::new(x, y)?;

    let processed = preprocess(&signal, options)?;
    let resampled = resample(
        signal.x(),
        &processed,
        options.interpolation_type,
        options.interpolation_points,
    )?;
    debug!(
        "resampled {} samples onto {} {} grid points, step {:.3e}",
        signal.len(),
        resampled.len(),
        options.interpolation_type,
        resampled.step()
    );

    let derivative = differentiate(&resampled, options)?;

    let grid = &derivative.x;
    let start = options.start.unwrap_or(grid[0]);
    let end = options.end.unwrap_or(grid[grid.len() - 1]);
    let coarse_idx = locate(grid, &derivative.dy, start, end, options.find_max)?;
    let coarse_x = grid[coarse_idx];
    debug!(
        "coarse {} of derivative at x = {coarse_x} (index {coarse_idx}) in [{start}, {end}]",
        if options.find_max { "maximum" } else { "minimum" }
    );

    let (x_star, refinement) = if options.use_parabola {
        match refine(grid, &derivative.dy_raw, coarse_x, options.parabola_half_width) {
            Ok(refined) => {
                debug!("parabolic refinement moved extremum {coarse_x} -> {refined}");
                (refined, Refinement::Refined)
            }
            Err(e) => match options.on_fit_failure {
                FitFallback::Error => return Err(e),
                FitFallback::Coarse => {
                    warn!("{e}; keeping coarse extremum at x = {coarse_x}");
                    (coarse_x, Refinement::FellBack(e.to_string()))
                }
            },
        }
    } else {
        (coarse_x, Refinement::Disabled)
    };

    let y_star = resampled.y[nearest_index(&resampled.x, x_star)];

    Ok(Derivation {
        resampled,
        derivative,
        extremum: Extremum {
            x: x_star,
            y: y_star,
            coarse_x,
            refinement,
        },
    })
}

/// Log transform and signal smoothing.
fn preprocess(signal: &Signal<'_>, options: &DeriveOptions) -> DeriveResult<Vec<f64>> {
    let mut y = signal.y().to_vec();
    if options.log {
        if let Some(index) = y.iter().position(|&v| v <= 0.0) {
            return Err(DeriveError::Domain {
                index,
                value: y[index],
            });
        }
        y.iter_mut().for_each(|v| *v = v.ln());
    }
    match options.signal_smoothing() {
        Some(params) => smooth(&y, params, "smooth_signal_window", "poly_order_signal"),
        None => Ok(y),
    }
}

/// Gradient of the resampled curve, optionally smoothed.
fn differentiate(curve: &ResampledCurve, options: &DeriveOptions) -> DeriveResult<DerivativeCurve> {
    let dy_raw = gradient(&curve.x, &curve.y)?;
    let dy = match options.derivative_smoothing() {
        Some(params) => smooth(
            &dy_raw,
            params,
            "smooth_derivative_window",
            "poly_order_derivative",
        )?,
        None => dy_raw.clone(),
    };
    Ok(DerivativeCurve {
        x: curve.x.clone(),
        dy,
        dy_raw,
    })
}

/// Run the filter, naming the offending option in validation errors.
fn smooth(
    data: &[f64],
    params: SmoothingParams,
    window_option: &str,
    order_option: &str,
) -> DeriveResult<Vec<f64>> {
    SavitzkyGolay::new(params)
        .and_then(|filter| filter.apply(data))
        .map_err(|e| match e {
            DeriveError::Validation { parameter, message } => DeriveError::Validation {
                parameter: if parameter == "poly_order" {
                    order_option.to_string()
                } else {
                    window_option.to_string()
                },
                message,
            },
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn plain() -> DeriveOptions {
        DeriveOptions {
            smooth_signal: false,
            smooth_derivative: false,
            use_parabola: false,
            ..Default::default()
        }
    }

    #[test]
    fn signal_rejects_mismatched_and_non_finite() {
        assert!(Signal::new(&[0.0, 1.0], &[0.0]).is_err());
        assert!(Signal::new(&[], &[]).is_err());
        let err = Signal::new(&[0.0, f64::NAN], &[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn log_domain_error_reports_first_bad_index() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 0.5, -2.0, 0.0];
        let options = DeriveOptions { log: true, ..plain() };
        assert_eq!(
            derive(&x, &y, &options).unwrap_err(),
            DeriveError::Domain { index: 2, value: -2.0 }
        );
    }

    #[test]
    fn log_transform_turns_exponential_into_constant_slope() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| (1.5 * v).exp()).collect();
        let options = DeriveOptions { log: true, interpolation_points: 200, ..plain() };
        let d = derive(&x, &y, &options).unwrap();
        for g in &d.derivative.dy {
            assert_abs_diff_eq!(*g, 1.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn smoothing_errors_name_the_option() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let options = DeriveOptions {
            smooth_signal: true,
            smooth_signal_window: 8,
            ..plain()
        };
        match derive(&x, &x, &options).unwrap_err() {
            DeriveError::Validation { parameter, .. } => {
                assert_eq!(parameter, "smooth_signal_window")
            }
            other => panic!("unexpected error {other:?}"),
        }

        let options = DeriveOptions {
            smooth_derivative: true,
            smooth_derivative_window: 5,
            poly_order_derivative: 7,
            ..plain()
        };
        match derive(&x, &x, &options).unwrap_err() {
            DeriveError::Validation { parameter, .. } => {
                assert_eq!(parameter, "poly_order_derivative")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn raw_derivative_is_kept_when_smoothing() {
        let x: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let options = DeriveOptions {
            smooth_derivative: true,
            smooth_derivative_window: 21,
            interpolation_points: 300,
            ..plain()
        };
        let d = derive(&x, &y, &options).unwrap();
        assert_eq!(d.derivative.dy_raw, gradient(&d.resampled.x, &d.resampled.y).unwrap());
        assert_ne!(d.derivative.dy, d.derivative.dy_raw);
    }
}
