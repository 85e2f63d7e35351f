//! Interpolating B-splines of degree 1–3 and uniform resampling.

use super::error::{DeriveError, DeriveResult};
use super::linalg::BandedMatrix;
use super::options::InterpolationKind;

/// Monotonic direction of an abscissa sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// Check that `x` is strictly increasing or strictly decreasing.
pub fn monotonic_direction(x: &[f64]) -> DeriveResult<Direction> {
    if x.len() < 2 {
        return Ok(Direction::Increasing);
    }
    let direction = if x[1] > x[0] {
        Direction::Increasing
    } else if x[1] < x[0] {
        Direction::Decreasing
    } else {
        return Err(duplicate_error(0, x[0]));
    };

    for (i, pair) in x.windows(2).enumerate() {
        let ok = match direction {
            Direction::Increasing => pair[1] > pair[0],
            Direction::Decreasing => pair[1] < pair[0],
        };
        if !ok {
            if pair[1] == pair[0] {
                return Err(duplicate_error(i, pair[0]));
            }
            return Err(DeriveError::validation(
                "x",
                format!("values must be strictly monotonic; direction changes at index {}", i + 1),
            ));
        }
    }
    Ok(direction)
}

fn duplicate_error(i: usize, value: f64) -> DeriveError {
    DeriveError::validation(
        "x",
        format!("duplicate value {value} at indices {i} and {}", i + 1),
    )
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            grid[n - 1] = stop;
            grid
        }
    }
}

// ---------------------------------------------------------------------------
// Spline
// ---------------------------------------------------------------------------

/// B-spline of degree `k` passing through every sample.
///
/// Knot placement follows the usual interpolation conventions: linear uses
/// the samples themselves, quadratic the midpoints between samples (minus
/// the outermost two), cubic the not-a-knot rule.
#[derive(Debug, Clone)]
pub struct Spline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
    degree: usize,
}

impl Spline {
    /// Fit the interpolant. `x` may be increasing or decreasing but must
    /// be strictly monotonic.
    pub fn fit(x: &[f64], y: &[f64], kind: InterpolationKind) -> DeriveResult<Self> {
        if x.len() != y.len() {
            return Err(DeriveError::validation(
                "y",
                format!("length {} does not match x length {}", y.len(), x.len()),
            ));
        }
        let required = kind.min_points();
        if x.len() < required {
            return Err(DeriveError::InsufficientData {
                context: format!("{kind} interpolation"),
                required,
                actual: x.len(),
            });
        }

        let (xs, ys) = match monotonic_direction(x)? {
            Direction::Increasing => (x.to_vec(), y.to_vec()),
            Direction::Decreasing => (
                x.iter().rev().copied().collect(),
                y.iter().rev().copied().collect(),
            ),
        };

        let degree = kind.degree();
        let knots = interpolation_knots(&xs, degree);
        let n = xs.len();

        // Row i has non-zeros in columns span-k ..= span, so both
        // bandwidths are bounded by the degree.
        let mut matrix = BandedMatrix::zeros(n, degree, degree);
        for (row, &xi) in xs.iter().enumerate() {
            let span = find_span(&knots, degree, n, xi);
            let basis = basis_functions(&knots, degree, span, xi);
            for (j, b) in basis.into_iter().enumerate() {
                let col = span - degree + j;
                if b != 0.0 {
                    matrix.set(row, col, b);
                }
            }
        }

        let coeffs = matrix.solve(ys).ok_or_else(|| {
            DeriveError::validation("x", "interpolation system is singular; samples are too close")
        })?;

        Ok(Self {
            knots,
            coeffs,
            degree,
        })
    }

    /// Domain covered by the spline.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Evaluate at `x`. Points outside the domain are extrapolated from
    /// the boundary piece.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.coeffs.len();
        let span = find_span(&self.knots, self.degree, n, x);
        basis_functions(&self.knots, self.degree, span, x)
            .iter()
            .enumerate()
            .map(|(j, b)| b * self.coeffs[span - self.degree + j])
            .sum()
    }
}

fn interpolation_knots(x: &[f64], k: usize) -> Vec<f64> {
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];
    let interior: Vec<f64> = match k {
        1 => x[1..n - 1].to_vec(),
        2 => x
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .skip(1)
            .take(n.saturating_sub(3))
            .collect(),
        _ => x[2..n - 2].to_vec(),
    };

    let mut knots = Vec::with_capacity(n + k + 1);
    knots.extend(std::iter::repeat(first).take(k + 1));
    knots.extend(interior);
    knots.extend(std::iter::repeat(last).take(k + 1));
    debug_assert_eq!(knots.len(), n + k + 1);
    knots
}

/// Index `m` in `k..n` of the knot interval `[t_m, t_{m+1})` holding `x`,
/// clamped to the first/last non-empty interval.
fn find_span(knots: &[f64], k: usize, n: usize, x: f64) -> usize {
    let inner = &knots[k + 1..=n];
    (k + inner.partition_point(|&t| t <= x)).min(n - 1)
}

/// The `k + 1` non-zero basis functions at `x` (Cox–de Boor).
fn basis_functions(knots: &[f64], k: usize, span: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; k + 1];
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    values[0] = 1.0;

    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = values[r] / (right[r + 1] + left[j - r]);
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// A signal evaluated on a uniform grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ResampledCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Grid spacing.
    pub fn step(&self) -> f64 {
        match self.x.len() {
            0 | 1 => 0.0,
            n => (self.x[n - 1] - self.x[0]) / (n - 1) as f64,
        }
    }
}

/// Interpolate `(x, y)` with `kind` and evaluate it on `points` evenly
/// spaced abscissas from `min(x)` to `max(x)`.
pub fn resample(
    x: &[f64],
    y: &[f64],
    kind: InterpolationKind,
    points: usize,
) -> DeriveResult<ResampledCurve> {
    let spline = Spline::fit(x, y, kind)?;
    let (lo, hi) = spline.domain();
    let grid = linspace(lo, hi, points);
    let values = grid.iter().map(|&g| spline.eval(g)).collect();
    Ok(ResampledCurve { x: grid, y: values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn irregular_x() -> Vec<f64> {
        vec![0.0, 0.3, 1.1, 1.5, 2.6, 3.0, 4.2, 5.0, 5.4, 6.5]
    }

    #[test]
    fn every_kind_passes_through_samples() {
        let x = irregular_x();
        let y: Vec<f64> = x.iter().map(|v| (v * 0.7).sin() + 0.1 * v).collect();
        for kind in [
            InterpolationKind::Linear,
            InterpolationKind::Quadratic,
            InterpolationKind::Cubic,
        ] {
            let s = Spline::fit(&x, &y, kind).unwrap();
            for (xi, yi) in x.iter().zip(&y) {
                assert_abs_diff_eq!(s.eval(*xi), *yi, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn reproduces_polynomials_of_its_degree() {
        let x = irregular_x();
        let quad: Vec<f64> = x.iter().map(|v| 2.0 * v * v - v + 3.0).collect();
        let s = Spline::fit(&x, &quad, InterpolationKind::Quadratic).unwrap();
        for t in linspace(0.0, 6.5, 27) {
            assert_abs_diff_eq!(s.eval(t), 2.0 * t * t - t + 3.0, epsilon = 1e-8);
        }

        let cubic: Vec<f64> = x.iter().map(|v| v.powi(3) - 4.0 * v).collect();
        let s = Spline::fit(&x, &cubic, InterpolationKind::Cubic).unwrap();
        for t in linspace(0.0, 6.5, 27) {
            assert_abs_diff_eq!(s.eval(t), t.powi(3) - 4.0 * t, epsilon = 1e-8);
        }
    }

    #[test]
    fn linear_is_piecewise_linear() {
        let s = Spline::fit(&[0.0, 1.0, 3.0], &[0.0, 2.0, 0.0], InterpolationKind::Linear).unwrap();
        assert_abs_diff_eq!(s.eval(0.5), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn decreasing_x_matches_increasing() {
        let x = irregular_x();
        let y: Vec<f64> = x.iter().map(|v| v.cos()).collect();
        let xr: Vec<f64> = x.iter().rev().copied().collect();
        let yr: Vec<f64> = y.iter().rev().copied().collect();
        let a = resample(&x, &y, InterpolationKind::Quadratic, 50).unwrap();
        let b = resample(&xr, &yr, InterpolationKind::Quadratic, 50).unwrap();
        assert_eq!(a.x, b.x);
        for (u, v) in a.y.iter().zip(&b.y) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
    }

    #[test]
    fn grid_spans_exact_range() {
        let c = resample(&[2.0, 3.5, 7.0], &[1.0, 0.0, 1.0], InterpolationKind::Quadratic, 11).unwrap();
        assert_eq!(c.len(), 11);
        assert_eq!(c.x[0], 2.0);
        assert_eq!(c.x[10], 7.0);
        assert_abs_diff_eq!(c.step(), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn rejects_duplicates_and_non_monotonic() {
        let err = Spline::fit(&[0.0, 1.0, 1.0, 2.0], &[0.0; 4], InterpolationKind::Linear).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        let err = Spline::fit(&[0.0, 2.0, 1.0, 3.0], &[0.0; 4], InterpolationKind::Linear).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn insufficient_points_for_degree() {
        let err = Spline::fit(&[0.0, 1.0], &[0.0, 1.0], InterpolationKind::Quadratic).unwrap_err();
        assert_eq!(
            err,
            DeriveError::InsufficientData {
                context: "quadratic interpolation".to_string(),
                required: 3,
                actual: 2,
            }
        );
        assert!(Spline::fit(&[0.0, 1.0, 2.0], &[0.0; 3], InterpolationKind::Cubic).is_err());
    }
}
