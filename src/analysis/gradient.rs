use super::error::{DeriveError, DeriveResult};

/// Finite-difference derivative of `y` with respect to `x`.
///
/// Interior points use second-order central differences that account for
/// uneven spacing; the two end points use first-order one-sided
/// differences.
pub fn gradient(x: &[f64], y: &[f64]) -> DeriveResult<Vec<f64>> {
    let n = y.len();
    if x.len() != n {
        return Err(DeriveError::validation(
            "y",
            format!("length {n} does not match x length {}", x.len()),
        ));
    }
    if n < 2 {
        return Err(DeriveError::InsufficientData {
            context: "gradient".to_string(),
            required: 2,
            actual: n,
        });
    }

    let mut out = Vec::with_capacity(n);
    out.push((y[1] - y[0]) / (x[1] - x[0]));
    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        let num = hs * hs * y[i + 1] + (hd * hd - hs * hs) * y[i] - hd * hd * y[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_for_linear_data() {
        let x = [0.0, 0.5, 1.7, 2.0, 3.1];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 1.0).collect();
        for g in gradient(&x, &y).unwrap() {
            assert_abs_diff_eq!(g, 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn central_differences_exact_for_quadratic_inside() {
        let x = [0.0, 0.4, 1.0, 1.3, 2.0];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let g = gradient(&x, &y).unwrap();
        for i in 1..4 {
            assert_abs_diff_eq!(g[i], 2.0 * x[i], epsilon = 1e-12);
        }
        // One-sided ends: slope of the first and last secant.
        assert_abs_diff_eq!(g[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(g[4], 3.3, epsilon = 1e-12);
    }

    #[test]
    fn needs_two_points() {
        assert!(gradient(&[1.0], &[1.0]).unwrap_err().is_validation());
    }
}
