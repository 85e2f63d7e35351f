//! Savitzky–Golay smoothing.
//!
//! Interior samples are replaced by the value at the window centre of a
//! least-squares polynomial fitted over the window, which reduces to a
//! fixed convolution. The first and last `window / 2` samples have no full
//! centred window; they are taken from one polynomial fitted to the first
//! (resp. last) full window.

use super::error::{DeriveError, DeriveResult};
use super::linalg::{legendre, Qr};
use super::options::SmoothingParams;

/// A validated smoothing filter with precomputed coefficients.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    /// Least-squares fit over one window; its projection rows are the
    /// filter weights.
    fit: Qr,
    coeffs: Vec<f64>,
}

impl SavitzkyGolay {
    /// Build the filter. The window must be odd and the polynomial order
    /// strictly smaller than the window.
    pub fn new(params: SmoothingParams) -> DeriveResult<Self> {
        let SmoothingParams { window, poly_order } = params;
        if window == 0 || window % 2 == 0 {
            return Err(DeriveError::validation(
                "window",
                format!("window length must be a positive odd number, got {window}"),
            ));
        }
        if poly_order >= window {
            return Err(DeriveError::validation(
                "poly_order",
                format!("polynomial order {poly_order} must be less than window length {window}"),
            ));
        }
        let fit = window_fit(window, poly_order).ok_or_else(|| {
            DeriveError::validation(
                "window",
                format!("cannot build filter coefficients for window {window}, order {poly_order}"),
            )
        })?;
        let coeffs = fit.projection_row(window / 2);
        Ok(Self {
            window,
            fit,
            coeffs,
        })
    }

    /// Smooth `data`. Fails when the signal is shorter than the window.
    pub fn apply(&self, data: &[f64]) -> DeriveResult<Vec<f64>> {
        let n = data.len();
        let w = self.window;
        if n < w {
            return Err(DeriveError::validation(
                "window",
                format!("window length {w} exceeds the number of samples ({n})"),
            ));
        }
        let half = w / 2;
        let mut out = vec![0.0; n];

        for i in half..n - half {
            let segment = &data[i - half..=i + half];
            out[i] = segment.iter().zip(&self.coeffs).map(|(v, c)| v * c).sum();
        }

        if half > 0 {
            let head = self.fit.project(&data[..w]);
            out[..half].copy_from_slice(&head[..half]);
            let tail = self.fit.project(&data[n - w..]);
            out[n - half..].copy_from_slice(&tail[w - half..]);
        }
        Ok(out)
    }
}

/// Least-squares polynomial fit over the window positions, scaled to
/// `[-1, 1]`. Fitted values at the centre give the interior convolution;
/// fitted values at the other positions give the edges.
fn window_fit(window: usize, poly_order: usize) -> Option<Qr> {
    let half = (window / 2) as f64;
    let positions: Vec<f64> = (0..window)
        .map(|i| if half == 0.0 { 0.0 } else { (i as f64 - half) / half })
        .collect();
    Qr::new(&legendre(&positions, poly_order))
}
