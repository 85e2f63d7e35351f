use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{DeriveError, DeriveResult};

// ---------------------------------------------------------------------------
// Interpolation kind
// ---------------------------------------------------------------------------

/// Piecewise-polynomial kind used by the resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    Linear,
    #[default]
    Quadratic,
    Cubic,
}

impl InterpolationKind {
    /// Polynomial degree of each piece.
    pub fn degree(self) -> usize {
        match self {
            InterpolationKind::Linear => 1,
            InterpolationKind::Quadratic => 2,
            InterpolationKind::Cubic => 3,
        }
    }

    /// Fewest samples the interpolant can be built from.
    pub fn min_points(self) -> usize {
        self.degree() + 1
    }
}

impl fmt::Display for InterpolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationKind::Linear => write!(f, "linear"),
            InterpolationKind::Quadratic => write!(f, "quadratic"),
            InterpolationKind::Cubic => write!(f, "cubic"),
        }
    }
}

impl FromStr for InterpolationKind {
    type Err = DeriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "slinear" => Ok(InterpolationKind::Linear),
            "quadratic" => Ok(InterpolationKind::Quadratic),
            "cubic" => Ok(InterpolationKind::Cubic),
            other => Err(DeriveError::validation(
                "interpolation_type",
                format!("unknown interpolation kind '{other}' (expected linear, quadratic or cubic)"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Fit failure policy
// ---------------------------------------------------------------------------

/// What to do when parabolic refinement cannot produce a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitFallback {
    /// Keep the coarse extremum and record why refinement was skipped.
    #[default]
    Coarse,
    /// Propagate [`DeriveError::Fit`] to the caller.
    Error,
}

impl FromStr for FitFallback {
    type Err = DeriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" => Ok(FitFallback::Coarse),
            "error" => Ok(FitFallback::Error),
            other => Err(DeriveError::validation(
                "on_fit_failure",
                format!("unknown policy '{other}' (expected coarse or error)"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Smoothing parameters
// ---------------------------------------------------------------------------

/// Savitzky–Golay window and polynomial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingParams {
    pub window: usize,
    pub poly_order: usize,
}

// ---------------------------------------------------------------------------
// DeriveOptions
// ---------------------------------------------------------------------------

/// Options for a single [`derive`](super::derive) call.
///
/// Every field has a default. Field aliases accept the flat lower-case
/// keyword names (`findmax`, `smoothsignalwindow`, ...) so option files
/// written for the keyword interface still load. Unknown keys are errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeriveOptions {
    /// Locate the maximum (`true`) or the minimum of the derivative.
    #[serde(alias = "findmax")]
    pub find_max: bool,
    /// Refine the coarse extremum with a least-squares parabola.
    #[serde(alias = "useparabola")]
    pub use_parabola: bool,
    /// Natural-log transform of y before anything else.
    pub log: bool,
    /// Lower x bound of the extremum search (defaults to min x).
    pub start: Option<f64>,
    /// Upper x bound of the extremum search (defaults to max x).
    pub end: Option<f64>,
    #[serde(alias = "interpolationtype")]
    pub interpolation_type: InterpolationKind,
    /// Number of points on the uniform resampling grid.
    #[serde(alias = "interpolationpoints")]
    pub interpolation_points: usize,
    #[serde(alias = "smoothsignal")]
    pub smooth_signal: bool,
    #[serde(alias = "smoothsignalwindow")]
    pub smooth_signal_window: usize,
    #[serde(alias = "polyordersignal")]
    pub poly_order_signal: usize,
    #[serde(alias = "smoothderivative")]
    pub smooth_derivative: bool,
    #[serde(alias = "smoothderivativewindow")]
    pub smooth_derivative_window: usize,
    #[serde(alias = "polyorderderivative", alias = "polyorderderiv")]
    pub poly_order_derivative: usize,
    /// Half-width of the refinement neighbourhood, in x units.
    #[serde(alias = "parabolahalfwidth")]
    pub parabola_half_width: f64,
    pub on_fit_failure: FitFallback,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            find_max: true,
            use_parabola: true,
            log: false,
            start: None,
            end: None,
            interpolation_type: InterpolationKind::Quadratic,
            interpolation_points: 1000,
            smooth_signal: true,
            smooth_signal_window: 51,
            poly_order_signal: 3,
            smooth_derivative: true,
            smooth_derivative_window: 51,
            poly_order_derivative: 3,
            parabola_half_width: 4.0,
            on_fit_failure: FitFallback::Coarse,
        }
    }
}

impl DeriveOptions {
    /// Signal smoothing parameters, or `None` when disabled.
    pub fn signal_smoothing(&self) -> Option<SmoothingParams> {
        self.smooth_signal.then_some(SmoothingParams {
            window: self.smooth_signal_window,
            poly_order: self.poly_order_signal,
        })
    }

    /// Derivative smoothing parameters, or `None` when disabled.
    pub fn derivative_smoothing(&self) -> Option<SmoothingParams> {
        self.smooth_derivative.then_some(SmoothingParams {
            window: self.smooth_derivative_window,
            poly_order: self.poly_order_derivative,
        })
    }

    /// Check the options that do not depend on the data.
    ///
    /// Filter windows are checked against the signal length later, by the
    /// filter itself.
    pub fn validate(&self) -> DeriveResult<()> {
        if self.interpolation_points < 2 {
            return Err(DeriveError::validation(
                "interpolation_points",
                format!("must be at least 2, got {}", self.interpolation_points),
            ));
        }
        if self.use_parabola
            && !(self.parabola_half_width.is_finite() && self.parabola_half_width > 0.0)
        {
            return Err(DeriveError::validation(
                "parabola_half_width",
                format!("must be finite and positive, got {}", self.parabola_half_width),
            ));
        }
        for (name, bound) in [("start", self.start), ("end", self.end)] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    return Err(DeriveError::validation(name, format!("must be finite, got {v}")));
                }
            }
        }
        Ok(())
    }
}
