/// Derivative pipeline: preprocessing, resampling, differentiation and
/// extremum search.
///
/// Architecture:
/// ```text
///   (x, y)  irregular, noisy
///        │
///        ▼
///   ┌──────────────┐
///   │  preprocess   │  optional ln(y), Savitzky–Golay smoothing
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  interpolate  │  B-spline → uniform grid of N points
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   gradient    │  finite differences (+ optional smoothing)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   extremum    │  argmax/argmin in [start, end], parabolic refinement
///   └──────────────┘
/// ```

pub mod error;
pub mod extremum;
pub mod gradient;
pub mod interpolate;
pub mod linalg;
pub mod options;
pub mod pipeline;
pub mod savgol;

pub use error::{DeriveError, DeriveResult};
pub use interpolate::ResampledCurve;
pub use options::{DeriveOptions, FitFallback, InterpolationKind, SmoothingParams};
pub use pipeline::{derive, Derivation, DerivativeCurve, Extremum, Refinement, Signal};
