use thiserror::Error;

/// Result type for the derivative pipeline.
pub type DeriveResult<T> = Result<T, DeriveError>;

/// Everything that can go wrong while deriving a curve.
///
/// All variants are deterministic functions of the input and the options;
/// retrying the same call yields the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeriveError {
    /// Malformed input or configuration.
    #[error("invalid '{parameter}': {message}")]
    Validation { parameter: String, message: String },

    /// Not enough samples for the requested operation.
    #[error("insufficient data for {context}: need at least {required} points, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    /// Log transform applied to a value outside its domain.
    #[error("cannot take the logarithm of y[{index}] = {value}: values must be strictly positive")]
    Domain { index: usize, value: f64 },

    /// Quadratic refinement could not produce a usable vertex.
    #[error("parabolic fit failed: {message}")]
    Fit { message: String },
}

impl DeriveError {
    pub(crate) fn validation(parameter: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn fit(message: impl Into<String>) -> Self {
        Self::Fit {
            message: message.into(),
        }
    }

    /// Whether this is one of the validation-class errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InsufficientData { .. })
    }
}
