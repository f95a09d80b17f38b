use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizerError {
    /// A configuration value is outside its allowed range.
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    InsufficientPoints { required: usize, found: usize },
    /// x or y of the pairs has zero variance.
    UndefinedCorrelation,
    /// Outlier removal finished below the requested correlation.
    UnableToFit { correlation: f64, threshold: f64 },
    InsufficientCoverage { filled_bins: usize, required: usize },
    /// No RANSAC model reached the retention and correlation targets.
    NoConsensus { iterations: usize },
}

impl fmt::Display for NormalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                expected,
            } => write!(f, "Invalid {}: {} (expected {})", name, value, expected),
            Self::InsufficientPoints { required, found } => write!(
                f,
                "Need at least {} pairs, found {}",
                required, found
            ),
            Self::UndefinedCorrelation => {
                write!(f, "Correlation is undefined, x or y has zero variance")
            }
            Self::UnableToFit {
                correlation,
                threshold,
            } => write!(
                f,
                "Unable to fit: correlation {:.4} after outlier removal is below {:.4}",
                correlation, threshold
            ),
            Self::InsufficientCoverage {
                filled_bins,
                required,
            } => write!(
                f,
                "Insufficient RT coverage: {} bins filled, {} required",
                filled_bins, required
            ),
            Self::NoConsensus { iterations } => write!(
                f,
                "RANSAC found no acceptable model in {} iterations",
                iterations
            ),
        }
    }
}

impl std::error::Error for NormalizerError {}

pub(crate) fn check_fraction(name: &'static str, value: f64) -> Result<f64, NormalizerError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(NormalizerError::InvalidParameter {
            name,
            value,
            expected: "a value in (0, 1]",
        })
    }
}

pub(crate) fn check_correlation(name: &'static str, value: f64) -> Result<f64, NormalizerError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(NormalizerError::InvalidParameter {
            name,
            value,
            expected: "a value in [-1, 1]",
        })
    }
}
