//! Robust affine retention time normalization.
//!
//! Pairs of (measured RT, reference RT) are filtered for outliers until
//! their linear correlation is acceptable, then a least squares line is
//! fit on what is left.

pub mod coverage;
mod errors;
mod normalizer;
pub mod outliers;
pub mod ransac;
pub mod stats;

pub use errors::NormalizerError;
pub use normalizer::{
    OutlierMethod,
    RobustFitResult,
    RtNormalizationConfig,
    fit_robust,
};
pub use outliers::{
    CandidateSelection,
    IterativeOutlierRemover,
    OutlierRemoval,
    Termination,
};

/// A (measured RT, reference RT) pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Iteratively drops the pair with the largest residual until the
/// correlation of the remaining pairs reaches
/// `initial_correlation_threshold`.
///
/// At most `1 - min_retained_fraction` of the pairs are dropped, and a pair
/// is only dropped when that strictly raises the correlation. Kept pairs
/// retain their input order. Fewer than three pairs are returned as is, and
/// so is any input whose correlation cannot reach the threshold without
/// dropping below the retention floor.
///
/// Use [`IterativeOutlierRemover`] to pick a different candidate strategy,
/// enable Chauvenet's criterion, or learn why the iteration stopped.
///
/// # Example
///
/// ```
/// use rtnorm::{remove_outliers, Point};
///
/// let pairs: Vec<Point> = [
///     (612.98, 990.0),
///     (799.53, 1188.0),
///     (1086.25, 1470.0),
///     (1700.0, 900.0),
///     (1924.08, 2291.0),
///     (2151.48, 2509.0),
/// ]
/// .into_iter()
/// .map(Point::from)
/// .collect();
///
/// let kept = remove_outliers(&pairs, 0.8, 0.9).unwrap();
/// assert_eq!(kept.len(), 5);
/// assert!(!kept.contains(&Point { x: 1700.0, y: 900.0 }));
/// ```
pub fn remove_outliers(
    pairs: &[Point],
    min_retained_fraction: f64,
    initial_correlation_threshold: f64,
) -> Result<Vec<Point>, NormalizerError> {
    let remover = IterativeOutlierRemover::new(min_retained_fraction, initial_correlation_threshold)?;
    Ok(remover.run(pairs)?.kept)
}
