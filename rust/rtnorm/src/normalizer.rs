use crate::Point;
use crate::coverage::{
    CoverageConfig,
    check_coverage,
};
use crate::errors::{
    NormalizerError,
    check_correlation,
    check_fraction,
};
use crate::outliers::{
    CandidateSelection,
    IterativeOutlierRemover,
    MIN_PAIRS,
    OutlierRemoval,
    Termination,
};
use crate::ransac::{
    RansacConfig,
    remove_outliers_ransac,
};
use crate::stats::{
    LinearFit,
    pearson_correlation,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    info,
    instrument,
    warn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    #[default]
    IterResidual,
    IterJackknife,
    Ransac,
    None,
}

/// Settings for [`fit_robust`].
///
/// `min_retained_fraction` and `correlation_threshold` apply to every
/// outlier method, they take precedence over the same fields in `ransac`.
/// Their defaults (0.95 and 0.6) match [`IterativeOutlierRemover`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtNormalizationConfig {
    pub outlier_method: OutlierMethod,
    pub min_retained_fraction: f64,
    pub correlation_threshold: f64,
    pub use_chauvenet: bool,
    pub ransac: RansacConfig,
    pub coverage: Option<CoverageConfig>,
}

impl Default for RtNormalizationConfig {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::IterResidual,
            min_retained_fraction: 0.95,
            correlation_threshold: 0.6,
            use_chauvenet: false,
            ransac: RansacConfig::default(),
            coverage: None,
        }
    }
}

/// Affine mapping from measured RT (`x`) to reference RT (`y`), fit on
/// the pairs that survived outlier removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustFitResult {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation of `kept`.
    pub correlation: f64,
    pub kept: Vec<Point>,
    pub removed_indices: Vec<usize>,
    pub termination: Termination,
}

impl RobustFitResult {
    pub fn linear_fit(&self) -> LinearFit {
        LinearFit {
            slope: self.slope,
            intercept: self.intercept,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.linear_fit().predict(x)
    }

    /// Root mean squared error of the prediction on `points`; NaN when
    /// `points` is empty.
    pub fn rmse(&self, points: &[Point]) -> f64 {
        if points.is_empty() {
            return f64::NAN;
        }
        let fit = self.linear_fit();
        let total: f64 = points.iter().map(|p| fit.residual(p).powi(2)).sum();
        (total / points.len() as f64).sqrt()
    }
}

fn no_removal(pairs: &[Point], threshold: f64) -> OutlierRemoval {
    let correlation = pearson_correlation(pairs);
    let termination = match correlation {
        _ if pairs.len() < MIN_PAIRS => Termination::TooFewPoints,
        None => Termination::UndefinedCorrelation,
        Some(r) if r >= threshold => Termination::ThresholdMet,
        Some(_) => Termination::NoImprovement,
    };
    OutlierRemoval {
        kept: pairs.to_vec(),
        removed_indices: Vec::new(),
        correlation,
        termination,
    }
}

/// Removes outliers with the configured method, checks the result and fits
/// a least squares line on the kept pairs only.
///
/// # Example
///
/// ```
/// use rtnorm::{fit_robust, Point, RtNormalizationConfig};
///
/// let mut pairs: Vec<Point> = (0..20)
///     .map(|i| Point { x: i as f64, y: 2.0 * i as f64 + 5.0 })
///     .collect();
/// pairs[7].y = 200.0;
///
/// let fit = fit_robust(&pairs, &RtNormalizationConfig::default()).unwrap();
/// assert_eq!(fit.removed_indices, vec![7]);
/// assert!((fit.slope - 2.0).abs() < 1e-9);
/// assert!((fit.predict(100.0) - 205.0).abs() < 1e-6);
/// ```
#[instrument(level = "debug", skip_all, fields(n = pairs.len(), method = ?config.outlier_method))]
pub fn fit_robust(pairs: &[Point], config: &RtNormalizationConfig) -> Result<RobustFitResult, NormalizerError> {
    check_fraction("min_retained_fraction", config.min_retained_fraction)?;
    check_correlation("correlation_threshold", config.correlation_threshold)?;

    let iterative = |candidate| IterativeOutlierRemover {
        min_retained_fraction: config.min_retained_fraction,
        correlation_threshold: config.correlation_threshold,
        candidate,
        use_chauvenet: config.use_chauvenet,
    };
    let removal = match config.outlier_method {
        OutlierMethod::IterResidual => iterative(CandidateSelection::Residual).run(pairs)?,
        OutlierMethod::IterJackknife => iterative(CandidateSelection::Jackknife).run(pairs)?,
        OutlierMethod::Ransac => {
            let ransac = RansacConfig {
                min_retained_fraction: config.min_retained_fraction,
                correlation_threshold: config.correlation_threshold,
                ..config.ransac.clone()
            };
            remove_outliers_ransac(pairs, &ransac)?
        }
        OutlierMethod::None => no_removal(pairs, config.correlation_threshold),
    };

    let OutlierRemoval {
        kept,
        removed_indices,
        correlation,
        termination,
    } = removal;

    if kept.len() < 2 {
        return Err(NormalizerError::InsufficientPoints {
            required: 2,
            found: kept.len(),
        });
    }
    let correlation = correlation.ok_or(NormalizerError::UndefinedCorrelation)?;
    if correlation < config.correlation_threshold {
        warn!(
            "Correlation {:.4} is below the threshold of {:.4} after outlier removal ({:?})",
            correlation, config.correlation_threshold, termination
        );
        return Err(NormalizerError::UnableToFit {
            correlation,
            threshold: config.correlation_threshold,
        });
    }
    if let Some(coverage) = &config.coverage {
        check_coverage(&kept, coverage)?;
    }

    let fit = LinearFit::least_squares(&kept).ok_or(NormalizerError::UndefinedCorrelation)?;
    info!(
        "RT fit on {} of {} pairs: y = {:.5} * x + {:.5} (r = {:.5})",
        kept.len(),
        pairs.len(),
        fit.slope,
        fit.intercept,
        correlation
    );

    Ok(RobustFitResult {
        slope: fit.slope,
        intercept: fit.intercept,
        correlation,
        kept,
        removed_indices,
        termination,
    })
}
