//! Iterative single-point outlier removal.

use crate::Point;
use crate::errors::{
    NormalizerError,
    check_correlation,
    check_fraction,
};
use crate::stats::{
    LinearFit,
    chauvenet,
    pearson_correlation,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

/// Below this many pairs correlation cannot be assessed meaningfully and
/// nothing is ever removed.
pub const MIN_PAIRS: usize = 3;

/// How the next outlier candidate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSelection {
    /// Largest absolute residual from the least squares line.
    #[default]
    Residual,
    /// The pair whose removal gives the highest leave-one-out correlation.
    Jackknife,
}

/// Why an outlier removal run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    ThresholdMet,
    RetentionFloor,
    NoImprovement,
    ChauvenetRejected,
    TooFewPoints,
    UndefinedCorrelation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRemoval {
    /// Surviving pairs in input order.
    pub kept: Vec<Point>,
    /// Input positions of the removed pairs, in removal order.
    pub removed_indices: Vec<usize>,
    /// Correlation of `kept`, `None` when undefined.
    pub correlation: Option<f64>,
    pub termination: Termination,
}

/// Removes one pair at a time until the correlation of what is left
/// reaches `correlation_threshold`.
///
/// Never removes more pairs than `min_retained_fraction` allows, never
/// goes below three pairs, and only removes a pair when doing so strictly
/// improves the correlation. When the threshold cannot be reached within
/// those bounds the input is kept whole and the run ends with
/// [`Termination::RetentionFloor`], so running again on the output never
/// changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterativeOutlierRemover {
    pub min_retained_fraction: f64,
    pub correlation_threshold: f64,
    pub candidate: CandidateSelection,
    /// Only remove a candidate that fails Chauvenet's criterion on the
    /// absolute residuals.
    pub use_chauvenet: bool,
}

impl Default for IterativeOutlierRemover {
    fn default() -> Self {
        Self {
            min_retained_fraction: 0.95,
            correlation_threshold: 0.6,
            candidate: CandidateSelection::Residual,
            use_chauvenet: false,
        }
    }
}

impl IterativeOutlierRemover {
    pub fn new(min_retained_fraction: f64, correlation_threshold: f64) -> Result<Self, NormalizerError> {
        let out = Self {
            min_retained_fraction,
            correlation_threshold,
            ..Default::default()
        };
        out.validate()?;
        Ok(out)
    }

    pub fn with_candidate(mut self, candidate: CandidateSelection) -> Self {
        self.candidate = candidate;
        self
    }

    pub fn with_chauvenet(mut self, use_chauvenet: bool) -> Self {
        self.use_chauvenet = use_chauvenet;
        self
    }

    pub fn validate(&self) -> Result<(), NormalizerError> {
        check_fraction("min_retained_fraction", self.min_retained_fraction)?;
        check_correlation("correlation_threshold", self.correlation_threshold)?;
        Ok(())
    }

    /// Smallest number of pairs that may remain out of `n`.
    pub fn retention_floor(&self, n: usize) -> usize {
        retention_floor(self.min_retained_fraction, n)
    }

    pub fn run(&self, pairs: &[Point]) -> Result<OutlierRemoval, NormalizerError> {
        self.validate()?;
        let n = pairs.len();
        if n < MIN_PAIRS {
            return Ok(OutlierRemoval {
                kept: pairs.to_vec(),
                removed_indices: Vec::new(),
                correlation: pearson_correlation(pairs),
                termination: Termination::TooFewPoints,
            });
        }

        let floor = self.retention_floor(n);
        let mut current = pairs.to_vec();
        // Input position of every pair in `current`.
        let mut positions: Vec<usize> = (0..n).collect();
        let mut removed_indices = Vec::new();

        let (correlation, termination) = loop {
            let Some(r) = pearson_correlation(&current) else {
                break (None, Termination::UndefinedCorrelation);
            };
            if r >= self.correlation_threshold {
                break (Some(r), Termination::ThresholdMet);
            }
            if current.len() - 1 < floor || current.len() <= MIN_PAIRS {
                break (Some(r), Termination::RetentionFloor);
            }

            let candidate = match self.candidate {
                CandidateSelection::Residual => residual_outlier_candidate(&current),
                CandidateSelection::Jackknife => jackknife_outlier_candidate(&current),
            };
            let Some(k) = candidate else {
                break (Some(r), Termination::NoImprovement);
            };

            if self.use_chauvenet && !is_chauvenet_outlier(&current, k) {
                debug!("Candidate {} is not a Chauvenet outlier", positions[k]);
                break (Some(r), Termination::ChauvenetRejected);
            }

            let mut next = current.clone();
            next.remove(k);
            match pearson_correlation(&next) {
                Some(next_r) if next_r > r => {
                    debug!(
                        "Removing pair {} ({}, {}): r {:.5} -> {:.5}",
                        positions[k], current[k].x, current[k].y, r, next_r
                    );
                    removed_indices.push(positions.remove(k));
                    current = next;
                }
                _ => break (Some(r), Termination::NoImprovement),
            }
        };

        if termination == Termination::RetentionFloor {
            // Threshold out of reach above the floor: keep the input whole.
            info!(
                "Correlation stays below {} within the retention floor of {} pairs, keeping all {}",
                self.correlation_threshold, floor, n
            );
            return Ok(OutlierRemoval {
                kept: pairs.to_vec(),
                removed_indices: Vec::new(),
                correlation: pearson_correlation(pairs),
                termination,
            });
        }

        info!(
            "Removed {} of {} pairs as outliers, r = {:?} ({:?})",
            removed_indices.len(),
            n,
            correlation,
            termination
        );
        Ok(OutlierRemoval {
            kept: current,
            removed_indices,
            correlation,
            termination,
        })
    }
}

pub(crate) fn retention_floor(min_retained_fraction: f64, n: usize) -> usize {
    // The small offset keeps e.g. 0.95 * 20 from rounding up to 20.
    (min_retained_fraction * n as f64 - 1e-9).ceil().max(0.0) as usize
}

fn absolute_residuals(points: &[Point]) -> Option<Vec<f64>> {
    let fit = LinearFit::least_squares(points)?;
    Some(points.iter().map(|p| fit.residual(p).abs()).collect())
}

fn is_chauvenet_outlier(points: &[Point], pos: usize) -> bool {
    match absolute_residuals(points) {
        Some(residuals) => chauvenet(&residuals, pos),
        None => false,
    }
}

/// Position of the pair with the largest absolute residual from the least
/// squares line. Ties go to the first such pair.
pub fn residual_outlier_candidate(points: &[Point]) -> Option<usize> {
    let residuals = absolute_residuals(points)?;
    let mut best: Option<(usize, f64)> = None;
    for (i, r) in residuals.into_iter().enumerate() {
        if best.map_or(true, |(_, b)| r > b) {
            best = Some((i, r));
        }
    }
    best.map(|(i, _)| i)
}

/// Position of the pair whose removal leaves the highest correlation.
pub fn jackknife_outlier_candidate(points: &[Point]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    let mut rest = Vec::with_capacity(points.len().saturating_sub(1));
    for i in 0..points.len() {
        rest.clear();
        rest.extend_from_slice(&points[..i]);
        rest.extend_from_slice(&points[i + 1..]);
        let Some(r) = pearson_correlation(&rest) else {
            continue;
        };
        if best.map_or(true, |(_, b)| r > b) {
            best = Some((i, r));
        }
    }
    best.map(|(i, _)| i)
}
