//! Random sample consensus over least squares lines.

use crate::Point;
use crate::errors::{
    NormalizerError,
    check_correlation,
    check_fraction,
};
use crate::outliers::{
    OutlierRemoval,
    Termination,
    retention_floor,
};
use crate::stats::{
    LinearFit,
    pearson_correlation,
};
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Pairs drawn to fit each candidate model.
    pub sampling_size: usize,
    pub max_iterations: usize,
    /// Largest absolute residual (in y units) of a consensus member.
    pub max_residual: f64,
    /// Ignored by `fit_robust`, which passes its own.
    pub min_retained_fraction: f64,
    /// Ignored by `fit_robust`, which passes its own.
    pub correlation_threshold: f64,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            sampling_size: 5,
            max_iterations: 1000,
            max_residual: 30.0,
            min_retained_fraction: 0.6,
            correlation_threshold: 0.95,
            seed: 42,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> Result<(), NormalizerError> {
        check_fraction("min_retained_fraction", self.min_retained_fraction)?;
        check_correlation("correlation_threshold", self.correlation_threshold)?;
        if self.sampling_size < 2 {
            return Err(NormalizerError::InvalidParameter {
                name: "sampling_size",
                value: self.sampling_size as f64,
                expected: "at least 2",
            });
        }
        if !(self.max_residual.is_finite() && self.max_residual > 0.0) {
            return Err(NormalizerError::InvalidParameter {
                name: "max_residual",
                value: self.max_residual,
                expected: "a finite positive value",
            });
        }
        Ok(())
    }
}

/// Keeps the consensus set of the best random model.
///
/// A model fit on `sampling_size` random pairs is accepted when its
/// sample plus every pair within `max_residual` of it holds at least
/// `min_retained_fraction` of the input and correlates at or above
/// `correlation_threshold`. Among accepted models the one whose refit on
/// the consensus set has the lowest mean squared residual wins.
///
/// The result is deterministic for a given `seed`.
pub fn remove_outliers_ransac(pairs: &[Point], config: &RansacConfig) -> Result<OutlierRemoval, NormalizerError> {
    config.validate()?;
    let n = pairs.len();
    if n < config.sampling_size {
        return Err(NormalizerError::InsufficientPoints {
            required: config.sampling_size,
            found: n,
        });
    }

    let floor = retention_floor(config.min_retained_fraction, n);
    let max_sq = config.max_residual * config.max_residual;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut in_consensus = vec![false; n];

    for _ in 0..config.max_iterations {
        let sample = index::sample(&mut rng, n, config.sampling_size);
        let sample_points: Vec<Point> = sample.iter().map(|i| pairs[i]).collect();
        let Some(model) = LinearFit::least_squares(&sample_points) else {
            continue;
        };

        in_consensus.iter_mut().for_each(|x| *x = false);
        for i in sample.iter() {
            in_consensus[i] = true;
        }
        for (i, p) in pairs.iter().enumerate() {
            if model.residual(p).powi(2) < max_sq {
                in_consensus[i] = true;
            }
        }
        let members: Vec<usize> = (0..n).filter(|&i| in_consensus[i]).collect();
        if members.len() < floor {
            continue;
        }

        let member_points: Vec<Point> = members.iter().map(|&i| pairs[i]).collect();
        let Some(r) = pearson_correlation(&member_points) else {
            continue;
        };
        if r < config.correlation_threshold {
            continue;
        }
        let Some(refit) = LinearFit::least_squares(&member_points) else {
            continue;
        };
        let mse = member_points
            .iter()
            .map(|p| refit.residual(p).powi(2))
            .sum::<f64>()
            / member_points.len() as f64;

        if best.as_ref().map_or(true, |(best_mse, _)| mse < *best_mse) {
            debug!(
                "New RANSAC model: {} members, r = {:.5}, mse = {:.5}",
                members.len(),
                r,
                mse
            );
            best = Some((mse, members));
        }
    }

    let Some((mse, members)) = best else {
        return Err(NormalizerError::NoConsensus {
            iterations: config.max_iterations,
        });
    };

    let kept: Vec<Point> = members.iter().map(|&i| pairs[i]).collect();
    let mut is_member = vec![false; n];
    for &i in &members {
        is_member[i] = true;
    }
    let removed_indices: Vec<usize> = (0..n).filter(|&i| !is_member[i]).collect();
    let correlation = pearson_correlation(&kept);
    info!(
        "RANSAC kept {} of {} pairs, r = {:?}, mse = {:.5}",
        kept.len(),
        n,
        correlation,
        mse
    );

    Ok(OutlierRemoval {
        kept,
        removed_indices,
        correlation,
        termination: Termination::ThresholdMet,
    })
}
