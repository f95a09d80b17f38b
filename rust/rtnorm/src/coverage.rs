//! Checks that the pairs kept after outlier removal span the reference
//! RT range instead of clustering in one region.

use crate::Point;
use crate::errors::NormalizerError;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Reference RT range to bin. Defaults to the range of the pairs' `y`.
    pub rt_range: Option<(f64, f64)>,
    pub nr_bins: usize,
    pub min_points_per_bin: usize,
    pub min_bins_filled: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            rt_range: None,
            nr_bins: 10,
            min_points_per_bin: 1,
            min_bins_filled: 8,
        }
    }
}

/// Number of pairs per equal-width bin of `y` over `[rt_min, rt_max]`.
/// Values outside the range land in the first or last bin.
pub fn bin_counts(points: &[Point], rt_min: f64, rt_max: f64, nr_bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; nr_bins];
    if nr_bins == 0 {
        return counts;
    }
    let width = (rt_max - rt_min) / nr_bins as f64;
    for p in points {
        let bin = if width > 0.0 {
            ((p.y - rt_min) / width).floor().clamp(0.0, (nr_bins - 1) as f64) as usize
        } else {
            0
        };
        counts[bin] += 1;
    }
    counts
}

/// Fails with [`NormalizerError::InsufficientCoverage`] when fewer than
/// `min_bins_filled` bins hold `min_points_per_bin` pairs.
pub fn check_coverage(points: &[Point], config: &CoverageConfig) -> Result<(), NormalizerError> {
    if config.nr_bins == 0 || config.min_bins_filled > config.nr_bins {
        return Err(NormalizerError::InvalidParameter {
            name: "min_bins_filled",
            value: config.min_bins_filled as f64,
            expected: "at most nr_bins, with nr_bins > 0",
        });
    }
    let (rt_min, rt_max) = match config.rt_range {
        Some(range) => range,
        None => points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        }),
    };
    let counts = bin_counts(points, rt_min, rt_max, config.nr_bins);
    let filled_bins = counts
        .iter()
        .filter(|&&c| c >= config.min_points_per_bin)
        .count();
    debug!("RT coverage bins: {:?}", counts);

    if filled_bins < config.min_bins_filled {
        return Err(NormalizerError::InsufficientCoverage {
            filled_bins,
            required: config.min_bins_filled,
        });
    }
    Ok(())
}
