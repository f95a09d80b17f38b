//! Small statistics helpers over coordinate pairs.

use crate::Point;
use serde::{
    Deserialize,
    Serialize,
};

/// Pearson correlation coefficient of x and y.
///
/// Returns `None` for fewer than two pairs or when either coordinate has
/// zero variance.
///
/// ```
/// use rtnorm::Point;
/// use rtnorm::stats::pearson_correlation;
///
/// let points: Vec<Point> = [(1.0, 2.0), (2.0, 4.1), (3.0, 5.9)]
///     .into_iter()
///     .map(Point::from)
///     .collect();
/// assert!(pearson_correlation(&points).unwrap() > 0.99);
/// assert_eq!(pearson_correlation(&points[..1]), None);
/// ```
pub fn pearson_correlation(points: &[Point]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let (mean_x, mean_y) = means(points);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

fn means(points: &[Point]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// `None` when there are fewer than two pairs or all x are equal.
    pub fn least_squares(points: &[Point]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let (mean_x, mean_y) = means(points);
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for p in points {
            let dx = p.x - mean_x;
            sxy += dx * (p.y - mean_y);
            sxx += dx * dx;
        }
        if sxx <= 0.0 {
            return None;
        }
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Observed minus predicted y.
    pub fn residual(&self, point: &Point) -> f64 {
        point.y - self.predict(point.x)
    }
}

/// Probability of observing a deviation at least as large as the one of
/// `values[pos]`, assuming the values are normally distributed (using the
/// population standard deviation).
///
/// Returns `None` if `pos` is out of bounds. A constant series gives 1.0.
pub fn chauvenet_probability(values: &[f64], pos: usize) -> Option<f64> {
    let value = *values.get(pos)?;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sd = variance.sqrt();
    if sd <= 0.0 {
        return Some(1.0);
    }
    Some(libm::erfc((value - mean).abs() / sd / std::f64::consts::SQRT_2))
}

/// Chauvenet's criterion: true when `values[pos]` is unlikely enough
/// (probability below `1 / (2n)`) to be rejected as an outlier.
pub fn chauvenet(values: &[f64], pos: usize) -> bool {
    match chauvenet_probability(values, pos) {
        Some(prob) => prob < 1.0 / (2.0 * values.len() as f64),
        None => false,
    }
}
