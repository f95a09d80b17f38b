//! Scale factor estimation and the 8 byte fixed point header.

use crate::errors::DecodingError;
use tracing::warn;

pub(crate) const HEADER_LEN: usize = 8;

/// Largest fixed point that keeps the first two values and every
/// linear-extrapolation residual inside a signed 32 bit integer.
///
/// Only magnitudes matter, negative values are handled like positive ones.
///
/// # Example
///
/// ```
/// use numpress::fixed_point::optimal_linear_fixed_point;
///
/// let fp = optimal_linear_fixed_point(&[100.0, 200.0, 300.00005, 400.0001]);
/// assert_eq!(fp, 10737418.0);
/// ```
pub fn optimal_linear_fixed_point(data: &[f64]) -> f64 {
    match data {
        [] => 0.0,
        [only] => {
            let max_double = if only.abs() > 0.0 { only.abs() } else { 1.0 };
            (i32::MAX as f64 / max_double).floor()
        }
        [first, second, ..] => {
            let mut max_double = first.abs().max(second.abs());
            for w in data.windows(3) {
                let extrapolated = w[1] + (w[1] - w[0]);
                let diff = w[2] - extrapolated;
                max_double = max_double.max((diff.abs() + 1.0).ceil());
            }
            if max_double <= 0.0 {
                max_double = 1.0;
            }
            (i32::MAX as f64 / max_double).floor()
        }
    }
}

/// Fixed point giving a maximal absolute error of `mass_accuracy` on the
/// encoded values (rounding contributes at most half a unit).
///
/// Returns `None` when that fixed point would overflow the residuals, see
/// [`optimal_linear_fixed_point`]. Traces shorter than three values carry
/// no residuals and simply use the overflow-safe estimate.
pub fn optimal_linear_fixed_point_mass(data: &[f64], mass_accuracy: f64) -> Option<f64> {
    let max_fp = optimal_linear_fixed_point(data);
    if data.len() < 3 {
        return Some(max_fp);
    }
    let wanted = 0.5 / mass_accuracy;
    if !wanted.is_finite() || wanted > max_fp {
        warn!(
            "Cannot reach a mass accuracy of {} (needs fixed point {}, max is {})",
            mass_accuracy, wanted, max_fp
        );
        return None;
    }
    Some(wanted)
}

/// Largest fixed point for which `ln(x + 1) * fp` fits an unsigned short
/// for every value of the trace.
pub fn optimal_slof_fixed_point(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let max_log = data.iter().fold(1.0f64, |acc, &x| acc.max((x + 1.0).ln()));
    (u16::MAX as f64 / max_log).floor()
}

pub(crate) fn write_header(fixed_point: f64, out: &mut Vec<u8>) {
    out.extend_from_slice(&fixed_point.to_be_bytes());
}

pub(crate) fn read_header(data: &[u8], context: &'static str) -> Result<f64, DecodingError> {
    let bytes = match data.get(..HEADER_LEN) {
        Some(bytes) => bytes,
        None => {
            return Err(DecodingError::Truncated {
                context,
                len: data.len(),
            });
        }
    };
    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(bytes);
    let fixed_point = f64::from_be_bytes(header);
    if !(fixed_point.is_finite() && fixed_point > 0.0) {
        return Err(DecodingError::InvalidFixedPoint(fixed_point));
    }
    Ok(fixed_point)
}
