use crate::config::{
    CompressionMode,
    NumpressConfig,
};
use crate::errors::{
    DecodingError,
    EncodingError,
    Result,
};
use crate::fixed_point::{
    optimal_linear_fixed_point,
    optimal_linear_fixed_point_mass,
    optimal_slof_fixed_point,
};
use crate::{
    linear,
    pic,
    slof,
};
use base64::prelude::*;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{
    Deserialize,
    Serialize,
};
use std::io::{
    Read,
    Write,
};
use tracing::{
    debug,
    warn,
};

/// A base64 encoded numpress payload and everything needed to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedTrace {
    pub data: String,
    pub mode: CompressionMode,
    /// Scale written in the header. `None` for modes without one and for
    /// empty traces.
    pub fixed_point: Option<f64>,
    pub fixed_point_estimated: bool,
    pub secondary_compression: bool,
}

impl EncodedTrace {
    pub fn decode(&self) -> Result<Vec<f64>> {
        decode(&self.data, self.mode, self.secondary_compression)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Encodes a trace into its base64 transport form.
///
/// # Example
///
/// ```
/// use numpress::{encode, CompressionMode, NumpressConfig};
///
/// let values = [100.0, 200.0, 300.00005, 400.0001];
/// let encoded = encode(&values, &NumpressConfig::new(CompressionMode::Linear)).unwrap();
/// assert_eq!(encoded.data, "QWR64UAAAADo//8/0P//f1kSgA==");
/// assert_eq!(encoded.fixed_point, Some(10737418.0));
///
/// let decoded = encoded.decode().unwrap();
/// assert_eq!(decoded.len(), values.len());
/// assert!((decoded[2] - 300.00005).abs() < 1e-7);
/// ```
pub fn encode(values: &[f64], config: &NumpressConfig) -> Result<EncodedTrace> {
    let mode = config.mode;
    let estimated = config.estimate_fixed_point && mode.uses_fixed_point();
    if values.is_empty() {
        return Ok(EncodedTrace {
            data: String::new(),
            mode,
            fixed_point: None,
            fixed_point_estimated: estimated,
            secondary_compression: config.apply_secondary_compression,
        });
    }
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(EncodingError::NonFiniteValue { index, value }.into());
    }

    let fixed_point = resolve_fixed_point(values, config)?;
    let payload = encode_payload(values, mode, fixed_point)?;
    if let Some(tolerance) = config.error_tolerance {
        check_tolerance(values, &payload, mode, tolerance)?;
    }

    let raw_len = payload.len();
    let payload = if config.apply_secondary_compression {
        zlib_compress(&payload)?
    } else {
        payload
    };
    let data = BASE64_STANDARD.encode(&payload);
    debug!(
        "Encoded {} values with {} (fixed point {:?}): {} bytes, {} after compression, {} base64 chars",
        values.len(),
        mode,
        fixed_point,
        raw_len,
        payload.len(),
        data.len()
    );

    Ok(EncodedTrace {
        data,
        mode,
        fixed_point,
        fixed_point_estimated: estimated,
        secondary_compression: config.apply_secondary_compression,
    })
}

/// Inverse of [`encode`]. `apply_secondary_compression` must match the
/// flag the data was encoded with.
pub fn decode(data: &str, mode: CompressionMode, apply_secondary_compression: bool) -> Result<Vec<f64>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let bytes = BASE64_STANDARD
        .decode(data)
        .map_err(DecodingError::from)?;
    let bytes = if apply_secondary_compression {
        zlib_decompress(&bytes)?
    } else {
        bytes
    };
    decode_bytes(&bytes, mode)
}

/// Raw numpress bytes for `values`, without zlib or base64.
///
/// `fixed_point` is ignored by [`CompressionMode::PositiveInteger`].
pub fn encode_bytes(values: &[f64], mode: CompressionMode, fixed_point: f64) -> Result<Vec<u8>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let fixed_point = if mode.uses_fixed_point() {
        Some(validate_fixed_point(fixed_point)?)
    } else {
        None
    };
    Ok(encode_payload(values, mode, fixed_point)?)
}

pub fn decode_bytes(data: &[u8], mode: CompressionMode) -> Result<Vec<f64>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let values = match mode {
        CompressionMode::Linear => linear::decode(data)?,
        CompressionMode::PositiveInteger => pic::decode(data)?,
        CompressionMode::ShortLogarithmicFloat => slof::decode(data)?,
    };
    Ok(values)
}

fn validate_fixed_point(fixed_point: f64) -> std::result::Result<f64, EncodingError> {
    if fixed_point.is_finite() && fixed_point > 0.0 {
        Ok(fixed_point)
    } else {
        Err(EncodingError::InvalidFixedPoint(fixed_point))
    }
}

fn resolve_fixed_point(
    values: &[f64],
    config: &NumpressConfig,
) -> std::result::Result<Option<f64>, EncodingError> {
    let fixed_point = match (config.mode, config.estimate_fixed_point) {
        (CompressionMode::PositiveInteger, _) => return Ok(None),
        (_, false) => config.fixed_point,
        (CompressionMode::Linear, true) => match config.linear_mass_accuracy {
            Some(mass_accuracy) => optimal_linear_fixed_point_mass(values, mass_accuracy).ok_or(
                EncodingError::MassAccuracyUnreachable {
                    mass_accuracy,
                    max_fixed_point: optimal_linear_fixed_point(values),
                },
            )?,
            None => optimal_linear_fixed_point(values),
        },
        (CompressionMode::ShortLogarithmicFloat, true) => optimal_slof_fixed_point(values),
    };
    validate_fixed_point(fixed_point).map(Some)
}

fn encode_payload(
    values: &[f64],
    mode: CompressionMode,
    fixed_point: Option<f64>,
) -> std::result::Result<Vec<u8>, EncodingError> {
    let mut out = Vec::new();
    match (mode, fixed_point) {
        (CompressionMode::PositiveInteger, _) => pic::encode(values, &mut out)?,
        (CompressionMode::Linear, Some(fp)) => linear::encode(values, fp, &mut out)?,
        (CompressionMode::ShortLogarithmicFloat, Some(fp)) => slof::encode(values, fp, &mut out)?,
        (_, None) => return Err(EncodingError::InvalidFixedPoint(f64::NAN)),
    }
    Ok(out)
}

/// Decodes a freshly encoded payload and compares it to the input.
/// Deviation is relative, or absolute for zero-valued originals.
fn check_tolerance(values: &[f64], payload: &[u8], mode: CompressionMode, tolerance: f64) -> Result<()> {
    let decoded = decode_bytes(payload, mode)?;
    for (index, (&original, &decoded)) in values.iter().zip(decoded.iter()).enumerate() {
        let deviation = if original == 0.0 {
            decoded.abs()
        } else {
            ((decoded - original) / original).abs()
        };
        if deviation > tolerance {
            warn!(
                "Numpress {} round trip of {} gave {} (tolerance {})",
                mode, original, decoded, tolerance
            );
            return Err(EncodingError::ToleranceExceeded {
                index,
                original,
                decoded,
                tolerance,
            }
            .into());
        }
    }
    Ok(())
}

fn zlib_compress(bytes: &[u8]) -> std::result::Result<Vec<u8>, EncodingError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(EncodingError::Compression)?;
    encoder.finish().map_err(EncodingError::Compression)
}

fn zlib_decompress(bytes: &[u8]) -> std::result::Result<Vec<u8>, DecodingError> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(DecodingError::Decompression)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trace_every_mode() {
        for mode in CompressionMode::ALL {
            for zlib in [false, true] {
                let config = NumpressConfig::new(mode).with_secondary_compression(zlib);
                let encoded = encode(&[], &config).unwrap();
                assert!(encoded.is_empty());
                assert!(encoded.decode().unwrap().is_empty());
            }
        }
    }

    #[test]
    fn test_pic_reports_no_fixed_point() {
        let encoded = encode(&[1.0, 2.0], &NumpressConfig::new(CompressionMode::PositiveInteger)).unwrap();
        assert_eq!(encoded.fixed_point, None);
        assert!(!encoded.fixed_point_estimated);
    }

    #[test]
    fn test_given_fixed_point_is_used() {
        let config = NumpressConfig::new(CompressionMode::Linear).with_fixed_point(1000.0);
        let encoded = encode(&[1.0, 2.0, 3.5], &config).unwrap();
        assert_eq!(encoded.fixed_point, Some(1000.0));
        assert!(!encoded.fixed_point_estimated);
        assert_eq!(encoded.decode().unwrap(), vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn test_invalid_given_fixed_point() {
        let config = NumpressConfig::new(CompressionMode::ShortLogarithmicFloat).with_fixed_point(-3.0);
        let err = encode(&[1.0], &config).unwrap_err();
        assert!(matches!(
            err,
            crate::NumpressError::Encoding(EncodingError::InvalidFixedPoint(_))
        ));
    }

    #[test]
    fn test_tolerance_check() {
        let values = [0.4, 10.2, 300.0];
        let mut config = NumpressConfig::new(CompressionMode::PositiveInteger);
        config.error_tolerance = Some(0.5);
        // 0.4 rounds to 0, a full relative error of 1.0
        let err = encode(&values, &config).unwrap_err();
        assert!(matches!(
            err,
            crate::NumpressError::Encoding(EncodingError::ToleranceExceeded { index: 0, .. })
        ));

        config.error_tolerance = Some(1.0);
        assert!(encode(&values, &config).is_ok());
    }

    #[test]
    fn test_nan_rejected_before_estimation() {
        let err = encode(&[1.0, f64::NAN], &NumpressConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::NumpressError::Encoding(EncodingError::NonFiniteValue { index: 1, .. })
        ));
    }
}
