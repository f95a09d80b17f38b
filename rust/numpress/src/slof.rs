//! Short logarithmic float: `ln(x + 1)` scaled to an unsigned short.
//!
//! Two bytes per value plus the 8 byte header. The relative error is
//! roughly constant, which suits intensities spanning several orders of
//! magnitude.

use crate::errors::{
    DecodingError,
    EncodingError,
};
use crate::fixed_point::{
    HEADER_LEN,
    read_header,
    write_header,
};

pub(crate) fn encode(data: &[f64], fixed_point: f64, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    write_header(fixed_point, out);
    out.reserve(data.len() * 2);
    for (index, &value) in data.iter().enumerate() {
        if !value.is_finite() {
            return Err(EncodingError::NonFiniteValue { index, value });
        }
        // ln(x + 1) is only non-negative for x >= 0, no clamping is applied.
        if value < 0.0 {
            return Err(EncodingError::NegativeValue { index, value });
        }
        let scaled = (value + 1.0).ln() * fixed_point;
        if scaled > u16::MAX as f64 {
            return Err(EncodingError::Overflow { index, value });
        }
        let x = (scaled + 0.5) as u16;
        out.extend_from_slice(&x.to_le_bytes());
    }
    Ok(())
}

pub(crate) fn decode(data: &[u8]) -> Result<Vec<f64>, DecodingError> {
    let fixed_point = read_header(data, "the logarithmic fixed point")?;
    let body = &data[HEADER_LEN..];
    if body.len() % 2 != 0 {
        return Err(DecodingError::OddLength { len: data.len() });
    }
    Ok(body
        .chunks_exact(2)
        .map(|c| {
            let x = u16::from_le_bytes([c[0], c[1]]);
            (x as f64 / fixed_point).exp() - 1.0
        })
        .collect())
}
