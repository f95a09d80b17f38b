//! Positive integer compression: values are rounded to the nearest integer
//! and half-byte packed. There is no fixed point header.

use crate::errors::{
    DecodingError,
    EncodingError,
};
use crate::halfbyte::{
    HalfBytePacker,
    HalfByteReader,
};

pub(crate) fn encode(data: &[f64], out: &mut Vec<u8>) -> Result<(), EncodingError> {
    let mut packer = HalfBytePacker::new(out);
    for (index, &value) in data.iter().enumerate() {
        if !value.is_finite() {
            return Err(EncodingError::NonFiniteValue { index, value });
        }
        if value < 0.0 {
            return Err(EncodingError::NegativeValue { index, value });
        }
        if value + 0.5 > i32::MAX as f64 {
            return Err(EncodingError::Overflow { index, value });
        }
        packer.push_int((value + 0.5) as u32);
    }
    packer.finish();
    Ok(())
}

pub(crate) fn decode(data: &[u8]) -> Result<Vec<f64>, DecodingError> {
    let mut reader = HalfByteReader::new(data);
    let mut out = Vec::with_capacity(data.len());
    while !reader.is_exhausted() {
        out.push(reader.read_int()? as f64);
    }
    Ok(out)
}
