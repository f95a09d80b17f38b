//! Linear prediction: the first two values are stored as scaled signed
//! 32 bit integers, every further value as the residual to its linear
//! extrapolation.
//!
//! Best suited for smooth, roughly monotonic traces such as m/z or
//! retention time arrays.

use crate::errors::{
    DecodingError,
    EncodingError,
};
use crate::fixed_point::{
    HEADER_LEN,
    read_header,
    write_header,
};
use crate::halfbyte::{
    HalfBytePacker,
    HalfByteReader,
};

fn scale_value(index: usize, value: f64, fixed_point: f64) -> Result<i64, EncodingError> {
    if !value.is_finite() {
        return Err(EncodingError::NonFiniteValue { index, value });
    }
    // Round half up, also for negative values.
    let scaled = (value * fixed_point + 0.5).floor();
    if scaled >= i64::MAX as f64 || scaled <= i64::MIN as f64 {
        return Err(EncodingError::Overflow { index, value });
    }
    Ok(scaled as i64)
}

pub(crate) fn encode(data: &[f64], fixed_point: f64, out: &mut Vec<u8>) -> Result<(), EncodingError> {
    write_header(fixed_point, out);

    let mut scaled = [0i64; 2];
    for (index, &value) in data.iter().enumerate().take(2) {
        let x = scale_value(index, value, fixed_point)?;
        let x = i32::try_from(x).map_err(|_| EncodingError::Overflow { index, value })?;
        out.extend_from_slice(&x.to_le_bytes());
        scaled[index] = x as i64;
    }
    if data.len() < 3 {
        return Ok(());
    }

    let [mut prev2, mut prev1] = scaled;
    let mut packer = HalfBytePacker::new(out);
    for (index, &value) in data.iter().enumerate().skip(2) {
        let current = scale_value(index, value, fixed_point)?;
        let residual = prev1
            .checked_mul(2)
            .and_then(|x| x.checked_sub(prev2))
            .and_then(|extrapolated| current.checked_sub(extrapolated))
            .and_then(|diff| i32::try_from(diff).ok())
            .ok_or(EncodingError::Overflow { index, value })?;

        packer.push_int(residual as u32);
        prev2 = prev1;
        prev1 = current;
    }
    packer.finish();
    Ok(())
}

fn read_i32(body: &[u8], offset: usize, context: &'static str) -> Result<i32, DecodingError> {
    match body.get(offset..offset + 4) {
        Some(bytes) => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            Ok(i32::from_le_bytes(buf))
        }
        None => Err(DecodingError::Truncated {
            context,
            len: body.len() + HEADER_LEN,
        }),
    }
}

pub(crate) fn decode(data: &[u8]) -> Result<Vec<f64>, DecodingError> {
    let fixed_point = read_header(data, "the linear fixed point")?;
    let body = &data[HEADER_LEN..];
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let first = read_i32(body, 0, "the first value")? as i64;
    let mut out = vec![first as f64 / fixed_point];
    if body.len() == 4 {
        return Ok(out);
    }
    let second = read_i32(body, 4, "the second value")? as i64;
    out.push(second as f64 / fixed_point);

    let (mut prev2, mut prev1) = (first, second);
    let mut reader = HalfByteReader::new(&body[8..]);
    while !reader.is_exhausted() {
        let residual = reader.read_int()? as i32 as i64;
        // Wrapping keeps corrupt input from panicking, valid input never wraps.
        let current = prev1
            .wrapping_mul(2)
            .wrapping_sub(prev2)
            .wrapping_add(residual);
        out.push(current as f64 / fixed_point);
        prev2 = prev1;
        prev1 = current;
    }
    Ok(out)
}
