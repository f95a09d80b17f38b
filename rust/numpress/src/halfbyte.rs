//! Variable length integer packing on half bytes.
//!
//! A 32 bit integer is written as a head nibble followed by its significant
//! nibbles, least significant first.
//!
//! - head `0..=8`: number of leading zero nibbles (8 means the value is 0,
//!   0 means all 8 nibbles follow).
//! - head `9..=15`: 8 + number of leading `0xF` nibbles (negative values).
//!
//! Nibbles are stored two per byte, high nibble first. An odd trailing
//! nibble is padded with 0, which the reader recognizes and skips.

use crate::errors::DecodingError;

const HIGH_NIBBLE: u32 = 0xf000_0000;

pub(crate) struct HalfBytePacker<'a> {
    out: &'a mut Vec<u8>,
    pending: Option<u8>,
}

impl<'a> HalfBytePacker<'a> {
    pub(crate) fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out, pending: None }
    }

    fn push(&mut self, nibble: u8) {
        match self.pending.take() {
            Some(high) => self.out.push((high << 4) | (nibble & 0xf)),
            None => self.pending = Some(nibble & 0xf),
        }
    }

    fn push_low_nibbles(&mut self, x: u32, count: usize) {
        for i in 0..count {
            self.push(((x >> (4 * i)) & 0xf) as u8);
        }
    }

    /// Appends the bit pattern of `x`; signed residuals are passed as their
    /// two's complement `u32`.
    pub(crate) fn push_int(&mut self, x: u32) {
        let init = x & HIGH_NIBBLE;
        if init == 0 {
            let leading = (0..8usize)
                .find(|i| x & (HIGH_NIBBLE >> (4 * i)) != 0)
                .unwrap_or(8);
            self.push(leading as u8);
            self.push_low_nibbles(x, 8 - leading);
        } else if init == HIGH_NIBBLE {
            let leading = (0..8usize)
                .find(|i| {
                    let mask = HIGH_NIBBLE >> (4 * i);
                    x & mask != mask
                })
                .unwrap_or(7);
            self.push(leading as u8 + 8);
            self.push_low_nibbles(x, 8 - leading);
        } else {
            self.push(0);
            self.push_low_nibbles(x, 8);
        }
    }

    /// Flushes a dangling nibble as the high half of a zero padded byte.
    pub(crate) fn finish(self) {
        if let Some(high) = self.pending {
            self.out.push(high << 4);
        }
    }
}

pub(crate) struct HalfByteReader<'a> {
    data: &'a [u8],
    // Position in nibbles, not bytes.
    pos: usize,
}

impl<'a> HalfByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() * 2 - self.pos
    }

    fn next_nibble(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos / 2)?;
        let nibble = if self.pos % 2 == 0 {
            byte >> 4
        } else {
            byte & 0xf
        };
        self.pos += 1;
        Some(nibble)
    }

    /// True when nothing but (at most) the zero padding nibble is left.
    pub(crate) fn is_exhausted(&self) -> bool {
        match self.remaining() {
            0 => true,
            1 => self.data[self.pos / 2] & 0xf == 0,
            _ => false,
        }
    }

    pub(crate) fn read_int(&mut self) -> Result<u32, DecodingError> {
        let truncated = DecodingError::Truncated {
            context: "a half-byte packed integer",
            len: self.data.len(),
        };
        let head = match self.next_nibble() {
            Some(x) => x,
            None => return Err(truncated),
        };

        let (leading, mut res) = if head <= 8 {
            (head as usize, 0u32)
        } else {
            let leading = (head - 8) as usize;
            let filled = (0..leading).fold(0u32, |acc, i| acc | (HIGH_NIBBLE >> (4 * i)));
            (leading, filled)
        };

        for i in leading..8 {
            let nibble = match self.next_nibble() {
                Some(x) => x,
                None => return Err(truncated),
            };
            res |= (nibble as u32) << ((i - leading) * 4);
        }
        Ok(res)
    }
}
