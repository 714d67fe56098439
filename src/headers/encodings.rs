// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::bit_writer::BitWriter;
use crate::error::{Error, Result};

/// A fixed-width or constant field of a header.
#[derive(Debug, Clone, Copy)]
pub enum U32 {
    Bits(usize),
    BitsOffset { n: usize, off: u32 },
    Val(u32),
}

impl U32 {
    pub fn read(&self, br: &mut BitReader) -> Result<u32> {
        match *self {
            U32::Bits(n) => Ok(br.read(n)? as u32),
            U32::BitsOffset { n, off } => Ok(br.read(n)? as u32 + off),
            U32::Val(val) => Ok(val),
        }
    }

    /// Whether `value` is representable by this field.
    pub fn can_encode(&self, value: u32) -> bool {
        match *self {
            U32::Bits(n) => (value as u64) < (1u64 << n),
            U32::BitsOffset { n, off } => {
                value >= off && ((value - off) as u64) < (1u64 << n)
            }
            U32::Val(val) => value == val,
        }
    }

    pub fn write(&self, bw: &mut BitWriter, value: u32) {
        debug_assert!(self.can_encode(value));
        match *self {
            U32::Bits(n) => bw.write_bits(value as u64, n),
            U32::BitsOffset { n, off } => bw.write_bits((value - off) as u64, n),
            U32::Val(_) => {}
        }
    }
}

/// Four alternative field layouts behind a 2-bit selector, as used by the
/// header dimension fields.
#[derive(Debug, Clone, Copy)]
pub struct U32Coder(pub U32, pub U32, pub U32, pub U32);

impl U32Coder {
    pub fn read(&self, br: &mut BitReader) -> Result<u32> {
        let selector = br.read(2)?;
        match selector {
            0 => self.0.read(br),
            1 => self.1.read(br),
            2 => self.2.read(br),
            _ => self.3.read(br),
        }
    }

    /// Writes `value` with the first selector able to represent it.
    pub fn write(&self, bw: &mut BitWriter, value: u32) -> Result<()> {
        let alternatives = [self.0, self.1, self.2, self.3];
        for (selector, alternative) in alternatives.iter().enumerate() {
            if alternative.can_encode(value) {
                bw.write_bits(selector as u64, 2);
                alternative.write(bw, value);
                return Ok(());
            }
        }
        Err(Error::EncodingFailed(format!(
            "value {value} fits no selector"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM_CODER: U32Coder = U32Coder(
        U32::BitsOffset { n: 14, off: 1 },
        U32::BitsOffset { n: 18, off: 1 },
        U32::BitsOffset { n: 22, off: 1 },
        U32::BitsOffset { n: 30, off: 1 },
    );

    #[test]
    fn test_selector_roundtrip() {
        for value in [1u32, 100, 1 << 14, (1 << 14) + 1, 1 << 20, 1 << 29] {
            let mut bw = BitWriter::new();
            DIM_CODER.write(&mut bw, value).unwrap();
            let bytes = bw.finalize();
            let mut br = BitReader::new(&bytes);
            assert_eq!(DIM_CODER.read(&mut br).unwrap(), value);
        }
    }

    #[test]
    fn test_smallest_selector_wins() {
        let mut bw = BitWriter::new();
        DIM_CODER.write(&mut bw, 5).unwrap();
        // 2 selector bits + 14 value bits.
        assert_eq!(bw.finalize().len(), 2);
    }

    #[test]
    fn test_unencodable_value() {
        let coder = U32Coder(U32::Val(0), U32::Bits(2), U32::Bits(2), U32::Bits(2));
        let mut bw = BitWriter::new();
        assert!(coder.write(&mut bw, 100).is_err());
    }
}
