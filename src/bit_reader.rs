// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! LSB-first bit reader over a byte slice.
//!
//! The reader keeps a single bit cursor and gathers each requested field
//! from the underlying bytes on demand; it never reads past the end of
//! the slice, and underflow surfaces as `TruncatedData`.

use crate::error::{Error, Result};

/// Widest single field the reader hands out; matches the writer's N-bit
/// unsigned range. Larger values are composed from several reads.
pub const MAX_READ_BITS: usize = 32;

#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &[u8]) -> BitReader {
        BitReader { data, bit_pos: 0 }
    }

    /// Reads the next `num` bits, least significant first.
    pub fn read(&mut self, num: usize) -> Result<u64> {
        debug_assert!(num <= MAX_READ_BITS);
        if num > self.total_bits_available() {
            return Err(Error::TruncatedData);
        }
        let mut value = 0u64;
        let mut filled = 0;
        let mut byte = self.bit_pos / 8;
        let mut shift = self.bit_pos % 8;
        while filled < num {
            value |= ((self.data[byte] >> shift) as u64) << filled;
            filled += 8 - shift;
            shift = 0;
            byte += 1;
        }
        self.bit_pos += num;
        Ok(value & ((1u64 << num) - 1))
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read(1)? != 0)
    }

    /// Reads a unary-coded quotient: the count of 1-bits before the
    /// terminating 0-bit.
    pub fn read_unary(&mut self) -> Result<u32> {
        let mut count = 0u32;
        while self.read_bit()? {
            count += 1;
        }
        Ok(count)
    }

    /// Reads a variable-length U32: a 2-bit selector, then
    /// {value 0, 4 bits + 1, 8 bits + 17, 32 raw bits}.
    pub fn read_u32_var(&mut self) -> Result<u32> {
        match self.read(2)? {
            0 => Ok(0),
            1 => Ok(1 + self.read(4)? as u32),
            2 => Ok(17 + self.read(8)? as u32),
            _ => Ok(self.read(32)? as u32),
        }
    }

    /// Reads a variable-length U64: a 2-bit selector, then
    /// {value 0, 4 bits + 1, 8 bits + 17, 12 bits plus 8-bit continuations}.
    pub fn read_u64_var(&mut self) -> Result<u64> {
        match self.read(2)? {
            0 => Ok(0),
            1 => Ok(1 + self.read(4)?),
            2 => Ok(17 + self.read(8)?),
            _ => {
                let mut result = self.read(12)?;
                let mut shift = 12;
                while self.read_bit()? {
                    if shift == 60 {
                        result |= self.read(4)? << shift;
                        break;
                    }
                    result |= self.read(8)? << shift;
                    shift += 8;
                }
                Ok(result)
            }
        }
    }

    /// Reads a ZigZag-mapped signed value stored as a variable-length U32.
    pub fn read_signed_zigzag(&mut self) -> Result<i32> {
        let u = self.read_u32_var()?;
        Ok(crate::entropy_coding::context::zigzag_decode(u))
    }

    /// Returns the total number of bits that have been read or skipped.
    pub fn total_bits_read(&self) -> usize {
        self.bit_pos
    }

    /// Returns the total number of bits that can still be read or skipped.
    pub fn total_bits_available(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Skips `num` bits without looking at them.
    pub fn skip_bits(&mut self, num: usize) -> Result<()> {
        if num > self.total_bits_available() {
            return Err(Error::TruncatedData);
        }
        self.bit_pos += num;
        Ok(())
    }

    /// Jumps to the next byte boundary. The skipped bits have to be 0.
    pub fn jump_to_byte_boundary(&mut self) -> Result<()> {
        let padding = (8 - self.bit_pos % 8) % 8;
        if self.read(padding)? != 0 {
            return Err(Error::DecodingFailed("non-zero padding bits".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lsb_first() {
        let mut br = BitReader::new(&[0b0000_0001, 0b0000_0010]);
        assert_eq!(br.read(1).unwrap(), 1);
        assert_eq!(br.read(7).unwrap(), 0);
        assert_eq!(br.read(8).unwrap(), 2);
        assert_eq!(br.total_bits_read(), 16);
        assert_eq!(br.read(1), Err(Error::TruncatedData));
    }

    #[test]
    fn test_read_across_byte_boundary() {
        // 0xab = 1010_1011, 0xcd = 1100_1101, LSB-first.
        let mut br = BitReader::new(&[0xab, 0xcd]);
        assert_eq!(br.read(4).unwrap(), 0xb);
        assert_eq!(br.read(8).unwrap(), 0xda);
        assert_eq!(br.read(4).unwrap(), 0xc);
    }

    #[test]
    fn test_full_width_read() {
        let mut br = BitReader::new(&[0x78, 0x56, 0x34, 0x12, 0x01]);
        assert_eq!(br.read(4).unwrap(), 0x8);
        assert_eq!(br.read(32).unwrap(), 0x1123_4567);
        assert_eq!(br.total_bits_available(), 4);
    }

    #[test]
    fn test_skip_and_boundary() {
        let mut br = BitReader::new(&[0x01, 0x00, 0xff]);
        assert_eq!(br.read(1).unwrap(), 1);
        br.jump_to_byte_boundary().unwrap();
        assert_eq!(br.total_bits_read(), 8);
        br.skip_bits(8).unwrap();
        assert_eq!(br.read(8).unwrap(), 0xff);
    }

    #[test]
    fn test_boundary_is_idempotent_when_aligned() {
        let mut br = BitReader::new(&[0xaa]);
        br.jump_to_byte_boundary().unwrap();
        assert_eq!(br.total_bits_read(), 0);
        assert_eq!(br.read(8).unwrap(), 0xaa);
    }

    #[test]
    fn test_nonzero_padding_rejected() {
        let mut br = BitReader::new(&[0b1000_0001]);
        assert_eq!(br.read(1).unwrap(), 1);
        assert!(br.jump_to_byte_boundary().is_err());
    }

    #[test]
    fn test_skip_past_end() {
        let mut br = BitReader::new(&[0x00]);
        assert_eq!(br.skip_bits(9), Err(Error::TruncatedData));
        // A failed skip leaves the cursor usable.
        assert_eq!(br.read(8).unwrap(), 0);
    }

    #[test]
    fn test_unary() {
        // Bits (LSB-first): 1 1 1 0 ... -> quotient 3.
        let mut br = BitReader::new(&[0b0000_0111]);
        assert_eq!(br.read_unary().unwrap(), 3);
        assert_eq!(br.read_unary().unwrap(), 0);
    }
}
