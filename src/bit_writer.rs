// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::entropy_coding::context::zigzag_encode;

/// Writes bits to a byte buffer, LSB-first; the exact mirror of
/// [`BitReader`](crate::bit_reader::BitReader).
#[derive(Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_buf: u64,
    bits_in_buf: usize,
}

pub const MAX_BITS_PER_WRITE: usize = 56;

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Writes the low `num` bits of `value`.
    pub fn write_bits(&mut self, value: u64, num: usize) {
        debug_assert!(num <= MAX_BITS_PER_WRITE);
        debug_assert!(num == 64 || value < (1u64 << num));
        self.bit_buf |= value << self.bits_in_buf;
        self.bits_in_buf += num;
        while self.bits_in_buf >= 8 {
            self.data.push((self.bit_buf & 0xff) as u8);
            self.bit_buf >>= 8;
            self.bits_in_buf -= 8;
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Writes a unary-coded quotient: `count` 1-bits then a 0-bit.
    pub fn write_unary(&mut self, count: u32) {
        let mut left = count as usize;
        while left >= 32 {
            self.write_bits(0xffff_ffff, 32);
            left -= 32;
        }
        // The terminating zero rides along with the remaining ones.
        self.write_bits((1u64 << left) - 1, left + 1);
    }

    /// Pads with zero bits to the next byte boundary. Idempotent when the
    /// writer is already aligned.
    pub fn flush_byte(&mut self) {
        if self.bits_in_buf > 0 {
            self.write_bits(0, 8 - self.bits_in_buf);
        }
    }

    /// Writes a variable-length U32: a 2-bit selector, then
    /// {value 0, 4 bits + 1, 8 bits + 17, 32 raw bits}.
    pub fn write_u32_var(&mut self, value: u32) {
        if value == 0 {
            self.write_bits(0, 2);
        } else if value <= 16 {
            self.write_bits(1, 2);
            self.write_bits((value - 1) as u64, 4);
        } else if value <= 272 {
            self.write_bits(2, 2);
            self.write_bits((value - 17) as u64, 8);
        } else {
            self.write_bits(3, 2);
            self.write_bits(value as u64, 32);
        }
    }

    /// Writes a variable-length U64: a 2-bit selector, then
    /// {value 0, 4 bits + 1, 8 bits + 17, 12 bits plus 8-bit continuations}.
    pub fn write_u64_var(&mut self, value: u64) {
        if value == 0 {
            self.write_bits(0, 2);
        } else if value <= 16 {
            self.write_bits(1, 2);
            self.write_bits(value - 1, 4);
        } else if value <= 272 {
            self.write_bits(2, 2);
            self.write_bits(value - 17, 8);
        } else {
            self.write_bits(3, 2);
            self.write_bits(value & 0xfff, 12);
            let mut left = value >> 12;
            let mut shift = 12;
            while left > 0 {
                self.write_bit(true);
                if shift == 60 {
                    self.write_bits(left & 0xf, 4);
                    return;
                }
                self.write_bits(left & 0xff, 8);
                left >>= 8;
                shift += 8;
            }
            self.write_bit(false);
        }
    }

    /// Writes a signed value with the unsigned ZigZag mapping, then as a
    /// variable-length U32.
    pub fn write_signed_zigzag(&mut self, value: i32) {
        self.write_u32_var(zigzag_encode(value));
    }

    /// Flushes to a byte boundary, then appends raw bytes.
    pub fn write_bytes_aligned(&mut self, bytes: &[u8]) {
        self.flush_byte();
        self.data.extend_from_slice(bytes);
    }

    /// Number of bits written so far.
    pub fn bit_position(&self) -> usize {
        self.data.len() * 8 + self.bits_in_buf
    }

    /// Flushes to a byte boundary and returns the written bytes.
    pub fn finalize(mut self) -> Vec<u8> {
        self.flush_byte();
        self.data
    }
}
